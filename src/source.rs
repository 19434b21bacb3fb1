// Input classification: decides what the single positional argument
// refers to before any request is built.

use crate::error::InputError;
use std::fmt;
use std::path::{Path, PathBuf};

/// What gets uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A regular file on the local filesystem.
    File(PathBuf),
    /// The process's standard input, requested with a literal `-`.
    Stdin,
    /// A remote `http(s)://` URL that the service fetches itself.
    Url(String),
}

impl Source {
    /// Classify a positional descriptor. Checks run in a fixed order and the
    /// first match wins:
    ///
    /// 1. `-` is stdin, even if a file named `-` exists.
    /// 2. An existing regular file, even if its name looks like a URL.
    /// 3. Anything starting with `http://` or `https://`.
    /// 4. An existing directory is rejected.
    /// 5. Everything else is a missing file.
    pub fn classify(descriptor: &str) -> Result<Self, InputError> {
        if descriptor == "-" {
            return Ok(Source::Stdin);
        }

        let path = Path::new(descriptor);
        if path.is_file() {
            return Ok(Source::File(path.to_path_buf()));
        }
        if is_remote_url(descriptor) {
            return Ok(Source::Url(descriptor.to_string()));
        }
        if path.is_dir() {
            return Err(InputError::IsDirectory(path.to_path_buf()));
        }
        Err(InputError::NoSuchFile(path.to_path_buf()))
    }

    /// Whether the upload carries file content, so a MIME override applies.
    pub fn carries_content(&self) -> bool {
        match self {
            Source::File(_) | Source::Stdin => true,
            Source::Url(_) => false,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "file {}", path.display()),
            Source::Stdin => f.write_str("stdin"),
            Source::Url(url) => write!(f, "url {url}"),
        }
    }
}

fn is_remote_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
