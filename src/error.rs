// Error taxonomy for the uploader. Every failure the tool can report is
// one of these variants; `main` turns them into an exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the command line itself. These are shown together with
/// the usage line.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("invalid expires value")]
    InvalidExpires,
    #[error("missing mimetype")]
    MissingMimeType,
    #[error("no input specified")]
    NoInput,
    /// Anything else clap rejected, such as an unknown flag.
    #[error("{}", .0.kind())]
    Other(clap::Error),
}

/// The positional input did not resolve to stdin, a file or a URL.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{}: is a directory", .0.display())]
    IsDirectory(PathBuf),
    #[error("{}: no such file", .0.display())]
    NoSuchFile(PathBuf),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The content type has bytes an HTTP header cannot carry, so the
    /// part cannot be sent.
    #[error("content type {0:?} cannot be sent as a header")]
    ContentType(String),
    #[error("upload failed")]
    Transport(#[from] reqwest::Error),
}

impl Error {
    /// Process exit code for this error. Success and `--help` exit 0 and
    /// never reach here.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Usage(_) | Error::Input(_) | Error::Io { .. } => 1,
            Error::ContentType(_) | Error::Transport(_) => 2,
        }
    }

    /// Whether the usage line should be printed along with the error.
    pub fn shows_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
