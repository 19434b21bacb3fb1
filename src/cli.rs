// Command line surface. Parsing is done with clap, then clap's own
// failures are folded into `UsageError` so every usage problem exits 1.
//
// Any token that is not one of our flags is the input, even when it starts
// with `-` (a file called `-notes.txt`). Before clap sees the argument list
// every such token is moved behind a `--`, keeping their relative order, so
// flags still work on either side of the input.

use crate::api::UploadRequest;
use crate::error::{Result, UsageError};
use crate::source::Source;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Command, CommandFactory, Parser};
use std::ffi::{OsStr, OsString};
use tracing::{debug, warn};

/// Upload a file, stdin or a remote URL to 0x0.st and print the hosted URL.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "0x0",
    version,
    override_usage = "0x0 [options] <file|url|->",
    args_override_self = true
)]
pub struct Args {
    /// Hours from now, or an epoch-millisecond timestamp (digits only)
    #[arg(short, long, value_name = "N", value_parser = parse_expires)]
    pub expires: Option<String>,

    /// Force the Content-Type of file and stdin uploads
    #[arg(short, long = "mimetype", value_name = "TYPE", value_parser = parse_mime_type)]
    pub mime_type: Option<String>,

    /// Also print the x-expires and x-token response headers
    #[arg(short, long)]
    pub verbose: bool,

    /// File path, http(s) URL, or - to read stdin. If several are given the
    /// last one is used.
    #[arg(value_name = "file|url|-")]
    pub inputs: Vec<String>,
}

/// Outcome of reading the command line.
#[derive(Debug)]
pub enum Parsed {
    Upload(Args),
    /// `--help` or `--version`: clap has the text ready, print it and exit 0.
    Info(clap::Error),
}

impl Args {
    /// Parse an argument list (including the program name).
    pub fn parse_from_args<I, T>(args: I) -> std::result::Result<Parsed, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args = escape_positionals(args.into_iter().map(Into::into).collect());
        match Args::try_parse_from(args) {
            Ok(args) => Ok(Parsed::Upload(args)),
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Ok(Parsed::Info(err)),
                _ => Err(usage_error(err)),
            },
        }
    }

    /// The descriptor that will be classified. With more than one positional
    /// the last one silently wins.
    pub fn input(&self) -> std::result::Result<&str, UsageError> {
        if self.inputs.len() > 1 {
            warn!(
                ignored = ?&self.inputs[..self.inputs.len() - 1],
                "several inputs given, only the last is uploaded"
            );
        }
        self.inputs
            .last()
            .map(String::as_str)
            .ok_or(UsageError::NoInput)
    }

    /// Classify the input and assemble the request.
    pub fn into_request(self) -> Result<UploadRequest> {
        let source = Source::classify(self.input()?)?;
        debug!(%source, "classified input");

        if self.mime_type.is_some() && !source.carries_content() {
            warn!("--mimetype has no effect on URL uploads");
        }

        Ok(UploadRequest {
            source,
            expires: self.expires,
            mime_type: self.mime_type,
            verbose: self.verbose,
        })
    }
}

/// Full help text, shown after usage errors.
pub fn usage() -> String {
    Args::command().render_help().to_string()
}

/// The digits exactly as typed; leading zeros and width are preserved.
fn parse_expires(value: &str) -> std::result::Result<String, String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UsageError::InvalidExpires.to_string());
    }
    Ok(value.to_string())
}

fn parse_mime_type(value: &str) -> std::result::Result<String, String> {
    if value.is_empty() || value.starts_with('-') {
        return Err(UsageError::MissingMimeType.to_string());
    }
    Ok(value.to_string())
}

/// Map clap failures on our two valued options onto their dedicated errors.
fn usage_error(err: clap::Error) -> UsageError {
    let arg = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg.as_str(),
        _ => "",
    };
    match arg.split_whitespace().next().unwrap_or_default() {
        "--expires" | "-e" => UsageError::InvalidExpires,
        "--mimetype" | "-m" => UsageError::MissingMimeType,
        _ => UsageError::Other(err),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// A literal `--`: everything after it is input.
    Escape,
    Flag,
    /// A flag whose value is the next token.
    FlagThenValue,
    Input,
}

/// Rebuild `args` as program name, flags, then `--` and every input token in
/// its original order.
fn escape_positionals(args: Vec<OsString>) -> Vec<OsString> {
    let mut cmd = Args::command();
    cmd.build();

    let mut tokens = args.into_iter();
    let mut flags: Vec<OsString> = tokens.next().into_iter().collect();
    let mut inputs = Vec::new();
    while let Some(token) = tokens.next() {
        match classify_token(&cmd, &token) {
            Token::Escape => {
                inputs.extend(tokens.by_ref());
            }
            Token::Flag => flags.push(token),
            Token::FlagThenValue => {
                flags.push(token);
                flags.extend(tokens.next());
            }
            Token::Input => inputs.push(token),
        }
    }

    if !inputs.is_empty() {
        flags.push(OsString::from("--"));
        flags.extend(inputs);
    }
    flags
}

fn classify_token(cmd: &Command, token: &OsStr) -> Token {
    let Some(text) = token.to_str() else {
        return Token::Input;
    };
    if text == "--" {
        return Token::Escape;
    }

    if let Some(long) = text.strip_prefix("--") {
        let (name, inline_value) = match long.split_once('=') {
            Some((name, _)) => (name, true),
            None => (long, false),
        };
        return match cmd.get_arguments().find(|a| a.get_long() == Some(name)) {
            Some(arg) if arg.get_action().takes_values() && !inline_value => Token::FlagThenValue,
            Some(_) => Token::Flag,
            None => Token::Input,
        };
    }

    let Some(cluster) = text.strip_prefix('-') else {
        return Token::Input;
    };
    for (i, c) in cluster.char_indices() {
        match cmd.get_arguments().find(|a| a.get_short() == Some(c)) {
            // Unknown first letter: not one of ours at all.
            None if i == 0 => return Token::Input,
            // Unknown later letter (`-vx`): leave it to clap to reject.
            None => return Token::Flag,
            Some(arg) if arg.get_action().takes_values() => {
                let rest = &cluster[i + c.len_utf8()..];
                return if rest.is_empty() {
                    Token::FlagThenValue
                } else {
                    Token::Flag
                };
            }
            Some(_) => {}
        }
    }
    // Either a plain `-` (stdin) or a run of switches like `-v`.
    if cluster.is_empty() {
        Token::Input
    } else {
        Token::Flag
    }
}
