// Terminal output: the hosted URL, the optional verbose headers, error
// reports and the progress spinner. Whether to use color is decided once
// at startup and passed around in `OutputStyle`.

use crate::api::UploadResponse;
use crossterm::style::{Color, Stylize};
use crossterm::tty::IsTty;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Presentation settings shared by every printing routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputStyle {
    /// Style the highlighted header lines.
    pub color: bool,
}

impl OutputStyle {
    /// Color only when stdout is an interactive terminal.
    pub fn detect() -> Self {
        OutputStyle {
            color: io::stdout().is_tty(),
        }
    }
}

/// Write the response body verbatim, then the `x-expires` / `x-token`
/// header lines if any were captured.
pub fn print_response<W: Write>(
    out: &mut W,
    style: OutputStyle,
    response: &UploadResponse,
) -> io::Result<()> {
    out.write_all(&response.body)?;
    for line in response.highlighted_headers() {
        if style.color {
            writeln!(out, "{}", line.with(Color::Cyan))?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}

/// Spinner shown on stderr while the request is in flight. indicatif keeps
/// it invisible when stderr is not a terminal; `enabled = false` hides it
/// unconditionally (used while stdin is being read from the terminal).
pub fn spinner(message: &'static str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
