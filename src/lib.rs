// Library root
// -----------
// The binary (`main.rs`) is a thin pipeline over these modules:
// parse -> classify -> build -> send -> print.
//
// Module responsibilities:
// - `cli`: command line flags and the single positional input.
// - `source`: decides whether the input is stdin, a file or a URL.
// - `api`: builds the multipart form and performs the one HTTP POST.
// - `ui`: prints the hosted URL, verbose headers and the spinner.
// - `error`: error taxonomy and exit codes.
pub mod api;
pub mod cli;
pub mod error;
pub mod source;
pub mod ui;

pub use api::{UploadClient, UploadRequest, UploadResponse, DEFAULT_ENDPOINT};
pub use error::{Error, InputError, UsageError};
pub use source::Source;
