// Entrypoint for the `0x0` uploader.
// - Keeps `main` small: parse, build the request, upload, print.
// - `run` returns `anyhow::Result`; `main` maps the error to an exit code.

use anyhow::Context;
use nullpointer::cli::{self, Args, Parsed};
use nullpointer::ui::{self, OutputStyle};
use nullpointer::{Error, Source, UploadClient, UsageError, DEFAULT_ENDPOINT};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run() -> anyhow::Result<()> {
    let args = match Args::parse_from_args(std::env::args_os()).map_err(Error::from)? {
        Parsed::Upload(args) => args,
        Parsed::Info(info) => {
            info.print().context("failed to print help")?;
            return Ok(());
        }
    };

    let request = args.into_request()?;
    let style = OutputStyle::detect();
    let client = UploadClient::new(DEFAULT_ENDPOINT)?;

    // Reading stdin from a terminal would fight with the spinner.
    let spinner = ui::spinner("Uploading...", request.source != Source::Stdin);
    let response = client.upload(request);
    spinner.finish_and_clear();
    let response = response?;

    let mut out = io::stdout().lock();
    ui::print_response(&mut out, style, &response).context("failed to write to stdout")?;
    Ok(())
}

/// Print the error the way its kind calls for and pick the exit code.
fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>() {
        Some(Error::Usage(UsageError::Other(clap_err))) => {
            // clap renders its own message and usage hint.
            let _ = clap_err.print();
            ExitCode::from(1)
        }
        Some(known) => {
            eprintln!("error: {:#}", err);
            if known.shows_usage() {
                eprintln!();
                eprint!("{}", cli::usage());
            }
            ExitCode::from(known.exit_code())
        }
        None => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
