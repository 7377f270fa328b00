//! `sfdesk` entry point.
//!
//! Logging goes to stderr, filtered by `SFDESK_LOG` (or `RUST_LOG`), default
//! `warn`; `--verbose` switches to `debug`. Configuration problems exit with
//! status 2, every other failure with 1.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sfdesk::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let directives = if cli.verbose {
        "sfdesk=debug,sfdesk_auth=debug,sfdesk_rest=debug,sfdesk_client=debug,sfdesk_report=debug"
            .to_string()
    } else {
        std::env::var("SFDESK_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".into())
    };
    tracing_subscriber::registry()
        .with(EnvFilter::new(directives))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting sfdesk");

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr(), "Error: {err:#}");
            let config_error = err
                .downcast_ref::<sfdesk::Error>()
                .is_some_and(sfdesk::Error::is_config);
            if config_error {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
