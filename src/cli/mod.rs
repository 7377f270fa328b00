//! The `sfdesk` command line.
//!
//! User-facing output uses writeln! to stdout; diagnostics go through tracing
//! to stderr.

mod account;
mod admin_cmd;
mod query_cmd;
mod records_cmd;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sfdesk_report::{render_text, Chart, Table};
use sfdesk_rest::SalesforceRestClient;

use crate::config::{AppConfig, StoreBackend, HOME_VAR};
use crate::error::{Error, Result};
use crate::export::write_report;
use crate::login;

pub use account::AccountCommand;
pub use admin_cmd::AdminCommand;
pub use query_cmd::{QueryArgs, SearchArgs};
pub use records_cmd::{NewCommand, RecordCommand};

#[derive(Parser, Debug)]
#[command(name = "sfdesk")]
#[command(version, about = "Salesforce administration toolkit", long_about = None)]
pub struct Cli {
    /// Data directory (key file, credential store, session)
    #[arg(long, global = true, env = "SFDESK_HOME")]
    pub home: Option<PathBuf>,

    /// Credential store backend: sqlite or file
    #[arg(long, global = true, env = "SFDESK_STORE")]
    pub store: Option<String>,

    /// Salesforce API version, e.g. 62.0
    #[arg(long, global = true, env = "SFDESK_API_VERSION")]
    pub api_version: Option<String>,

    /// Login host override (My Domain or a test server)
    #[arg(long, global = true, env = "SFDESK_LOGIN_URL")]
    pub login_url: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Account(AccountCommand),

    #[command(flatten)]
    Admin(AdminCommand),

    /// Build and run a SOQL query
    Query(QueryArgs),

    /// Full-text search (SOSL)
    Search(SearchArgs),

    /// List queryable objects
    Objects,

    /// Show the fields of an object
    Describe {
        /// Object API name, e.g. Account
        sobject: String,
        /// Write the field list to a file (.csv, .xlsx, .pdf)
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Quick-create a record
    #[command(subcommand)]
    New(NewCommand),

    /// Create, update or delete any record
    #[command(subcommand)]
    Record(RecordCommand),

    /// Upload a file to Salesforce Files
    Upload {
        path: PathBuf,
    },

    /// Create one record per CSV row
    Import {
        /// Object API name
        sobject: String,
        /// CSV file with field names in the header row
        csv: PathBuf,
    },
}

impl Cli {
    /// Environment settings with command-line overrides applied.
    pub fn config(&self) -> Result<AppConfig> {
        let home = self.home.as_ref().map(|h| h.to_string_lossy().to_string());
        let mut config = AppConfig::from_lookup(|name| match (name, &home) {
            (HOME_VAR, Some(home)) => Some(home.clone()),
            _ => std::env::var(name).ok(),
        })?;
        if let Some(store) = &self.store {
            config = config.with_store(store.parse::<StoreBackend>()?);
        }
        if let Some(version) = &self.api_version {
            config = config.with_api_version(version);
        }
        if let Some(url) = &self.login_url {
            config = config.with_login_url(url);
        }
        Ok(config)
    }
}

/// Run one command to completion.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config()?;
    match cli.command {
        Command::Account(command) => account::run(&config, command).await,
        Command::Admin(command) => {
            let client = connect(&config)?;
            guard(&config, admin_cmd::run(&client, command).await)
        }
        Command::Query(args) => {
            let client = connect(&config)?;
            guard(&config, query_cmd::run_query(&client, args).await)
        }
        Command::Search(args) => {
            let client = connect(&config)?;
            guard(&config, query_cmd::run_search(&client, args).await)
        }
        Command::Objects => {
            let client = connect(&config)?;
            guard(&config, query_cmd::run_objects(&client).await)
        }
        Command::Describe { sobject, export } => {
            let client = connect(&config)?;
            guard(
                &config,
                query_cmd::run_describe(&client, &sobject, export.as_deref()).await,
            )
        }
        Command::New(command) => {
            let client = connect(&config)?;
            guard(&config, records_cmd::run_new(&client, command).await)
        }
        Command::Record(command) => {
            let client = connect(&config)?;
            guard(&config, records_cmd::run_record(&client, command).await)
        }
        Command::Upload { path } => {
            let client = connect(&config)?;
            guard(&config, records_cmd::run_upload(&client, &path).await)
        }
        Command::Import { sobject, csv } => {
            let client = connect(&config)?;
            guard(&config, records_cmd::run_import(&client, &sobject, &csv).await)
        }
    }
}

/// Client for the current session. The key file must exist even though the
/// session itself does not need it.
fn connect(config: &AppConfig) -> Result<SalesforceRestClient> {
    config.cipher()?;
    let mut context = config.session_context()?;
    login::connect(&mut context, &config.client)
}

/// Drop the stored session when Salesforce rejected it.
fn guard(config: &AppConfig, result: Result<()>) -> anyhow::Result<()> {
    if let Err(ref err) = result {
        if err.needs_login() {
            if let Ok(mut context) = config.session_context() {
                context.clear()?;
            }
            anyhow::bail!("{err}. Run `sfdesk login` again.");
        }
    }
    result.map_err(Into::into)
}

/// Print a table, or write it to `export` when given. Without an export the
/// charts cannot be drawn anywhere, so their series are printed instead.
pub(crate) fn show(
    table: &Table,
    title: &str,
    export: Option<&Path>,
    charts: &[Chart],
) -> Result<()> {
    let mut out = io::stdout();
    match export {
        Some(path) => {
            let format = write_report(path, title, table, charts)?;
            writeln!(
                out,
                "Wrote {} rows to {} ({:?}).",
                table.len(),
                path.display(),
                format
            )
            .map_err(Error::from)
        }
        None => {
            writeln!(out, "{}", render_text(table))?;
            write_series(&mut out, charts)
        }
    }
}

fn write_series(out: &mut impl Write, charts: &[Chart]) -> Result<()> {
    for chart in charts {
        writeln!(out)?;
        writeln!(out, "{} ({})", chart.title, chart.legend_heading().to_lowercase())?;
        for entry in chart.legend() {
            writeln!(out, "  {}", entry)?;
        }
    }
    Ok(())
}
