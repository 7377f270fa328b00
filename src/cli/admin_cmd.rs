use std::io::{self, Write};
use std::path::PathBuf;

use clap::Subcommand;
use sfdesk_report::{render_text, Chart};
use sfdesk_rest::SalesforceRestClient;

use super::show;
use crate::admin;
use crate::error::Result;
use crate::hierarchy;

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Active users, queued jobs and key limits
    Home,

    /// Scheduled (cron) jobs
    Jobs {
        /// Write the report to a file (.csv, .xlsx, .pdf, .pptx)
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Setup audit trail, latest 100 changes
    Audit {
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Login history, latest 100 logins
    Logins {
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// API and resource limits
    Limits {
        /// Only limits whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Users with profile, role and status
    Users {
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Profiles and their licenses
    Profiles {
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Role hierarchy
    Roles {
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Parent chain of a record through ParentId
    Hierarchy {
        /// Object API name, e.g. Account
        sobject: String,
        /// Record Id; without it the first 100 records are listed
        #[arg(long)]
        id: Option<String>,
    },
}

pub async fn run(client: &SalesforceRestClient, command: AdminCommand) -> Result<()> {
    let mut out = io::stdout();
    match command {
        AdminCommand::Home => {
            let metrics = admin::home_metrics(client).await?;
            write!(out, "{metrics}")?;
        }
        AdminCommand::Jobs { export } => {
            let table = admin::scheduled_jobs(client).await?;
            let charts: Vec<Chart> = Chart::count_bar(&table, "State").into_iter().collect();
            show(&table, admin::SCHEDULED_JOBS_TITLE, export.as_deref(), &charts)?;
        }
        AdminCommand::Audit { export } => {
            let table = admin::setup_audit_trail(client).await?;
            show(&table, admin::SETUP_AUDIT_TITLE, export.as_deref(), &[])?;
        }
        AdminCommand::Logins { export } => {
            let table = admin::login_history(client).await?;
            let charts: Vec<Chart> = Chart::count_bar(&table, "Status").into_iter().collect();
            show(&table, admin::LOGIN_HISTORY_TITLE, export.as_deref(), &charts)?;
        }
        AdminCommand::Limits { filter, export } => {
            let table = admin::api_limits(client, filter.as_deref()).await?;
            show(&table, admin::LIMITS_TITLE, export.as_deref(), &[])?;
        }
        AdminCommand::Users { export } => {
            let table = admin::users(client).await?;
            show(&table, "Users Report", export.as_deref(), &[])?;
        }
        AdminCommand::Profiles { export } => {
            let table = admin::profiles(client).await?;
            show(&table, "Profiles Report", export.as_deref(), &[])?;
        }
        AdminCommand::Roles { export } => {
            let (tree, table) = admin::roles(client).await?;
            match export {
                Some(path) => show(&table, "Role Hierarchy", Some(&path), &[])?,
                None if tree.is_empty() => writeln!(out, "{}", render_text(&table))?,
                None => write!(out, "{}", admin::render_role_tree(&tree))?,
            }
        }
        AdminCommand::Hierarchy { sobject, id } => match id {
            Some(id) => {
                let chain = hierarchy::record_hierarchy(client, &sobject, &id).await?;
                writeln!(out, "{}", hierarchy::render_hierarchy(&chain))?;
            }
            None => {
                let table = hierarchy::list_records(client, &sobject).await?;
                writeln!(out, "{}", render_text(&table))?;
            }
        },
    }
    Ok(())
}
