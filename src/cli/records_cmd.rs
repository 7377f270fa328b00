//! Quick-create forms, generic record CRUD, upload and import.

use std::io::{self, Write};
use std::path::Path;

use clap::Subcommand;
use serde_json::Value;
use sfdesk_rest::SalesforceApi;

use crate::actions::{self, NewCase, NewContact, NewEvent, NewLead, NewOpportunity};
use crate::error::{Error, ErrorKind, Result};
use crate::outcome::ActionOutcome;

#[derive(Subcommand, Debug)]
pub enum NewCommand {
    Contact {
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        first_name: Option<String>,
        /// Mr., Ms., Dr. ...
        #[arg(long)]
        salutation: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Account to link, by name
        #[arg(long)]
        account: Option<String>,
    },

    Opportunity {
        #[arg(long)]
        name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        close_date: String,
        #[arg(long)]
        stage: String,
        #[arg(long)]
        amount: Option<f64>,
        /// Account to link, by name
        #[arg(long)]
        account: Option<String>,
    },

    Event {
        #[arg(long)]
        subject: String,
        /// Start, e.g. 2024-05-01T09:00:00Z
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Contact or Lead Id
        #[arg(long)]
        who_id: Option<String>,
        /// Related record Id
        #[arg(long)]
        what_id: Option<String>,
    },

    Case {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Account to link, by name
        #[arg(long)]
        account: Option<String>,
    },

    Lead {
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    Create {
        sobject: String,
        /// Field values as a JSON object
        #[arg(long)]
        data: String,
    },
    Update {
        sobject: String,
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        sobject: String,
        id: String,
    },
}

fn json_object(data: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(data).map_err(|e| {
        Error::with_source(ErrorKind::Validation("--data is not valid JSON".into()), e)
    })?;
    if !value.is_object() {
        return Err(Error::validation("--data must be a JSON object"));
    }
    Ok(value)
}

/// Print a successful outcome; a failed one becomes the command's error.
fn report(outcome: ActionOutcome) -> Result<()> {
    if outcome.success {
        writeln!(io::stdout(), "{outcome}")?;
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Action(outcome.message)))
    }
}

pub async fn run_new<A: SalesforceApi>(api: &A, command: NewCommand) -> Result<()> {
    let outcome = match command {
        NewCommand::Contact {
            last_name,
            first_name,
            salutation,
            email,
            phone,
            account,
        } => {
            let contact = NewContact {
                salutation,
                first_name,
                last_name,
                email,
                phone,
                account_name: account,
            };
            actions::create_contact(api, &contact).await
        }
        NewCommand::Opportunity {
            name,
            close_date,
            stage,
            amount,
            account,
        } => {
            let opp = NewOpportunity {
                name,
                account_name: account,
                close_date,
                stage_name: stage,
                amount,
            };
            actions::create_opportunity(api, &opp).await
        }
        NewCommand::Event {
            subject,
            start,
            end,
            who_id,
            what_id,
        } => {
            let event = NewEvent {
                subject,
                start,
                end,
                who_id,
                what_id,
            };
            actions::create_event(api, &event).await
        }
        NewCommand::Case {
            subject,
            status,
            origin,
            priority,
            description,
            account,
        } => {
            let case = NewCase {
                subject,
                status,
                origin,
                priority,
                description,
                account_name: account,
            };
            actions::create_case(api, &case).await
        }
        NewCommand::Lead {
            last_name,
            company,
            first_name,
            email,
            status,
        } => {
            let lead = NewLead {
                first_name,
                last_name,
                company,
                email,
                status,
            };
            actions::create_lead(api, &lead).await
        }
    };
    report(outcome)
}

pub async fn run_record<A: SalesforceApi>(api: &A, command: RecordCommand) -> Result<()> {
    let outcome = match command {
        RecordCommand::Create { sobject, data } => {
            actions::create_record(api, &sobject, &json_object(&data)?).await
        }
        RecordCommand::Update { sobject, id, data } => {
            actions::update_record(api, &sobject, &id, &json_object(&data)?).await
        }
        RecordCommand::Delete { sobject, id } => actions::delete_record(api, &sobject, &id).await,
    };
    report(outcome)
}

pub async fn run_upload<A: SalesforceApi>(api: &A, path: &Path) -> Result<()> {
    report(actions::upload_file(api, path).await?)
}

/// Every row is attempted; failed rows are listed and do not fail the command.
pub async fn run_import<A: SalesforceApi>(api: &A, sobject: &str, csv: &Path) -> Result<()> {
    let outcomes = actions::import_csv(api, sobject, csv).await?;
    let mut out = io::stdout();
    for (row, outcome) in outcomes.iter().enumerate() {
        writeln!(out, "row {}: {outcome}", row + 1)?;
    }
    let created = outcomes.iter().filter(|o| o.success).count();
    writeln!(
        out,
        "{created} created, {} failed.",
        outcomes.len() - created
    )?;
    Ok(())
}
