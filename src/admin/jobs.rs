use sfdesk_report::Table;
use sfdesk_rest::SalesforceApi;
use tracing::instrument;

use crate::error::Result;

pub const SCHEDULED_JOBS_SOQL: &str =
    "SELECT Id, CronJobDetail.Name, State, NextFireTime, CreatedBy.Name FROM CronTrigger";

pub const SCHEDULED_JOBS_TITLE: &str = "Scheduled Jobs Report";

const COLUMNS: &[(&str, &str)] = &[
    ("CronJobDetail.Name", "Job Name"),
    ("State", "State"),
    ("NextFireTime", "Next Fire Time"),
    ("CreatedBy.Name", "Created By"),
];

/// Scheduled Apex and other cron triggers.
#[instrument(skip(api))]
pub async fn scheduled_jobs<A: SalesforceApi>(api: &A) -> Result<Table> {
    let records = api.query(SCHEDULED_JOBS_SOQL).await?;
    Ok(Table::from_records(&records).project(COLUMNS))
}
