//! Dashboard counters.

use serde::Serialize;
use sfdesk_rest::SalesforceApi;
use tracing::instrument;

use super::limits::{limit_rows, LimitRow};
use crate::error::Result;

pub const ACTIVE_USERS_SOQL: &str = "SELECT COUNT() FROM User WHERE IsActive = true";
pub const QUEUED_JOBS_SOQL: &str = "SELECT COUNT() FROM AsyncApexJob WHERE Status = 'Queued'";

/// Limits shown on the home screen, in display order.
pub const HOME_LIMITS: &[&str] = &[
    "DailyApiRequests",
    "DataStorageMB",
    "FileStorageMB",
    "DailyWorkflowEmails",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeMetrics {
    pub active_users: u64,
    pub queued_jobs: u64,
    /// Entries of [`HOME_LIMITS`] present in the org; absent ones are omitted.
    pub limits: Vec<LimitRow>,
}

#[instrument(skip(api))]
pub async fn home_metrics<A: SalesforceApi>(api: &A) -> Result<HomeMetrics> {
    let active_users = api.count(ACTIVE_USERS_SOQL).await?;
    let queued_jobs = api.count(QUEUED_JOBS_SOQL).await?;
    let all = limit_rows(&api.limits().await?, None);

    let limits = HOME_LIMITS
        .iter()
        .filter_map(|name| all.iter().find(|row| row.name == *name).cloned())
        .collect();

    Ok(HomeMetrics {
        active_users,
        queued_jobs,
        limits,
    })
}

impl std::fmt::Display for HomeMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Active users:  {}", self.active_users)?;
        writeln!(f, "Queued jobs:   {}", self.queued_jobs)?;
        for row in &self.limits {
            writeln!(f, "{}: {} / {} remaining", row.name, row.remaining, row.max)?;
        }
        Ok(())
    }
}
