//! Fixed-query viewers over org administration data.
//!
//! Every viewer issues its hardcoded SOQL through [`SalesforceApi`] and
//! returns a [`Table`](sfdesk_report::Table) ready for display or export.
//! API failures abort the viewer and surface as the error message.

mod audit;
mod home;
mod jobs;
mod limits;
mod org;

pub use audit::{
    login_history, setup_audit_trail, LOGIN_HISTORY_SOQL, LOGIN_HISTORY_TITLE, SETUP_AUDIT_SOQL,
    SETUP_AUDIT_TITLE, UNKNOWN_USER,
};
pub use home::{home_metrics, HomeMetrics, ACTIVE_USERS_SOQL, HOME_LIMITS, QUEUED_JOBS_SOQL};
pub use jobs::{scheduled_jobs, SCHEDULED_JOBS_SOQL, SCHEDULED_JOBS_TITLE};
pub use limits::{api_limits, limit_rows, limits_table, LimitRow, LIMITS_TITLE};
pub use org::{
    profiles, render_role_tree, role_tree, roles, users, RoleNode, PROFILES_SOQL, ROLES_SOQL,
    USERS_SOQL,
};

use serde_json::Value;

/// String at a JSON pointer, if present and a string.
fn text_at<'a>(record: &'a Value, pointer: &str) -> Option<&'a str> {
    record.pointer(pointer).and_then(Value::as_str)
}
