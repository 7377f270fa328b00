//! User-facing result of a record action.

use serde::Serialize;

/// What happened when a record was created, updated or deleted.
///
/// Failures are carried here rather than returned as errors so a batch
/// (CSV import) can report every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub id: Option<String>,
    pub message: String,
}

impl ActionOutcome {
    pub fn ok(id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            id,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.id, self.success) {
            (Some(id), true) => write!(f, "{} (Id: {})", self.message, id),
            (_, true) => f.write_str(&self.message),
            (_, false) => write!(f, "Error: {}", self.message),
        }
    }
}
