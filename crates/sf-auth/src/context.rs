//! The logged-in state carried between commands.
//!
//! A [`SessionContext`] holds at most one [`SalesforceSession`] plus the time
//! of last activity. It expires after [`IDLE_TIMEOUT_MINUTES`] without a
//! [`touch`](SessionContext::touch). With a backing file the state survives
//! across process runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, ErrorKind, Result};
use crate::session::SalesforceSession;

/// Minutes of inactivity after which a session is dropped.
pub const IDLE_TIMEOUT_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionState {
    session: SalesforceSession,
    last_activity: DateTime<Utc>,
}

/// Explicit holder of the current login.
#[derive(Debug)]
pub struct SessionContext {
    path: Option<PathBuf>,
    state: Option<SessionState>,
    idle_timeout: Duration,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl SessionContext {
    /// A context that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: None,
            idle_timeout: Duration::minutes(IDLE_TIMEOUT_MINUTES),
        }
    }

    /// Load the context persisted at `path`. A missing file means "logged out".
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            Some(serde_json::from_str::<SessionState>(&json)?)
        } else {
            None
        };

        Ok(Self {
            path: Some(path),
            state,
            idle_timeout: Duration::minutes(IDLE_TIMEOUT_MINUTES),
        })
    }

    /// Override the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Start a new login, replacing any previous one.
    pub fn create(&mut self, session: SalesforceSession) -> Result<()> {
        info!(username = %session.username, "Session created");
        self.state = Some(SessionState {
            session,
            last_activity: Utc::now(),
        });
        self.save()
    }

    /// The active session, if it has not idled out.
    pub fn current(&mut self) -> Result<&SalesforceSession> {
        self.current_at(Utc::now())
    }

    /// [`current`](Self::current) evaluated at a given instant.
    pub fn current_at(&mut self, now: DateTime<Utc>) -> Result<&SalesforceSession> {
        let expired = match &self.state {
            None => {
                return Err(Error::new(ErrorKind::SessionExpired(
                    "not logged in".to_string(),
                )))
            }
            Some(state) => now - state.last_activity > self.idle_timeout,
        };

        if expired {
            debug!("Session idled out");
            self.clear()?;
            return Err(Error::new(ErrorKind::SessionExpired(format!(
                "no activity for {IDLE_TIMEOUT_MINUTES} minutes, log in again"
            ))));
        }

        match &self.state {
            Some(state) => Ok(&state.session),
            None => Err(Error::new(ErrorKind::SessionExpired(
                "not logged in".to_string(),
            ))),
        }
    }

    /// Record activity, pushing the idle deadline forward.
    pub fn touch(&mut self) -> Result<()> {
        if let Some(ref mut state) = self.state {
            state.last_activity = Utc::now();
        }
        self.save()
    }

    /// Log out: forget the session and delete the backing file.
    pub fn clear(&mut self) -> Result<()> {
        self.state = None;
        if let Some(ref path) = self.path {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Username of the stored session, expired or not.
    pub fn username(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.session.username.as_str())
    }

    /// Time left before the session idles out at `now`.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        let state = self.state.as_ref()?;
        let left = state.last_activity + self.idle_timeout - now;
        (left > Duration::zero()).then_some(left)
    }

    /// Time left before the session idles out.
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Utc::now())
    }

    fn save(&self) -> Result<()> {
        let (Some(path), Some(state)) = (&self.path, &self.state) else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }
}
