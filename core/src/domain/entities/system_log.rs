//! Entries appended to the backend's system log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemLogEntry {
    /// What happened (e.g. `otp_verified`)
    pub action: String,
    /// Who did it, usually an email address
    pub actor: String,
    #[serde(default)]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SystemLogEntry {
    pub fn new(action: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            actor: actor.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
