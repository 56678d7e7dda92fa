//! Service-queue history records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Where a ticket is in the service queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Waiting,
    Serving,
    Completed,
    Skipped,
    Cancelled,
}

impl std::str::FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "waiting" => Ok(QueueStatus::Waiting),
            "serving" => Ok(QueueStatus::Serving),
            "completed" | "done" => Ok(QueueStatus::Completed),
            "skipped" => Ok(QueueStatus::Skipped),
            "cancelled" | "canceled" => Ok(QueueStatus::Cancelled),
            _ => Err(format!("Invalid queue status: {}", s)),
        }
    }
}

/// One served (or abandoned) ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub id: i64,
    pub ticket_number: String,
    pub service: String,
    pub status: QueueStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub served_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl QueueRecord {
    /// Minutes between ticket creation and start of service
    pub fn wait_minutes(&self) -> Option<i64> {
        self.served_at.map(|served| (served - self.created_at).num_minutes())
    }
}

/// Query parameters for the history endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueHistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QueueStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl QueueHistoryQuery {
    /// Rejects a range whose end precedes its start
    pub fn validate(&self) -> Result<(), String> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if to < from => {
                Err(format!("Date range is inverted: {} is after {}", from, to))
            }
            _ => Ok(()),
        }
    }
}
