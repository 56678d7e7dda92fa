//! Announcements published to applicants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Payload for creating or replacing an announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub body: String,
    pub is_published: bool,
}
