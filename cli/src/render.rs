//! Plain-text rendering of command results

use enroll_core::domain::{Account, Announcement, QueueRecord, RolePermissions};
use enroll_core::errors::format_countdown;
use enroll_core::services::{OtpStatus, TimerSnapshot, TimerState};
use serde::Serialize;

/// Status line shown under the code prompt
pub fn countdown_line(snapshot: &TimerSnapshot) -> String {
    match snapshot.state {
        TimerState::Active => format!(
            "Code expires in {} | {} attempt{} left",
            format_countdown(snapshot.otp_seconds_remaining),
            snapshot.attempts_left,
            if snapshot.attempts_left == 1 { "" } else { "s" }
        ),
        TimerState::Expired => "Code expired. Type 'resend' for a new one.".to_string(),
        TimerState::LockedOut => format!(
            "Too many failed attempts. Try again in {}.",
            format_countdown(snapshot.lockout_seconds_remaining)
        ),
    }
}

pub fn otp_status(status: &OtpStatus) -> String {
    let mut lines = vec![format!("verified:       {}", status.is_verified)];
    if let Some(expiry) = status.otp_expiry {
        lines.push(format!("code expires:   {}", expiry.to_rfc3339()));
    }
    if let Some(attempts) = status.attempts_left {
        lines.push(format!("attempts left:  {}", attempts));
    }
    lines.push(format!("locked out:     {}", status.is_locked_out));
    if let Some(expiry) = status.lockout_expiry {
        lines.push(format!("lockout ends:   {}", expiry.to_rfc3339()));
    }
    lines.join("\n")
}

pub fn account_row(account: &Account) -> String {
    format!(
        "{:>6}  {:<32}  {:<24}  {:<10}  {}",
        account.id,
        account.email,
        account.full_name(),
        account.role.as_str(),
        if account.is_active { "active" } else { "inactive" }
    )
}

pub fn announcement_row(announcement: &Announcement) -> String {
    let when = announcement
        .published_at
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "draft".to_string());
    format!("{:>6}  {:<10}  {}", announcement.id, when, announcement.title)
}

pub fn role_row(role: &RolePermissions) -> String {
    let permissions = role
        .permissions
        .iter()
        .filter_map(|p| serde_json::to_value(p).ok())
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{:<10}  {}", role.role.as_str(), permissions)
}

pub fn queue_row(record: &QueueRecord) -> String {
    let wait = record
        .wait_minutes()
        .map(|m| format!("{}m", m))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<8}  {:<16}  {:<10}  {}  wait {}",
        record.ticket_number,
        record.service,
        format!("{:?}", record.status).to_lowercase(),
        record.created_at.format("%Y-%m-%d %H:%M"),
        wait
    )
}

/// Pretty JSON for `--json` output
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
