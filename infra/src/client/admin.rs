//! Administrative endpoints

use tracing::{debug, info};

use enroll_core::domain::{
    Account, AccountUpdate, Announcement, NewAccount, NewAnnouncement, QueueHistoryQuery,
    QueueRecord, RolePermissions, SystemLogEntry,
};
use enroll_core::errors::ApiError;
use enroll_shared::types::{PaginatedResponse, Pagination};

use super::backend::BackendClient;

const ACCOUNTS_PATH: &str = "/api/accounts";
const ANNOUNCEMENTS_PATH: &str = "/api/announcements";
const ACCESS_CONTROL_PATH: &str = "/api/access-control";
const QUEUE_HISTORY_PATH: &str = "/api/queue/history";
const QUEUE_EXPORT_PATH: &str = "/api/queue/history/export";
const SYSTEM_LOGS_PATH: &str = "/api/system-logs";

impl BackendClient {
    // ---- accounts ----

    pub async fn list_accounts(
        &self,
        pagination: Pagination,
    ) -> Result<PaginatedResponse<Account>, ApiError> {
        debug!(page = pagination.page, per_page = pagination.per_page, "GET accounts");
        let request = self.get(self.url(ACCOUNTS_PATH)).query(&pagination);
        self.send_json(request).await
    }

    pub async fn get_account(&self, id: i64) -> Result<Account, ApiError> {
        let url = self.url_with_segment(ACCOUNTS_PATH, &id.to_string())?;
        self.send_json(self.get(url)).await
    }

    pub async fn create_account(&self, account: &NewAccount) -> Result<Account, ApiError> {
        let request = self.post(self.url(ACCOUNTS_PATH)).json(account);
        let created: Account = self.send_json(request).await?;
        info!(account_id = created.id, role = %created.role, "Account created");
        Ok(created)
    }

    pub async fn update_account(
        &self,
        id: i64,
        update: &AccountUpdate,
    ) -> Result<Account, ApiError> {
        let url = self.url_with_segment(ACCOUNTS_PATH, &id.to_string())?;
        self.send_json(self.put(url).json(update)).await
    }

    pub async fn delete_account(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url_with_segment(ACCOUNTS_PATH, &id.to_string())?;
        self.send_unit(self.delete(url)).await?;
        info!(account_id = id, "Account deleted");
        Ok(())
    }

    // ---- announcements ----

    pub async fn list_announcements(&self) -> Result<Vec<Announcement>, ApiError> {
        self.send_json(self.get(self.url(ANNOUNCEMENTS_PATH))).await
    }

    pub async fn publish_announcement(
        &self,
        announcement: &NewAnnouncement,
    ) -> Result<Announcement, ApiError> {
        let request = self.post(self.url(ANNOUNCEMENTS_PATH)).json(announcement);
        let created: Announcement = self.send_json(request).await?;
        info!(announcement_id = created.id, "Announcement created");
        Ok(created)
    }

    pub async fn update_announcement(
        &self,
        id: i64,
        announcement: &NewAnnouncement,
    ) -> Result<Announcement, ApiError> {
        let url = self.url_with_segment(ANNOUNCEMENTS_PATH, &id.to_string())?;
        self.send_json(self.put(url).json(announcement)).await
    }

    pub async fn delete_announcement(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url_with_segment(ANNOUNCEMENTS_PATH, &id.to_string())?;
        self.send_unit(self.delete(url)).await
    }

    // ---- access control ----

    pub async fn access_control(&self) -> Result<Vec<RolePermissions>, ApiError> {
        self.send_json(self.get(self.url(ACCESS_CONTROL_PATH))).await
    }

    /// Replace the permission set of one role
    pub async fn update_role_permissions(
        &self,
        permissions: &RolePermissions,
    ) -> Result<RolePermissions, ApiError> {
        let url = self.url_with_segment(ACCESS_CONTROL_PATH, permissions.role.as_str())?;
        let updated: RolePermissions = self.send_json(self.put(url).json(permissions)).await?;
        info!(role = %updated.role, count = updated.permissions.len(), "Role permissions updated");
        Ok(updated)
    }

    // ---- queue ----

    pub async fn queue_history(
        &self,
        query: &QueueHistoryQuery,
    ) -> Result<PaginatedResponse<QueueRecord>, ApiError> {
        let request = self.get(self.url(QUEUE_HISTORY_PATH)).query(query);
        self.send_json(request).await
    }

    /// Queue history as CSV bytes, exactly as the backend renders it
    pub async fn export_queue_history(&self, query: &QueueHistoryQuery) -> Result<Vec<u8>, ApiError> {
        let request = self.get(self.url(QUEUE_EXPORT_PATH)).query(query);
        let bytes = self.send_bytes(request).await?;
        debug!(bytes = bytes.len(), "Queue history exported");
        Ok(bytes)
    }

    // ---- system logs ----

    pub async fn record_system_log(&self, entry: &SystemLogEntry) -> Result<(), ApiError> {
        self.send_unit(self.post(self.url(SYSTEM_LOGS_PATH)).json(entry))
            .await
    }
}
