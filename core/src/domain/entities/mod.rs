//! Domain entities representing the records the client handles.

pub mod access;
pub mod account;
pub mod announcement;
pub mod queue;
pub mod system_log;
pub mod verification_session;

// Re-export commonly used types
pub use access::{Permission, RolePermissions};
pub use account::{Account, AccountUpdate, NewAccount, Role};
pub use announcement::{Announcement, NewAnnouncement};
pub use queue::{QueueHistoryQuery, QueueRecord, QueueStatus};
pub use system_log::SystemLogEntry;
pub use verification_session::{
    OtpPurpose, VerificationSession, MAX_ATTEMPTS, SESSION_KEY_PREFIX,
};
