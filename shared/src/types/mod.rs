//! Type definitions shared by the backend client and the CLI
//!
//! - `pagination` - Paging parameters and paged list responses
//! - `response` - Backend rejection bodies

pub mod pagination;
pub mod response;

pub use pagination::{PaginatedResponse, Pagination};
pub use response::RejectionBody;
