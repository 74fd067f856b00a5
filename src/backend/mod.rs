//! The external directory / announcements backend, seen through its HTTP
//! contract. Everything stateful lives there; the console only relays.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    domain::*,
    error::Result,
};

pub mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod fake;

pub use http::HttpBackend;

/// Result of a successful credential check.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Every call except `login` and `health_check` carries the caller's
/// session token. A 401 from any of them surfaces as
/// [`AppError::SessionExpired`](crate::error::AppError::SessionExpired).
#[async_trait]
pub trait Backend: Send + Sync {
    async fn health_check(&self) -> Result<()>;
    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome>;
    async fn logout(&self, token: &str) -> Result<()>;

    async fn list_announcements(&self, token: &str, query: &AnnouncementQuery) -> Result<Vec<Announcement>>;
    /// Some backend versions echo the created announcement, others only
    /// confirm with a message.
    async fn create_announcement(&self, token: &str, draft: &NewAnnouncement) -> Result<Option<Announcement>>;
    async fn acknowledge(&self, token: &str, id: Uuid) -> Result<()>;
    async fn set_archived(&self, token: &str, id: Uuid, archived: bool) -> Result<Announcement>;
    async fn announcement_logs(&self, token: &str, id: Uuid) -> Result<AcknowledgementLog>;

    async fn list_employees(&self, token: &str, query: &EmployeeQuery) -> Result<Vec<EmployeeSummary>>;
    async fn get_employee(&self, token: &str, username: &str) -> Result<EmployeeProfile>;
    async fn update_employee(&self, token: &str, username: &str, update: &EmployeeUpdate) -> Result<()>;
    async fn list_departments(&self, token: &str) -> Result<Vec<String>>;
}
