/// Data models for the iBooks client.
/// Domain records plus the request/response shapes of the REST backend.

pub mod book;
pub mod borrow;
pub mod user;

pub use book::{Book, BookDraft};
pub use borrow::{BorrowReceipt, BorrowRecord, BorrowStatus};
pub use user::{Role, UserId, UserProfile};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parse a backend timestamp.
///
/// Accepts RFC 3339, SQL-style `YYYY-MM-DD HH:MM:SS`, the same with a `T`
/// separator and no offset, and bare dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Login request for the backend
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response from the backend. `token` is checked by the caller.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "userId", default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Account creation request
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Row of `/admin/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Body of `/test-db`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
