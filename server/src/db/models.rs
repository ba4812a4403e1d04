/// Data models for database operations.
/// Represents users, books and borrow records, plus request DTOs.
use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

pub const STATUS_BORROWED: &str = "borrowed";
pub const STATUS_RETURNED: &str = "returned";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub total_copies: i64,
    pub available_copies: i64,
}

/// Borrow row joined with its book and borrower
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BorrowRecord {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub book_title: Option<String>,
    pub book_author: Option<String>,
    pub borrow_date: String,
    pub due_date: String,
    pub return_date: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

// Request/Response DTOs
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Create/update body for `/books`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub total_copies: i64,
    #[serde(default)]
    pub available_copies: i64,
}

impl BookPayload {
    /// Reason the payload cannot be stored, if any
    pub fn problem(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() || self.author.trim().is_empty() || self.isbn.trim().is_empty() {
            Some("Title, author and ISBN are required")
        } else if self.total_copies < 0 || self.available_copies < 0 {
            Some("Copy counts cannot be negative")
        } else if self.available_copies > self.total_copies {
            Some("Available copies cannot exceed total copies")
        } else {
            None
        }
    }
}
