/// Borrow records and the receipt returned when borrowing.

use super::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loan status. The backend uses both `"borrowed"` and `"active"` for the
/// same state; anything unrecognized falls into `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    #[serde(alias = "borrowed")]
    Active,
    Returned,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub id: i64,
    pub book_id: i64,
    #[serde(default)]
    pub book_title: Option<String>,
    #[serde(default)]
    pub book_author: Option<String>,
    #[serde(default)]
    pub borrow_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub return_date: Option<String>,
    pub status: BorrowStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Borrower, present in admin listings
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

impl BorrowRecord {
    pub fn is_active(&self) -> bool {
        self.status == BorrowStatus::Active
    }

    pub fn is_returned(&self) -> bool {
        self.status == BorrowStatus::Returned
    }

    pub fn borrowed_at(&self) -> Option<DateTime<Utc>> {
        first_timestamp(&[&self.borrow_date, &self.created_at])
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        first_timestamp(&[&self.due_date])
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        first_timestamp(&[&self.return_date, &self.updated_at])
    }

    /// Late return: returned strictly after the due date. Independent of the
    /// current time; false when either date is unusable.
    pub fn was_overdue(&self) -> bool {
        match (parse_opt(&self.return_date), self.due_at()) {
            (Some(returned), Some(due)) => returned > due,
            _ => false,
        }
    }

    pub fn title_or_placeholder(&self) -> String {
        match self.book_title.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(title) => title.to_string(),
            None => format!("Book ID: {}", self.book_id),
        }
    }

    pub fn borrower(&self) -> Option<&str> {
        self.user_name
            .as_deref()
            .or(self.user_email.as_deref())
            .filter(|b| !b.trim().is_empty())
    }
}

fn parse_opt(value: &Option<String>) -> Option<DateTime<Utc>> {
    value.as_deref().and_then(parse_timestamp)
}

fn first_timestamp(candidates: &[&Option<String>]) -> Option<DateTime<Utc>> {
    candidates.iter().find_map(|value| parse_opt(value))
}

/// What the backend confirmed after a successful borrow
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowReceipt {
    pub book_id: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl BorrowReceipt {
    /// Read a borrow response. The record may be the body itself or nested
    /// under `borrowRecord`, and the due date may be spelled three ways.
    pub fn from_response(book_id: i64, body: &serde_json::Value) -> Self {
        let record = body.get("borrowRecord").unwrap_or(body);
        let due_date = ["due_date", "dueDate", "due"]
            .iter()
            .find_map(|key| record.get(*key).and_then(|v| v.as_str()))
            .and_then(parse_timestamp);
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);

        BorrowReceipt {
            book_id,
            due_date,
            message,
        }
    }
}
