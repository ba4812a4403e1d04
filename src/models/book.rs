/// Book records and the payload used to create or update them.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};

/// A catalog entry as served by the backend. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
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

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Copies currently out on loan
    pub fn borrowed_copies(&self) -> i64 {
        (self.total_copies - self.available_copies).max(0)
    }

    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("General")
    }
}

/// Create/update payload for `/books`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_copies: i64,
    pub available_copies: i64,
}

impl BookDraft {
    /// Trim every text field and check the local preconditions.
    ///
    /// Returns the normalized draft; an error here means no request may be sent.
    pub fn validate(self) -> Result<BookDraft> {
        let draft = BookDraft {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            category: trimmed_optional(self.category),
            description: trimmed_optional(self.description),
            total_copies: self.total_copies,
            available_copies: self.available_copies,
        };

        if draft.title.is_empty() || draft.author.is_empty() || draft.isbn.is_empty() {
            return Err(ClientError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        if draft.total_copies < 0 || draft.available_copies < 0 {
            return Err(ClientError::Validation(
                "Copy counts cannot be negative".to_string(),
            ));
        }
        if draft.available_copies > draft.total_copies {
            return Err(ClientError::Validation(
                "Available copies cannot exceed total copies".to_string(),
            ));
        }

        Ok(draft)
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        BookDraft {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            category: book.category.clone(),
            description: book.description.clone(),
            total_copies: book.total_copies,
            available_copies: book.available_copies,
        }
    }
}

fn trimmed_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
