//! Admin console
//!
//! Book management, user listing and dashboard statistics. Every operation
//! checks for an admin session before doing anything else.

use crate::actions::{Confirm, Mutation, Resync};
use crate::api::ServerApi;
use crate::catalog::{Capability, CatalogController, CatalogView};
use crate::error::{ClientError, Result};
use crate::ledger;
use crate::models::{AdminUser, Book, BookDraft, BorrowRecord};
use crate::session::SessionStore;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Dashboard counters. A statistic whose source failed to load is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminStats {
    pub total_books: usize,
    pub total_users: usize,
    /// Sum of `total_copies - available_copies`
    pub borrowed_copies: i64,
    /// Sum of `available_copies`
    pub available_copies: i64,
    pub overdue: usize,
}

impl AdminStats {
    pub fn compute(
        books: Option<&[Book]>,
        users: Option<&[AdminUser]>,
        borrows: Option<&[BorrowRecord]>,
        now: DateTime<Utc>,
    ) -> Self {
        let books = books.unwrap_or_default();
        AdminStats {
            total_books: books.len(),
            total_users: users.map(<[AdminUser]>::len).unwrap_or(0),
            borrowed_copies: books.iter().map(Book::borrowed_copies).sum(),
            available_copies: books.iter().map(|b| b.available_copies).sum(),
            overdue: borrows
                .map(|records| {
                    records
                        .iter()
                        .filter(|r| ledger::is_overdue(r, now))
                        .count()
                })
                .unwrap_or(0),
        }
    }
}

pub struct AdminConsole {
    api: Arc<ServerApi>,
    session: Arc<SessionStore>,
    catalog: CatalogController,
}

impl AdminConsole {
    pub fn new(api: Arc<ServerApi>, session: Arc<SessionStore>) -> Self {
        let catalog = CatalogController::new(api.clone(), session.clone(), Capability::Admin);
        AdminConsole {
            api,
            session,
            catalog,
        }
    }

    fn require_admin(&self) -> Result<()> {
        let user = self.session.user().ok_or(ClientError::Unauthenticated)?;
        if !user.is_admin() {
            log::warn!("Admin operation refused for {}", user.email);
            return Err(ClientError::Forbidden(format!(
                "{} is not an administrator",
                user.email
            )));
        }
        Ok(())
    }

    /// Listing with ISBN search enabled
    pub async fn list_books(&self, term: &str) -> Result<CatalogView> {
        self.require_admin()?;
        self.catalog.list_books(term, "").await
    }

    /// Current record, used to pre-fill an edit
    pub async fn book(&self, book_id: i64) -> Result<Book> {
        self.require_admin()?;
        self.api.get_book(book_id).await
    }

    pub async fn create_book(&self, draft: BookDraft) -> Result<Mutation<Value>> {
        self.require_admin()?;
        let draft = draft.validate()?;

        let body = self.api.create_book(&draft).await?;
        log::info!("Created book \"{}\"", draft.title);
        Ok(Mutation::Done {
            value: body,
            resync: Resync::CatalogAndStats,
        })
    }

    pub async fn update_book(&self, book_id: i64, draft: BookDraft) -> Result<Mutation<Value>> {
        self.require_admin()?;
        let draft = draft.validate()?;

        let body = self.api.update_book(book_id, &draft).await?;
        log::info!("Updated book {}", book_id);
        Ok(Mutation::Done {
            value: body,
            resync: Resync::CatalogAndStats,
        })
    }

    pub async fn delete_book(&self, book_id: i64, confirm: &dyn Confirm) -> Result<Mutation<Value>> {
        self.require_admin()?;
        if !confirm.confirm("Are you sure you want to delete this book?").await {
            return Ok(Mutation::Cancelled);
        }

        let body = self.api.delete_book(book_id).await?;
        log::info!("Deleted book {}", book_id);
        Ok(Mutation::Done {
            value: body,
            resync: Resync::CatalogAndStats,
        })
    }

    pub async fn users(&self) -> Result<Vec<AdminUser>> {
        self.require_admin()?;
        self.api.list_users().await
    }

    /// Fetch books, borrows and users concurrently and derive the counters
    pub async fn stats(&self) -> Result<AdminStats> {
        self.require_admin()?;

        let (books, borrows, users) = futures::join!(
            self.api.list_books(),
            self.api.all_borrows(),
            self.api.list_users()
        );

        let books = ok_or_log("books", books);
        let borrows = ok_or_log("borrows", borrows);
        let users = ok_or_log("users", users);

        Ok(AdminStats::compute(
            books.as_deref(),
            users.as_deref(),
            borrows.as_deref(),
            Utc::now(),
        ))
    }
}

fn ok_or_log<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("Failed to load {} for statistics: {}", what, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::AssumeYes;
    use crate::models::{Role, UserProfile};
    use chrono::TimeZone;

    fn book(id: i64, total: i64, available: i64) -> Book {
        Book {
            id,
            title: format!("Book {}", id),
            author: "Author".to_string(),
            isbn: format!("isbn-{}", id),
            category: None,
            description: None,
            total_copies: total,
            available_copies: available,
        }
    }

    fn console(role: Option<Role>) -> AdminConsole {
        let session = Arc::new(SessionStore::in_memory().unwrap());
        if let Some(role) = role {
            let profile = UserProfile::new("staff@library.test", None, role, None);
            session.set_session("token", profile).unwrap();
        }
        let api = Arc::new(ServerApi::new("http://127.0.0.1:9", session.clone()).unwrap());
        AdminConsole::new(api, session)
    }

    fn draft(total: i64, available: i64) -> BookDraft {
        BookDraft {
            title: "Title".to_string(),
            author: "Author".to_string(),
            isbn: "123".to_string(),
            category: None,
            description: None,
            total_copies: total,
            available_copies: available,
        }
    }

    #[test]
    fn test_stats_from_all_sources() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let books = vec![book(1, 3, 1), book(2, 2, 2)];
        let users: Vec<AdminUser> = serde_json::from_value(serde_json::json!([
            {"id": 1, "email": "a@x.io", "role": "admin"},
            {"id": 2, "email": "b@x.io"}
        ]))
        .unwrap();
        let borrows: Vec<BorrowRecord> = serde_json::from_value(serde_json::json!([
            {"id": 1, "book_id": 1, "status": "borrowed", "due_date": "2026-10-01"},
            {"id": 2, "book_id": 1, "status": "active", "due_date": "2026-11-01"},
            {"id": 3, "book_id": 2, "status": "returned", "due_date": "2026-09-01"}
        ]))
        .unwrap();

        let stats = AdminStats::compute(
            Some(books.as_slice()),
            Some(users.as_slice()),
            Some(borrows.as_slice()),
            now,
        );
        assert_eq!(
            stats,
            AdminStats {
                total_books: 2,
                total_users: 2,
                borrowed_copies: 2,
                available_copies: 3,
                overdue: 1,
            }
        );
    }

    #[test]
    fn test_failed_source_zeroes_only_its_stats() {
        let books = vec![book(1, 4, 1)];
        let stats = AdminStats::compute(Some(books.as_slice()), None, None, Utc::now());
        assert_eq!(stats.total_books, 1);
        assert_eq!(stats.borrowed_copies, 3);
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.overdue, 0);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let admin = console(None);
        assert!(matches!(admin.users().await, Err(ClientError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_member_is_forbidden() {
        let admin = console(Some(Role::User));
        assert!(matches!(admin.stats().await, Err(ClientError::Forbidden(_))));
        assert!(matches!(
            admin.delete_book(1, &AssumeYes).await,
            Err(ClientError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected_before_sending() {
        // The backend is unreachable, so anything but Validation means a request went out
        let admin = console(Some(Role::Admin));
        let result = admin.update_book(1, draft(1, 2)).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        let admin = console(Some(Role::Admin));
        let decline = |_: &str| false;
        let outcome = admin.delete_book(1, &decline).await.unwrap();
        assert!(outcome.is_cancelled());
    }

    #[tokio::test]
    async fn test_stats_degrade_when_backend_unreachable() {
        let admin = console(Some(Role::Admin));
        assert_eq!(admin.stats().await.unwrap(), AdminStats::default());
    }
}
