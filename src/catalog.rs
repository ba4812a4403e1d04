//! Book catalog
//!
//! Listing is always a fresh `/books` fetch filtered on the client. Borrowing
//! checks the rendered snapshot, asks for confirmation, and then tells the
//! caller to reload the catalog rather than decrementing anything locally.

use crate::actions::{Confirm, Mutation, Resync};
use crate::api::ServerApi;
use crate::error::{ClientError, Result};
use crate::models::{Book, BorrowReceipt};
use crate::session::SessionStore;
use std::sync::Arc;

/// Shown in place of the list when `/books` cannot be loaded
pub const LOAD_FAILURE: &str = "Error loading books. Please try again later.";

/// Who is looking at the catalog; admins can also search by ISBN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Member,
    Admin,
}

/// Filter a snapshot. Case-insensitive substring match of the trimmed term
/// over title, author and category (and ISBN for admins), AND'ed with an
/// exact category match when one is given. Order is preserved.
pub fn filter_books(books: &[Book], term: &str, category: &str, capability: Capability) -> Vec<Book> {
    let term = term.trim().to_lowercase();
    let category = category.trim();

    books
        .iter()
        .filter(|book| term.is_empty() || matches_term(book, &term, capability))
        .filter(|book| category.is_empty() || book.category.as_deref() == Some(category))
        .cloned()
        .collect()
}

fn matches_term(book: &Book, term: &str, capability: Capability) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(term);

    contains(book.title.as_str())
        || contains(book.author.as_str())
        || book.category.as_deref().map(contains).unwrap_or(false)
        || (capability == Capability::Admin && contains(book.isbn.as_str()))
}

/// What a book card offers the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowAffordance {
    Borrow,
    NotAvailable,
    LoginToBorrow,
}

/// A rendered listing; also the snapshot borrowing is checked against
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogView {
    pub books: Vec<Book>,
    /// Size of the unfiltered listing
    pub total: usize,
    pub term: String,
    pub category: String,
    pub signed_in: bool,
}

impl CatalogView {
    pub fn find(&self, book_id: i64) -> Option<&Book> {
        self.books.iter().find(|b| b.id == book_id)
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn affordance(&self, book: &Book) -> BorrowAffordance {
        if !self.signed_in {
            BorrowAffordance::LoginToBorrow
        } else if book.is_available() {
            BorrowAffordance::Borrow
        } else {
            BorrowAffordance::NotAvailable
        }
    }
}

pub struct CatalogController {
    api: Arc<ServerApi>,
    session: Arc<SessionStore>,
    capability: Capability,
}

impl CatalogController {
    pub fn new(api: Arc<ServerApi>, session: Arc<SessionStore>, capability: Capability) -> Self {
        CatalogController {
            api,
            session,
            capability,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Fetch `/books` and filter it
    pub async fn list_books(&self, term: &str, category: &str) -> Result<CatalogView> {
        let books = self.api.list_books().await.map_err(|e| {
            log::error!("Failed to load books: {}", e);
            e
        })?;
        let filtered = filter_books(&books, term, category, self.capability);
        log::debug!("Catalog: {} of {} books match", filtered.len(), books.len());

        Ok(CatalogView {
            books: filtered,
            total: books.len(),
            term: term.trim().to_string(),
            category: category.trim().to_string(),
            signed_in: self.session.token().is_some(),
        })
    }

    /// Borrow a book shown in `snapshot`.
    ///
    /// Availability is judged from the snapshot only; the backend remains the
    /// final arbiter and a lost race comes back as a client error.
    pub async fn borrow(
        &self,
        book_id: i64,
        snapshot: &CatalogView,
        confirm: &dyn Confirm,
    ) -> Result<Mutation<BorrowReceipt>> {
        if self.session.token().is_none() {
            return Err(ClientError::Unauthenticated);
        }

        let book = snapshot.find(book_id).ok_or_else(|| {
            ClientError::Validation(format!("Book {} is not in the current listing", book_id))
        })?;
        if !book.is_available() {
            return Err(ClientError::Validation("No copies available".to_string()));
        }

        let prompt = format!("Are you sure you want to borrow \"{}\"?", book.title);
        if !confirm.confirm(&prompt).await {
            return Ok(Mutation::Cancelled);
        }

        let receipt = self.api.borrow_book(book_id).await?;
        log::info!("Borrowed book {}", book_id);
        Ok(Mutation::Done {
            value: receipt,
            resync: Resync::Catalog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::AssumeYes;

    fn book(id: i64, title: &str, author: &str, isbn: &str, category: Option<&str>) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            category: category.map(str::to_string),
            description: None,
            total_copies: 2,
            available_copies: if id == 3 { 0 } else { 1 },
        }
    }

    fn shelf() -> Vec<Book> {
        vec![
            book(1, "Half of a Yellow Sun", "Chimamanda Ngozi Adichie", "9780007200283", Some("African Literature")),
            book(2, "Dune", "Frank Herbert", "9780441013593", Some("Science Fiction")),
            book(3, "The Famished Road", "Ben Okri", "9780099437819", Some("African Literature")),
            book(4, "Untitled", "Anonymous", "0000", None),
        ]
    }

    #[test]
    fn test_empty_filter_returns_everything() {
        let books = shelf();
        assert_eq!(filter_books(&books, "", "", Capability::Member), books);
    }

    #[test]
    fn test_term_is_case_insensitive_over_fields() {
        let books = shelf();
        let ids = |found: Vec<Book>| found.iter().map(|b| b.id).collect::<Vec<_>>();

        assert_eq!(ids(filter_books(&books, "  DUNE ", "", Capability::Member)), vec![2]);
        assert_eq!(ids(filter_books(&books, "okri", "", Capability::Member)), vec![3]);
        assert_eq!(ids(filter_books(&books, "african", "", Capability::Member)), vec![1, 3]);
    }

    #[test]
    fn test_isbn_only_for_admin() {
        let books = shelf();
        assert!(filter_books(&books, "9780441", "", Capability::Member).is_empty());
        assert_eq!(filter_books(&books, "9780441", "", Capability::Admin).len(), 1);
    }

    #[test]
    fn test_category_is_exact_and_anded() {
        let books = shelf();
        let found = filter_books(&books, "road", "African Literature", Capability::Member);
        assert_eq!(found.len(), 1);
        assert!(filter_books(&books, "", "african literature", Capability::Member).is_empty());
        assert!(filter_books(&books, "dune", "African Literature", Capability::Member).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent_subset() {
        let books = shelf();
        let first = filter_books(&books, "a", "", Capability::Member);
        let second = filter_books(&books, "a", "", Capability::Member);
        assert_eq!(first, second);
        assert!(first.iter().all(|b| books.contains(b)));
    }

    #[test]
    fn test_affordances() {
        let books = shelf();
        let mut view = CatalogView {
            books: books.clone(),
            total: books.len(),
            term: String::new(),
            category: String::new(),
            signed_in: false,
        };
        assert_eq!(view.affordance(&books[0]), BorrowAffordance::LoginToBorrow);
        view.signed_in = true;
        assert_eq!(view.affordance(&books[0]), BorrowAffordance::Borrow);
        assert_eq!(view.affordance(&books[2]), BorrowAffordance::NotAvailable);
    }

    #[tokio::test]
    async fn test_borrow_without_session() {
        let session = Arc::new(SessionStore::in_memory().unwrap());
        let api = Arc::new(ServerApi::new("http://127.0.0.1:9", session.clone()).unwrap());
        let catalog = CatalogController::new(api, session, Capability::Member);
        let view = CatalogView {
            books: shelf(),
            total: 4,
            term: String::new(),
            category: String::new(),
            signed_in: false,
        };

        let result = catalog.borrow(1, &view, &AssumeYes).await;
        assert!(matches!(result, Err(ClientError::Unauthenticated)));
    }
}
