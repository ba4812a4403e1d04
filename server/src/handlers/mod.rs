/// HTTP handlers module
/// Provides the REST endpoints for accounts, books and borrows

pub mod accounts;
pub mod books;
pub mod borrows;

pub use accounts::{list_users, login, register, test_db};
pub use books::{create_book, delete_book, get_book, list_books, update_book};
pub use borrows::{all_borrows, borrow_book, my_borrows, return_borrow};

/// Server-wide settings shared with handlers
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Loan period applied to new borrows
    pub loan_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { loan_days: 14 }
    }
}
