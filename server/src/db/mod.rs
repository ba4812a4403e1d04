/// Database layer for persistent storage.
/// Handles all database operations for users, sessions, books and borrows.

pub mod init;
pub mod models;

use chrono::{Duration, Utc};
use models::{Book, BookPayload, BorrowRecord, User, STATUS_BORROWED, STATUS_RETURNED};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type DbPool = Arc<Mutex<Connection>>;

/// Create a connection pool (simplified for single-threaded SQLite)
pub fn create_pool(db_path: &str) -> SqliteResult<DbPool> {
    let conn = Connection::open(db_path)?;
    init::initialize_database(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Create an in-memory database for testing
pub fn create_test_pool() -> SqliteResult<DbPool> {
    let conn = Connection::open_in_memory()?;
    init::initialize_database(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Result of a borrow attempt
#[derive(Debug, Clone, PartialEq)]
pub enum BorrowOutcome {
    Borrowed(BorrowRecord),
    NoCopies,
    NoSuchBook,
}

/// Result of a return attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
    Returned(BorrowRecord),
    AlreadyReturned,
    /// Missing, or owned by someone else
    NotFound,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";
const BOOK_COLUMNS: &str =
    "id, title, author, isbn, category, description, total_copies, available_copies";
const BORROW_SELECT: &str = "SELECT br.id, br.user_id, br.book_id, b.title, b.author, \
     br.borrow_date, br.due_date, br.return_date, br.status, br.created_at, br.updated_at, \
     u.name, u.email \
     FROM borrows br \
     LEFT JOIN books b ON b.id = br.book_id \
     LEFT JOIN users u ON u.id = br.user_id";

fn user_from_row(row: &Row) -> SqliteResult<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn book_from_row(row: &Row) -> SqliteResult<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        total_copies: row.get(6)?,
        available_copies: row.get(7)?,
    })
}

fn borrow_from_row(row: &Row) -> SqliteResult<BorrowRecord> {
    Ok(BorrowRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        book_title: row.get(3)?,
        book_author: row.get(4)?,
        borrow_date: row.get(5)?,
        due_date: row.get(6)?,
        return_date: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        user_name: row.get(11)?,
        user_email: row.get(12)?,
    })
}

fn get_borrow(conn: &Connection, borrow_id: i64) -> SqliteResult<Option<BorrowRecord>> {
    conn.query_row(
        &format!("{} WHERE br.id = ?1", BORROW_SELECT),
        params![borrow_id],
        borrow_from_row,
    )
    .optional()
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Database operations
pub struct Database;

impl Database {
    /// Create a user with an already hashed password
    pub async fn create_user(
        pool: &DbPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> SqliteResult<User> {
        let conn = pool.lock().await;
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (name, email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, email, password_hash, role, &created_at],
        )?;

        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![conn.last_insert_rowid()],
            user_from_row,
        )
    }

    /// Get user by email (case-insensitive)
    pub async fn get_user_by_email(pool: &DbPool, email: &str) -> SqliteResult<Option<User>> {
        let conn = pool.lock().await;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE lower(email) = lower(?1)", USER_COLUMNS),
            params![email],
            user_from_row,
        )
        .optional()
    }

    pub async fn list_users(pool: &DbPool) -> SqliteResult<Vec<User>> {
        let conn = pool.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Issue a new opaque session token for a user
    pub async fn create_token(pool: &DbPool, user_id: i64) -> SqliteResult<String> {
        let conn = pool.lock().await;
        let token = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO tokens (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![&token, user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(token)
    }

    /// Resolve a bearer token to its user
    pub async fn user_for_token(pool: &DbPool, token: &str) -> SqliteResult<Option<User>> {
        let conn = pool.lock().await;
        conn.query_row(
            "SELECT u.id, u.name, u.email, u.password_hash, u.role, u.created_at \
             FROM tokens t JOIN users u ON u.id = t.user_id WHERE t.token = ?1",
            params![token],
            user_from_row,
        )
        .optional()
    }

    pub async fn list_books(pool: &DbPool) -> SqliteResult<Vec<Book>> {
        let conn = pool.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))?;
        let books = stmt
            .query_map([], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    pub async fn get_book(pool: &DbPool, book_id: i64) -> SqliteResult<Option<Book>> {
        let conn = pool.lock().await;
        conn.query_row(
            &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
            params![book_id],
            book_from_row,
        )
        .optional()
    }

    pub async fn create_book(pool: &DbPool, book: &BookPayload) -> SqliteResult<Book> {
        let conn = pool.lock().await;
        conn.execute(
            "INSERT INTO books (title, author, isbn, category, description, total_copies, available_copies, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                book.title.trim(),
                book.author.trim(),
                book.isbn.trim(),
                trimmed(&book.category),
                trimmed(&book.description),
                book.total_copies,
                book.available_copies,
                Utc::now().to_rfc3339()
            ],
        )?;

        conn.query_row(
            &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
            params![conn.last_insert_rowid()],
            book_from_row,
        )
    }

    /// Replace a book's fields; `None` when it does not exist
    pub async fn update_book(
        pool: &DbPool,
        book_id: i64,
        book: &BookPayload,
    ) -> SqliteResult<Option<Book>> {
        let conn = pool.lock().await;
        let changed = conn.execute(
            "UPDATE books SET title = ?1, author = ?2, isbn = ?3, category = ?4, description = ?5, \
             total_copies = ?6, available_copies = ?7 WHERE id = ?8",
            params![
                book.title.trim(),
                book.author.trim(),
                book.isbn.trim(),
                trimmed(&book.category),
                trimmed(&book.description),
                book.total_copies,
                book.available_copies,
                book_id
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        conn.query_row(
            &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
            params![book_id],
            book_from_row,
        )
        .optional()
    }

    /// Delete a book; false when it did not exist. Borrow rows are kept.
    pub async fn delete_book(pool: &DbPool, book_id: i64) -> SqliteResult<bool> {
        let conn = pool.lock().await;
        let changed = conn.execute("DELETE FROM books WHERE id = ?1", params![book_id])?;
        Ok(changed > 0)
    }

    /// Borrow one copy. The availability check and decrement share a transaction.
    pub async fn borrow_book(
        pool: &DbPool,
        user_id: i64,
        book_id: i64,
        loan_days: i64,
    ) -> SqliteResult<BorrowOutcome> {
        let mut conn = pool.lock().await;
        let tx = conn.transaction()?;

        let available: Option<i64> = tx
            .query_row(
                "SELECT available_copies FROM books WHERE id = ?1",
                params![book_id],
                |row| row.get(0),
            )
            .optional()?;
        match available {
            None => return Ok(BorrowOutcome::NoSuchBook),
            Some(n) if n <= 0 => return Ok(BorrowOutcome::NoCopies),
            Some(_) => {}
        }

        let now = Utc::now();
        let due = now + Duration::days(loan_days);
        tx.execute(
            "UPDATE books SET available_copies = available_copies - 1 WHERE id = ?1",
            params![book_id],
        )?;
        tx.execute(
            "INSERT INTO borrows (user_id, book_id, borrow_date, due_date, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?3, ?3)",
            params![user_id, book_id, now.to_rfc3339(), due.to_rfc3339(), STATUS_BORROWED],
        )?;
        let borrow_id = tx.last_insert_rowid();
        let record = get_borrow(&tx, borrow_id)?;
        tx.commit()?;

        Ok(match record {
            Some(record) => BorrowOutcome::Borrowed(record),
            None => BorrowOutcome::NoSuchBook,
        })
    }

    /// Return a borrow. Members may only return their own; admins any.
    pub async fn return_borrow(
        pool: &DbPool,
        user: &User,
        borrow_id: i64,
    ) -> SqliteResult<ReturnOutcome> {
        let mut conn = pool.lock().await;
        let tx = conn.transaction()?;

        let record = match get_borrow(&tx, borrow_id)? {
            Some(record) if record.user_id == user.id || user.is_admin() => record,
            _ => return Ok(ReturnOutcome::NotFound),
        };
        if record.status == STATUS_RETURNED {
            return Ok(ReturnOutcome::AlreadyReturned);
        }

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE borrows SET status = ?1, return_date = ?2, updated_at = ?2 WHERE id = ?3",
            params![STATUS_RETURNED, &now, borrow_id],
        )?;
        tx.execute(
            "UPDATE books SET available_copies = MIN(available_copies + 1, total_copies) WHERE id = ?1",
            params![record.book_id],
        )?;
        let updated = get_borrow(&tx, borrow_id)?;
        tx.commit()?;

        Ok(match updated {
            Some(record) => ReturnOutcome::Returned(record),
            None => ReturnOutcome::NotFound,
        })
    }

    pub async fn borrows_for_user(pool: &DbPool, user_id: i64) -> SqliteResult<Vec<BorrowRecord>> {
        let conn = pool.lock().await;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE br.user_id = ?1 ORDER BY br.id DESC",
            BORROW_SELECT
        ))?;
        let records = stmt
            .query_map(params![user_id], borrow_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub async fn all_borrows(pool: &DbPool) -> SqliteResult<Vec<BorrowRecord>> {
        let conn = pool.lock().await;
        let mut stmt = conn.prepare(&format!("{} ORDER BY br.id DESC", BORROW_SELECT))?;
        let records = stmt
            .query_map([], borrow_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Round-trip the connection
    pub async fn ping(pool: &DbPool) -> SqliteResult<()> {
        let conn = pool.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Move a borrow's dates, for exercising overdue handling
    #[cfg(any(test, feature = "test_utils"))]
    pub async fn set_borrow_dates(
        pool: &DbPool,
        borrow_id: i64,
        borrowed: chrono::DateTime<Utc>,
        due: chrono::DateTime<Utc>,
    ) -> SqliteResult<bool> {
        let conn = pool.lock().await;
        let changed = conn.execute(
            "UPDATE borrows SET borrow_date = ?1, due_date = ?2 WHERE id = ?3",
            params![borrowed.to_rfc3339(), due.to_rfc3339(), borrow_id],
        )?;
        Ok(changed > 0)
    }
}
