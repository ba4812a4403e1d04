/// Database schema initialization.
/// Sets up SQLite WAL mode and creates tables on startup.
use rusqlite::{Connection, Result as SqliteResult};

/// Initialize database connection with WAL mode and schema
pub fn initialize_database(conn: &Connection) -> SqliteResult<()> {
    // Enable WAL mode (for file-based DB only, ignore error for in-memory)
    let _ = conn.execute("PRAGMA journal_mode = WAL", []);
    let _ = conn.execute("PRAGMA synchronous = NORMAL", []);

    create_schema(conn)?;

    Ok(())
}

/// Create all database tables
fn create_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tokens (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            isbn TEXT NOT NULL,
            category TEXT,
            description TEXT,
            total_copies INTEGER NOT NULL DEFAULT 0,
            available_copies INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS borrows (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            borrow_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            return_date TEXT,
            status TEXT NOT NULL DEFAULT 'borrowed',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
        CREATE INDEX IF NOT EXISTS idx_borrows_user ON borrows(user_id);
        CREATE INDEX IF NOT EXISTS idx_borrows_book ON borrows(book_id);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_initialize_in_memory_database() {
        let conn = Connection::open_in_memory().expect("Failed to open in-memory DB");
        initialize_database(&conn).expect("Failed to initialize DB");

        let tables: Vec<String> = conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            )
            .expect("Query failed")
            .query_map([], |row| row.get(0))
            .expect("Mapping failed")
            .collect::<Result<Vec<_>, _>>()
            .expect("Collection failed");

        for table in ["users", "tokens", "books", "borrows"] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_borrows_table_schema() {
        let conn = Connection::open_in_memory().expect("Failed to open in-memory DB");
        initialize_database(&conn).expect("Failed to initialize DB");

        let mut stmt = conn
            .prepare("PRAGMA table_info(borrows)")
            .expect("Query failed");
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("Mapping failed")
            .collect::<Result<Vec<_>, _>>()
            .expect("Collection failed");

        for column in ["borrow_date", "due_date", "return_date", "status", "updated_at"] {
            assert!(columns.contains(&column.to_string()), "missing column {}", column);
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().expect("Failed to open in-memory DB");
        initialize_database(&conn).expect("First init failed");
        initialize_database(&conn).expect("Second init failed");
    }
}
