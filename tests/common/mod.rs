//! Common test utilities and helpers for integration tests
//! Spawns backends, seeds data and builds clients against them
#![allow(dead_code)]

use actix_web::{web, App, HttpResponse, HttpServer};
use ibooks_client::api::ServerApi;
use ibooks_client::cli::LineInput;
use ibooks_client::client::LibraryClient;
use ibooks_client::config::ClientConfig;
use ibooks_client::session::SessionStore;
use ibooks_client::storage::LocalStore;
use ibooks_server::db::models::{BookPayload, ROLE_USER};
use ibooks_server::db::{BorrowOutcome, Database, DbPool};
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@library.test";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// A running test backend and direct access to its database
pub struct TestBackend {
    pub base_url: String,
    pub pool: DbPool,
}

impl TestBackend {
    /// Spawn a test HTTP server and run it in background
    pub async fn spawn() -> Self {
        let (server, addr, pool) = ibooks_server::server::create_test_http_server_with_pool()
            .expect("Failed to create test server");
        tokio::spawn(server);

        // Give server a moment to bind
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestBackend {
            base_url: format!("http://{}", addr),
            pool: pool.get_ref().clone(),
        }
    }

    /// Spawn with the admin account already present
    pub async fn spawn_with_admin() -> Self {
        let backend = Self::spawn().await;
        ibooks_server::auth::seed_admin(&backend.pool, ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("Failed to seed admin");
        backend
    }

    pub async fn add_book(&self, title: &str, author: &str, category: Option<&str>, copies: i64) -> i64 {
        let payload = BookPayload {
            title: title.to_string(),
            author: author.to_string(),
            isbn: format!("978{:010}", title.len() * 7919),
            category: category.map(str::to_string),
            description: None,
            total_copies: copies,
            available_copies: copies,
        };
        Database::create_book(&self.pool, &payload)
            .await
            .expect("Failed to add book")
            .id
    }

    pub async fn add_member(&self, name: &str, email: &str, password: &str) -> i64 {
        let hash = ibooks_server::auth::hash_password(password).expect("hash");
        Database::create_user(&self.pool, name, email, &hash, ROLE_USER)
            .await
            .expect("Failed to add member")
            .id
    }

    /// Borrow directly in the database and return the borrow id
    pub async fn borrow_as(&self, user_id: i64, book_id: i64) -> i64 {
        match Database::borrow_book(&self.pool, user_id, book_id, 14)
            .await
            .expect("borrow failed")
        {
            BorrowOutcome::Borrowed(record) => record.id,
            other => panic!("unexpected borrow outcome {:?}", other),
        }
    }

    /// Shift a borrow so it was taken `borrowed_days_ago` and is due in `due_in_days`
    pub async fn shift_borrow(&self, borrow_id: i64, borrowed_days_ago: i64, due_in_days: i64) {
        let now = chrono::Utc::now();
        Database::set_borrow_dates(
            &self.pool,
            borrow_id,
            now - chrono::Duration::days(borrowed_days_ago),
            now + chrono::Duration::days(due_in_days),
        )
        .await
        .expect("Failed to shift dates");
    }

    /// Fresh in-memory session and a gateway pointed at this backend
    pub fn api(&self) -> (Arc<SessionStore>, Arc<ServerApi>) {
        let session = Arc::new(SessionStore::in_memory().expect("session store"));
        let api = Arc::new(ServerApi::new(&self.base_url, session.clone()).expect("api"));
        (session, api)
    }

    /// A full client with its own data directory; confirmations auto-approve
    pub fn client(&self, dir: &TempDir) -> LibraryClient {
        client_at(&self.base_url, dir)
    }

    /// A client that reads commands and confirmation answers from `script`
    pub fn scripted_client(&self, dir: &TempDir, script: &str) -> LibraryClient {
        let config = ClientConfig::new(&self.base_url, Some(dir.path().to_path_buf()))
            .expect("config");
        LibraryClient::new(config)
            .expect("client")
            .with_input(LineInput::new(std::io::Cursor::new(script.as_bytes().to_vec())))
    }
}

pub fn client_at(base_url: &str, dir: &TempDir) -> LibraryClient {
    let config = ClientConfig::new(base_url, Some(dir.path().to_path_buf()))
        .expect("config")
        .assume_yes(true);
    LibraryClient::new(config).expect("client")
}

/// In-memory client for backends that are not an iBooks server
pub fn memory_client(base_url: &str) -> LibraryClient {
    let config = ClientConfig::new(base_url, Some(std::env::temp_dir()))
        .expect("config")
        .assume_yes(true);
    LibraryClient::with_store(config, LocalStore::in_memory().expect("store")).expect("client")
}

const HTML_500: &str = "<!DOCTYPE html><html><body><h1>500 Internal Server Error</h1></body></html>";

/// A backend whose every route fails with an HTML 500 page
pub async fn spawn_html_500() -> String {
    let server = HttpServer::new(|| {
        App::new().default_service(web::to(|| async {
            HttpResponse::InternalServerError()
                .content_type("text/html")
                .body(HTML_500)
        }))
    })
    .workers(1)
    .bind("127.0.0.1:0")
    .expect("bind");
    let addr = server.addrs()[0];
    tokio::spawn(server.run());
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    format!("http://{}", addr)
}

/// A backend that accepts registrations but never issues a token
pub async fn spawn_tokenless_login() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/register",
                web::post().to(|| async {
                    HttpResponse::Created()
                        .json(serde_json::json!({"message": "User registered successfully"}))
                }),
            )
            .route(
                "/login",
                web::post().to(|| async {
                    HttpResponse::Ok().json(serde_json::json!({"role": "user"}))
                }),
            )
    })
    .workers(1)
    .bind("127.0.0.1:0")
    .expect("bind");
    let addr = server.addrs()[0];
    tokio::spawn(server.run());
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    format!("http://{}", addr)
}

/// Address nothing listens on
pub const UNREACHABLE: &str = "http://127.0.0.1:9";
