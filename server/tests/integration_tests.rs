/// Integration tests for the REST API
/// Drives a spawned test server over HTTP and checks state through direct DB calls
use chrono::{Duration, Utc};
use ibooks_server::db::models::{BookPayload, ROLE_ADMIN};
use ibooks_server::db::{Database, DbPool};
use ibooks_server::{auth, server};
use serde_json::{json, Value};

async fn spawn_server() -> (String, DbPool) {
    let (server, addr, pool) =
        server::create_test_http_server_with_pool().expect("Failed to create test server");
    tokio::spawn(server);
    (format!("http://{}", addr), pool.get_ref().clone())
}

async fn login(client: &reqwest::Client, base: &str, email: &str, password: &str) -> String {
    let body: Value = client
        .post(format!("{}/login", base))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("login request failed")
        .json()
        .await
        .expect("login body");
    body["token"].as_str().expect("token").to_string()
}

fn book(title: &str, copies: i64) -> BookPayload {
    BookPayload {
        title: title.to_string(),
        author: "Chinua Achebe".to_string(),
        isbn: format!("978-{}", title.len()),
        category: Some("African Literature".to_string()),
        description: None,
        total_copies: copies,
        available_copies: copies,
    }
}

#[tokio::test]
async fn test_registration_and_login_workflow() {
    let (base, _pool) = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/register", base))
        .json(&json!({"name": "Ama Owusu", "email": "ama@library.test", "password": "pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .post(format!("{}/register", base))
        .json(&json!({"name": "Ama", "email": "ama@library.test", "password": "pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Email already registered");

    let token = login(&client, &base, "ama@library.test", "pw").await;
    let borrows: Value = client
        .get(format!("{}/my-borrows", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(borrows, json!([]));
}

#[tokio::test]
async fn test_borrow_and_return_workflow() {
    let (base, pool) = spawn_server().await;
    let client = reqwest::Client::new();
    let created = Database::create_book(&pool, &book("Arrow of God", 1)).await.unwrap();

    client
        .post(format!("{}/register", base))
        .json(&json!({"name": "Kofi", "email": "kofi@library.test", "password": "pw"}))
        .send()
        .await
        .unwrap();
    let token = login(&client, &base, "kofi@library.test", "pw").await;

    let resp = client
        .post(format!("{}/borrow/{}", base, created.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let borrow_id = body["borrowRecord"]["id"].as_i64().unwrap();

    let stored = Database::get_book(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(stored.available_copies, 0);

    // The legacy return path is an alias of /return-borrow
    let resp = client
        .post(format!("{}/return/{}", base, borrow_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{}/return-borrow/{}", base, borrow_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let stored = Database::get_book(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(stored.available_copies, 1);
}

#[tokio::test]
async fn test_admin_listing_includes_borrower_and_dates() {
    let (base, pool) = spawn_server().await;
    let client = reqwest::Client::new();
    auth::seed_admin(&pool, "admin@library.test", "secret").await.unwrap();
    let member = Database::create_user(
        &pool,
        "Efua",
        "efua@library.test",
        &auth::hash_password("pw").unwrap(),
        "user",
    )
    .await
    .unwrap();
    let created = Database::create_book(&pool, &book("Things Fall Apart", 2)).await.unwrap();
    let record = match Database::borrow_book(&pool, member.id, created.id, 14).await.unwrap() {
        ibooks_server::db::BorrowOutcome::Borrowed(record) => record,
        other => panic!("unexpected outcome {:?}", other),
    };
    let now = Utc::now();
    assert!(
        Database::set_borrow_dates(&pool, record.id, now - Duration::days(20), now - Duration::days(6))
            .await
            .unwrap()
    );

    let token = login(&client, &base, "admin@library.test", "secret").await;
    let all: Vec<Value> = client
        .get(format!("{}/admin/all-borrows", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["user_email"], "efua@library.test");
    assert_eq!(all[0]["book_title"], "Things Fall Apart");

    let users: Vec<Value> = client
        .get(format!("{}/admin/users", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u["role"] == ROLE_ADMIN));
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn test_health_probe() {
    let (base, _pool) = spawn_server().await;
    let body: Value = reqwest::get(format!("{}/test-db", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_file_backed_pool_keeps_data_across_restarts() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("ibooks.db");
    let path = path.to_str().expect("utf-8 path");

    {
        let pool = ibooks_server::db::create_pool(path).expect("Failed to open database");
        auth::seed_admin(&pool, "admin@library.test", "secret").await.unwrap();
        Database::create_book(&pool, &book("Weep Not, Child", 3)).await.unwrap();
    }

    let pool = ibooks_server::db::create_pool(path).expect("Failed to reopen database");
    let books = Database::list_books(&pool).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Weep Not, Child");

    // Seeding is idempotent on an existing database
    let admin = auth::seed_admin(&pool, "admin@library.test", "other").await.unwrap();
    assert!(admin.is_admin());
    assert_eq!(Database::list_users(&pool).await.unwrap().len(), 1);
}
