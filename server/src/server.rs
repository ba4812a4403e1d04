/// HTTP server factory and configuration.
/// Provides reusable functions to create and configure the HTTP server
/// for use in both the main binary and tests.

use crate::db::DbPool;
use crate::handlers::{
    all_borrows, borrow_book, create_book, delete_book, get_book, list_books, list_users, login,
    my_borrows, register, return_borrow, test_db, update_book, ServerConfig,
};
use actix_web::{middleware, web, App, HttpServer};

/// Register every REST route
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/test-db", web::get().to(test_db))
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/books", web::get().to(list_books))
        .route("/books", web::post().to(create_book))
        .route("/books/{id}", web::get().to(get_book))
        .route("/books/{id}", web::put().to(update_book))
        .route("/books/{id}", web::delete().to(delete_book))
        .route("/borrow/{book_id}", web::post().to(borrow_book))
        .route("/return-borrow/{borrow_id}", web::post().to(return_borrow))
        .route("/return/{borrow_id}", web::post().to(return_borrow))
        .route("/my-borrows", web::get().to(my_borrows))
        .route("/admin/all-borrows", web::get().to(all_borrows))
        .route("/admin/users", web::get().to(list_users));
}

/// Create a configured HTTP server
///
/// # Arguments
/// * `pool` - Database connection pool wrapped in web::Data
/// * `server_config` - Loan policy shared with handlers
/// * `bind_addr` - Address to bind the server to (e.g., "127.0.0.1:4000")
///
/// # Example
/// ```ignore
/// let pool = web::Data::new(db::create_pool("ibooks.db")?);
/// let server = server::create_http_server(pool, web::Data::new(ServerConfig::default()), "127.0.0.1:4000")?;
/// server.await?;
/// ```
pub fn create_http_server(
    pool: web::Data<DbPool>,
    server_config: web::Data<ServerConfig>,
    bind_addr: &str,
) -> std::io::Result<actix_web::dev::Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(server_config.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}

/// Create a test HTTP server with an in-memory database on a random port
///
/// # Returns
/// A tuple of (server, bind_address, pool); the pool lets tests seed and
/// adjust data behind the HTTP surface
pub fn create_test_http_server_with_pool(
) -> std::io::Result<(actix_web::dev::Server, String, web::Data<DbPool>)> {
    let pool = crate::db::create_test_pool()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let pool = web::Data::new(pool);
    let server_config = web::Data::new(ServerConfig::default());

    let pool_clone = pool.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool_clone.clone())
            .app_data(server_config.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .workers(1)
    // Bind to 127.0.0.1:0 to get a random available port
    .bind("127.0.0.1:0")?;

    let addr_str = server
        .addrs()
        .first()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "No bind address found"))?
        .to_string();

    Ok((server.run(), addr_str, pool))
}

/// Create a test HTTP server with an in-memory database on a random port
///
/// # Example
/// ```ignore
/// let (server, addr) = server::create_test_http_server()?;
/// tokio::spawn(server);
/// let resp = reqwest::get(format!("http://{}/test-db", addr)).await?;
/// ```
pub fn create_test_http_server() -> std::io::Result<(actix_web::dev::Server, String)> {
    let (server, addr, _pool) = create_test_http_server_with_pool()?;
    Ok((server, addr))
}
