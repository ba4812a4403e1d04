/// iBooks Server - Library REST backend
///
/// Main server entry point. Handles:
/// - Command-line argument parsing
/// - Database initialization and optional admin seeding
/// - HTTP server startup
use actix_web::web;
use anyhow::Context;
use ibooks_server::config::Config;
use ibooks_server::handlers::ServerConfig;
use ibooks_server::{auth, db, server};
use std::fs;
use std::process;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .init();

    let config = Config::from_args();

    log::info!("Starting iBooks Server");
    log::info!("Database: {:?}", config.database);
    log::info!("Port: {}", config.port);
    log::info!("Loan period: {} days", config.loan_days);

    // Write PID file if specified
    if let Some(pidfile) = &config.pidfile {
        fs::write(pidfile, process::id().to_string())
            .with_context(|| format!("Failed to write PID file {:?}", pidfile))?;
        log::info!("PID file written to: {:?}", pidfile);
    }

    let db_path = config
        .database
        .to_str()
        .context("Database path is not valid UTF-8")?;
    let pool = db::create_pool(db_path).context("Failed to create database pool")?;
    log::info!("Database initialized");

    if let Some((email, password)) = config.admin_seed() {
        auth::seed_admin(&pool, email, password)
            .await
            .context("Failed to seed admin account")?;
    }

    let server_config = web::Data::new(ServerConfig {
        loan_days: config.loan_days,
    });

    let bind_addr = format!("127.0.0.1:{}", config.port);
    log::info!("Starting HTTP server on {}", bind_addr);

    let http_server = server::create_http_server(web::Data::new(pool), server_config, &bind_addr)
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    http_server.await.context("HTTP server failed")?;

    Ok(())
}
