/// iBooks Server Library
/// REST backend for books, accounts and borrows over SQLite

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod server;
