/// iBooks Library Client Library
/// Session handling, REST gateway and page controllers for the iBooks backend

pub mod actions;
pub mod admin;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod covers;
pub mod error;
pub mod ledger;
pub mod models;
pub mod render;
pub mod session;
pub mod storage;
pub mod view;

pub use actions::{AssumeYes, Confirm, Mutation, Resync};
pub use api::ServerApi;
pub use error::{ClientError, Result};
pub use session::{Session, SessionObserver, SessionStore};
pub use storage::LocalStore;
