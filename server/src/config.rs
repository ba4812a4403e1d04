/// Configuration management for the iBooks server.
/// Handles command-line argument parsing and config structure.
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "iBooks Server")]
#[command(about = "Library REST backend for the iBooks client", long_about = None)]
pub struct Config {
    /// Server port (default: 4000)
    #[arg(long, default_value = "4000")]
    pub port: u16,

    /// SQLite database file path (default: ibooks.db)
    #[arg(long, default_value = "ibooks.db")]
    pub database: PathBuf,

    /// PID file path (optional) - write server PID to this file on startup
    #[arg(long)]
    pub pidfile: Option<PathBuf>,

    /// Loan period in days (default: 14)
    #[arg(long, default_value = "14")]
    pub loan_days: i64,

    /// Email of an admin account to create on startup if missing
    #[arg(long, env = "IBOOKS_ADMIN_EMAIL", requires = "admin_password")]
    pub admin_email: Option<String>,

    /// Password for the seeded admin account
    #[arg(long, env = "IBOOKS_ADMIN_PASSWORD", requires = "admin_email")]
    pub admin_password: Option<String>,
}

impl Config {
    /// Parse command-line arguments into Config
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Admin credentials to seed, when both are configured
    pub fn admin_seed(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}
