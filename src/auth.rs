//! Login, registration and logout
//!
//! The only code that writes the session store. Each successful path ends
//! in `set_session`/`clear_session`, which in turn resynchronizes the view.

use crate::api::ServerApi;
use crate::error::{ClientError, Result};
use crate::models::UserProfile;
use crate::session::SessionStore;
use std::sync::Arc;

/// Result of a registration attempt that reached the backend successfully
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// Account created and the automatic login succeeded
    LoggedIn(UserProfile),
    /// Account created but the automatic login did not; ask the user to log in
    RegisteredPleaseLogin,
}

/// Reachability of the backend as reported by `/test-db`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Connected,
    Error,
    Offline,
}

impl BackendStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BackendStatus::Connected => "Connected",
            BackendStatus::Error => "Error",
            BackendStatus::Offline => "Offline",
        }
    }
}

pub struct AuthController {
    api: Arc<ServerApi>,
    session: Arc<SessionStore>,
}

impl AuthController {
    pub fn new(api: Arc<ServerApi>, session: Arc<SessionStore>) -> Self {
        AuthController { api, session }
    }

    /// Log in and store the resulting session
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Please fill in all fields".to_string(),
            ));
        }

        let response = self.api.login(email, password).await?;
        let token = response
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                log::warn!("Login for {} succeeded without a token", email);
                ClientError::Validation("Login failed: No token received".to_string())
            })?;

        let profile = UserProfile::new(email, response.name, response.role, response.user_id);
        self.session.set_session(&token, profile.clone())?;
        log::info!("Logged in as {} ({})", email, profile.role.as_str());
        Ok(profile)
    }

    /// Create an account, then try to log straight in
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterOutcome> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Please fill in all fields".to_string(),
            ));
        }

        self.api.register(name, email, password).await?;
        log::info!("Registered account for {}", email);

        match self.login(email, password).await {
            Ok(profile) => Ok(RegisterOutcome::LoggedIn(profile)),
            Err(e) => {
                log::warn!("Automatic login after registration failed: {}", e);
                Ok(RegisterOutcome::RegisteredPleaseLogin)
            }
        }
    }

    pub fn logout(&self) -> Result<()> {
        self.session.clear_session()?;
        log::info!("Logged out");
        Ok(())
    }

    /// Probe `/test-db`. Never fails; unreachable means `Offline`.
    pub async fn probe_backend(&self) -> BackendStatus {
        match self.api.health_check().await {
            Ok(health) if health.success => BackendStatus::Connected,
            Ok(_) => BackendStatus::Error,
            Err(ClientError::Network(e)) => {
                log::error!("Backend connection failed: {}", e);
                BackendStatus::Offline
            }
            Err(e) => {
                log::warn!("Backend health check failed: {}", e);
                BackendStatus::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AuthController {
        let session = Arc::new(SessionStore::in_memory().unwrap());
        let api = Arc::new(ServerApi::new("http://127.0.0.1:9", session.clone()).unwrap());
        AuthController::new(api, session)
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let auth = controller();
        assert!(matches!(
            auth.login("  ", "secret").await,
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            auth.login("a@b.c", "").await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let auth = controller();
        assert!(matches!(
            auth.register("", "a@b.c", "pw").await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_offline() {
        let auth = controller();
        assert_eq!(auth.probe_backend().await, BackendStatus::Offline);
    }
}
