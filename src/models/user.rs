/// User identity as cached by the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role as reported by the backend at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Backend user identifier; numeric on the reference backend, opaque elsewhere
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// Profile stored alongside the token. Replaced wholesale on every login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl UserProfile {
    /// Build a profile from a login response, deriving the name from the
    /// email local-part when the backend sends none.
    pub fn new(email: &str, name: Option<String>, role: Role, user_id: Option<UserId>) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| Some(email_local_part(email).to_string()).filter(|n| !n.is_empty()));

        UserProfile {
            email: email.to_string(),
            name,
            role,
            user_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let local = email_local_part(&self.email);
        if local.is_empty() {
            "User".to_string()
        } else {
            local.to_string()
        }
    }
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default().trim()
}
