/// Password hashing and bearer-token authentication.
///
/// Passwords are stored as argon2id PHC strings. Sessions are opaque UUID
/// tokens kept in the `tokens` table; handlers receive the resolved user
/// through the [`AuthUser`] extractor.

use crate::db::models::{User, ROLE_ADMIN};
use crate::db::{Database, DbPool};
use crate::error::ApiError;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use futures::future::LocalBoxFuture;

/// Hash a password using argon2id
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash; a malformed hash never matches
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is invalid: {}", e);
            false
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// The caller behind a valid bearer token
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn require_admin(&self) -> Result<&User, ApiError> {
        if self.0.is_admin() {
            Ok(&self.0)
        } else {
            Err(ApiError::Forbidden("Access denied. Admins only.".to_string()))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let pool = pool.ok_or_else(|| ApiError::Internal("Database not configured".to_string()))?;
            let token = token.ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;
            match Database::user_for_token(&pool, &token).await? {
                Some(user) => Ok(AuthUser(user)),
                None => Err(ApiError::Unauthorized("Invalid token".to_string())),
            }
        })
    }
}

/// Create the configured admin account unless the email is already taken
pub async fn seed_admin(pool: &DbPool, email: &str, password: &str) -> Result<User, ApiError> {
    if let Some(existing) = Database::get_user_by_email(pool, email).await? {
        log::info!("Admin account {} already exists", email);
        return Ok(existing);
    }

    let name = email.split('@').next().unwrap_or(email);
    let hash = hash_password(password)?;
    let user = Database::create_user(pool, name, email, &hash, ROLE_ADMIN).await?;
    log::info!("Seeded admin account {}", email);
    Ok(user)
}
