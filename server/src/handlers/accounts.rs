/// Account handlers: registration, login, user listing and health.

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::db::models::{LoginRequest, LoginResponse, RegisterRequest, UserSummary, ROLE_USER};
use crate::db::{Database, DbPool};
use crate::error::{ApiError, ApiResult};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Create an account
/// POST /register
pub async fn register(
    pool: web::Data<DbPool>,
    req: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let name = req.name.trim();
    let email = req.email.trim();
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, email and password are required".to_string(),
        ));
    }

    let hash = hash_password(&req.password)?;
    match Database::create_user(&pool, name, email, &hash, ROLE_USER).await {
        Ok(user) => {
            log::info!("Registered user {} ({})", user.id, user.email);
            Ok(HttpResponse::Created().json(json!({
                "message": "User registered successfully",
                "userId": user.id
            })))
        }
        Err(e) if e.to_string().contains("UNIQUE constraint failed") => {
            Err(ApiError::Conflict("Email already registered".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Exchange credentials for a bearer token
/// POST /login
pub async fn login(
    pool: web::Data<DbPool>,
    req: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = Database::get_user_by_email(&pool, email)
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let token = Database::create_token(&pool, user.id).await?;
    log::info!("User {} logged in", user.email);
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        role: user.role,
        user_id: user.id,
        name: user.name,
    }))
}

/// All accounts
/// GET /admin/users
pub async fn list_users(pool: web::Data<DbPool>, auth: AuthUser) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let users: Vec<UserSummary> = Database::list_users(&pool)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// Database health probe
/// GET /test-db
pub async fn test_db(pool: web::Data<DbPool>) -> HttpResponse {
    match Database::ping(&pool).await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Database connection successful"
        })),
        Err(e) => {
            log::error!("Database health check failed: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Database connection failed"
            }))
        }
    }
}
