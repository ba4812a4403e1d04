/// Borrow and return handlers.

use super::ServerConfig;
use crate::auth::AuthUser;
use crate::db::{BorrowOutcome, Database, DbPool, ReturnOutcome};
use crate::error::{ApiError, ApiResult};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// POST /borrow/:bookId
pub async fn borrow_book(
    pool: web::Data<DbPool>,
    config: web::Data<ServerConfig>,
    auth: AuthUser,
    book_id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    match Database::borrow_book(&pool, auth.0.id, *book_id, config.loan_days).await? {
        BorrowOutcome::Borrowed(record) => {
            log::info!("User {} borrowed book {}", auth.0.email, record.book_id);
            Ok(HttpResponse::Created().json(json!({
                "message": "Book borrowed successfully",
                "borrowRecord": record
            })))
        }
        BorrowOutcome::NoCopies => Err(ApiError::BadRequest("No copies available".to_string())),
        BorrowOutcome::NoSuchBook => Err(ApiError::NotFound("Book not found".to_string())),
    }
}

/// POST /return-borrow/:borrowId, also served as /return/:borrowId
pub async fn return_borrow(
    pool: web::Data<DbPool>,
    auth: AuthUser,
    borrow_id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    match Database::return_borrow(&pool, &auth.0, *borrow_id).await? {
        ReturnOutcome::Returned(record) => {
            log::info!("Borrow {} returned by {}", record.id, auth.0.email);
            Ok(HttpResponse::Ok().json(json!({
                "message": "Book returned successfully",
                "borrowRecord": record
            })))
        }
        ReturnOutcome::AlreadyReturned => {
            Err(ApiError::BadRequest("Book already returned".to_string()))
        }
        ReturnOutcome::NotFound => Err(ApiError::NotFound("Borrow record not found".to_string())),
    }
}

/// GET /my-borrows
pub async fn my_borrows(pool: web::Data<DbPool>, auth: AuthUser) -> ApiResult<HttpResponse> {
    let records = Database::borrows_for_user(&pool, auth.0.id).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// GET /admin/all-borrows
pub async fn all_borrows(pool: web::Data<DbPool>, auth: AuthUser) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let records = Database::all_borrows(&pool).await?;
    Ok(HttpResponse::Ok().json(records))
}
