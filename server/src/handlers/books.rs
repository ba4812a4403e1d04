/// Book catalog handlers.

use crate::auth::AuthUser;
use crate::db::models::BookPayload;
use crate::db::{Database, DbPool};
use crate::error::{ApiError, ApiResult};
use actix_web::{web, HttpResponse};
use serde_json::json;

fn check(payload: &BookPayload) -> ApiResult<()> {
    match payload.problem() {
        Some(problem) => Err(ApiError::BadRequest(problem.to_string())),
        None => Ok(()),
    }
}

/// GET /books
pub async fn list_books(pool: web::Data<DbPool>) -> ApiResult<HttpResponse> {
    let books = Database::list_books(&pool).await?;
    Ok(HttpResponse::Ok().json(books))
}

/// GET /books/:id
pub async fn get_book(pool: web::Data<DbPool>, id: web::Path<i64>) -> ApiResult<HttpResponse> {
    match Database::get_book(&pool, *id).await? {
        Some(book) => Ok(HttpResponse::Ok().json(book)),
        None => Err(ApiError::NotFound("Book not found".to_string())),
    }
}

/// POST /books (admin)
pub async fn create_book(
    pool: web::Data<DbPool>,
    auth: AuthUser,
    req: web::Json<BookPayload>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    check(&req)?;

    let book = Database::create_book(&pool, &req).await?;
    log::info!("Book {} created by {}", book.id, auth.0.email);
    Ok(HttpResponse::Created().json(json!({
        "message": "Book added successfully",
        "book": book
    })))
}

/// PUT /books/:id (admin)
pub async fn update_book(
    pool: web::Data<DbPool>,
    auth: AuthUser,
    id: web::Path<i64>,
    req: web::Json<BookPayload>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    check(&req)?;

    match Database::update_book(&pool, *id, &req).await? {
        Some(book) => Ok(HttpResponse::Ok().json(json!({
            "message": "Book updated successfully",
            "book": book
        }))),
        None => Err(ApiError::NotFound("Book not found".to_string())),
    }
}

/// DELETE /books/:id (admin)
pub async fn delete_book(
    pool: web::Data<DbPool>,
    auth: AuthUser,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;

    if Database::delete_book(&pool, *id).await? {
        log::info!("Book {} deleted by {}", id, auth.0.email);
        Ok(HttpResponse::Ok().json(json!({ "message": "Book deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Book not found".to_string()))
    }
}
