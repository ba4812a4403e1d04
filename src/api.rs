//! Server API client for the library REST backend
//!
//! Every call goes through [`ServerApi::execute`], which attaches the bearer
//! token when asked to, decodes the body defensively and classifies the
//! outcome. Nothing here retries.

use crate::error::{ClientError, Result};
use crate::models::{
    AdminUser, Book, BookDraft, BorrowReceipt, BorrowRecord, HealthResponse, LoginRequest,
    LoginResponse, RegisterRequest,
};
use crate::session::SessionStore;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Longest plain-text body carried into an error message
const MAX_DETAIL_LEN: usize = 200;

/// Whether a call needs the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Public,
    Required,
}

/// Server API client
pub struct ServerApi {
    client: Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl ServerApi {
    /// Create a client with no request timeout
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self> {
        Self::with_timeout(base_url, session, None)
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<SessionStore>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ClientError::Config(format!("Invalid server URL {}: {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "Unsupported server URL scheme: {}",
                base_url.scheme()
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}/{}", self.base_url(), path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| ClientError::Config(format!("Invalid path {}: {}", path, e)))
    }

    /// Issue one request and classify the outcome.
    ///
    /// With [`Auth::Required`] and no stored token the request is never sent.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<Value> {
        let url = self.endpoint(path)?;
        let mut request = self.client.request(method.clone(), url);

        if auth == Auth::Required {
            let token = self.session.token().ok_or_else(|| {
                log::debug!("{} {} needs a session; not sending", method, path);
                ClientError::Unauthenticated
            })?;
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        log::debug!("{} {}", method, path);
        let response = request.send().await.map_err(|e| {
            log::error!("{} {} failed: {}", method, path, e);
            ClientError::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            log::error!("Failed to read response body for {} {}: {}", method, path, e);
            ClientError::Network(e.to_string())
        })?;

        classify_response(status, &text)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<T> {
        let value = self.execute(method, path, body, auth).await?;
        serde_json::from_value(value).map_err(|e| {
            log::warn!("Unexpected response shape from {}: {}", path, e);
            ClientError::Parse(e.to_string())
        })
    }

    fn to_body<B: Serialize>(body: &B) -> Result<Option<Value>> {
        Ok(Some(serde_json::to_value(body)?))
    }

    // Books

    pub async fn list_books(&self) -> Result<Vec<Book>> {
        self.call(Method::GET, "/books", None, Auth::Public).await
    }

    pub async fn get_book(&self, book_id: i64) -> Result<Book> {
        self.call(Method::GET, &format!("/books/{}", book_id), None, Auth::Public)
            .await
    }

    pub async fn create_book(&self, draft: &BookDraft) -> Result<Value> {
        self.execute(Method::POST, "/books", Self::to_body(draft)?, Auth::Required)
            .await
    }

    pub async fn update_book(&self, book_id: i64, draft: &BookDraft) -> Result<Value> {
        self.execute(
            Method::PUT,
            &format!("/books/{}", book_id),
            Self::to_body(draft)?,
            Auth::Required,
        )
        .await
    }

    pub async fn delete_book(&self, book_id: i64) -> Result<Value> {
        self.execute(
            Method::DELETE,
            &format!("/books/{}", book_id),
            None,
            Auth::Required,
        )
        .await
    }

    // Accounts

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.call(Method::POST, "/login", Self::to_body(&request)?, Auth::Public)
            .await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Value> {
        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.execute(Method::POST, "/register", Self::to_body(&request)?, Auth::Public)
            .await
    }

    // Borrowing

    pub async fn borrow_book(&self, book_id: i64) -> Result<BorrowReceipt> {
        let body = self
            .execute(
                Method::POST,
                &format!("/borrow/{}", book_id),
                None,
                Auth::Required,
            )
            .await?;
        Ok(BorrowReceipt::from_response(book_id, &body))
    }

    pub async fn return_borrow(&self, borrow_id: i64) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/return-borrow/{}", borrow_id),
            None,
            Auth::Required,
        )
        .await
    }

    pub async fn my_borrows(&self) -> Result<Vec<BorrowRecord>> {
        self.call(Method::GET, "/my-borrows", None, Auth::Required)
            .await
    }

    // Administration

    pub async fn all_borrows(&self) -> Result<Vec<BorrowRecord>> {
        self.call(Method::GET, "/admin/all-borrows", None, Auth::Required)
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<AdminUser>> {
        self.call(Method::GET, "/admin/users", None, Auth::Required)
            .await
    }

    /// Backend health probe
    pub async fn health_check(&self) -> Result<HealthResponse> {
        self.call(Method::GET, "/test-db", None, Auth::Public).await
    }
}

/// Turn a status code and raw body into data or a classified error.
///
/// The body is decoded as JSON when possible; otherwise the plain text (or a
/// generic fallback for HTML pages) becomes the error detail.
pub fn classify_response(status: u16, text: &str) -> Result<Value> {
    let parsed: Option<Value> = if text.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str(text).ok()
    };

    if (200..300).contains(&status) {
        return parsed.ok_or_else(|| {
            log::warn!("Non-JSON success response ({}): {}", status, truncate(text));
            ClientError::Parse(format!("Expected JSON, got: {}", truncate(text)))
        });
    }

    let message = error_message(status, text, parsed.as_ref());
    if (400..500).contains(&status) {
        Err(ClientError::Client { status, message })
    } else {
        if parsed.is_none() {
            log::error!("Server error {} with non-JSON body: {}", status, truncate(text));
        }
        Err(ClientError::Server { status, message })
    }
}

fn error_message(status: u16, text: &str, parsed: Option<&Value>) -> String {
    if let Some(value) = parsed {
        let from_body = ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|m| m.as_str()))
            .map(str::trim)
            .filter(|m| !m.is_empty());
        if let Some(message) = from_body {
            return message.to_string();
        }
    }

    let plain = text.trim();
    if parsed.is_none() && !plain.is_empty() && !plain.starts_with('<') {
        return truncate(plain);
    }

    if (400..500).contains(&status) {
        format!("Request failed with status {}", status)
    } else {
        format!("Server error: {}. Please try again.", status)
    }
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_DETAIL_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_DETAIL_LEN).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(url: &str) -> Result<ServerApi> {
        ServerApi::new(url, Arc::new(SessionStore::in_memory()?))
    }

    #[test]
    fn test_server_api_creation() {
        let api = api("http://localhost:5000/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000");
        assert_eq!(
            api.endpoint("/books/3").unwrap().as_str(),
            "http://localhost:5000/books/3"
        );
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(api("not a url"), Err(ClientError::Config(_))));
        assert!(matches!(api("ftp://example.com"), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_success_json() {
        let value = classify_response(200, r#"[{"id":1}]"#).unwrap();
        assert!(value.is_array());
        assert_eq!(classify_response(204, "").unwrap(), Value::Null);
    }

    #[test]
    fn test_success_with_html_is_parse_error() {
        let err = classify_response(200, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[test]
    fn test_client_error_uses_backend_message() {
        let err = classify_response(400, r#"{"message":"No copies available"}"#).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Client { status: 400, ref message } if message == "No copies available"
        ));

        let err = classify_response(401, r#"{"error":"Invalid token"}"#).unwrap_err();
        assert_eq!(err.user_message(), "Invalid token");
    }

    #[test]
    fn test_client_error_generic_fallback() {
        let err = classify_response(404, "{}").unwrap_err();
        assert_eq!(err.user_message(), "Request failed with status 404");
    }

    #[test]
    fn test_html_500_does_not_leak_markup() {
        let html = "<!DOCTYPE html><html><body><h1>Internal Server Error</h1></body></html>";
        let err = classify_response(500, html).unwrap_err();
        match err {
            ClientError::Server { status, message } => {
                assert_eq!(status, 500);
                assert!(!message.contains('<'));
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_error_is_detail() {
        let err = classify_response(502, "Bad gateway upstream").unwrap_err();
        assert_eq!(err.user_message(), "Bad gateway upstream");
    }

    #[tokio::test]
    async fn test_auth_required_without_token_never_sends() {
        // Nothing listens on port 9; reaching the network would be a Network error
        let api = api("http://127.0.0.1:9").unwrap();
        let result = api.my_borrows().await;
        assert!(matches!(result, Err(ClientError::Unauthenticated)));
    }
}
