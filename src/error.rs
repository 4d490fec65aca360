use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::session::AuthError;

#[derive(Debug)]
pub enum AppError {
    Sqlx(sqlx::Error),
    PasswordHash(argon2::password_hash::Error),
    Jwt(jsonwebtoken::errors::Error),
    Blocking(tokio::task::JoinError),
    Validation(String),
    DuplicateUsername,
    InvalidCredentials,
    Auth(AuthError),
    NotFound,
}

impl From<sqlx::Error> for AppError {
    fn from(inner: sqlx::Error) -> Self {
        AppError::Sqlx(inner)
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(inner: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(inner)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(inner: jsonwebtoken::errors::Error) -> Self {
        AppError::Jwt(inner)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(inner: tokio::task::JoinError) -> Self {
        AppError::Blocking(inner)
    }
}

impl From<AuthError> for AppError {
    fn from(inner: AuthError) -> Self {
        AppError::Auth(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(inner: JsonRejection) -> Self {
        AppError::Validation(inner.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateUsername => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Sqlx(_)
            | AppError::PasswordHash(_)
            | AppError::Jwt(_)
            | AppError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Sqlx(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing error: {}", e);
                "Password hashing error".to_string()
            }
            AppError::Jwt(e) => {
                tracing::error!("JWT error: {}", e);
                "Token error".to_string()
            }
            AppError::Blocking(e) => {
                tracing::error!("Blocking task failed: {}", e);
                "Internal server error".to_string()
            }
            AppError::Validation(msg) => msg,
            AppError::DuplicateUsername => "Username already exists".to_string(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::Auth(AuthError::MissingToken) => "No token".to_string(),
            AppError::Auth(AuthError::InvalidToken) => "Invalid token".to_string(),
            AppError::NotFound => "Task not found".to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
