use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Amount mismatch")]
    AmountMismatch,

    #[error("Payment is already {0}. Cannot confirm.")]
    PaymentAlreadyFinalized(String),

    #[error("Insufficient points")]
    InsufficientPoints,

    #[error("Reward is out of stock")]
    OutOfStock,

    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    #[error("File size exceeds 10MB limit")]
    FileTooLarge,

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::Forbidden(msg) => {
                log::warn!("Forbidden: {msg}");
                (
                    actix_web::http::StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    msg.clone(),
                )
            }
            AppError::AmountMismatch => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "AMOUNT_MISMATCH",
                self.to_string(),
            ),
            AppError::PaymentAlreadyFinalized(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "PAYMENT_ALREADY_FINALIZED",
                self.to_string(),
            ),
            AppError::InsufficientPoints => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INSUFFICIENT_POINTS",
                self.to_string(),
            ),
            AppError::OutOfStock => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "OUT_OF_STOCK",
                self.to_string(),
            ),
            AppError::InvalidOrExpiredCode => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_CODE",
                self.to_string(),
            ),
            AppError::FileTooLarge => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "FILE_TOO_LARGE",
                self.to_string(),
            ),
            AppError::TooManyRequests(msg) => {
                log::warn!("Rate limited: {msg}");
                (
                    actix_web::http::StatusCode::TOO_MANY_REQUESTS,
                    "TOO_MANY_REQUESTS",
                    msg.clone(),
                )
            }
            AppError::DeliveryFailed(msg) => {
                log::error!("Delivery failed: {msg}");
                (
                    actix_web::http::StatusCode::BAD_GATEWAY,
                    "DELIVERY_FAILED",
                    msg.clone(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
