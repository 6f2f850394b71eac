// src/error.rs

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::models::{OrderStatus, UnknownVariant};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("You cannot start a chat with yourself")]
    InvalidParticipant,

    /// The viewer is not one of the chat's two members. Reported like a
    /// missing chat so callers cannot probe other users' threads.
    #[error("Chat not found")]
    NotParticipant,

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("Milestone needs {required} points, you have {available}")]
    InsufficientPoints { required: i32, available: i32 },

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("no free order number after repeated attempts")]
    OrderNumberExhausted,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored value error: {0}")]
    StoredValue(#[from] UnknownVariant),

    #[error("password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Failure classes a client can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    NotFound,
    StateConflict,
    Unauthorized,
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Validation(_)
            | AppError::EmptyCart
            | AppError::EmptyMessage
            | AppError::InvalidParticipant => ErrorClass::Validation,
            AppError::NotFound(_) | AppError::NotParticipant => ErrorClass::NotFound,
            AppError::InvalidTransition { .. }
            | AppError::AlreadyExists(_)
            | AppError::InsufficientPoints { .. } => ErrorClass::StateConflict,
            AppError::Unauthorized(_) => ErrorClass::Unauthorized,
            AppError::OrderNumberExhausted
            | AppError::Database(_)
            | AppError::StoredValue(_)
            | AppError::PasswordHash(_)
            | AppError::Token(_) => ErrorClass::Internal,
        }
    }

    /// Message safe to hand to the client. Internal details stay in the log.
    pub fn client_message(&self) -> String {
        match self.class() {
            ErrorClass::Internal => "Something went wrong, please try again".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.class() {
            ErrorClass::Validation => StatusCode::BAD_REQUEST,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            // Conflicts are an ordinary outcome for these endpoints: the
            // envelope's `success: false` carries them.
            ErrorClass::StateConflict => StatusCode::OK,
            ErrorClass::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.class() == ErrorClass::Internal {
            log::error!("request failed: {self}");
        }

        HttpResponse::build(self.status_code()).json(ErrorEnvelope {
            success: false,
            message: self.client_message(),
        })
    }
}

/// Keeps malformed or incomplete JSON bodies inside the same envelope as
/// every other failure.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid request body: {err}")).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid query parameters: {err}")).into()
}

/// A path segment that does not parse (`/orders/abc/`) is a bad request, not
/// a missing route.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid path: {err}")).into()
}
