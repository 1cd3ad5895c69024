use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Ticket {0} not found")]
    TicketNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("SLA {0} not found")]
    SlaNotFound(Uuid),

    #[error("Notification {0} not found")]
    NotificationNotFound(Uuid),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ServiceError {
    pub fn forbidden() -> Self {
        ServiceError::Forbidden(ErrorMessage::PermissionDenied.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::TicketNotFound(_)
            | ServiceError::UserNotFound(_)
            | ServiceError::SlaNotFound(_)
            | ServiceError::NotificationNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Conflict(_) => StatusCode::CONFLICT,

            ServiceError::Database(_) | ServiceError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        let message = match &error {
            ServiceError::TicketNotFound(_) => ErrorMessage::TicketNotFound.to_string(),
            ServiceError::UserNotFound(_) => ErrorMessage::UserNotFound.to_string(),
            ServiceError::SlaNotFound(_) => ErrorMessage::SlaNotFound.to_string(),
            ServiceError::NotificationNotFound(_) => ErrorMessage::NotificationNotFound.to_string(),
            ServiceError::Database(e) => {
                tracing::error!("database error: {}", e);
                error.to_string()
            }
            _ => error.to_string(),
        };

        HttpError::new(message, status)
    }
}

/// Maps unique-key violations to `Conflict` and everything else to `Database`.
pub fn conflict_on_unique(error: sqlx::Error, message: ErrorMessage) -> ServiceError {
    match &error {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ServiceError::Conflict(message.to_string())
        }
        _ => ServiceError::Database(error),
    }
}

impl From<ErrorMessage> for ServiceError {
    fn from(err: ErrorMessage) -> Self {
        ServiceError::Other(err.to_string())
    }
}
