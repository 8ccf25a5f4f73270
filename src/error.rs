use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("username is already taken")]
    DuplicateIdentity,
    #[error("incorrect username")]
    UnknownUser,
    #[error("wrong password")]
    WrongPassword,
    #[error("incorrect current password")]
    WrongCurrentPassword,
    #[error("user is not the owner of trip or trip doesn't exist")]
    NotOwnerOrMissing,
    #[error("missing at least one required parameter")]
    NoFieldsChanged,
    #[error("incorrect trip_id")]
    UnknownTrip,
    #[error("missing required parameter: {0}")]
    MissingParameter(String),
}

impl AppError {
    /// Stable identifier sent to clients next to the human readable message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Other(_) => "internal",
            AppError::DuplicateIdentity => "duplicate_identity",
            AppError::UnknownUser => "unknown_user",
            AppError::WrongPassword => "wrong_password",
            AppError::WrongCurrentPassword => "wrong_current_password",
            AppError::NotOwnerOrMissing => "not_owner_or_missing",
            AppError::NoFieldsChanged => "no_fields_changed",
            AppError::UnknownTrip => "unknown_trip",
            AppError::MissingParameter(_) => "missing_parameter",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Io(_)
                | AppError::Database(_)
                | AppError::Migration(_)
                | AppError::Other(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DuplicateIdentity | AppError::UnknownUser | AppError::UnknownTrip => {
                StatusCode::BAD_REQUEST
            }
            AppError::WrongPassword => StatusCode::UNAUTHORIZED,
            AppError::WrongCurrentPassword | AppError::NotOwnerOrMissing => StatusCode::FORBIDDEN,
            AppError::NoFieldsChanged | AppError::MissingParameter(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };

        // Internal details stay in the log, never in the response body.
        let message = if self.is_internal() {
            error!("request failed: {self:?}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": self.code(), "message": message }))).into_response()
    }
}
