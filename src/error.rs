use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub const INVALID_NAME: &str = "Name must be a valid string!";
pub const PERSON_NOT_FOUND: &str = "Person with this id/name could not be located.";
pub const DUPLICATE_NAME: &str = "A person with that name already exists!";

pub type AppResult<T> = Result<T, PersonError>;

#[derive(Debug, Error)]
pub enum PersonError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl PersonError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound(PERSON_NOT_FOUND.to_string())
    }

    pub fn duplicate_name() -> Self {
        Self::Conflict(DUPLICATE_NAME.to_string())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicate names are reported as a plain bad request, not 409.
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn description(self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::Conflict(msg) => msg,
            Self::Storage(_) => "storage operation failed".to_string(),
        }
    }
}

impl From<sqlx::Error> for PersonError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::duplicate_name(),
            _ => Self::Storage(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for PersonError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Storage(format!("migration failed: {err}"))
    }
}

impl From<JsonRejection> for PersonError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: u16,
    status: String,
    description: String,
}

impl IntoResponse for PersonError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Self::Storage(detail) = &self {
            tracing::error!(error = %detail, "person store failure");
        }

        let body = ErrorBody {
            code: status.as_u16(),
            status: status.canonical_reason().unwrap_or("Unknown").to_string(),
            description: self.description(),
        };

        (status, Json(body)).into_response()
    }
}
