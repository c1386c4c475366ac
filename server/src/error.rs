use ntex::http::StatusCode;
use ntex::web::{HttpResponse, WebResponseError};
use thiserror::Error;

/// Why a submitted tuple or score was refused before touching the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown course: {0}")]
    UnknownCourse(String),
    #[error("unknown variant {variant} for course {course}")]
    UnknownVariant { course: String, variant: String },
    #[error("submitter name must be 1-{max} characters")]
    BadSubmitter { max: usize },
    #[error("score must be a positive integer, got {0}")]
    NonPositiveScore(i64),
    #[error("score must be at most {max}, got {score}")]
    ScoreTooLarge { score: i64, max: i64 },
}

/// Failure writing or reading the durable record.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed leaderboard document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<InvalidInput> for AppError {
    fn from(e: InvalidInput) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl WebResponseError for AppError {
    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.as_str()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
        };
        HttpResponse::build(status).json(&serde_json::json!({ "error": message }))
    }
}
