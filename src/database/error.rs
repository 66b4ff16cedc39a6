use std::convert::Infallible;

use serde::Serialize;
use thiserror::Error;
use warp::{http::StatusCode, reject::Rejection, reply::Reply};

use super::validate::ValidationReport;

/// Request-level error taxonomy. Every fallible action in the crate resolves
/// to one of these; storage failures are translated here and never leak raw.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(ValidationReport),
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl Error {
    pub fn forbidden(info: &str) -> Self {
        Self::Forbidden(info.to_string())
    }

    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_string())
    }

    pub fn conflict(info: &str) -> Self {
        Self::Conflict(info.to_string())
    }

    /// Duplicate membership toggles surface as 400 to API consumers, the
    /// same way the other validation-class failures do.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e)
                if matches!(e.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Self::Conflict(String::from("Entry already exists"))
            }
            sqlx::Error::Database(e)
                if matches!(e.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
            {
                Self::NotFound(String::from("Referenced entity does not exist"))
            }
            sqlx::Error::RowNotFound => Self::NotFound(String::from("Row not found")),
            sqlx::Error::Database(e) => Self::Query(format!("{e}")),
            sqlx::Error::Io(e) => Self::Query(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::Query(format!("{e}")),
            sqlx::Error::ColumnNotFound(e) => Self::Query(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::Query(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::Query(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::Query(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::Query(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::Query(String::from("Worker crashed")),
            e => Self::Query(format!("{e}")),
        }
    }
}

impl warp::reject::Reject for Error {}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    details: Vec<String>,
}

/// Warp `recover` handler translating [`Error`] rejections into JSON replies.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = match err.find::<Error>() {
        Some(e) => {
            let details = match e {
                Error::Validation(report) => report.messages(),
                _ => vec![],
            };
            (
                e.status(),
                ErrorBody {
                    error: e.to_string(),
                    details,
                },
            )
        }
        None if err.is_not_found() => (
            StatusCode::NOT_FOUND,
            ErrorBody {
                error: String::from("Not found"),
                details: vec![],
            },
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody {
                error: String::from("Internal server error"),
                details: vec![],
            },
        ),
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&body),
        status,
    ))
}
