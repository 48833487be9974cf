//! Errors surfaced by the recommendation and transaction engine.

use serde::Serialize;
use thiserror::Error;

use crate::db::models::Medicine;

/// Details of a purchase rejected for lack of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockShortage {
    pub medicine_id: i64,
    pub name: String,
    pub available: i64,
    pub requested: i64,
    /// Medicines with the same `uses`, offered in place of the exhausted one.
    pub substitutes: Vec<Medicine>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Only {} units of '{}' are available!", .0.available, .0.name)]
    InsufficientStock(Box<StockShortage>),

    #[error("storage error: {0}")]
    Storage(#[source] sqlx::Error),
}

impl From<sqlx::Error> for ServiceError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage(error)
    }
}

impl ServiceError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn medicine_not_found(medicine_id: i64) -> Self {
        Self::NotFound(format!("Medicine {} not found", medicine_id))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InsufficientStock(_) => ErrorKind::InsufficientStock,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Only storage failures are worth retrying; every other kind needs different input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InsufficientStock,
    Storage,
}

/// Data-only error payload for transports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortage: Option<StockShortage>,
}

impl From<&ServiceError> for ErrorBody {
    fn from(error: &ServiceError) -> Self {
        let shortage = match error {
            ServiceError::InsufficientStock(shortage) => Some(shortage.as_ref().clone()),
            _ => None,
        };

        Self {
            kind: error.kind(),
            message: error.to_string(),
            shortage,
        }
    }
}
