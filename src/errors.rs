//! Unified application error type.
//! Store, backend, export and CLI code all return AppError so failures
//! can be reported to the user in one place.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO / serialization
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ---------------------------
    // Backend failures
    // ---------------------------
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ---------------------------
    // Logic errors
    // ---------------------------
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Partial failure: {} of {} operations failed ({})", failed.len(), failed.len() + succeeded, failed.join(", "))]
    PartialFailure { failed: Vec<String>, succeeded: usize },

    #[error("Unknown bay: {0}")]
    UnknownBay(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),
}

impl AppError {
    /// Wrap any backend-side failure as `BackendUnavailable`.
    pub fn backend<E: std::fmt::Display>(e: E) -> Self {
        AppError::BackendUnavailable(e.to_string())
    }

    /// Message shown to the operator when an action fails.
    pub fn user_message(&self) -> String {
        match self {
            AppError::PermissionDenied(_) => {
                "Permission denied. Please check the database access rules.".to_string()
            }
            AppError::BackendUnavailable(_) | AppError::Db(_) => {
                "The database is not reachable right now. Please try again.".to_string()
            }
            AppError::InvalidState(msg) => format!("Cannot do that: {msg}"),
            AppError::PartialFailure { failed, .. } => format!(
                "Operation failed for {}. Some bays may already have been updated; please try again.",
                failed.join(", ")
            ),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
