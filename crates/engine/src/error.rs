//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`DomainViolation`] thrown when a business rule rejects an operation.
//! - [`KeyNotFound`] thrown when an item are not found.
//!
//!  [`DomainViolation`]: EngineError::DomainViolation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
///
/// Every rejected business rule is a [`DomainViolation`] carrying the message
/// key the UI layer resolves through [`MessageSource`], plus the formatted
/// arguments for the `{0}`-style placeholders of the message template.
///
/// [`DomainViolation`]: EngineError::DomainViolation
/// [`MessageSource`]: crate::MessageSource
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("domain rule violated: {key}")]
    DomainViolation { key: String, args: Vec<String> },
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Credential error: {0}")]
    Credential(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// A domain violation without message arguments.
    pub fn violation(key: &str) -> Self {
        Self::DomainViolation {
            key: key.to_string(),
            args: Vec::new(),
        }
    }

    /// A domain violation whose message template takes arguments.
    pub fn violation_with(key: &str, args: Vec<String>) -> Self {
        Self::DomainViolation {
            key: key.to_string(),
            args,
        }
    }

    /// The message key when the error is a domain violation.
    pub fn violation_key(&self) -> Option<&str> {
        match self {
            Self::DomainViolation { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::DomainViolation { key: a, args: x },
                Self::DomainViolation { key: b, args: y },
            ) => a == b && x == y,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidValue(a), Self::InvalidValue(b)) => a == b,
            (Self::Credential(a), Self::Credential(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
