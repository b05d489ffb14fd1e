use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes surfaced by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidCredentials,
    Unauthorized,
    AccountDisabled,
    SessionExpired,
    ContractViolation,
    NotFound,
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::ContractViolation => "CONTRACT_VIOLATION",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Session token errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    #[error("Token has expired")]
    Expired,

    #[error("Account is disabled")]
    Disabled,

    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    #[error("JWT library error: {0}")]
    Library(#[from] jsonwebtoken::errors::Error),
}

pub type TokenResult<T> = Result<T, TokenError>;
