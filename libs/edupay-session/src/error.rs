use edupay_types::{ErrorCode, TokenError};
use thiserror::Error;

/// Fixed copy shown when a disabled account tries to sign in.
pub const DISABLED_ACCOUNT_MESSAGE: &str =
    "Your account has been disabled. Please contact support for assistance.";

/// Fixed copy shown when the stored session is no longer valid.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Fallback copy for failures without a usable server message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Failures of the request client.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The backend rejected the credential (HTTP 401).
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("no message"))]
    Unauthorized { message: Option<String> },

    /// Any other non-success status.
    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// Network error (only with `client` feature)
    #[cfg(feature = "client")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be read as the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Invalid request path: {0}")]
    InvalidPath(String),
}

impl TransportError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Server-supplied message, if the backend sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Session Store failures. Reads never fail; only writes report errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to serialize entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to persist cookies: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything a session operation can fail with.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed or unparseable token.
    #[error("Invalid session token: {0}")]
    Decode(String),

    #[error("Session has expired")]
    Expired,

    #[error("Account is disabled")]
    DisabledAccount,

    /// A response matched none of the expected shapes.
    #[error("Unexpected response: {0}")]
    ContractViolation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("No organization selection is pending")]
    NoPendingSelection,

    #[error("Organization {requested} is not part of the session")]
    OrganizationMismatch { requested: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TokenError> for SessionError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => SessionError::Expired,
            TokenError::Disabled => SessionError::DisabledAccount,
            other => SessionError::Decode(other.to_string()),
        }
    }
}

impl SessionError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_unauthorized())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Decode(_) | Self::Expired => ErrorCode::SessionExpired,
            Self::DisabledAccount => ErrorCode::AccountDisabled,
            Self::ContractViolation(_) => ErrorCode::ContractViolation,
            Self::Transport(TransportError::Unauthorized { .. }) => ErrorCode::Unauthorized,
            Self::Transport(TransportError::Status { status: 404, .. }) => ErrorCode::NotFound,
            Self::Transport(TransportError::Status { status: 400..=499, .. }) => {
                ErrorCode::InvalidCredentials
            }
            Self::NoPendingSelection | Self::NotAuthenticated => ErrorCode::Unauthorized,
            Self::OrganizationMismatch { .. } => ErrorCode::NotFound,
            Self::Transport(_) | Self::Store(_) => ErrorCode::InternalError,
        }
    }

    /// Human message for the reducer's `error` field and notifications.
    ///
    /// Disabled and expired sessions use fixed copy; backend text is passed
    /// through only for transport failures that carry one.
    pub fn user_message(&self) -> String {
        match self {
            Self::DisabledAccount => DISABLED_ACCOUNT_MESSAGE.to_string(),
            Self::Expired | Self::Decode(_) => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::Transport(e) => e
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            Self::NoPendingSelection => {
                "Your sign-in has timed out. Please log in again.".to_string()
            }
            Self::OrganizationMismatch { .. } => {
                "Could not switch to the selected school. Please try again.".to_string()
            }
            Self::NotAuthenticated => "Please log in to continue.".to_string(),
            Self::ContractViolation(_) | Self::Store(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_map_to_taxonomy() {
        assert!(matches!(SessionError::from(TokenError::Expired), SessionError::Expired));
        assert!(matches!(
            SessionError::from(TokenError::Disabled),
            SessionError::DisabledAccount
        ));
        assert!(matches!(
            SessionError::from(TokenError::InvalidFormat("x".into())),
            SessionError::Decode(_)
        ));
    }

    #[test]
    fn test_user_message_uses_fixed_copy_for_disabled() {
        assert_eq!(SessionError::DisabledAccount.user_message(), DISABLED_ACCOUNT_MESSAGE);
        assert_eq!(SessionError::Expired.user_message(), SESSION_EXPIRED_MESSAGE);
    }

    #[test]
    fn test_user_message_passes_server_text_through() {
        let err = SessionError::from(TransportError::Status {
            status: 400,
            message: Some("Invalid phone number or password".into()),
        });
        assert_eq!(err.user_message(), "Invalid phone number or password");
        assert_eq!(err.code(), ErrorCode::InvalidCredentials);

        let bare = SessionError::from(TransportError::Status { status: 502, message: None });
        assert_eq!(bare.user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(bare.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_is_unauthorized() {
        let err = SessionError::from(TransportError::Unauthorized { message: None });
        assert!(err.is_unauthorized());
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert!(!SessionError::Expired.is_unauthorized());
    }
}
