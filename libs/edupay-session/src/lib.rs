//! Client-side session lifecycle for EduPay.
//!
//! This crate owns everything between a password login and a signed-out
//! screen, without any UI of its own.
//!
//! # Features
//!
//! - **Session state machine** - Pure reducer over [`SessionState`] with derived [`SessionPhase`]
//! - **Local token decoding** - Claims, expiry and disabled checks without a network round-trip
//! - **Multi-organization login** - Temp-token selection and mid-session organization switching
//! - **Persistence** - Cookie-backed [`SessionStore`] with per-entry expiry
//! - **Centralized expiry handling** - One sign-out per burst of unauthorized responses
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use edupay_session::{
//!     AuthErrorBridge, AuthService, HttpTransport, SessionController, SessionExpiryHandler,
//!     SessionOptions, SessionStore, SystemClock, DEFAULT_COOLDOWN,
//! };
//!
//! let bridge = Arc::new(AuthErrorBridge::new());
//! let transport = Arc::new(HttpTransport::new(api_base_url, bridge.clone())?);
//! let clock = Arc::new(SystemClock);
//! let store = Arc::new(SessionStore::open(".edupay-session", &app_origin, clock.clone())?);
//!
//! let controller = Arc::new(SessionController::new(
//!     AuthService::new(transport),
//!     store,
//!     clock,
//!     navigator,
//!     notifier,
//!     SessionOptions::default(),
//! ));
//! let _registration = SessionExpiryHandler::register(&controller, &bridge, DEFAULT_COOLDOWN);
//!
//! controller.bootstrap();
//! controller.login("08012345678", "secret").await?;
//! ```

mod bridge;
mod clock;
mod controller;
mod error;
mod expiry;
mod machine;
mod permissions;
mod ports;
mod service;
mod store;
mod transport;

#[cfg(test)]
mod test_utils;

pub use bridge::{AuthErrorBridge, AuthErrorHandler, AuthErrorNotice, BridgeRegistration};
pub use clock::{Clock, SystemClock};
pub use controller::{LoginStep, SessionController, SessionOptions};
pub use error::{
    DISABLED_ACCOUNT_MESSAGE, GENERIC_FAILURE_MESSAGE, SESSION_EXPIRED_MESSAGE, SessionError,
    SessionResult, StoreError, StoreResult, TransportError, TransportResult,
};
pub use expiry::{DEFAULT_COOLDOWN, SessionExpiryHandler};
pub use machine::{SessionAction, SessionPhase, SessionState};
pub use permissions::{RequiredPermissions, has_permission};
pub use ports::{
    DASHBOARD, LOGIN, NavigateOptions, Navigator, Notifier, SCHOOL_SELECTION, is_public_route,
};
pub use service::{AuthService, LoginOutcome, SelectedSession, SwitchOutcome, paths};
pub use store::{SELECTED_SCHOOL_KEY, SessionStore, TOKEN_KEY};
pub use transport::{Transport, error_message};

#[cfg(feature = "client")]
pub use transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, HttpTransport};

// Re-export shared types for convenience
pub use edupay_types::{
    AckResponse, ErrorCode, OrgClaims, SessionClaims, TokenError, UserClaims, requests,
};
