//! Shared types for EduPay session handling.
//!
//! This crate provides:
//! - Session token claims (`SessionClaims`, `UserClaims`, `OrgClaims`)
//! - The token codec (`decode_session_token`, `resolve_session`, `encode_session_token`)
//! - Request and response bodies of the authentication endpoints
//! - Error types shared by the SDK

mod claims;
mod codec;
mod errors;
pub mod requests;
mod responses;

pub use claims::{OrgClaims, SessionClaims, UserClaims};
pub use codec::{decode_session_token, encode_session_token, resolve_session};
pub use errors::{ErrorCode, TokenError, TokenResult};
pub use responses::{AckResponse, LoginResponse, SelectSchoolResponse, SwitchOrganizationResponse};
