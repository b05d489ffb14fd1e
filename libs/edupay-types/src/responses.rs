use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{OrgClaims, UserClaims};

/// Response of `POST /auth/login`.
///
/// Carries either a session `token` (single organization) or a `tempToken`
/// plus the candidate `orgs` when the account maps to several organizations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub temp_token: Option<String>,

    #[serde(default)]
    pub orgs: Option<Vec<OrgClaims>>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /auth/select-school`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSchoolResponse {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub user: Option<UserClaims>,

    #[serde(default)]
    pub orgs: Option<Vec<OrgClaims>>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /auth/switch-organization`.
///
/// The backend either rotates the token or keeps the current one valid and
/// switches context server-side, answering with a status/message only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOrganizationResponse {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub user: Option<UserClaims>,

    #[serde(default)]
    pub orgs: Option<Vec<OrgClaims>>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl SwitchOrganizationResponse {
    /// Whether the response signals success by the status/message convention.
    pub fn signals_success(&self) -> bool {
        let status_ok = self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("success"));
        let message_ok = self
            .message
            .as_deref()
            .is_some_and(|m| m.to_ascii_lowercase().contains("switched successfully"));
        status_ok || message_ok
    }
}

/// Generic acknowledgement returned by OTP, PIN, password and registration
/// endpoints. Anything beyond `status`/`message` is kept in `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(flatten)]
    pub data: Map<String, Value>,
}
