use serde::{Deserialize, Serialize};

/// Identity of the authenticated actor, as carried in the session token.
///
/// Immutable once decoded; replaced wholesale on re-login or org switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub id: String,

    #[serde(default)]
    pub full_name: String,

    /// Role name (e.g., "admin", "bursar", "teacher")
    #[serde(default)]
    pub role: String,

    /// Granted permission identifiers (e.g., "payments.read")
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Disabled accounts must never reach an authenticated session.
    #[serde(default)]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// One tenant (school) the user may act within.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgClaims {
    pub id: String,

    #[serde(default)]
    pub organization_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_category: Option<String>,

    /// e.g., "primary", "secondary", "tertiary"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Full claim set decoded from a bearer session token.
///
/// The payload is flat: user fields sit next to `orgs` and `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub principal: UserClaims,

    /// Organizations the principal belongs to (may be empty)
    #[serde(default)]
    pub orgs: Vec<OrgClaims>,

    /// Token expiration (Unix timestamp, seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Token issued at (Unix timestamp, seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl SessionClaims {
    /// A token without `exp` never expires on the client side.
    pub fn is_expired_at(&self, now_epoch_seconds: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_epoch_seconds)
    }

    /// Finds an organization by id in the decoded membership list.
    pub fn org(&self, org_id: &str) -> Option<&OrgClaims> {
        self.orgs.iter().find(|org| org.id == org_id)
    }
}
