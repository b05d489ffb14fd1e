//! Stateless session-lifecycle calls against the backend.
//!
//! Each call is one request/response pair. Transport failures propagate
//! unchanged (no retry, no recovery); raw bodies are translated into the
//! canonical outcomes the controller commits.

use std::sync::Arc;

use edupay_types::requests::{
    ForgetPinRequest, ForgotPasswordRequest, LoginRequest, RegisterSchoolRequest,
    ResendPhoneOtpRequest, ResetPasswordRequest, ResetPinRequest, SelectSchoolRequest,
    SendAdminOtpRequest, SetPassPinRequest, SwitchOrganizationRequest, VerifyAdminOtpRequest,
    VerifyEmailRequest, VerifyPhoneRequest, VerifyPortalIdRequest,
};
use edupay_types::{
    AckResponse, LoginResponse, OrgClaims, SelectSchoolResponse, SwitchOrganizationResponse,
    UserClaims,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{SessionError, SessionResult};
use crate::transport::Transport;

pub mod paths {
    pub const LOGIN: &str = "/auth/login";
    pub const SELECT_SCHOOL: &str = "/auth/select-school";
    pub const SWITCH_ORGANIZATION: &str = "/auth/switch-organization";
    pub const LOGOUT: &str = "/auth/logout";
    pub const REGISTER_SCHOOL: &str = "/auth/register-school";
    pub const VERIFY_EMAIL: &str = "/auth/verify-email";
    pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
    pub const RESET_PASSWORD: &str = "/auth/reset-password";
    pub const SEND_ADMIN_OTP: &str = "/auth/admin/send-otp";
    pub const VERIFY_ADMIN_OTP: &str = "/auth/admin/verify-otp";
    pub const VERIFY_PORTAL_ID: &str = "/auth/verify-portal-id";
    pub const VERIFY_PHONE: &str = "/auth/verify-phone";
    pub const RESEND_PHONE_OTP: &str = "/auth/resend-phone-otp";
    pub const SET_PASS_PIN: &str = "/auth/set-pin";
    pub const FORGET_PIN: &str = "/auth/forget-pin";
    pub const RESET_PIN: &str = "/auth/reset-pin";
}

/// Result of a password login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The account maps to exactly one organization.
    Session { token: String },
    /// Several organizations: the user must pick one with the temp token.
    PendingSelection { temp_token: String, orgs: Vec<OrgClaims> },
}

/// Result of committing a pending multi-organization login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedSession {
    pub token: String,
    pub user: Option<UserClaims>,
    pub orgs: Option<Vec<OrgClaims>>,
}

/// Result of switching the active organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The backend issued a new token.
    Rotated { token: String },
    /// The backend switched context server-side; the current token stays valid.
    ContextSwitched { message: Option<String> },
}

#[derive(Clone)]
pub struct AuthService {
    transport: Arc<dyn Transport>,
}

impl AuthService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Attach or detach the bearer credential on the underlying transport.
    pub fn set_token(&self, token: Option<&str>) {
        self.transport.set_token(token);
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, phone_number: &str, password: &str) -> SessionResult<LoginOutcome> {
        let request = LoginRequest {
            phone_number: phone_number.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post(paths::LOGIN, &request).await?;

        match response {
            LoginResponse { temp_token: Some(temp_token), orgs: Some(orgs), .. } => {
                debug!(orgs = orgs.len(), "Login requires organization selection");
                Ok(LoginOutcome::PendingSelection { temp_token, orgs })
            }
            LoginResponse { token: Some(token), .. } => Ok(LoginOutcome::Session { token }),
            _ => Err(SessionError::ContractViolation(
                "login response carries neither a token nor a temp token".into(),
            )),
        }
    }

    #[instrument(skip(self, temp_token))]
    pub async fn select_school(&self, temp_token: &str, org_id: &str) -> SessionResult<SelectedSession> {
        let request = SelectSchoolRequest {
            temp_token: temp_token.to_string(),
            org_id: org_id.to_string(),
        };
        let response: SelectSchoolResponse = self.post(paths::SELECT_SCHOOL, &request).await?;

        let token = response.token.ok_or_else(|| {
            SessionError::ContractViolation("select-school response carries no token".into())
        })?;

        Ok(SelectedSession { token, user: response.user, orgs: response.orgs })
    }

    #[instrument(skip(self))]
    pub async fn switch_organization(&self, org_id: &str) -> SessionResult<SwitchOutcome> {
        let request = SwitchOrganizationRequest { org_id: org_id.to_string() };
        let response: SwitchOrganizationResponse =
            self.post(paths::SWITCH_ORGANIZATION, &request).await?;

        if let Some(token) = response.token.clone().filter(|t| !t.is_empty()) {
            return Ok(SwitchOutcome::Rotated { token });
        }

        if response.signals_success() {
            return Ok(SwitchOutcome::ContextSwitched { message: response.message });
        }

        Err(SessionError::ContractViolation(format!(
            "switch-organization response is neither a new token nor a success ({:?})",
            response.status
        )))
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> SessionResult<()> {
        self.transport.post(paths::LOGOUT, Value::Null).await?;
        Ok(())
    }

    pub async fn register_school(&self, request: &RegisterSchoolRequest) -> SessionResult<AckResponse> {
        self.post(paths::REGISTER_SCHOOL, request).await
    }

    pub async fn verify_email(&self, request: &VerifyEmailRequest) -> SessionResult<AckResponse> {
        self.post(paths::VERIFY_EMAIL, request).await
    }

    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> SessionResult<AckResponse> {
        self.post(paths::FORGOT_PASSWORD, request).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> SessionResult<AckResponse> {
        self.post(paths::RESET_PASSWORD, request).await
    }

    pub async fn send_admin_otp(&self, request: &SendAdminOtpRequest) -> SessionResult<AckResponse> {
        self.post(paths::SEND_ADMIN_OTP, request).await
    }

    pub async fn verify_admin_otp(&self, request: &VerifyAdminOtpRequest) -> SessionResult<AckResponse> {
        self.post(paths::VERIFY_ADMIN_OTP, request).await
    }

    pub async fn verify_portal_id(&self, request: &VerifyPortalIdRequest) -> SessionResult<AckResponse> {
        self.post(paths::VERIFY_PORTAL_ID, request).await
    }

    pub async fn verify_phone(&self, request: &VerifyPhoneRequest) -> SessionResult<AckResponse> {
        self.post(paths::VERIFY_PHONE, request).await
    }

    pub async fn resend_phone_otp(&self, request: &ResendPhoneOtpRequest) -> SessionResult<AckResponse> {
        self.post(paths::RESEND_PHONE_OTP, request).await
    }

    pub async fn set_pass_pin(&self, request: &SetPassPinRequest) -> SessionResult<AckResponse> {
        self.post(paths::SET_PASS_PIN, request).await
    }

    pub async fn forget_pin(&self, request: &ForgetPinRequest) -> SessionResult<AckResponse> {
        self.post(paths::FORGET_PIN, request).await
    }

    pub async fn reset_pin(&self, request: &ResetPinRequest) -> SessionResult<AckResponse> {
        self.post(paths::RESET_PIN, request).await
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> SessionResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| SessionError::ContractViolation(format!("unserializable request: {e}")))?;
        let raw = self.transport.post(path, body).await?;

        // Endpoints without a body still acknowledge success.
        let raw = if raw.is_null() { Value::Object(Default::default()) } else { raw };

        serde_json::from_value(raw)
            .map_err(|e| SessionError::ContractViolation(format!("{path}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::test_utils::ScriptedTransport;
    use serde_json::json;

    fn service(transport: &Arc<ScriptedTransport>) -> AuthService {
        AuthService::new(transport.clone())
    }

    #[tokio::test]
    async fn test_login_single_org_yields_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(paths::LOGIN, Ok(json!({"token": "T1"})));

        let outcome = service(&transport).login("0801", "pw").await.unwrap();

        assert_eq!(outcome, LoginOutcome::Session { token: "T1".into() });
        let sent = transport.last_body(paths::LOGIN).unwrap();
        assert_eq!(sent["phoneNumber"], "0801");
    }

    #[tokio::test]
    async fn test_login_multi_org_yields_pending_selection() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            paths::LOGIN,
            Ok(json!({"tempToken": "TMP", "orgs": [{"id": "A"}, {"id": "B"}]})),
        );

        let outcome = service(&transport).login("0801", "pw").await.unwrap();

        match outcome {
            LoginOutcome::PendingSelection { temp_token, orgs } => {
                assert_eq!(temp_token, "TMP");
                assert_eq!(orgs.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(), ["A", "B"]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_unknown_shape_is_contract_violation() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(paths::LOGIN, Ok(json!({"status": "ok"})));

        let err = service(&transport).login("0801", "pw").await.unwrap_err();

        assert!(matches!(err, SessionError::ContractViolation(_)));
    }

    #[tokio::test]
    async fn test_transport_error_propagates_unchanged() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            paths::LOGIN,
            Err(TransportError::Status { status: 400, message: Some("Wrong password".into()) }),
        );

        let err = service(&transport).login("0801", "bad").await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Transport(TransportError::Status { status: 400, .. })
        ));
        assert_eq!(transport.calls(paths::LOGIN), 1);
    }

    #[tokio::test]
    async fn test_switch_outcomes() {
        let transport = Arc::new(ScriptedTransport::new());
        let service = service(&transport);

        transport.respond(paths::SWITCH_ORGANIZATION, Ok(json!({"token": "T9"})));
        assert_eq!(
            service.switch_organization("C").await.unwrap(),
            SwitchOutcome::Rotated { token: "T9".into() }
        );

        transport.respond(
            paths::SWITCH_ORGANIZATION,
            Ok(json!({"status": "success", "message": "Account switched successfully"})),
        );
        assert!(matches!(
            service.switch_organization("C").await.unwrap(),
            SwitchOutcome::ContextSwitched { .. }
        ));

        transport.respond(paths::SWITCH_ORGANIZATION, Ok(json!({"status": "pending"})));
        assert!(matches!(
            service.switch_organization("C").await,
            Err(SessionError::ContractViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_select_school_requires_token() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(paths::SELECT_SCHOOL, Ok(json!({"message": "ok"})));

        let err = service(&transport).select_school("TMP", "B").await.unwrap_err();

        assert!(matches!(err, SessionError::ContractViolation(_)));
        let sent = transport.last_body(paths::SELECT_SCHOOL).unwrap();
        assert_eq!(sent, json!({"tempToken": "TMP", "orgId": "B"}));
    }

    #[tokio::test]
    async fn test_ack_endpoint_tolerates_empty_body() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(paths::RESEND_PHONE_OTP, Ok(Value::Null));

        let ack = service(&transport)
            .resend_phone_otp(&ResendPhoneOtpRequest { phone_number: "0801".into() })
            .await
            .unwrap();

        assert_eq!(ack, AckResponse::default());
    }
}
