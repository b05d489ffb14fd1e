//! Request bodies for the authentication endpoints.
//!
//! Bodies that carry a password, PIN or OTP deliberately do not derive `Debug`.

use serde::Serialize;

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSchoolRequest {
    pub temp_token: String,
    pub org_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOrganizationRequest {
    pub org_id: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSchoolRequest {
    pub school_name: String,
    pub admin_full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_category: Option<String>,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub phone_number: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub phone_number: String,
    pub otp: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAdminOtpRequest {
    pub phone_number: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAdminOtpRequest {
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPortalIdRequest {
    pub portal_id: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPhoneRequest {
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendPhoneOtpRequest {
    pub phone_number: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPassPinRequest {
    pub pin: String,
    pub confirm_pin: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetPinRequest {
    pub phone_number: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPinRequest {
    pub otp: String,
    pub pin: String,
    pub confirm_pin: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_is_camel_case() {
        let body = serde_json::to_value(LoginRequest {
            phone_number: "08012345678".into(),
            password: "pw".into(),
        })
        .unwrap();

        assert_eq!(body["phoneNumber"], "08012345678");
        assert_eq!(body["password"], "pw");
    }

    #[test]
    fn test_register_school_skips_absent_optionals() {
        let body = serde_json::to_value(RegisterSchoolRequest {
            school_name: "Greenfield High".into(),
            admin_full_name: "Ada Obi".into(),
            email: "ada@example.com".into(),
            phone_number: "08012345678".into(),
            password: "pw".into(),
            school_type: None,
            organization_category: Some("private".into()),
        })
        .unwrap();

        assert!(body.get("schoolType").is_none());
        assert_eq!(body["organizationCategory"], "private");
    }
}
