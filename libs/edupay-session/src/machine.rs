//! Authentication state and its transition table.
//!
//! ```text
//!            Booting ──LOGIN_SUCCESS──────────────► Authenticated
//!               │                                      ▲   │
//!               └──LOGOUT──► Unauthenticated ◄─LOGOUT──┼───┘
//!                               │      ▲               │
//!              LOGIN_TEMP_SUCCESS      LOGIN_FAILURE   │ SCHOOL_SELECTED
//!                               ▼      │               │
//!                          AwaitingOrgSelection ───────┘
//! ```
//!
//! `is_loading` overlays every phase. [`SessionState::reduce`] is the only way
//! to produce a new state.

use edupay_types::{OrgClaims, UserClaims};
use serde::Serialize;

use crate::permissions::{RequiredPermissions, has_permission};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<UserClaims>,
    pub schools: Vec<OrgClaims>,
    pub selected_school: Option<OrgClaims>,
    /// Present only while a multi-organization login awaits disambiguation.
    pub temp_token: Option<String>,
    pub error: Option<String>,
    /// False until the first bootstrap transition has been applied.
    pub bootstrapped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    LoginStart,
    LoginSuccess { user: UserClaims, schools: Vec<OrgClaims>, token: String },
    LoginTempSuccess { schools: Vec<OrgClaims>, temp_token: String },
    SchoolSelected {
        user: UserClaims,
        schools: Vec<OrgClaims>,
        selected_school: OrgClaims,
        token: String,
    },
    LoginFailure { message: String },
    Logout,
    ClearError,
    SetLoading(bool),
}

impl SessionAction {
    /// Bearer token committed by this action, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::LoginSuccess { token, .. } | Self::SchoolSelected { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginStart => "LOGIN_START",
            Self::LoginSuccess { .. } => "LOGIN_SUCCESS",
            Self::LoginTempSuccess { .. } => "LOGIN_TEMP_SUCCESS",
            Self::SchoolSelected { .. } => "SCHOOL_SELECTED",
            Self::LoginFailure { .. } => "LOGIN_FAILURE",
            Self::Logout => "LOGOUT",
            Self::ClearError => "CLEAR_ERROR",
            Self::SetLoading(_) => "SET_LOADING",
        }
    }
}

/// Phase derived from a [`SessionState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase<'a> {
    Booting,
    Unauthenticated,
    AwaitingOrgSelection { temp_token: &'a str, schools: &'a [OrgClaims] },
    Authenticated {
        user: &'a UserClaims,
        schools: &'a [OrgClaims],
        selected_school: Option<&'a OrgClaims>,
    },
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

impl SessionState {
    /// State at process start: unauthenticated and loading.
    pub fn initial() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
            schools: Vec::new(),
            selected_school: None,
            temp_token: None,
            error: None,
            bootstrapped: false,
        }
    }

    fn signed_out() -> Self {
        Self { is_loading: false, bootstrapped: true, ..Self::initial() }
    }

    /// Apply one action. Pure: no I/O, no clock.
    pub fn reduce(self, action: SessionAction) -> Self {
        match action {
            SessionAction::LoginStart => Self { is_loading: true, error: None, ..self },

            SessionAction::LoginSuccess { user, schools, .. } => {
                let selected_school = schools.first().cloned();
                Self {
                    is_authenticated: true,
                    is_loading: false,
                    user: Some(user),
                    schools,
                    selected_school,
                    temp_token: None,
                    error: None,
                    bootstrapped: true,
                }
            }

            SessionAction::LoginTempSuccess { schools, temp_token } => Self {
                is_authenticated: false,
                is_loading: false,
                user: None,
                schools,
                selected_school: None,
                temp_token: Some(temp_token),
                error: None,
                bootstrapped: true,
            },

            SessionAction::SchoolSelected { user, schools, selected_school, .. } => {
                let selected_school = schools.contains(&selected_school).then_some(selected_school);
                Self {
                    is_authenticated: true,
                    is_loading: false,
                    user: Some(user),
                    schools,
                    selected_school,
                    temp_token: None,
                    error: None,
                    bootstrapped: true,
                }
            }

            SessionAction::LoginFailure { message } => Self {
                is_loading: false,
                error: Some(message),
                temp_token: None,
                bootstrapped: true,
                ..self
            },

            SessionAction::Logout => Self::signed_out(),

            SessionAction::ClearError => Self { error: None, ..self },

            SessionAction::SetLoading(is_loading) => Self { is_loading, ..self },
        }
    }

    pub fn phase(&self) -> SessionPhase<'_> {
        if let (true, Some(user)) = (self.is_authenticated, self.user.as_ref()) {
            return SessionPhase::Authenticated {
                user,
                schools: &self.schools,
                selected_school: self.selected_school.as_ref(),
            };
        }

        if let Some(temp_token) = self.temp_token.as_deref() {
            return SessionPhase::AwaitingOrgSelection { temp_token, schools: &self.schools };
        }

        if self.bootstrapped {
            SessionPhase::Unauthenticated
        } else {
            SessionPhase::Booting
        }
    }

    /// Whether the authenticated principal holds `required`.
    pub fn can(&self, required: impl Into<RequiredPermissions>) -> bool {
        match (&self.user, self.is_authenticated) {
            (Some(user), true) => has_permission(&user.permissions, required),
            _ => false,
        }
    }

    /// Checks the structural invariants every reachable state satisfies.
    pub fn invariants_hold(&self) -> bool {
        let auth_has_user = !self.is_authenticated || self.user.is_some();
        let temp_is_unauthenticated = self.temp_token.is_none() || !self.is_authenticated;
        let selected_is_member = self
            .selected_school
            .as_ref()
            .is_none_or(|selected| self.schools.contains(selected));

        auth_has_user && temp_is_unauthenticated && selected_is_member
    }
}
