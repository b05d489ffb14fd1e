//! Session lifecycle: bootstrap, login, organization selection and switching,
//! logout, and the auxiliary OTP/PIN/password flows.
//!
//! The controller is the only writer of [`SessionState`]. Every public
//! operation ends in a committed transition or a recorded `error`; failures are
//! also returned so callers can react, but they never leave `is_loading` set.

use std::future::Future;
use std::sync::Arc;

use edupay_types::requests::{
    ForgetPinRequest, ForgotPasswordRequest, RegisterSchoolRequest, ResendPhoneOtpRequest,
    ResetPasswordRequest, ResetPinRequest, SendAdminOtpRequest, SetPassPinRequest,
    VerifyAdminOtpRequest, VerifyEmailRequest, VerifyPhoneRequest, VerifyPortalIdRequest,
};
use edupay_types::{AckResponse, OrgClaims, SessionClaims, resolve_session};
use time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::error::{DISABLED_ACCOUNT_MESSAGE, SessionError, SessionResult};
use crate::machine::{SessionAction, SessionState};
use crate::ports::{DASHBOARD, LOGIN, NavigateOptions, Navigator, Notifier, SCHOOL_SELECTION, is_public_route};
use crate::service::{AuthService, LoginOutcome, SwitchOutcome};
use crate::store::{SELECTED_SCHOOL_KEY, SessionStore, TOKEN_KEY};

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Lifetime of the persisted bearer token entry.
    pub token_ttl: Duration,
    /// Lifetime of the persisted selected-school entry.
    pub selected_school_ttl: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { token_ttl: Duration::days(14), selected_school_ttl: Duration::days(14) }
    }
}

/// Where a successful password login leaves the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    Authenticated,
    /// Several organizations matched; call [`SessionController::select_school`].
    SelectSchool(Vec<OrgClaims>),
}

pub struct SessionController {
    service: AuthService,
    store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionState>,
    options: SessionOptions,
}

/// Clears `is_loading` when dropped, whatever path the operation took.
struct LoadingGuard<'a> {
    controller: &'a SessionController,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.controller.state.borrow().is_loading {
            self.controller.dispatch(SessionAction::SetLoading(false));
        }
    }
}

impl SessionController {
    pub fn new(
        service: AuthService,
        store: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self { service, store, clock, navigator, notifier, state, options }
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub(crate) fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Apply an action through the reducer.
    pub fn dispatch(&self, action: SessionAction) {
        debug!(action = action.name(), "Session transition");
        self.state.send_modify(|state| {
            *state = std::mem::take(state).reduce(action);
        });
    }

    pub fn clear_error(&self) {
        self.dispatch(SessionAction::ClearError);
    }

    // ========================================================================
    // Bootstrap
    // ========================================================================

    /// Restore a persisted session without any network round-trip.
    ///
    /// A missing, malformed, expired or disabled token leaves the session
    /// unauthenticated and is evicted from the store.
    #[instrument(skip(self))]
    pub fn bootstrap(&self) -> bool {
        let Some(token) = self.store.get::<String>(TOKEN_KEY) else {
            debug!("No persisted session");
            self.dispatch(SessionAction::Logout);
            self.redirect_after_bootstrap(false);
            return false;
        };

        let claims = match self.resolve(&token) {
            Ok(claims) => claims,
            Err(e) => {
                info!(error = %e, "Discarding persisted session");
                self.invalidate_local_session();
                self.redirect_after_bootstrap(false);
                return false;
            }
        };

        let remembered = self
            .store
            .get::<String>(SELECTED_SCHOOL_KEY)
            .and_then(|org_id| claims.org(&org_id).cloned());

        let SessionClaims { principal, orgs, .. } = claims;
        info!(user_id = %principal.id, orgs = orgs.len(), "Session restored");

        match remembered {
            Some(selected_school) => self.commit(SessionAction::SchoolSelected {
                user: principal,
                schools: orgs,
                selected_school,
                token,
            }),
            None => self.commit(SessionAction::LoginSuccess { user: principal, schools: orgs, token }),
        }

        self.redirect_after_bootstrap(true);
        true
    }

    fn redirect_after_bootstrap(&self, authenticated: bool) {
        let current = self.navigator.current_path();
        let on_public_route = is_public_route(&current);

        if authenticated && on_public_route && current != SCHOOL_SELECTION {
            self.navigator.navigate(DASHBOARD, NavigateOptions::replace());
        } else if !authenticated && !on_public_route {
            self.navigator.navigate(LOGIN, NavigateOptions::replace());
        }
    }

    // ========================================================================
    // Login and organization selection
    // ========================================================================

    #[instrument(skip(self, password))]
    pub async fn login(&self, phone_number: &str, password: &str) -> SessionResult<LoginStep> {
        self.dispatch(SessionAction::LoginStart);

        match self.try_login(phone_number, password).await {
            Ok(step) => Ok(step),
            Err(e) => Err(self.fail("Login failed", false, e)),
        }
    }

    async fn try_login(&self, phone_number: &str, password: &str) -> SessionResult<LoginStep> {
        match self.service.login(phone_number, password).await? {
            LoginOutcome::PendingSelection { temp_token, orgs } => {
                // A previous session must not survive into the selection step.
                self.forget_credentials();
                self.dispatch(SessionAction::LoginTempSuccess {
                    schools: orgs.clone(),
                    temp_token,
                });
                self.navigator.navigate(SCHOOL_SELECTION, NavigateOptions::default());
                Ok(LoginStep::SelectSchool(orgs))
            }
            LoginOutcome::Session { token } => {
                let SessionClaims { principal, orgs, .. } = self.resolve(&token)?;
                info!(user_id = %principal.id, "Login succeeded");

                self.commit(SessionAction::LoginSuccess { user: principal, schools: orgs, token });
                self.navigator.navigate(DASHBOARD, NavigateOptions::replace());
                Ok(LoginStep::Authenticated)
            }
        }
    }

    /// Commit a pending multi-organization login to `org_id`.
    #[instrument(skip(self))]
    pub async fn select_school(&self, org_id: &str) -> SessionResult<()> {
        self.dispatch(SessionAction::LoginStart);

        match self.try_select_school(org_id).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail("School selection failed", false, e)),
        }
    }

    async fn try_select_school(&self, org_id: &str) -> SessionResult<()> {
        let temp_token = self
            .state
            .borrow()
            .temp_token
            .clone()
            .ok_or(SessionError::NoPendingSelection)?;

        let selected = self.service.select_school(&temp_token, org_id).await?;
        if selected.user.as_ref().is_some_and(|user| user.disabled) {
            return Err(SessionError::DisabledAccount);
        }

        let SessionClaims { principal, orgs, .. } = self.resolve(&selected.token)?;
        let schools = if orgs.is_empty() { selected.orgs.unwrap_or_default() } else { orgs };
        let selected_school = find_org(&schools, org_id)?;
        info!(user_id = %principal.id, org_id, "School selected");

        self.commit(SessionAction::SchoolSelected {
            user: principal,
            schools,
            selected_school,
            token: selected.token,
        });
        self.navigator.navigate(DASHBOARD, NavigateOptions::replace());
        Ok(())
    }

    /// Change the active organization of an authenticated session.
    ///
    /// Handles both a rotated token and a server-side context switch that
    /// keeps the current token valid.
    #[instrument(skip(self))]
    pub async fn switch_organization(&self, org_id: &str) -> SessionResult<()> {
        if !self.state.borrow().is_authenticated {
            return Err(SessionError::NotAuthenticated);
        }

        self.dispatch(SessionAction::LoginStart);
        let _loading = LoadingGuard { controller: self };

        match self.try_switch_organization(org_id).await {
            Ok(name) => {
                self.notifier
                    .show_success("School switched", &format!("You are now working in {name}."));
                Ok(())
            }
            Err(SessionError::DisabledAccount) => {
                self.invalidate_local_session();
                let err = self.fail("Could not switch school", false, SessionError::DisabledAccount);
                self.navigator.navigate(LOGIN, NavigateOptions::replace());
                Err(err)
            }
            Err(e) => Err(self.fail("Could not switch school", true, e)),
        }
    }

    async fn try_switch_organization(&self, org_id: &str) -> SessionResult<String> {
        let token = match self.service.switch_organization(org_id).await? {
            SwitchOutcome::Rotated { token } => token,
            SwitchOutcome::ContextSwitched { message } => {
                debug!(?message, "Organization switched server-side; reusing current token");
                self.store.get::<String>(TOKEN_KEY).ok_or(SessionError::Expired)?
            }
        };

        let SessionClaims { principal, orgs, .. } = self.resolve(&token)?;
        let selected_school = find_org(&orgs, org_id)?;
        let name = selected_school.organization_name.clone();
        info!(user_id = %principal.id, org_id, "Organization switched");

        self.commit(SessionAction::SchoolSelected {
            user: principal,
            schools: orgs,
            selected_school,
            token,
        });
        Ok(name)
    }

    // ========================================================================
    // Logout
    // ========================================================================

    /// Sign out. The remote call is best-effort; local state is always cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.end_session().await;
        self.navigator.navigate(LOGIN, NavigateOptions::replace());
    }

    /// Remote logout (best-effort) followed by a local reset, without navigation.
    pub(crate) async fn end_session(&self) {
        if let Err(e) = self.service.logout().await {
            warn!(error = %e, "Remote logout failed; clearing local session anyway");
        }
        self.invalidate_local_session();
    }

    fn invalidate_local_session(&self) {
        self.forget_credentials();
        self.dispatch(SessionAction::Logout);
    }

    /// Drop the persisted and attached credential without touching the reducer.
    fn forget_credentials(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(SELECTED_SCHOOL_KEY);
        self.service.set_token(None);
    }

    // ========================================================================
    // Auxiliary flows
    // ========================================================================

    pub async fn register_school(&self, request: &RegisterSchoolRequest) -> SessionResult<AckResponse> {
        self.run_flow("Registration", self.service.register_school(request)).await
    }

    pub async fn verify_email(&self, request: &VerifyEmailRequest) -> SessionResult<AckResponse> {
        self.run_flow("Email verification", self.service.verify_email(request)).await
    }

    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> SessionResult<AckResponse> {
        self.run_flow("Password recovery", self.service.forgot_password(request)).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> SessionResult<AckResponse> {
        self.run_flow("Password reset", self.service.reset_password(request)).await
    }

    pub async fn send_admin_otp(&self, request: &SendAdminOtpRequest) -> SessionResult<AckResponse> {
        self.run_flow("Verification code", self.service.send_admin_otp(request)).await
    }

    pub async fn verify_admin_otp(&self, request: &VerifyAdminOtpRequest) -> SessionResult<AckResponse> {
        self.run_flow("Code verification", self.service.verify_admin_otp(request)).await
    }

    pub async fn verify_portal_id(&self, request: &VerifyPortalIdRequest) -> SessionResult<AckResponse> {
        self.run_flow("Portal ID verification", self.service.verify_portal_id(request)).await
    }

    pub async fn verify_phone(&self, request: &VerifyPhoneRequest) -> SessionResult<AckResponse> {
        self.run_flow("Phone verification", self.service.verify_phone(request)).await
    }

    pub async fn resend_phone_otp(&self, request: &ResendPhoneOtpRequest) -> SessionResult<AckResponse> {
        self.run_flow("Verification code", self.service.resend_phone_otp(request)).await
    }

    pub async fn set_pass_pin(&self, request: &SetPassPinRequest) -> SessionResult<AckResponse> {
        self.run_flow("PIN setup", self.service.set_pass_pin(request)).await
    }

    pub async fn forget_pin(&self, request: &ForgetPinRequest) -> SessionResult<AckResponse> {
        self.run_flow("PIN recovery", self.service.forget_pin(request)).await
    }

    pub async fn reset_pin(&self, request: &ResetPinRequest) -> SessionResult<AckResponse> {
        self.run_flow("PIN reset", self.service.reset_pin(request)).await
    }

    async fn run_flow(
        &self,
        title: &str,
        call: impl Future<Output = SessionResult<AckResponse>>,
    ) -> SessionResult<AckResponse> {
        let was_authenticated = self.state.borrow().is_authenticated;
        self.dispatch(SessionAction::LoginStart);

        match call.await {
            Ok(ack) => {
                self.dispatch(SessionAction::SetLoading(false));
                if let Some(message) = ack.message.as_deref().filter(|m| !m.is_empty()) {
                    self.notifier.show_success(title, message);
                }
                Ok(ack)
            }
            Err(e) => Err(self.fail(title, was_authenticated, e)),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Decode `token` and check expiry and the disabled flag.
    fn resolve(&self, token: &str) -> SessionResult<SessionClaims> {
        Ok(resolve_session(token, self.clock.now_epoch_seconds())?)
    }

    /// Persist the committed token and selection, attach the token to the
    /// transport, then apply the transition.
    fn commit(&self, action: SessionAction) {
        if let Some(token) = action.token() {
            let unchanged = self.store.get::<String>(TOKEN_KEY).as_deref() == Some(token);
            if !unchanged {
                if let Err(e) = self.store.put(TOKEN_KEY, &token, self.options.token_ttl) {
                    warn!(error = %e, "Failed to persist session token");
                }
            }
            self.service.set_token(Some(token));
        }

        self.dispatch(action);

        let selected = self.state.borrow().selected_school.as_ref().map(|org| org.id.clone());
        match selected {
            Some(org_id) => {
                if let Err(e) =
                    self.store.put(SELECTED_SCHOOL_KEY, &org_id, self.options.selected_school_ttl)
                {
                    warn!(error = %e, "Failed to persist selected school");
                }
            }
            None => self.store.remove(SELECTED_SCHOOL_KEY),
        }
    }

    /// Record a failure in the reducer and surface it to the user.
    ///
    /// An unauthorized response during an authenticated operation is owned by
    /// the auth-error bridge when it has already signed the user out. If the
    /// session survived (no handler, or a public route), the credential is
    /// dropped here and the failure is recorded like any other.
    fn fail(&self, title: &str, was_authenticated: bool, err: SessionError) -> SessionError {
        if was_authenticated && err.is_unauthorized() {
            if !self.state.borrow().is_authenticated {
                debug!(error = %err, "Credential rejected mid-session; bridge already signed out");
                self.dispatch(SessionAction::SetLoading(false));
                return err;
            }
            warn!(error = %err, "Credential rejected and no sign-out happened; dropping local session");
            self.invalidate_local_session();
        }

        warn!(code = %err.code(), error = %err, "{title}");
        let message = err.user_message();
        self.dispatch(SessionAction::LoginFailure { message: message.clone() });

        match err {
            SessionError::DisabledAccount => {
                self.notifier.show_error("Account disabled", DISABLED_ACCOUNT_MESSAGE)
            }
            _ => self.notifier.show_error(title, &message),
        }
        err
    }
}

/// Look up the requested organization in a decoded membership list.
///
/// A backend that reports success but omits the requested organization is
/// treated as a failure rather than silently acting in another tenant.
fn find_org(orgs: &[OrgClaims], org_id: &str) -> SessionResult<OrgClaims> {
    orgs.iter()
        .find(|org| org.id == org_id)
        .cloned()
        .ok_or_else(|| SessionError::OrganizationMismatch { requested: org_id.to_string() })
}
