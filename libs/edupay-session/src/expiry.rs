//! Centralized recovery from rejected credentials.
//!
//! Installed into the [`AuthErrorBridge`], the handler turns any number of
//! near-simultaneous unauthorized responses into a single sign-out: one remote
//! logout attempt, one notification and one redirect to the login route.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::bridge::{AuthErrorBridge, AuthErrorHandler, AuthErrorNotice, BridgeRegistration};
use crate::controller::SessionController;
use crate::error::SESSION_EXPIRED_MESSAGE;
use crate::ports::{LOGIN, NavigateOptions, is_public_route};

/// How long duplicate reports are suppressed after a sign-out.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3_000);

pub struct SessionExpiryHandler {
    controller: Weak<SessionController>,
    cooldown: Duration,
    in_flight: Arc<AtomicBool>,
    toast_shown: Arc<AtomicBool>,
}

impl SessionExpiryHandler {
    pub fn new(controller: &Arc<SessionController>, cooldown: Duration) -> Self {
        Self {
            controller: Arc::downgrade(controller),
            cooldown,
            in_flight: Arc::new(AtomicBool::new(false)),
            toast_shown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build a handler for `controller` and install it into `bridge`.
    pub fn register(
        controller: &Arc<SessionController>,
        bridge: &Arc<AuthErrorBridge>,
        cooldown: Duration,
    ) -> BridgeRegistration {
        bridge.register(Arc::new(Self::new(controller, cooldown)))
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn schedule_reset(&self) {
        let in_flight = self.in_flight.clone();
        let toast_shown = self.toast_shown.clone();
        let cooldown = self.cooldown;

        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            in_flight.store(false, Ordering::SeqCst);
            toast_shown.store(false, Ordering::SeqCst);
            debug!("Session expiry cooldown elapsed");
        });
    }
}

#[async_trait]
impl AuthErrorHandler for SessionExpiryHandler {
    async fn on_auth_error(&self, notice: AuthErrorNotice) {
        if self.in_flight.load(Ordering::SeqCst) {
            debug!(path = %notice.path, "Sign-out already in progress; ignoring");
            return;
        }

        let Some(controller) = self.controller.upgrade() else {
            return;
        };

        // Bad credentials on the login screen are not an expired session.
        let current = controller.navigator().current_path();
        if is_public_route(&current) {
            debug!(path = %notice.path, route = %current, "Unauthorized on a public route; ignoring");
            return;
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(path = %notice.path, "Credential rejected; signing out");
        controller.end_session().await;

        if !self.toast_shown.swap(true, Ordering::SeqCst) {
            let message = notice
                .message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(SESSION_EXPIRED_MESSAGE);
            controller.notifier().show_error("Session expired", message);
        }

        controller.navigator().navigate(LOGIN, NavigateOptions::replace());
        self.schedule_reset();
    }
}
