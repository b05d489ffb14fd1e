//! Process-wide, late-bound slot for the authentication-failure handler.
//!
//! The transport reports every unauthorized response here, from any call
//! site, without needing a reference to the session controller. Exactly one
//! handler is registered at a time; with none registered, reports are no-ops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;
use tracing::debug;

/// What the transport knows about a failed, unauthorized call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthErrorNotice {
    /// Message supplied by the backend, if any.
    pub message: Option<String>,

    /// Request path that failed.
    pub path: String,
}

#[async_trait]
pub trait AuthErrorHandler: Send + Sync {
    async fn on_auth_error(&self, notice: AuthErrorNotice);
}

struct Slot {
    generation: u64,
    handler: Option<Arc<dyn AuthErrorHandler>>,
}

pub struct AuthErrorBridge {
    slot: RwLock<Slot>,
    generations: AtomicU64,
}

impl Default for AuthErrorBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthErrorBridge {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(Slot { generation: 0, handler: None }),
            generations: AtomicU64::new(0),
        }
    }

    /// Install `handler`, replacing any previous one.
    ///
    /// Dropping the returned registration clears the slot, unless another
    /// handler has been registered since.
    pub fn register(self: &Arc<Self>, handler: Arc<dyn AuthErrorHandler>) -> BridgeRegistration {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
            slot.generation = generation;
            slot.handler = Some(handler);
        }
        debug!(generation, "Auth error handler registered");

        BridgeRegistration { bridge: Arc::downgrade(self), generation }
    }

    /// Reset the slot to a no-op.
    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        slot.handler = None;
    }

    pub fn is_registered(&self) -> bool {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).handler.is_some()
    }

    /// Hand an unauthorized failure to the registered handler.
    pub async fn report(&self, notice: AuthErrorNotice) {
        let handler = self.slot.read().unwrap_or_else(|e| e.into_inner()).handler.clone();

        match handler {
            Some(handler) => handler.on_auth_error(notice).await,
            None => debug!(path = %notice.path, "Auth error reported with no handler registered"),
        }
    }

    fn clear_generation(&self, generation: u64) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if slot.generation == generation {
            slot.handler = None;
            debug!(generation, "Auth error handler cleared");
        }
    }
}

/// Keeps a handler installed for as long as it is alive.
#[must_use = "dropping the registration immediately clears the handler"]
pub struct BridgeRegistration {
    bridge: Weak<AuthErrorBridge>,
    generation: u64,
}

impl Drop for BridgeRegistration {
    fn drop(&mut self) {
        if let Some(bridge) = self.bridge.upgrade() {
            bridge.clear_generation(self.generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<AuthErrorNotice>>,
    }

    #[async_trait]
    impl AuthErrorHandler for Recorder {
        async fn on_auth_error(&self, notice: AuthErrorNotice) {
            self.seen.lock().unwrap().push(notice);
        }
    }

    fn notice() -> AuthErrorNotice {
        AuthErrorNotice { message: Some("Token expired".into()), path: "/students".into() }
    }

    #[tokio::test]
    async fn test_report_without_handler_is_noop() {
        let bridge = Arc::new(AuthErrorBridge::new());
        bridge.report(notice()).await;
        assert!(!bridge.is_registered());
    }

    #[tokio::test]
    async fn test_report_reaches_registered_handler() {
        let bridge = Arc::new(AuthErrorBridge::new());
        let recorder = Arc::new(Recorder::default());
        let _registration = bridge.register(recorder.clone());

        bridge.report(notice()).await;

        assert_eq!(recorder.seen.lock().unwrap().as_slice(), &[notice()]);
    }

    #[tokio::test]
    async fn test_dropping_registration_clears_slot() {
        let bridge = Arc::new(AuthErrorBridge::new());
        let recorder = Arc::new(Recorder::default());

        drop(bridge.register(recorder.clone()));
        bridge.report(notice()).await;

        assert!(!bridge.is_registered());
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_registration_does_not_clear_newer_handler() {
        let bridge = Arc::new(AuthErrorBridge::new());
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());

        let old = bridge.register(first.clone());
        let _current = bridge.register(second.clone());
        drop(old);

        bridge.report(notice()).await;

        assert!(first.seen.lock().unwrap().is_empty());
        assert_eq!(second.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_resets_to_noop() {
        let bridge = Arc::new(AuthErrorBridge::new());
        let recorder = Arc::new(Recorder::default());
        let _registration = bridge.register(recorder.clone());

        bridge.clear();
        bridge.report(notice()).await;

        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
