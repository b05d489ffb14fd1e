//! In-memory collaborators and fixtures for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use edupay_types::{OrgClaims, SessionClaims, UserClaims, encode_session_token};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use url::Url;

use crate::bridge::{AuthErrorBridge, AuthErrorNotice};
use crate::clock::Clock;
use crate::controller::{SessionController, SessionOptions};
use crate::error::{TransportError, TransportResult};
use crate::ports::{NavigateOptions, Navigator, Notifier};
use crate::service::AuthService;
use crate::store::SessionStore;
use crate::transport::Transport;

pub const NOW: i64 = 1_700_000_000;

const SIGNING_SECRET: &[u8] = b"fixture-secret";

// ============================================================================
// Clock
// ============================================================================

pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn at_epoch(seconds: i64) -> Self {
        let now = OffsetDateTime::from_unix_timestamp(seconds).unwrap();
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Transport that replays queued responses per path.
///
/// Unscripted calls fail with a 404. Unauthorized responses are reported to
/// the attached bridge first, like the HTTP transport does.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<TransportResult<Value>>>>,
    bodies: Mutex<HashMap<String, Vec<Value>>>,
    stalled: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, std::time::Duration>>,
    token: Mutex<Option<String>>,
    bridge: Option<Arc<AuthErrorBridge>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bridge(bridge: Arc<AuthErrorBridge>) -> Self {
        Self { bridge: Some(bridge), ..Self::default() }
    }

    /// Queue the next response for `path`.
    pub fn respond(&self, path: &str, response: TransportResult<Value>) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// Make every call to `path` hang forever.
    pub fn stall(&self, path: &str) {
        self.stalled.lock().unwrap().insert(path.to_string());
    }

    /// Hold every call to `path` for `by` before answering.
    pub fn delay(&self, path: &str, by: std::time::Duration) {
        self.delays.lock().unwrap().insert(path.to_string(), by);
    }

    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.bodies.lock().unwrap().get(path).and_then(|b| b.last().cloned())
    }

    pub fn calls(&self, path: &str) -> usize {
        self.bodies.lock().unwrap().get(path).map_or(0, Vec::len)
    }

    /// Bearer token currently attached.
    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    async fn call(&self, path: &str, body: Value) -> TransportResult<Value> {
        self.bodies.lock().unwrap().entry(path.to_string()).or_default().push(body);

        let stalled = self.stalled.lock().unwrap().contains(path);
        if stalled {
            std::future::pending::<()>().await;
        }

        let delay = self.delays.lock().unwrap().get(path).copied();
        if let Some(by) = delay {
            tokio::time::sleep(by).await;
        }

        let next = self.responses.lock().unwrap().get_mut(path).and_then(VecDeque::pop_front);
        let response = next.unwrap_or(Err(TransportError::Status {
            status: 404,
            message: Some(format!("no scripted response for {path}")),
        }));

        if let (Err(TransportError::Unauthorized { message }), Some(bridge)) =
            (&response, &self.bridge)
        {
            bridge
                .report(AuthErrorNotice { message: message.clone(), path: path.to_string() })
                .await;
        }

        response
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str) -> TransportResult<Value> {
        self.call(path, Value::Null).await
    }

    async fn post(&self, path: &str, body: Value) -> TransportResult<Value> {
        self.call(path, body).await
    }

    fn set_token(&self, token: Option<&str>) {
        *self.token.lock().unwrap() = token.map(str::to_string);
    }
}

// ============================================================================
// Navigation and notifications
// ============================================================================

pub struct RecordingNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<(String, NavigateOptions)>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Self {
        Self { current: Mutex::new(path.to_string()), history: Mutex::new(Vec::new()) }
    }

    pub fn history(&self) -> Vec<(String, NavigateOptions)> {
        self.history.lock().unwrap().clone()
    }

    /// Number of navigations to `path`.
    pub fn visits(&self, path: &str) -> usize {
        self.history.lock().unwrap().iter().filter(|(p, _)| p == path).count()
    }

    pub fn last(&self) -> Option<String> {
        self.history.lock().unwrap().last().map(|(p, _)| p.clone())
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    fn navigate(&self, path: &str, options: NavigateOptions) {
        *self.current.lock().unwrap() = path.to_string();
        self.history.lock().unwrap().push((path.to_string(), options));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<Notification>>,
    errors: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<Notification> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_success(&self, title: &str, message: &str) {
        self.successes
            .lock()
            .unwrap()
            .push(Notification { title: title.into(), message: message.into() });
    }

    fn show_error(&self, title: &str, message: &str) {
        self.errors
            .lock()
            .unwrap()
            .push(Notification { title: title.into(), message: message.into() });
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn user(id: &str) -> UserClaims {
    UserClaims {
        id: id.to_string(),
        full_name: format!("User {id}"),
        role: "admin".into(),
        permissions: vec!["payments.read".into()],
        disabled: false,
        profile_image: None,
        email: None,
        phone_number: None,
    }
}

pub fn org(id: &str) -> OrgClaims {
    OrgClaims {
        id: id.to_string(),
        organization_name: format!("School {id}"),
        organization_category: None,
        school_type: None,
        disabled: false,
        logo: None,
    }
}

pub fn claims(user: UserClaims, orgs: Vec<OrgClaims>, exp: Option<i64>) -> SessionClaims {
    SessionClaims { principal: user, orgs, exp, iat: Some(NOW - 60) }
}

/// Signed token for `claims`.
pub fn token_for(claims: &SessionClaims) -> String {
    encode_session_token(claims, SIGNING_SECRET).unwrap()
}

/// Token for `user_id` in `org_ids`, valid for a day after [`NOW`].
pub fn valid_token(user_id: &str, org_ids: &[&str]) -> String {
    token_for(&claims(
        user(user_id),
        org_ids.iter().map(|id| org(id)).collect(),
        Some(NOW + 86_400),
    ))
}

// ============================================================================
// Harness
// ============================================================================

/// A controller wired to scripted collaborators.
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub bridge: Arc<AuthErrorBridge>,
    pub clock: Arc<FixedClock>,
    pub store: Arc<SessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
    pub controller: Arc<SessionController>,
}

impl Harness {
    pub fn new(path: &str) -> Self {
        let bridge = Arc::new(AuthErrorBridge::new());
        let transport = Arc::new(ScriptedTransport::with_bridge(bridge.clone()));
        let clock = Arc::new(FixedClock::at_epoch(NOW));
        let origin = Url::parse("https://app.example.com").unwrap();
        let store = Arc::new(SessionStore::in_memory(&origin, clock.clone()));
        let navigator = Arc::new(RecordingNavigator::at(path));
        let notifier = Arc::new(RecordingNotifier::default());

        let controller = Arc::new(SessionController::new(
            AuthService::new(transport.clone()),
            store.clone(),
            clock.clone(),
            navigator.clone(),
            notifier.clone(),
            SessionOptions::default(),
        ));

        Self { transport, bridge, clock, store, navigator, notifier, controller }
    }
}
