use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use edupay_session::{
    AuthErrorBridge, AuthService, BridgeRegistration, HttpTransport, SessionController,
    SessionExpiryHandler, SessionOptions, SessionStore, SystemClock,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::adapters::terminal::{TerminalNavigator, TerminalNotifier};
use crate::infra::config::AppConfig;

/// A wired session plus the registration that keeps its expiry handler alive.
pub struct Session {
    pub controller: Arc<SessionController>,
    _expiry: BridgeRegistration,
}

pub fn init_session(config: &AppConfig) -> anyhow::Result<Session> {
    let bridge = Arc::new(AuthErrorBridge::new());
    let transport = Arc::new(HttpTransport::new(config.api_base_url.clone(), bridge.clone())?);

    let clock = Arc::new(SystemClock);
    let store = Arc::new(SessionStore::open(
        &config.session_store_path,
        &config.app_origin,
        clock.clone(),
    )?);

    let options = SessionOptions { token_ttl: config.token_ttl, ..SessionOptions::default() };

    let controller = Arc::new(SessionController::new(
        AuthService::new(transport),
        store,
        clock,
        Arc::new(TerminalNavigator::new("/")),
        Arc::new(TerminalNotifier),
        options,
    ));

    let expiry = SessionExpiryHandler::register(&controller, &bridge, config.auth_error_cooldown);

    info!(
        api = %config.api_base_url,
        store = %config.session_store_path.display(),
        secure_cookies = config.app_origin.scheme() == "https",
        "Session wired"
    );

    Ok(Session { controller, _expiry: expiry })
}

pub fn init_tracing(log_json_path: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "edupay_console=info,edupay_session=info".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .pretty();

    // File (structured JSON logs), only when asked for
    let json_layer = log_json_path.and_then(|path| match File::create(path) {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("cannot create log file {}: {e}", path.display());
            None
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
