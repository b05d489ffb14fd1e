use std::path::PathBuf;

use anyhow::Context;
use env_helpers::{get_env, get_env_default};
use time::Duration;
use url::Url;

pub struct AppConfig {
    /// Base URL of the EduPay API, e.g. "https://api.edupay.ng/api/v1".
    pub api_base_url: Url,
    /// Origin the session cookies belong to. An https origin marks them `Secure`.
    pub app_origin: Url,
    pub session_store_path: PathBuf,
    pub token_ttl: Duration,
    /// How long duplicate unauthorized reports are ignored after a forced sign-out.
    pub auth_error_cooldown: std::time::Duration,
    /// When set, structured JSON logs are also written to this file.
    pub log_json_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url: Url = get_env("API_BASE_URL");

        let app_origin: String =
            get_env_default("APP_ORIGIN", String::from("http://localhost:3000"));
        let app_origin = Url::parse(&app_origin).context("APP_ORIGIN must be a valid URL")?;

        let session_store_path: String =
            get_env_default("SESSION_STORE_PATH", String::from(".edupay-session"));
        let token_ttl_days: i64 = get_env_default("TOKEN_TTL_DAYS", 14);
        let auth_error_cooldown_ms: u64 = get_env_default("AUTH_ERROR_COOLDOWN_MS", 3_000);
        let log_json_path: Option<PathBuf> = std::env::var("LOG_JSON_PATH").ok().map(PathBuf::from);

        Ok(Self {
            api_base_url,
            app_origin,
            session_store_path: PathBuf::from(session_store_path),
            token_ttl: Duration::days(token_ttl_days),
            auth_error_cooldown: std::time::Duration::from_millis(auth_error_cooldown_ms),
            log_json_path,
        })
    }
}
