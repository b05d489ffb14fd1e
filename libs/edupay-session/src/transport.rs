//! Request client used by the session service.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportResult;

/// Opaque request client. Implementations attach the bearer token set via
/// [`Transport::set_token`] and report unauthorized responses to the
/// [`AuthErrorBridge`](crate::bridge::AuthErrorBridge) before failing with
/// [`TransportError::Unauthorized`](crate::error::TransportError::Unauthorized).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> TransportResult<Value>;

    async fn post(&self, path: &str, body: Value) -> TransportResult<Value>;

    /// Attach (or with `None`, detach) the bearer credential for later calls.
    fn set_token(&self, token: Option<&str>);
}

/// Best-effort extraction of a human message from an error body.
pub fn error_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("error").and_then(|e| e.get("message")),
        body.get("error"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(feature = "client")]
pub use http::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, HttpTransport};

#[cfg(feature = "client")]
mod http {
    use std::sync::{Arc, RwLock};
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::{Client, RequestBuilder, StatusCode};
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::Value;
    use tracing::{debug, warn};
    use url::Url;

    use super::{Transport, error_message};
    use crate::bridge::{AuthErrorBridge, AuthErrorNotice};
    use crate::error::{TransportError, TransportResult};

    /// Default connect timeout (TCP handshake + TLS).
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default request timeout (total request/response time).
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// `reqwest`-backed transport against the EduPay API.
    pub struct HttpTransport {
        base_url: Url,
        http_client: Client,
        token: RwLock<Option<SecretString>>,
        bridge: Arc<AuthErrorBridge>,
    }

    impl HttpTransport {
        pub fn new(base_url: Url, bridge: Arc<AuthErrorBridge>) -> Result<Self, TransportError> {
            let http_client = Client::builder()
                .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
                .timeout(DEFAULT_REQUEST_TIMEOUT)
                .build()?;

            Ok(Self::with_client(base_url, http_client, bridge))
        }

        pub fn with_client(mut base_url: Url, http_client: Client, bridge: Arc<AuthErrorBridge>) -> Self {
            // Relative joins drop the last segment unless the base ends in '/'.
            if !base_url.path().ends_with('/') {
                let path = format!("{}/", base_url.path());
                base_url.set_path(&path);
            }

            Self { base_url, http_client, token: RwLock::new(None), bridge }
        }

        fn url(&self, path: &str) -> TransportResult<Url> {
            self.base_url
                .join(path.trim_start_matches('/'))
                .map_err(|e| TransportError::InvalidPath(format!("{path}: {e}")))
        }

        fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
            let token = self.token.read().unwrap_or_else(|e| e.into_inner());
            match token.as_ref() {
                Some(token) => request.bearer_auth(token.expose_secret()),
                None => request,
            }
        }

        async fn send(&self, path: &str, request: RequestBuilder) -> TransportResult<Value> {
            let response = self.authorize(request).send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;

            let body: Value = if bytes.is_empty() {
                Value::Null
            } else {
                match serde_json::from_slice(&bytes) {
                    Ok(body) => body,
                    Err(e) if status.is_success() => {
                        return Err(TransportError::Decode(e.to_string()));
                    }
                    Err(_) => Value::Null,
                }
            };

            if status == StatusCode::UNAUTHORIZED {
                let message = error_message(&body);
                warn!(path, "Request rejected as unauthorized");
                self.bridge
                    .report(AuthErrorNotice { message: message.clone(), path: path.to_string() })
                    .await;
                return Err(TransportError::Unauthorized { message });
            }

            if !status.is_success() {
                debug!(path, status = status.as_u16(), "Request failed");
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
            }

            Ok(body)
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn get(&self, path: &str) -> TransportResult<Value> {
            let url = self.url(path)?;
            self.send(path, self.http_client.get(url)).await
        }

        async fn post(&self, path: &str, body: Value) -> TransportResult<Value> {
            let url = self.url(path)?;
            self.send(path, self.http_client.post(url).json(&body)).await
        }

        fn set_token(&self, token: Option<&str>) {
            let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
            *slot = token.map(|t| SecretString::from(t.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_top_level_message() {
        let body = json!({"message": "Invalid credentials", "error": "Bad Request"});
        assert_eq!(error_message(&body).as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn test_error_message_nested_and_plain_error() {
        assert_eq!(
            error_message(&json!({"error": {"message": "Token expired"}})).as_deref(),
            Some("Token expired")
        );
        assert_eq!(error_message(&json!({"error": "Forbidden"})).as_deref(), Some("Forbidden"));
        assert_eq!(error_message(&json!({"message": "  "})), None);
        assert_eq!(error_message(&Value::Null), None);
    }
}

#[cfg(all(test, feature = "client"))]
mod http_tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use url::Url;

    use super::{HttpTransport, Transport};
    use crate::bridge::{AuthErrorBridge, AuthErrorHandler, AuthErrorNotice};
    use crate::error::TransportError;

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

    async fn whoami(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer T1") => (StatusCode::OK, Json(json!({"id": "u-1"}))),
            _ => (StatusCode::UNAUTHORIZED, Json(json!({"message": "Session expired"}))),
        }
    }

    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "pw" {
            (StatusCode::OK, Json(json!({"token": "T1"})))
        } else {
            (StatusCode::BAD_REQUEST, Json(json!({"message": "Invalid phone number or password"})))
        }
    }

    async fn serve() -> Url {
        let app = Router::new()
            .route("/api/v1/auth/me", get(whoami))
            .route("/api/v1/auth/login", post(login));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/api/v1")).unwrap()
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let base = serve().await;
        let bridge = Arc::new(AuthErrorBridge::new());
        let transport = HttpTransport::new(base, bridge).unwrap();

        transport.set_token(Some("T1"));
        let body = transport.get("/auth/me").await.unwrap();

        assert_eq!(body["id"], "u-1");
    }

    #[tokio::test]
    async fn test_unauthorized_reports_to_bridge() {
        let base = serve().await;
        let bridge = Arc::new(AuthErrorBridge::new());
        let recorder = Arc::new(Recorder::default());
        let _registration = bridge.register(recorder.clone());
        let transport = HttpTransport::new(base, bridge).unwrap();

        let err = transport.get("/auth/me").await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::Unauthorized { message: Some(ref m) } if m == "Session expired"
        ));
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/auth/me");
    }

    #[tokio::test]
    async fn test_other_failures_carry_status_and_message() {
        let base = serve().await;
        let bridge = Arc::new(AuthErrorBridge::new());
        let recorder = Arc::new(Recorder::default());
        let _registration = bridge.register(recorder.clone());
        let transport = HttpTransport::new(base, bridge).unwrap();

        let err = transport
            .post("/auth/login", json!({"phoneNumber": "0801", "password": "nope"}))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 400, .. }));
        assert_eq!(err.server_message(), Some("Invalid phone number or password"));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleared_token_is_not_sent() {
        let base = serve().await;
        let bridge = Arc::new(AuthErrorBridge::new());
        let transport = HttpTransport::new(base, bridge).unwrap();

        transport.set_token(Some("T1"));
        transport.set_token(None);

        let err = transport.get("auth/me").await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
