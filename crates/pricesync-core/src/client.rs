//! Shared HTTP fetch and response classification for provider adapters.
//!
//! Adapters hold a [`ProviderClient`] and delegate to it for URL building, the GET
//! round trip and the detection of errors that providers embed in successful
//! responses. Each adapter only adds its own URL layout and field mapping.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::types::ProviderConfig;

/// Timeout applied to every provider request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error keys checked on object-shaped responses, in order.
pub const DEFAULT_OBJECT_ERROR_KEYS: &[&str] = &["Error Message", "error", "message", "error_message"];

/// Error keys checked on the first element of array-shaped responses, in order.
pub const DEFAULT_ARRAY_ERROR_KEYS: &[&str] = &["error", "message", "error_message", "Error Message"];

/// Builds the process-wide HTTP client with the default provider timeout.
///
/// # Errors
/// Returns [`SyncError::HttpRequest`] if the TLS backend cannot be initialized.
pub fn default_http_client() -> Result<Client> {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(|e| SyncError::HttpRequest {
            url: String::new(),
            message: e.to_string(),
        })
}

/// Ordered candidate keys that may carry a provider-embedded error message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorKeys {
    object: Vec<String>,
    array: Vec<String>,
}

impl Default for ErrorKeys {
    fn default() -> Self {
        Self {
            object: DEFAULT_OBJECT_ERROR_KEYS.iter().map(ToString::to_string).collect(),
            array: DEFAULT_ARRAY_ERROR_KEYS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ErrorKeys {
    /// Key list with no entries; nothing is ever reported as an embedded error.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            object: Vec::new(),
            array: Vec::new(),
        }
    }

    /// Puts `keys` ahead of the current object-response keys.
    #[must_use]
    pub fn with_object_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged: Vec<String> = keys.into_iter().map(Into::into).collect();
        merged.append(&mut self.object);
        self.object = merged;
        self
    }

    /// Puts `keys` ahead of the current array-response keys.
    #[must_use]
    pub fn with_array_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged: Vec<String> = keys.into_iter().map(Into::into).collect();
        merged.append(&mut self.array);
        self.array = merged;
        self
    }

    /// Keys checked on object responses.
    #[must_use]
    pub fn object_keys(&self) -> &[String] {
        &self.object
    }

    /// Keys checked on the first element of array responses.
    #[must_use]
    pub fn array_keys(&self) -> &[String] {
        &self.array
    }

    fn first_message<'a>(keys: &[String], map: &'a Map<String, Value>) -> Option<&'a str> {
        keys.iter()
            .filter_map(|key| map.get(key))
            .filter_map(Value::as_str)
            .find(|msg| !msg.trim().is_empty())
    }
}

/// HTTP plumbing shared by every provider adapter.
#[derive(Clone)]
pub struct ProviderClient {
    provider: String,
    client: Client,
    config: ProviderConfig,
    error_keys: ErrorKeys,
    timeout: Duration,
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .field("error_keys", &self.error_keys)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderClient {
    /// Creates a client for `provider` using a shared HTTP client.
    #[must_use]
    pub fn new(provider: impl Into<String>, client: Client, config: ProviderConfig) -> Self {
        Self {
            provider: provider.into(),
            client,
            config,
            error_keys: ErrorKeys::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replaces the embedded-error key lists.
    #[must_use]
    pub fn with_error_keys(mut self, error_keys: ErrorKeys) -> Self {
        self.error_keys = error_keys;
        self
    }

    /// Replaces the per-request timeout.
    ///
    /// The timeout applies to each request regardless of how the shared
    /// [`Client`] was built.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Name of the provider this client talks to.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Configured embedded-error keys.
    #[must_use]
    pub const fn error_keys(&self) -> &ErrorKeys {
        &self.error_keys
    }

    /// Builds `{base_url}/{path}?{params}&apikey={key}`.
    ///
    /// An empty `path` targets the base URL itself.
    ///
    /// # Errors
    /// Returns [`SyncError::HttpRequest`] if the base URL is not a valid URL.
    pub fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        let raw = if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{}", path.trim_start_matches('/'))
        };

        let mut url = Url::parse(&raw).map_err(|e| SyncError::HttpRequest {
            url: raw.clone(),
            message: format!("invalid provider URL: {e}"),
        })?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("apikey", &self.config.api_key);
        Ok(url)
    }

    /// Performs a GET and decodes the body as JSON.
    ///
    /// The body is always read to the end, including on error statuses.
    ///
    /// # Errors
    /// Transport failures, non-success statuses and malformed bodies.
    pub async fn get_json(&self, url: &Url) -> Result<Value> {
        let shown = redact(url);
        debug!(provider = %self.provider, url = %shown, "provider request");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SyncError::HttpRequest {
                url: shown.clone(),
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body = response.text().await;

        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: shown,
                status: status.as_u16(),
                body: body.unwrap_or_default(),
            });
        }

        let body = body.map_err(|e| SyncError::ResponseRead(e.without_url().to_string()))?;
        serde_json::from_str(&body).map_err(|e| SyncError::ResponseParse(e.to_string()))
    }

    /// Fetches an object-shaped response and checks it for embedded errors.
    ///
    /// # Errors
    /// As [`get_json`](Self::get_json), plus [`SyncError::ProviderApi`] for an
    /// embedded error and [`SyncError::ResponseParse`] for a non-object body.
    pub async fn get_object(&self, url: &Url) -> Result<Map<String, Value>> {
        match self.get_json(url).await? {
            Value::Object(map) => {
                self.check_object_error(&map)?;
                Ok(map)
            }
            other => Err(SyncError::ResponseParse(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Fetches an array-shaped response and checks its first element for embedded errors.
    ///
    /// Providers that normally answer with an array report some errors as a bare
    /// object; such objects are checked with the object keys first.
    ///
    /// # Errors
    /// As [`get_object`](Self::get_object).
    pub async fn get_array(&self, url: &Url) -> Result<Vec<Value>> {
        match self.get_json(url).await? {
            Value::Array(items) => {
                self.check_array_error(&items)?;
                Ok(items)
            }
            Value::Object(map) => {
                self.check_object_error(&map)?;
                Err(SyncError::ResponseParse(
                    "expected a JSON array, got object".to_string(),
                ))
            }
            other => Err(SyncError::ResponseParse(format!(
                "expected a JSON array, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Returns the first non-empty embedded error found under the object keys.
    ///
    /// # Errors
    /// [`SyncError::ProviderApi`] carrying the provider's message.
    pub fn check_object_error(&self, response: &Map<String, Value>) -> Result<()> {
        match ErrorKeys::first_message(&self.error_keys.object, response) {
            Some(message) => Err(self.api_error(message)),
            None => Ok(()),
        }
    }

    /// Checks the first element of an array response under the array keys.
    ///
    /// An empty array is not an error.
    ///
    /// # Errors
    /// [`SyncError::ProviderApi`] carrying the provider's message.
    pub fn check_array_error(&self, response: &[Value]) -> Result<()> {
        let Some(first) = response.first().and_then(Value::as_object) else {
            return Ok(());
        };
        match ErrorKeys::first_message(&self.error_keys.array, first) {
            Some(message) => Err(self.api_error(message)),
            None => Ok(()),
        }
    }

    fn api_error(&self, message: &str) -> SyncError {
        SyncError::ProviderApi {
            provider: self.provider.clone(),
            message: message.to_string(),
        }
    }
}

/// Renders `url` with the `apikey` parameter masked.
#[must_use]
pub fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k.eq_ignore_ascii_case("apikey") {
                "REDACTED".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return shown.to_string();
    }
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> ProviderClient {
        ProviderClient::new(
            "Test",
            default_http_client().unwrap(),
            ProviderConfig::new(base_url, "secret"),
        )
    }

    async fn stub() -> String {
        let router = Router::new()
            .route(
                "/unauthorized",
                get(|| async { (StatusCode::UNAUTHORIZED, "invalid key") }),
            )
            .route(
                "/embedded",
                get(|| async { Json(json!({"Error Message": "Invalid API call"})) }),
            )
            .route("/garbage", get(|| async { "<html>not json</html>" }))
            .route(
                "/array-error",
                get(|| async { Json(json!([{"error": "Limit Reach"}])) }),
            )
            .route("/empty-array", get(|| async { Json(json!([])) }))
            .route(
                "/object",
                get(|| async { Json(json!({"Meta Data": {}, "message": ""})) }),
            );
        serve(router).await
    }

    #[test]
    fn test_build_url() {
        let client = client("https://example.test/api/");
        let url = client
            .build_url("/history", &[("symbol", "AAPL"), ("outputsize", "full")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/api/history?symbol=AAPL&outputsize=full&apikey=secret"
        );

        let url = client.build_url("", &[("function", "TIME_SERIES_DAILY")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/api?function=TIME_SERIES_DAILY&apikey=secret"
        );
    }

    #[test]
    fn test_redact_hides_api_key() {
        let url = client("https://example.test")
            .build_url("q", &[("symbol", "AAPL")])
            .unwrap();
        let shown = redact(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("symbol=AAPL"));
    }

    #[test]
    fn test_error_keys_are_ordered_and_configurable() {
        let keys = ErrorKeys::default().with_object_keys(["Information", "Note"]);
        assert_eq!(keys.object_keys()[0], "Information");
        assert_eq!(keys.object_keys()[2], "Error Message");

        let client = client("https://example.test").with_error_keys(keys);
        let response = json!({"Note": "rate limited", "error": "other"});
        match client.check_object_error(response.as_object().unwrap()) {
            Err(SyncError::ProviderApi { message, .. }) => assert_eq!(message, "rate limited"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_and_non_string_messages_are_ignored() {
        let client = client("https://example.test");
        let response = json!({"error": "", "message": {"nested": true}});
        assert!(client.check_object_error(response.as_object().unwrap()).is_ok());
        assert!(client.check_array_error(&[]).is_ok());
    }

    #[tokio::test]
    async fn test_status_error_is_transport() {
        let base = stub().await;
        let client = client(&base);
        let url = client.build_url("unauthorized", &[]).unwrap();

        let err = client.get_json(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        match err {
            SyncError::HttpStatus { status, body, url } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid key");
                assert!(!url.contains("secret"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embedded_error_is_provider() {
        let base = stub().await;
        let client = client(&base);
        let url = client.build_url("embedded", &[]).unwrap();

        let err = client.get_object(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.to_string().contains("Invalid API call"));
    }

    #[tokio::test]
    async fn test_garbage_body_is_parse_error() {
        let base = stub().await;
        let client = client(&base);
        let url = client.build_url("garbage", &[]).unwrap();

        let err = client.get_json(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_array_responses() {
        let base = stub().await;
        let client = client(&base);

        let url = client.build_url("array-error", &[]).unwrap();
        let err = client.get_array(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);

        let url = client.build_url("empty-array", &[]).unwrap();
        assert!(client.get_array(&url).await.unwrap().is_empty());

        let url = client.build_url("object", &[]).unwrap();
        let err = client.get_array(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport() {
        // Nothing listens on port 9 of the loopback address.
        let client = client("http://127.0.0.1:9");
        let url = client.build_url("x", &[]).unwrap();
        let err = client.get_json(&url).await.unwrap_err();
        assert!(matches!(err, SyncError::HttpRequest { .. }));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let base = serve(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        ))
        .await;

        // Client::new() carries no timeout of its own.
        let client = ProviderClient::new("Test", Client::new(), ProviderConfig::new(base, "k"))
            .with_timeout(Duration::from_millis(200));
        let url = client.build_url("slow", &[]).unwrap();
        let err = client.get_json(&url).await.unwrap_err();
        assert!(matches!(err, SyncError::HttpRequest { .. }));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_default_timeout() {
        let client = ProviderClient::new("Test", Client::new(), ProviderConfig::new("http://x", "k"));
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }
}
