//! The request executor: one call, one request, one normalized result.

use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::cookies::CookieJar;
use crate::error::Error;
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::payload::RequestBody;
use crate::types::{ApiResponse, HttpResponse, Method, PreparedRequest, RequestOptions, WireBody};

const JSON_CONTENT_TYPE: &str = "application/json";

/// When a failed response's body is searched for a server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorBodyPolicy {
    /// Only when the response declares a JSON content type.
    DeclaredJson,
    /// Always try; a parse failure falls back to the status line.
    Sniff,
}

/// REST client bound to one backend.
///
/// Cheap to clone; clones share the executor.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    executor: Arc<dyn HttpExecutor>,
}

impl ApiClient {
    /// Client over a fresh reqwest executor using `config.timeout`.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let executor = ReqwestExecutor::new(config.timeout)?;
        Ok(Self::with_executor(config, Arc::new(executor)))
    }

    /// Client whose credentialed requests use `jar`.
    pub fn with_cookie_jar(config: ClientConfig, jar: CookieJar) -> Result<Self, Error> {
        let executor = ReqwestExecutor::new(config.timeout)?.with_cookie_jar(jar);
        Ok(Self::with_executor(config, Arc::new(executor)))
    }

    /// Client over any transport; tests pass a mock here.
    pub fn with_executor(config: ClientConfig, executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            config: Arc::new(config),
            executor,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue one request against `base_url + path`.
    ///
    /// JSON content type is declared unless the body resolves to multipart,
    /// in which case the transport writes the boundary header itself.
    /// `options` headers are applied last and win over the defaults.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, Error> {
        let body = body.map(RequestBody::into_wire);

        let mut defaults = HeaderMap::new();
        if !matches!(body, Some(WireBody::Form(_))) {
            defaults.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }

        let request = self.prepare(method, path, body, defaults, false, options)?;
        self.send(&request, ErrorBodyPolicy::DeclaredJson).await
    }

    /// `GET path`.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, Error> {
        self.execute(Method::GET, path, None, RequestOptions::default())
            .await
    }

    /// `GET path`, decoding the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get(path).await?.json()
    }

    /// `POST path`; a payload carrying files goes out as multipart.
    pub async fn post(&self, path: &str, body: impl Into<RequestBody>) -> Result<ApiResponse, Error> {
        self.execute(
            Method::POST,
            path,
            Some(body.into()),
            RequestOptions::default(),
        )
        .await
    }

    /// `PATCH path` with a JSON body.
    pub async fn patch(&self, path: &str, data: Value) -> Result<ApiResponse, Error> {
        self.execute(
            Method::PATCH,
            path,
            Some(RequestBody::Json(data)),
            RequestOptions::default(),
        )
        .await
    }

    /// `PUT path` with a JSON body.
    pub async fn put(&self, path: &str, data: Value) -> Result<ApiResponse, Error> {
        self.execute(
            Method::PUT,
            path,
            Some(RequestBody::Json(data)),
            RequestOptions::default(),
        )
        .await
    }

    /// `DELETE path`. A 204 comes back as [`ApiResponse::NoContent`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, Error> {
        self.execute(Method::DELETE, path, None, RequestOptions::default())
            .await
    }

    pub(crate) fn prepare(
        &self,
        method: Method,
        path: &str,
        body: Option<WireBody>,
        mut headers: HeaderMap,
        include_credentials: bool,
        options: RequestOptions,
    ) -> Result<PreparedRequest, Error> {
        for (name, value) in &options.headers {
            let name = HeaderName::try_from(name.as_str())?;
            let value = HeaderValue::try_from(value.as_str())?;
            headers.insert(name, value);
        }

        Ok(PreparedRequest {
            method,
            url: self.config.url_for(path)?,
            headers,
            body,
            include_credentials: options.include_credentials.unwrap_or(include_credentials),
            timeout: options.timeout,
        })
    }

    pub(crate) async fn send(
        &self,
        request: &PreparedRequest,
        policy: ErrorBodyPolicy,
    ) -> Result<ApiResponse, Error> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let result = match self.executor.execute(request).await {
            Ok(response) => {
                debug!(status = response.status, url = %request.url, "received response");
                decode(response, policy)
            }
            Err(error) => Err(error),
        };

        if let Err(error) = &result {
            warn!(method = %request.method, url = %request.url, %error, "request failed");
        }
        result
    }
}

/// Turn a raw response into a result.
pub(crate) fn decode(response: HttpResponse, policy: ErrorBodyPolicy) -> Result<ApiResponse, Error> {
    if response.status == 204 {
        return Ok(ApiResponse::NoContent { status: 204 });
    }

    if !response.is_success() {
        let server_message = match policy {
            ErrorBodyPolicy::DeclaredJson if !response.is_json() => None,
            _ => server_message(&response.body_text),
        };
        return Err(Error::http(
            response.status,
            response.status_text,
            server_message,
        ));
    }

    if response.is_json() {
        let value = serde_json::from_str(&response.body_text)
            .map_err(|e| Error::decode(e.to_string()))?;
        return Ok(ApiResponse::Json(value));
    }

    Ok(ApiResponse::Text(response.body_text))
}

/// `detail`, else `error`, from a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error"]
        .iter()
        .filter_map(|field| value.get(field))
        .find_map(message_text)
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::mock::MockExecutor;
    use crate::payload::{FileUpload, Payload};
    use serde_json::json;

    fn client(executor: &MockExecutor) -> ApiClient {
        ApiClient::with_executor(ClientConfig::default(), Arc::new(executor.clone()))
    }

    #[tokio::test]
    async fn json_response_is_parsed() {
        let executor = MockExecutor::new().with_json("/api/tracks/", json!([{"id": 1}]));
        let result = client(&executor).get("/tracks/").await.unwrap();
        assert_eq!(result, ApiResponse::Json(json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn non_json_response_is_text() {
        let executor = MockExecutor::new().with_response(
            Method::GET,
            "/api/health",
            MockExecutor::text_response(200, "ok"),
        );
        let result = client(&executor).get("/health").await.unwrap();
        assert_eq!(result, ApiResponse::Text("ok".to_string()));
    }

    #[tokio::test]
    async fn no_content_short_circuits() {
        let executor = MockExecutor::new().with_response(
            Method::DELETE,
            "/api/memories/delete/3/",
            MockExecutor::no_content(),
        );
        let result = client(&executor)
            .delete("/memories/delete/3/")
            .await
            .unwrap();
        assert_eq!(result.to_value(), json!({"success": true, "status": 204}));
    }

    #[tokio::test]
    async fn no_content_body_is_never_parsed() {
        let mut response = MockExecutor::json_response(204, json!(null));
        response.body_text = "{not json".to_string();
        let executor =
            MockExecutor::new().with_response(Method::DELETE, "/api/memories/delete/4/", response);

        let result = client(&executor)
            .delete("/memories/delete/4/")
            .await
            .unwrap();

        assert_eq!(result, ApiResponse::NoContent { status: 204 });
    }

    #[tokio::test]
    async fn detail_field_becomes_message() {
        let executor = MockExecutor::new().with_response(
            Method::POST,
            "/api/tracks/",
            MockExecutor::json_response(400, json!({"detail": "bad title"})),
        );
        let error = client(&executor)
            .post("/tracks/", json!({"nom": ""}))
            .await
            .unwrap_err();
        assert_eq!(error.message(), "bad title");
        assert_eq!(error.status(), Some(400));
    }

    #[tokio::test]
    async fn error_field_is_second_choice() {
        let executor = MockExecutor::new().with_response(
            Method::GET,
            "/api/tracks/9/",
            MockExecutor::json_response(404, json!({"error": "no such track"})),
        );
        let error = client(&executor).get("/tracks/9/").await.unwrap_err();
        assert_eq!(error.message(), "no such track");
    }

    #[tokio::test]
    async fn undeclared_json_error_body_is_ignored() {
        let executor = MockExecutor::new().with_response(
            Method::GET,
            "/api/tracks/",
            MockExecutor::text_response(500, r#"{"detail": "hidden"}"#),
        );
        let error = client(&executor).get("/tracks/").await.unwrap_err();
        assert_eq!(error.message(), "HTTP 500: Internal Server Error");
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let mut response = MockExecutor::json_response(200, json!(null));
        response.body_text = "{not json".to_string();
        let executor = MockExecutor::new().with_response(Method::GET, "/api/tracks/", response);

        let error = client(&executor).get("/tracks/").await.unwrap_err();
        assert!(matches!(error, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let executor = MockExecutor::new().fail_with("connection refused");
        let error = client(&executor).get("/tracks/").await.unwrap_err();
        assert!(error.is_transport());
        assert_eq!(error.message(), "connection refused");
    }

    #[tokio::test]
    async fn json_body_declares_content_type() {
        let executor = MockExecutor::new();
        let _ = client(&executor)
            .post("/tracks/", Payload::new().with("nom", "Génie Civil"))
            .await;

        let request = &executor.recorded_requests()[0];
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(
            request.body,
            Some(WireBody::Json(json!({"nom": "Génie Civil"})))
        );
    }

    #[tokio::test]
    async fn multipart_body_leaves_content_type_to_transport() {
        let executor = MockExecutor::new();
        let file = FileUpload::new("m.pdf", "application/pdf", vec![1, 2, 3]);
        let _ = client(&executor)
            .post("/memories/create", Payload::new().with("fichier_pdf", file))
            .await;

        let request = &executor.recorded_requests()[0];
        assert_eq!(request.header("content-type"), None);
        assert!(matches!(request.body, Some(WireBody::Form(_))));
    }

    #[tokio::test]
    async fn option_headers_override_defaults() {
        let executor = MockExecutor::new();
        let options = RequestOptions::new()
            .with_header("content-type", "application/vnd.api+json")
            .with_header("Accept-Language", "fr");
        let _ = client(&executor)
            .execute(Method::GET, "/tracks/", None, options)
            .await;

        let request = &executor.recorded_requests()[0];
        assert_eq!(
            request.header("Content-Type"),
            Some("application/vnd.api+json")
        );
        assert_eq!(request.header("accept-language"), Some("fr"));
        assert!(!request.include_credentials);
    }

    #[test]
    fn server_message_ignores_empty_fields() {
        assert_eq!(server_message(r#"{"detail": "", "error": "e"}"#), Some("e".into()));
        assert_eq!(server_message(r#"{"other": 1}"#), None);
        assert_eq!(server_message("not json"), None);
    }
}
