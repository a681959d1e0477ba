//! The transport seam.
//!
//! [`ApiClient`](crate::ApiClient) only ever talks to an [`HttpExecutor`].
//! Production code plugs in [`ReqwestExecutor`]; tests swap in
//! [`mock::MockExecutor`] to script backend answers and outages.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::Client;

use crate::cookies::CookieJar;
use crate::error::Error;
use crate::types::{HttpResponse, PreparedRequest, WireBody};

/// Sends a [`PreparedRequest`] and hands back the raw response.
///
/// One call is exactly one network exchange. Status codes are not
/// interpreted here; a non-2xx response is still `Ok`.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Returns [`Error::Transport`] when no response was obtained.
    async fn execute(&self, request: &PreparedRequest) -> Result<HttpResponse, Error>;
}

/// Network transport over an async `reqwest::Client`.
pub struct ReqwestExecutor {
    client: Client,
    cookies: Option<CookieJar>,
}

impl ReqwestExecutor {
    /// `timeout` applies to calls that do not set their own.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            cookies: None,
        })
    }

    /// 30 second timeout.
    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(Duration::from_secs(30))
    }

    /// Use `jar` for credentialed requests.
    pub fn with_cookie_jar(mut self, jar: CookieJar) -> Self {
        self.cookies = Some(jar);
        self
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: &PreparedRequest) -> Result<HttpResponse, Error> {
        let method: http::Method = request.method.into();
        let mut req_builder = self
            .client
            .request(method, request.url.clone())
            .headers(request.headers.clone());

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        let jar = self.cookies.as_ref().filter(|_| request.include_credentials);
        if let Some(cookie) = jar.and_then(|jar| jar.header_for(&request.url)) {
            req_builder = req_builder.header(COOKIE, cookie);
        }

        match &request.body {
            Some(WireBody::Json(value)) => {
                req_builder = req_builder.body(serde_json::to_vec(value)?);
            }
            Some(WireBody::Form(form)) => {
                req_builder = req_builder.multipart(form.to_multipart()?);
            }
            None => {}
        }

        let response = req_builder.send().await?;

        if let Some(jar) = jar {
            jar.store_from(response.headers().get_all(SET_COOKIE).iter(), &request.url);
        }

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response.text().await?;

        Ok(HttpResponse {
            status,
            status_text,
            headers,
            body_text,
        })
    }
}

/// Scripted transport for tests.
///
/// Unknown routes answer 404 with a JSON `detail`, like the backend does.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use crate::types::Method;
    use std::sync::{Arc, Mutex};

    type Key = (Method, String);

    /// Canned responses keyed by method and URL path (`/api/tracks/`).
    ///
    /// Clones share state, so a test can keep a handle and change the
    /// behaviour after the executor has been moved into a client.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Responses keyed by method and URL path.
        responses: Arc<Mutex<HashMap<Key, HttpResponse>>>,
        /// Every request seen, in order.
        recorded_requests: Arc<Mutex<Vec<PreparedRequest>>>,
        /// Transport failure returned for every request when set.
        failure: Arc<Mutex<Option<String>>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a response for a method and path.
        pub fn with_response(
            self,
            method: Method,
            path: impl Into<String>,
            response: HttpResponse,
        ) -> Self {
            self.set_response(method, path, response);
            self
        }

        /// Add a 200 JSON response for `GET path`.
        pub fn with_json(self, path: impl Into<String>, body: serde_json::Value) -> Self {
            self.with_response(Method::GET, path, Self::json_response(200, body))
        }

        /// Configure to fail all requests with a transport error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            self.set_failure(Some(message.into()));
            self
        }

        pub fn set_response(&self, method: Method, path: impl Into<String>, response: HttpResponse) {
            self.responses
                .lock()
                .unwrap()
                .insert((method, path.into()), response);
        }

        /// Switch transport failure on (`Some`) or off (`None`).
        pub fn set_failure(&self, message: Option<String>) {
            *self.failure.lock().unwrap() = message;
        }

        pub fn recorded_requests(&self) -> Vec<PreparedRequest> {
            self.recorded_requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.recorded_requests.lock().unwrap().len()
        }

        pub fn clear_recorded(&self) {
            self.recorded_requests.lock().unwrap().clear();
        }

        /// Create a JSON response.
        pub fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
            let mut headers = HashMap::new();
            headers.insert("content-type".to_string(), "application/json".to_string());
            HttpResponse {
                status,
                status_text: status_text(status),
                headers,
                body_text: body.to_string(),
            }
        }

        /// Create a plain-text response.
        pub fn text_response(status: u16, body: &str) -> HttpResponse {
            let mut headers = HashMap::new();
            headers.insert("content-type".to_string(), "text/plain".to_string());
            HttpResponse {
                status,
                status_text: status_text(status),
                headers,
                body_text: body.to_string(),
            }
        }

        /// Create a 204 No Content response.
        pub fn no_content() -> HttpResponse {
            HttpResponse {
                status: 204,
                status_text: "No Content".to_string(),
                headers: HashMap::new(),
                body_text: String::new(),
            }
        }

        /// The backend's answer for an unknown route.
        pub fn not_found() -> HttpResponse {
            Self::json_response(404, serde_json::json!({"detail": "Not found."}))
        }
    }

    fn status_text(status: u16) -> String {
        http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string()
    }

    #[async_trait]
    impl HttpExecutor for MockExecutor {
        async fn execute(&self, request: &PreparedRequest) -> Result<HttpResponse, Error> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            if let Some(message) = self.failure.lock().unwrap().clone() {
                return Err(Error::transport(message));
            }

            let key = (request.method, request.url.path().to_string());
            let responses = self.responses.lock().unwrap();
            Ok(responses
                .get(&key)
                .cloned()
                .unwrap_or_else(Self::not_found))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockExecutor;
    use super::*;
    use crate::types::Method;
    use http::HeaderMap;
    use url::Url;

    fn get(path: &str) -> PreparedRequest {
        PreparedRequest {
            method: Method::GET,
            url: Url::parse(&format!("http://127.0.0.1:8000/api{}", path)).unwrap(),
            headers: HeaderMap::new(),
            body: None,
            include_credentials: false,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn mock_executor_returns_configured_response() {
        let executor =
            MockExecutor::new().with_json("/api/tracks/", serde_json::json!([{"id": 1}]));

        let result = executor.execute(&get("/tracks/")).await.unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.body_text, r#"[{"id":1}]"#);
        assert!(result.is_json());
    }

    #[tokio::test]
    async fn mock_executor_returns_404_when_no_match() {
        let executor = MockExecutor::new();
        let result = executor.execute(&get("/unknown/")).await.unwrap();
        assert_eq!(result.status, 404);
    }

    #[tokio::test]
    async fn mock_executor_failure_can_be_toggled() {
        let executor = MockExecutor::new().with_json("/api/keywords/", serde_json::json!([]));
        let handle = executor.clone();

        handle.set_failure(Some("connection refused".to_string()));
        let error = executor.execute(&get("/keywords/")).await.unwrap_err();
        assert!(error.is_transport());

        handle.set_failure(None);
        assert!(executor.execute(&get("/keywords/")).await.is_ok());
    }

    #[tokio::test]
    async fn mock_executor_records_requests() {
        let executor = MockExecutor::new();

        executor.execute(&get("/first/")).await.unwrap();
        executor.execute(&get("/second/")).await.unwrap();

        let recorded = executor.recorded_requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].url.path(), "/api/first/");

        executor.clear_recorded();
        assert_eq!(executor.request_count(), 0);
    }

    #[test]
    fn reqwest_executor_creation() {
        assert!(ReqwestExecutor::with_default_timeout().is_ok());
        assert!(ReqwestExecutor::new(Duration::from_secs(10)).is_ok());
    }
}
