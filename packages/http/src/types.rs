use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

use crate::error::Error;
use crate::payload::FormBody;

/// The verbs the backend understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PATCH,
    PUT,
    DELETE,
}

impl Method {
    /// Methods that change server state and carry the anti-forgery token.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::GET)
    }

    /// Methods whose JSON payload is sent as the request body.
    pub fn sends_body(self) -> bool {
        matches!(self, Method::POST | Method::PATCH | Method::PUT)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PATCH => "PATCH",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PATCH" => Ok(Method::PATCH),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PATCH => http::Method::PATCH,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// Per-call overrides merged over the client's defaults.
///
/// Headers are applied after the defaults, so a header named here replaces
/// the default of the same name (names compare case-insensitively).
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    /// Send session cookies with the request. `None` keeps the caller's default.
    pub include_credentials: Option<bool>,
    /// Overrides the client-wide timeout for this call.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_credentials(mut self, include: bool) -> Self {
        self.include_credentials = Some(include);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Body as it goes over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum WireBody {
    Json(serde_json::Value),
    Form(FormBody),
}

/// A fully resolved request, ready for a [`crate::HttpExecutor`].
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<WireBody>,
    pub include_credentials: bool,
    pub timeout: Option<Duration>,
}

impl PreparedRequest {
    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Raw HTTP response from a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,

    /// Canonical reason phrase, used in fallback error messages.
    pub status_text: String,

    /// Response headers, names lower-cased
    pub headers: HashMap<String, String>,

    /// Raw body as string
    pub body_text: String,
}

impl HttpResponse {
    /// Any 2xx, 204 included.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Whether the declared content type is JSON.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Decoded result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 204 No Content; the body was never read.
    NoContent { status: u16 },
    Json(serde_json::Value),
    Text(String),
}

impl ApiResponse {
    /// JSON view of the result. 204 becomes `{"success": true, "status": 204}`.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            ApiResponse::NoContent { status } => {
                serde_json::json!({ "success": true, "status": status })
            }
            ApiResponse::Json(value) => value.clone(),
            ApiResponse::Text(text) => serde_json::Value::String(text.clone()),
        }
    }

    /// Deserialize a JSON result into `T`.
    ///
    /// A text body is a decode failure, not an empty value.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        match self {
            ApiResponse::Json(value) => {
                serde_json::from_value(value).map_err(|e| Error::decode(e.to_string()))
            }
            ApiResponse::NoContent { .. } => serde_json::from_value(self.to_value())
                .map_err(|e| Error::decode(e.to_string())),
            ApiResponse::Text(_) => Err(Error::decode("expected a JSON body, got text")),
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, ApiResponse::NoContent { .. })
    }
}

impl Serialize for ApiResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
