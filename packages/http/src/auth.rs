//! Session-aware requests: CSRF header plus cookies.

use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::client::{ApiClient, ErrorBodyPolicy};
use crate::cookies::CsrfTokenSource;
use crate::error::Error;
use crate::payload::RequestBody;
use crate::types::{ApiResponse, Method, RequestOptions};

/// [`ApiClient`] wrapper for endpoints behind a Django-style session.
///
/// Every call sends cookies. Mutating calls (POST/PATCH/PUT/DELETE) also
/// carry the anti-forgery token read from `tokens`, when there is one.
#[derive(Clone)]
pub struct AuthenticatedClient {
    client: ApiClient,
    tokens: Arc<dyn CsrfTokenSource>,
}

impl AuthenticatedClient {
    pub fn new(client: ApiClient, tokens: Arc<dyn CsrfTokenSource>) -> Self {
        Self { client, tokens }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The current token, if the configured cookie exists.
    pub fn csrf_token(&self) -> Option<String> {
        self.tokens.cookie(&self.client.config().csrf_cookie_name)
    }

    /// Issue a credentialed request.
    ///
    /// `data` is sent as JSON for POST/PATCH/PUT and ignored for GET/DELETE.
    /// On a non-2xx response the body is always tried as JSON for a
    /// `detail`/`error` message; if that fails the status line is used.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse, Error> {
        let config = self.client.config();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if method.is_mutating() {
            match self.csrf_token() {
                Some(token) => {
                    let name = HeaderName::try_from(config.csrf_header_name.as_str())?;
                    headers.insert(name, HeaderValue::try_from(token)?);
                }
                None if config.require_csrf_token => {
                    return Err(Error::MissingCsrfToken {
                        cookie: config.csrf_cookie_name.clone(),
                    });
                }
                None => {
                    debug!(%method, path, "no CSRF token cookie; sending without it");
                }
            }
        }

        let body = data
            .filter(|_| method.sends_body())
            .map(|value| RequestBody::Json(value).into_wire());

        let request = self
            .client
            .prepare(method, path, body, headers, true, options)?;
        self.client.send(&request, ErrorBodyPolicy::Sniff).await
    }
}
