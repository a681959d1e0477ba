use std::time::Duration;

use url::Url;

use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";

/// Startup configuration for [`crate::ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin plus API prefix; request paths are appended verbatim.
    pub base_url: Url,
    pub timeout: Duration,
    pub csrf_cookie_name: String,
    pub csrf_header_name: String,
    /// Fail mutating authenticated requests when no token cookie exists.
    pub require_csrf_token: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: Duration::from_secs(30),
            csrf_cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header_name: DEFAULT_CSRF_HEADER.to_string(),
            require_csrf_token: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            ..Self::default()
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_csrf_cookie(mut self, name: impl Into<String>) -> Self {
        self.csrf_cookie_name = name.into();
        self
    }

    pub fn with_csrf_header(mut self, name: impl Into<String>) -> Self {
        self.csrf_header_name = name.into();
        self
    }

    pub fn require_csrf_token(mut self, require: bool) -> Self {
        self.require_csrf_token = require;
        self
    }

    /// Absolute URL for `path`, appended to the base without normalisation.
    pub fn url_for(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    /// The base URL with its `/api` suffix removed; where uploaded files live.
    pub fn origin(&self) -> Url {
        let mut origin = self.base_url.clone();
        let path = origin.path().trim_end_matches('/');
        let trimmed = path.strip_suffix("/api").unwrap_or(path).to_string();
        origin.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
        origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_appended_verbatim() {
        let config = ClientConfig::default();
        assert_eq!(
            config.url_for("/memories/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/memories/"
        );
        assert_eq!(
            config.url_for("/memories/create").unwrap().as_str(),
            "http://127.0.0.1:8000/api/memories/create"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let config = ClientConfig::new("http://localhost:9000/api/").unwrap();
        assert_eq!(
            config.url_for("/tracks/3/").unwrap().as_str(),
            "http://localhost:9000/api/tracks/3/"
        );
    }

    #[test]
    fn origin_drops_api_prefix() {
        let config = ClientConfig::default();
        assert_eq!(config.origin().as_str(), "http://127.0.0.1:8000/");

        let config = ClientConfig::new("https://ecole.example/catalogue/api").unwrap();
        assert_eq!(config.origin().as_str(), "https://ecole.example/catalogue");
    }

    #[test]
    fn origin_strips_a_single_api_segment() {
        let config = ClientConfig::new("http://10.0.0.5:8000/x/api/api").unwrap();
        assert_eq!(config.origin().as_str(), "http://10.0.0.5:8000/x/api");

        let config = ClientConfig::new("http://10.0.0.5:8000/backend").unwrap();
        assert_eq!(config.origin().as_str(), "http://10.0.0.5:8000/backend");
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.csrf_cookie_name, "csrftoken");
        assert_eq!(config.csrf_header_name, "X-CSRFToken");
        assert!(!config.require_csrf_token);
    }
}
