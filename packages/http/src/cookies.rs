//! Client-side cookie storage and anti-forgery token lookup.

use std::sync::Arc;

use http::HeaderValue;
use percent_encoding::percent_decode_str;
use reqwest::cookie::{CookieStore, Jar};
use url::Url;

/// Somewhere a CSRF token can be read from.
pub trait CsrfTokenSource: Send + Sync {
    /// Value of the cookie called exactly `name`, if any.
    fn cookie(&self, name: &str) -> Option<String>;
}

/// Find `name` in a `a=b; c=d` cookie string and percent-decode its value.
pub fn find_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
}

/// A fixed cookie string, as `document.cookie` would expose it.
#[derive(Debug, Clone, Default)]
pub struct CookieString(String);

impl CookieString {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self(cookies.into())
    }
}

impl CsrfTokenSource for CookieString {
    fn cookie(&self, name: &str) -> Option<String> {
        find_cookie(&self.0, name)
    }
}

/// Session cookie jar shared by the executor and the token lookup.
///
/// The executor adds these cookies to credentialed requests and stores the
/// `Set-Cookie` headers they receive, so a token issued by the backend is
/// visible here on the next call.
#[derive(Debug, Clone)]
pub struct CookieJar {
    jar: Arc<Jar>,
    url: Url,
}

impl CookieJar {
    /// An empty jar scoped to `url`.
    pub fn new(url: Url) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            url,
        }
    }

    /// Seed the jar from a `a=b; c=d` string.
    pub fn add_cookie_str(&self, cookies: &str) {
        for pair in cookies.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, &self.url);
        }
    }

    /// `Cookie` header value for `url`.
    pub fn header_for(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }

    /// Record `Set-Cookie` values received from `url`.
    pub fn store_from<'a>(&self, set_cookies: impl Iterator<Item = &'a HeaderValue>, url: &Url) {
        let mut set_cookies = set_cookies.peekable();
        if set_cookies.peek().is_some() {
            self.jar.set_cookies(&mut set_cookies, url);
        }
    }
}

impl CsrfTokenSource for CookieJar {
    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.url)?;
        find_cookie(header.to_str().ok()?, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_name_match() {
        let cookies = "xcsrftoken=wrong; csrftoken=right; csrftoken2=also-wrong";
        assert_eq!(find_cookie(cookies, "csrftoken"), Some("right".to_string()));
    }

    #[test]
    fn missing_cookie() {
        assert_eq!(find_cookie("sessionid=abc", "csrftoken"), None);
        assert_eq!(find_cookie("", "csrftoken"), None);
    }

    #[test]
    fn values_are_percent_decoded() {
        assert_eq!(
            find_cookie("csrftoken=a%2Fb%3D", "csrftoken"),
            Some("a/b=".to_string())
        );
    }

    #[test]
    fn cookie_string_source() {
        let source = CookieString::new("sessionid=s1; csrftoken=t0k3n");
        assert_eq!(source.cookie("csrftoken"), Some("t0k3n".to_string()));
    }

    #[test]
    fn jar_source_reads_seeded_cookies() {
        let url = Url::parse("http://127.0.0.1:8000/api").unwrap();
        let jar = CookieJar::new(url.clone());
        jar.add_cookie_str("csrftoken=abc; sessionid=xyz");

        assert_eq!(jar.cookie("csrftoken"), Some("abc".to_string()));
        assert!(jar.header_for(&url).is_some());
    }
}
