/// The single error kind surfaced by the client.
///
/// Whatever went wrong, the UI only ever shows [`Error::message`]. The
/// variants exist so callers (and tests) can still tell a refused
/// connection from a 404.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A response was obtained but its status was not 2xx.
    #[error("{message}")]
    Http {
        status: u16,
        status_text: String,
        /// Server-supplied `detail`/`error` if present, else the status line.
        message: String,
    },

    /// No response was obtained (DNS, refused connection, timeout...).
    #[error("{message}")]
    Transport { message: String },

    /// The response claimed to be JSON, or was expected to match a type,
    /// and could not be decoded.
    #[error("Invalid response body: {message}")]
    Decode { message: String },

    #[error("CSRF token cookie '{cookie}' not found")]
    MissingCsrfToken { cookie: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("Invalid MIME type '{mime}' for file '{file_name}'")]
    InvalidMimeType { file_name: String, mime: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an HTTP failure, preferring a server-supplied message.
    pub fn http(status: u16, status_text: impl Into<String>, server_message: Option<String>) -> Self {
        let status_text = status_text.into();
        let message =
            server_message.unwrap_or_else(|| format!("HTTP {}: {}", status, status_text));
        Error::Http {
            status,
            status_text,
            message,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    /// The human-readable message shown to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status code, for failures that got as far as a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::transport(error.to_string())
    }
}
