//! # memoires-http
//!
//! REST client for the thesis catalogue backend.
//!
//! ## Layers
//!
//! ### ApiClient
//!
//! The request executor. Builds one request from a method, a path relative
//! to the configured base URL, an optional body and per-call options, then
//! normalizes the outcome:
//!
//! ```ignore
//! use memoires_http::{ApiClient, ClientConfig};
//!
//! let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:8000/api")?)?;
//!
//! // JSON in, JSON out
//! let tracks = client.get("/tracks/").await?;
//!
//! // 204 comes back as {"success": true, "status": 204}
//! let deleted = client.delete("/memories/delete/12/").await?;
//! ```
//!
//! ### Payloads
//!
//! A [`Payload`] holding a [`FileUpload`] (directly or in a top-level array)
//! is sent as `multipart/form-data`; anything else is JSON:
//!
//! ```ignore
//! use memoires_http::{FileUpload, Payload};
//!
//! let payload = Payload::new()
//!     .with("titre", "Monitoring IoT")
//!     .with("annee", 2025)
//!     .with("fichier_pdf", FileUpload::new("iot.pdf", "application/pdf", bytes));
//!
//! client.post("/memories/create", payload).await?;
//! ```
//!
//! ### AuthenticatedClient
//!
//! Sends session cookies and adds the `X-CSRFToken` header on mutating
//! methods:
//!
//! ```ignore
//! use memoires_http::{AuthenticatedClient, CookieString, Method, RequestOptions};
//!
//! let auth = AuthenticatedClient::new(client, Arc::new(CookieString::new("csrftoken=...")));
//! auth.request(Method::PATCH, "/tracks/1/", Some(json!({"icon": "fas fa-code"})), RequestOptions::default()).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod cookies;
pub mod error;
pub mod executor;
pub mod payload;
pub mod types;
pub mod validation;

// Re-export main types
pub use auth::AuthenticatedClient;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use cookies::{CookieJar, CookieString, CsrfTokenSource};
pub use error::Error;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use payload::{is_multipart, FileUpload, FormBody, FormField, Payload, PayloadValue, RequestBody};
pub use types::{ApiResponse, HttpResponse, Method, PreparedRequest, RequestOptions, WireBody};
pub use validation::{validate_file, FileRules, FileValidation};
