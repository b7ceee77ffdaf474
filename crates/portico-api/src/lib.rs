// portico-api: session-aware HTTP client with transparent refresh-and-retry

pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod flows;
pub mod request;
pub mod session;
pub mod transport;

mod refresh;

pub use auth::{Endpoint, EndpointTable, SessionKind};
pub use client::{
    ApiClient, ClientConfig, DEFAULT_CSRF_COOKIE, DEFAULT_CSRF_HEADER, absolute_url,
};
pub use envelope::{Envelope, NETWORK_FAILURE_STATUS};
pub use error::Error;
pub use request::{Body, MultipartForm, RequestOptions};
pub use session::{HandlerGuard, SessionContext};
pub use transport::{TlsMode, TransportConfig};

// Re-exported so callers can build options without a direct reqwest dependency.
pub use reqwest::Method;
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use tokio_util::sync::CancellationToken;
