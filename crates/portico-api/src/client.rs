// Resilient API client
//
// Wraps `reqwest::Client` with base-URL resolution, default headers
// (JSON content type, anti-forgery token from the cookie jar) and the
// refresh-and-retry cycle. Every public request method returns an
// `Envelope`; failures never escape as errors. Session flows live in
// `flows.rs` as further inherent methods.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{Endpoint, SessionKind};
use crate::envelope::Envelope;
use crate::error::Error;
use crate::refresh::{RefreshGate, RefreshOutcome};
use crate::request::{Body, RequestOptions};
use crate::session::SessionContext;
use crate::transport::TransportConfig;

/// Cookie the backend stores its anti-forgery token in.
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
/// Header the anti-forgery token is echoed back in.
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";

/// Request-level settings for an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Prefix for relative request paths. When unset, every path must be
    /// an absolute URL.
    pub base_url: Option<Url>,
    pub csrf_cookie: String,
    pub csrf_header: HeaderName,
    /// Profile whose refresh endpoint is used while no session marker is set.
    pub default_session: SessionKind,
    /// Share one in-flight refresh between concurrent 401s.
    pub coalesce_refresh: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            csrf_cookie: DEFAULT_CSRF_COOKIE.into(),
            csrf_header: HeaderName::from_static("x-csrftoken"),
            default_session: SessionKind::default(),
            coalesce_refresh: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: Some(base_url),
            ..Self::default()
        }
    }
}

/// HTTP client with transparent session refresh.
///
/// On a 401 the client posts to the refresh endpoint of the current
/// session profile and, if that succeeds, re-issues the original request
/// exactly once. If the refresh fails the session marker is cleared and the
/// context's unauthorized handler is invoked.
///
/// Clones share the cookie jar, session context, and refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    /// Same transport without a cookie store, for calls without credentials.
    anonymous: reqwest::Client,
    cookie_jar: Arc<Jar>,
    config: ClientConfig,
    session: Arc<SessionContext>,
    refresh_gate: Arc<RefreshGate>,
}

/// Parse `path` as an absolute `http(s)` URL. The scheme is matched
/// case-insensitively; anything else is a path relative to the base URL.
pub fn absolute_url(path: &str) -> Option<Url> {
    Url::parse(path)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client bound to `session`.
    ///
    /// The session context is injected rather than global so that several
    /// independent sessions can coexist in one process.
    pub fn new(
        config: ClientConfig,
        transport: &TransportConfig,
        session: Arc<SessionContext>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let anonymous = transport.build_anonymous_client()?;
        Ok(Self {
            http,
            anonymous,
            cookie_jar: Arc::clone(&transport.cookie_jar),
            refresh_gate: Arc::new(RefreshGate::new(config.coalesce_refresh)),
            config,
            session,
        })
    }

    /// Client with default transport settings and a fresh session.
    pub fn with_base_url(base_url: Url) -> Result<Self, Error> {
        Self::new(
            ClientConfig::new(base_url),
            &TransportConfig::default(),
            SessionContext::new(),
        )
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session context this client reads its marker and handler from.
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.cookie_jar
    }

    /// Profile used to resolve endpoints: the session marker, or the
    /// configured default when no session is established.
    pub fn active_kind(&self) -> SessionKind {
        self.session.kind().unwrap_or(self.config.default_session)
    }

    // ── Anti-forgery token ───────────────────────────────────────────

    /// The anti-forgery token currently stored for the base URL.
    pub fn csrf_token(&self) -> Option<String> {
        let base = self.config.base_url.as_ref()?;
        self.csrf_token_for(base)
    }

    fn csrf_token_for(&self, url: &Url) -> Option<String> {
        let header = self.cookie_jar.cookies(url)?;
        let cookies = header.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.config.csrf_cookie && !value.is_empty()).then(|| value.to_owned())
        })
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve a request path against the base URL.
    ///
    /// Absolute `http(s)://` paths are used as-is. Relative paths are
    /// appended to the base URL, keeping any path prefix it carries.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        if let Some(url) = absolute_url(path) {
            return Ok(url);
        }
        let base = self.config.base_url.as_ref().ok_or_else(|| {
            Error::InvalidRequest(format!("relative path {path:?} requires a base URL"))
        })?;
        let base = base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Whether `url` is the refresh endpoint of any profile, as this client
    /// would resolve it.
    fn is_refresh_url(&self, url: &Url) -> bool {
        Endpoint::is_refresh_path(url.path())
            || SessionKind::iter().any(|kind| {
                self.refresh_url(kind, url).is_ok_and(|refresh| {
                    refresh.origin() == url.origin() && refresh.path() == url.path()
                })
            })
    }

    /// URL of `kind`'s refresh endpoint, on the same origin as `original`
    /// when no base URL is configured.
    fn refresh_url(&self, kind: SessionKind, original: &Url) -> Result<Url, Error> {
        if self.config.base_url.is_some() {
            self.url(kind.refresh_path())
        } else {
            Ok(original.join(kind.refresh_path())?)
        }
    }

    // ── Request entry points ─────────────────────────────────────────

    /// Perform one logical request with refresh-and-retry.
    ///
    /// Never fails: transport errors and invalid descriptors yield a
    /// status-0 envelope carrying `{"error": "..."}`.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Envelope {
        self.request_as(None, path, &options).await
    }

    /// Like [`request`](Self::request), resolving to a status-0 envelope
    /// if `cancel` fires before the call completes.
    pub async fn request_with_cancel(
        &self,
        path: &str,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Envelope {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(path, "request cancelled");
                Envelope::from(Error::Cancelled)
            }
            envelope = self.request(path, options) => envelope,
        }
    }

    /// Issue a request against a logical endpoint of the current profile,
    /// with credentials.
    pub async fn call(&self, endpoint: Endpoint, options: RequestOptions) -> Envelope {
        let kind = self.active_kind();
        self.call_as(kind, endpoint, options).await
    }

    /// Issue a request against a logical endpoint of a specific profile.
    ///
    /// A 401 here refreshes through `kind`'s refresh endpoint regardless of
    /// the current marker.
    pub async fn call_as(
        &self,
        kind: SessionKind,
        endpoint: Endpoint,
        options: RequestOptions,
    ) -> Envelope {
        self.request_as(Some(kind), kind.path(endpoint), &options.with_auth())
            .await
    }

    pub async fn get(&self, path: &str) -> Envelope {
        self.request(path, RequestOptions::get().with_auth()).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Envelope {
        self.request(path, RequestOptions::post().json(body).with_auth())
            .await
    }

    pub async fn put_json(&self, path: &str, body: Value) -> Envelope {
        self.request(path, RequestOptions::put().json(body).with_auth())
            .await
    }

    pub async fn patch_json(&self, path: &str, body: Value) -> Envelope {
        self.request(path, RequestOptions::patch().json(body).with_auth())
            .await
    }

    pub async fn delete(&self, path: &str) -> Envelope {
        self.request(path, RequestOptions::delete().with_auth()).await
    }

    // ── Refresh-and-retry engine ─────────────────────────────────────

    async fn request_as(
        &self,
        kind: Option<SessionKind>,
        path: &str,
        options: &RequestOptions,
    ) -> Envelope {
        match self.execute(kind, path, options).await {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(path, error = %err, "request failed before a response");
                Envelope::from(err)
            }
        }
    }

    async fn execute(
        &self,
        kind: Option<SessionKind>,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Envelope, Error> {
        options.validate(path)?;
        let url = self.url(path)?;

        let kind = kind.unwrap_or_else(|| self.active_kind());
        let seen = self.refresh_gate.generation(kind);
        let response = self.send(&url, options).await?;

        if !response.is_unauthorized() || options.is_retry() || self.is_refresh_url(&url) {
            return Ok(response);
        }

        debug!(%kind, %url, "unauthorized, attempting session refresh");

        let refresh_url = self.refresh_url(kind, &url)?;
        let outcome = self
            .refresh_gate
            .run(kind, seen, || self.refresh(refresh_url))
            .await;

        match outcome {
            RefreshOutcome::Refreshed => {
                debug!(%url, "session refreshed, retrying once");
                self.send(&url, &options.as_retry()).await
            }
            RefreshOutcome::Failed { performed } => {
                warn!(%kind, "session refresh failed, session is no longer valid");
                self.session.clear_kind();
                if performed {
                    self.session.notify_unauthorized();
                }
                Ok(Envelope::from_status(401, response.data))
            }
        }
    }

    /// POST to the refresh endpoint with credentials. Never retried.
    async fn refresh(&self, url: Url) -> bool {
        match self.send(&url, &RequestOptions::post().with_auth()).await {
            Ok(envelope) if envelope.ok => true,
            Ok(envelope) => {
                debug!(status = envelope.status, "refresh rejected");
                false
            }
            Err(err) => {
                debug!(error = %err, "refresh request failed");
                false
            }
        }
    }

    /// Send a single HTTP request and normalize the response.
    async fn send(&self, url: &Url, options: &RequestOptions) -> Result<Envelope, Error> {
        debug!(method = %options.method, %url, retry = options.is_retry(), "sending request");

        let http = if options.include_auth {
            &self.http
        } else {
            &self.anonymous
        };

        let mut builder = http
            .request(options.method.clone(), url.clone())
            .headers(self.headers_for(url, options));

        builder = match &options.body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Multipart(form)) => builder.multipart(form.to_form()?),
            None => builder,
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.unwrap_or_else(|e| {
            debug!(error = %e, "failed to read response body");
            Default::default()
        });

        trace!(status, bytes = body.len(), "response received");
        Ok(Envelope::from_body(status, &body))
    }

    /// Default headers merged with the caller's; the caller wins.
    fn headers_for(&self, url: &Url, options: &RequestOptions) -> HeaderMap {
        let mut headers = HeaderMap::new();

        // Multipart bodies get their content type (with boundary) from reqwest.
        if !options.is_multipart() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if let Some(token) = self.csrf_token_for(url) {
            match HeaderValue::from_str(&token) {
                Ok(value) => {
                    trace!("attaching anti-forgery token");
                    headers.insert(self.config.csrf_header.clone(), value);
                }
                Err(_) => debug!("anti-forgery cookie is not a valid header value"),
            }
        }

        for name in options.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in &options.headers {
            headers.append(name, value.clone());
        }
        headers
    }
}
