// Request descriptors
//
// A `RequestOptions` describes one logical call. It is kept cloneable and
// transport-agnostic so the client can rebuild the reqwest request after a
// session refresh; multipart bodies are described rather than held as a
// `reqwest::multipart::Form`, which can only be sent once.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

/// Request body.
#[derive(Debug, Clone)]
pub enum Body {
    /// Structured payload, sent as JSON.
    Json(Value),
    /// Raw multipart form; the transport sets the content type and boundary.
    Multipart(MultipartForm),
}

/// Re-buildable description of a `multipart/form-data` body.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<(String, FormPart)>,
}

#[derive(Debug, Clone)]
enum FormPart {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: String,
        mime: Option<String>,
    },
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::File {
                bytes,
                file_name: file_name.into(),
                mime: mime.map(String::from),
            },
        ));
        self
    }

    /// Materialize a fresh `reqwest` form for one send.
    pub(crate) fn to_form(&self) -> Result<reqwest::multipart::Form, Error> {
        let mut form = reqwest::multipart::Form::new();
        for (name, part) in &self.parts {
            form = match part {
                FormPart::Text(value) => form.text(name.clone(), value.clone()),
                FormPart::File {
                    bytes,
                    file_name,
                    mime,
                } => {
                    let mut part =
                        reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        part = part.mime_str(mime).map_err(|e| {
                            Error::InvalidRequest(format!("invalid MIME type {mime:?}: {e}"))
                        })?;
                    }
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

/// Options for one logical request.
///
/// Defaults: `GET`, no body, no extra headers, no credentials.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Body>,
    pub headers: HeaderMap,
    /// Send (and accept) session cookies with this call.
    pub include_auth: bool,
    /// Set on the re-issued request after a refresh; never retried again.
    pub(crate) retried: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
            include_auth: false,
            retried: false,
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    /// Attach any serializable payload as a JSON body.
    pub fn json_from(self, body: &impl Serialize) -> Result<Self, Error> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::InvalidRequest(format!("body could not be serialized: {e}")))?;
        Ok(self.json(value))
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Add a header. Caller headers override the client defaults.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_auth(mut self) -> Self {
        self.include_auth = true;
        self
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.body, Some(Body::Multipart(_)))
    }

    pub fn is_retry(&self) -> bool {
        self.retried
    }

    /// Copy of these options marked as the single permitted retry.
    pub(crate) fn as_retry(&self) -> Self {
        Self {
            retried: true,
            ..self.clone()
        }
    }

    /// Reject descriptors that must never reach the transport.
    pub(crate) fn validate(&self, path: &str) -> Result<(), Error> {
        if path.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "request path must not be empty".into(),
            ));
        }
        if !is_standard_method(&self.method) {
            return Err(Error::InvalidRequest(format!(
                "unsupported HTTP method {}",
                self.method
            )));
        }
        Ok(())
    }
}

fn is_standard_method(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]
    .contains(method)
}
