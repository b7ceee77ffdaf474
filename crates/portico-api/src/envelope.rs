use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::Error;

/// Status reported for failures where no HTTP response was received.
pub const NETWORK_FAILURE_STATUS: u16 = 0;

/// Normalized result of every client call.
///
/// `ok` is true iff `status` is in `200..=299`. `status` is the HTTP status,
/// or [`NETWORK_FAILURE_STATUS`] when the request never produced a
/// response. `data` is the parsed JSON body, `{}` when the body was empty
/// or not JSON, and `{"error": "..."}` for network-level failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    pub status: u16,
    pub data: Value,
}

impl Envelope {
    /// Build an envelope from an HTTP status and an already-parsed body.
    pub fn from_status(status: u16, data: Value) -> Self {
        Self {
            ok: (200..300).contains(&status),
            status,
            data,
        }
    }

    /// Build an envelope from an HTTP status and raw body bytes.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        Self::from_status(status, parse_body(body))
    }

    /// Envelope for a request that never received a response.
    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: NETWORK_FAILURE_STATUS,
            data: json!({ "error": message.into() }),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_network_error(&self) -> bool {
        self.status == NETWORK_FAILURE_STATUS
    }

    /// The `error` message carried by a network-failure envelope, or a
    /// top-level `error`/`detail` string returned by the backend.
    pub fn error_message(&self) -> Option<&str> {
        ["error", "detail", "message"]
            .iter()
            .find_map(|key| self.data.get(key).and_then(Value::as_str))
    }

    /// Decode `data` into a typed payload.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        T::deserialize(&self.data).map_err(|e| Error::Deserialization {
            message: e.to_string(),
        })
    }
}

impl From<Error> for Envelope {
    fn from(err: Error) -> Self {
        Self::network_error(err.envelope_message())
    }
}

/// Best-effort JSON parse. Anything that isn't valid JSON yields `{}`.
pub(crate) fn parse_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Object(Map::new());
    }
    serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Map::new()))
}
