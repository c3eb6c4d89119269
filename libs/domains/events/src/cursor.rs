//! Opaque pagination tokens
//!
//! A token is the base64url encoding of `{"last_id": "...", "timestamp": "..."}`.
//! Only `last_id` takes part in the page boundary; `timestamp` is carried so a
//! token can be read back when diagnosing a paging problem.
//!
//! Tokens are encoded, not signed. They must not carry anything a client is
//! not allowed to see.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{EventError, Result};

/// Tokens above this size are rejected before decoding
pub const MAX_TOKEN_SIZE: usize = 4 * 1024;

/// Position of the last row a client has seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// `None` keeps cursor mode without adding an id boundary
    pub last_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct CursorPayload {
    #[serde(default)]
    last_id: String,
    #[serde(default)]
    timestamp: DateTime<Utc>,
}

impl Cursor {
    pub fn new(last_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            last_id: Some(last_id),
            timestamp,
        }
    }

    /// Encode into an opaque token
    ///
    /// Returns an empty string if the payload cannot be serialized; callers
    /// treat an empty token as "no next page".
    pub fn encode(&self) -> String {
        let payload = CursorPayload {
            last_id: self.last_id.map(|id| id.to_string()).unwrap_or_default(),
            timestamp: self.timestamp,
        };

        match serde_json::to_vec(&payload) {
            Ok(json) => URL_SAFE.encode(json),
            Err(e) => {
                warn!(error = %e, "Failed to encode pagination cursor");
                String::new()
            }
        }
    }

    /// Decode a token produced by [`Cursor::encode`]
    ///
    /// Padded and unpadded base64url are both accepted.
    pub fn decode(token: &str) -> Result<Self> {
        if token.len() > MAX_TOKEN_SIZE {
            return Err(EventError::InvalidCursor(format!(
                "token exceeds {} bytes",
                MAX_TOKEN_SIZE
            )));
        }

        let bytes = URL_SAFE
            .decode(token)
            .or_else(|_| URL_SAFE_NO_PAD.decode(token))
            .map_err(|_| EventError::InvalidCursor("token is not valid base64".to_string()))?;

        let payload: CursorPayload = serde_json::from_slice(&bytes)
            .map_err(|e| EventError::InvalidCursor(format!("malformed token payload: {}", e)))?;

        let last_id = if payload.last_id.is_empty() {
            None
        } else {
            let id = Uuid::parse_str(&payload.last_id).map_err(|_| {
                EventError::InvalidCursor(format!("invalid last_id '{}'", payload.last_id))
            })?;
            Some(id)
        };

        Ok(Self {
            last_id,
            timestamp: payload.timestamp,
        })
    }
}
