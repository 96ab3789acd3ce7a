//! The discovery cursor wire format.
//!
//! A cursor is the ASCII string `"discover:"` followed by the JSON
//! serialization of [`CursorPayload`]. It is opaque to callers: the engine
//! hands it out at the end of a discovery stream and accepts it back in
//! [`resume`](crate::GraffitiEngine::resume). Unrecognized input maps to
//! `NotFound` so a damaged cursor is indistinguishable from a vanished
//! one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

pub(crate) const CURSOR_PREFIX: &str = "discover:";

/// Resumption state carried inside a cursor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueParams {
    /// Wall-clock milliseconds when the cursor was minted; drives the
    /// continuation rate limit across process restarts.
    pub last_discovered: u64,
    /// The watermark: continuations report events with `lastModified`
    /// strictly above this value.
    pub if_modified_since: u64,
}

/// The full serialized form of a discovery call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPayload {
    pub channels: Vec<String>,
    pub schema: Value,
    pub continue_params: ContinueParams,
    /// The actor the originating session was bound to; `null` for an
    /// anonymous cursor. A resume under a different actor is rejected.
    #[serde(default)]
    pub actor: Option<String>,
}

impl CursorPayload {
    /// Serialize to the wire string.
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).expect("cursor payload always serializes");
        format!("{CURSOR_PREFIX}{json}")
    }

    /// Parse a wire string. Any unrecognized or malformed input is
    /// `NotFound`.
    pub fn parse(cursor: &str) -> EngineResult<Self> {
        let body = cursor
            .strip_prefix(CURSOR_PREFIX)
            .ok_or(EngineError::NotFound)?;
        serde_json::from_str(body).map_err(|_| EngineError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload() -> CursorPayload {
        CursorPayload {
            channels: vec!["c1".into(), "c2".into()],
            schema: json!({ "properties": { "value": {} } }),
            continue_params: ContinueParams {
                last_discovered: 1_700_000_000_000,
                if_modified_since: 42,
            },
            actor: Some("alice".into()),
        }
    }

    #[test]
    fn roundtrip() {
        let encoded = payload().encode();
        assert!(encoded.starts_with("discover:"));
        let parsed = CursorPayload::parse(&encoded).unwrap();
        assert_eq!(parsed, payload());
    }

    #[test]
    fn wire_fields_are_camel_case() {
        let encoded = payload().encode();
        let body: Value =
            serde_json::from_str(encoded.strip_prefix(CURSOR_PREFIX).unwrap()).unwrap();
        assert_eq!(body["continueParams"]["ifModifiedSince"], 42);
        assert_eq!(body["continueParams"]["lastDiscovered"], 1_700_000_000_000u64);
    }

    #[test]
    fn anonymous_cursor_carries_a_null_actor() {
        let mut p = payload();
        p.actor = None;
        let encoded = p.encode();

        // The key is always on the wire, null when anonymous.
        let body: Value =
            serde_json::from_str(encoded.strip_prefix(CURSOR_PREFIX).unwrap()).unwrap();
        assert_eq!(body["actor"], Value::Null);
        assert!(body.as_object().unwrap().contains_key("actor"));

        let parsed = CursorPayload::parse(&encoded).unwrap();
        assert_eq!(parsed.actor, None);
    }

    #[test]
    fn missing_prefix_is_not_found() {
        let err = CursorPayload::parse("resume:{}").unwrap_err();
        assert!(matches!(err, EngineError::NotFound));
    }

    #[test]
    fn malformed_body_is_not_found() {
        let err = CursorPayload::parse("discover:{not json").unwrap_err();
        assert!(matches!(err, EngineError::NotFound));
    }
}
