use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted Graffiti record: an actor-owned JSON value grouped into
/// channels, optionally restricted by an allow-list.
///
/// Field names serialize in camelCase so the stored JSON matches the wire
/// data model (`lastModified`, not `last_modified`).
///
/// # Invariants
///
/// - `url` is globally unique and uniquely determines `actor` (the url
///   codec is the only authority for that mapping).
/// - `last_modified` is assigned by the storage backend's logical clock
///   and never decreases across successful writes to the same url.
/// - When `tombstone` is `true`, `value` and `allowed` are logically
///   absent: the record only marks that the url once held a live object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraffitiObject {
    /// Primary key; of the form `scheme + encode(actor) + sep + encode(id)`.
    pub url: String,
    /// The owning actor. Immutable for the life of the object.
    pub actor: String,
    /// The JSON payload. Always a JSON object for live records.
    pub value: Value,
    /// Channel membership used by discovery. Duplicates are ignored.
    pub channels: Vec<String>,
    /// `None` means public; `Some` is an explicit allow-list (the owner is
    /// always implicitly included).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// Backend logical clock value at the time of the winning write.
    pub last_modified: u64,
    /// Deletion marker.
    pub tombstone: bool,
}

impl GraffitiObject {
    /// Returns `true` if `actor` owns this object.
    pub fn is_owned_by(&self, actor: &str) -> bool {
        self.actor == actor
    }

    /// Convert this record into its tombstone at the given clock value.
    ///
    /// Channels are preserved so continuation feeds can route the deletion
    /// to subscribers filtering by channel; `value` and `allowed` are
    /// cleared.
    pub fn into_tombstone(mut self, last_modified: u64) -> Self {
        self.value = Value::Null;
        self.allowed = None;
        self.tombstone = true;
        self.last_modified = last_modified;
        self
    }
}

/// Remove duplicate channel names, preserving first-occurrence order.
pub fn dedup_channels(channels: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    channels
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> GraffitiObject {
        GraffitiObject {
            url: "graffiti:local:alice~abc".into(),
            actor: "alice".into(),
            value: json!({"x": 1}),
            channels: vec!["c1".into(), "c2".into()],
            allowed: Some(vec!["bob".into()]),
            last_modified: 7,
            tombstone: false,
        }
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["lastModified"], 7);
        assert!(json.get("last_modified").is_none());
    }

    #[test]
    fn absent_allowed_is_omitted() {
        let mut obj = sample();
        obj.allowed = None;
        let json = serde_json::to_value(&obj).unwrap();
        assert!(json.get("allowed").is_none());

        // And deserializes back to None.
        let parsed: GraffitiObject = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.allowed, None);
    }

    #[test]
    fn serde_roundtrip() {
        let obj = sample();
        let text = serde_json::to_string(&obj).unwrap();
        let parsed: GraffitiObject = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, obj);
    }

    #[test]
    fn tombstone_clears_payload_and_allowed() {
        let tomb = sample().into_tombstone(9);
        assert!(tomb.tombstone);
        assert_eq!(tomb.value, Value::Null);
        assert_eq!(tomb.allowed, None);
        assert_eq!(tomb.last_modified, 9);
        // Channels survive for continuation feeds.
        assert_eq!(tomb.channels, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn ownership_check() {
        let obj = sample();
        assert!(obj.is_owned_by("alice"));
        assert!(!obj.is_owned_by("bob"));
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let channels = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ];
        assert_eq!(
            dedup_channels(channels),
            vec!["b".to_string(), "a".to_string(), "c".to_string()]
        );
    }
}
