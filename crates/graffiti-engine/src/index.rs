//! Secondary index definitions installed into the storage backend.
//!
//! Two views exist: `objectsByChannelAndLastModified` powers channel
//! discovery, `orphansByActorAndLastModified` powers owner-scoped orphan
//! recovery. Both key their rows as
//! `urlencode(component) + "/" + pad15(lastModified)`, which makes
//! lexicographic range scans equivalent to numeric `lastModified` scans.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use graffiti_store::{ObjectBackend, StoreResult};
use graffiti_types::GraffitiObject;

/// Channel discovery index. Tombstones are emitted like live objects; the
/// discovery layer decides whether to surface them.
pub const OBJECTS_BY_CHANNEL: &str = "objectsByChannelAndLastModified";

/// Orphan recovery index: objects with no channels, keyed by owner.
pub const ORPHANS_BY_ACTOR: &str = "orphansByActorAndLastModified";

/// Suffix ordered above any zero-padded decimal, closing unbounded scans.
pub const END_SENTINEL: &str = "\u{ffff}";

/// Escapes everything but `[A-Za-z0-9._-]`; in particular `/` is escaped,
/// keeping the key's component/suffix split unambiguous.
const KEY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.');

/// Zero-pad a clock value to 15 decimal digits.
///
/// Keeps lexicographic and numeric ordering identical for any value below
/// 10^15.
pub(crate) fn pad15(n: u64) -> String {
    format!("{n:015}")
}

/// Scan bounds over one index component (a channel or an actor) and a
/// suffix window.
pub(crate) fn scan_bounds(component: &str, start_suffix: &str, end_suffix: &str) -> (String, String) {
    let encoded = utf8_percent_encode(component, KEY_COMPONENT);
    (
        format!("{encoded}/{start_suffix}"),
        format!("{encoded}/{end_suffix}"),
    )
}

fn channel_keys(object: &GraffitiObject) -> Vec<String> {
    object
        .channels
        .iter()
        .map(|channel| {
            format!(
                "{}/{}",
                utf8_percent_encode(channel, KEY_COMPONENT),
                pad15(object.last_modified)
            )
        })
        .collect()
}

fn orphan_keys(object: &GraffitiObject) -> Vec<String> {
    if !object.channels.is_empty() {
        return Vec::new();
    }
    vec![format!(
        "{}/{}",
        utf8_percent_encode(&object.actor, KEY_COMPONENT),
        pad15(object.last_modified)
    )]
}

/// Install both views. Safe to call on a backend that already carries
/// them; re-installation is absorbed by the backend.
pub(crate) fn install_views(backend: &dyn ObjectBackend) -> StoreResult<()> {
    backend.ensure_view(OBJECTS_BY_CHANNEL, Arc::new(channel_keys))?;
    backend.ensure_view(ORPHANS_BY_ACTOR, Arc::new(orphan_keys))?;
    Ok(())
}
