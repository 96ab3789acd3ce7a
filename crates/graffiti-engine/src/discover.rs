//! The streaming discovery iterator and its continuation.
//!
//! A [`DiscoverStream`] pulls index rows channel by channel, deduplicates
//! objects that appear in several queried channels, applies visibility,
//! masking, and the compiled schema predicate, and yields the survivors.
//! When the stream is exhausted it converts into a [`Continuation`] whose
//! cursor can be fed back to [`resume`](crate::GraffitiEngine::resume),
//! in this process or a later one, to pick up where the scan stopped.
//!
//! Scans clamp their upper key to the clock value sampled at stream
//! start, so a stream never observes a record written after it began;
//! such records surface in the continuation.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::debug;

use graffiti_store::{ObjectBackend, ViewRow};
use graffiti_types::Session;

use crate::acl;
use crate::cursor::{ContinueParams, CursorPayload};
use crate::error::EngineResult;
use crate::index::{self, OBJECTS_BY_CHANNEL};
use crate::schema::CompiledSchema;

/// One element of a discovery stream.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoverEvent {
    /// A live object that passed visibility, masking, and the predicate.
    Object(graffiti_types::GraffitiObject),
    /// A deletion observed by a continuation. Never emitted by a fresh
    /// stream.
    Tombstone { url: String },
}

/// The terminator of a discovery stream: an opaque cursor that resumes
/// the scan above the watermark it carries.
#[derive(Clone, Debug)]
pub struct Continuation {
    cursor: String,
}

impl Continuation {
    /// The serialized cursor.
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Consume the continuation, yielding the cursor string.
    pub fn into_cursor(self) -> String {
        self.cursor
    }
}

/// Everything a stream needs at construction.
pub(crate) struct StreamSpec {
    pub backend: Arc<dyn ObjectBackend>,
    pub schema: Arc<CompiledSchema>,
    pub schema_value: Value,
    pub channels: Vec<String>,
    pub viewer: Option<Session>,
    /// Continuation mode: tombstones are emitted instead of skipped.
    pub replay: bool,
    /// Clock snapshot taken before iteration; the scan's upper bound and
    /// the floor of the next watermark.
    pub start_clock: u64,
    pub start_suffix: String,
    pub end_suffix: String,
}

/// A pull-based discovery iterator.
///
/// Yields `Err` at most once (a backend fault aborts the scan); callers
/// that drain it to `None` convert it into a [`Continuation`].
pub struct DiscoverStream {
    spec: StreamSpec,
    pending_channels: VecDeque<String>,
    current_rows: std::vec::IntoIter<ViewRow>,
    processed: HashSet<String>,
    max_seen: u64,
}

impl std::fmt::Debug for DiscoverStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoverStream").finish_non_exhaustive()
    }
}

impl DiscoverStream {
    pub(crate) fn new(spec: StreamSpec) -> Self {
        // Scan each distinct channel once; the processed set already
        // dedups objects, this avoids redundant scans.
        let mut seen = HashSet::new();
        let pending_channels = spec
            .channels
            .iter()
            .filter(|c| seen.insert((*c).clone()))
            .cloned()
            .collect();
        debug!(
            channels = spec.channels.len(),
            replay = spec.replay,
            start_clock = spec.start_clock,
            "discovery scan started"
        );
        Self {
            spec,
            pending_channels,
            current_rows: Vec::new().into_iter(),
            processed: HashSet::new(),
            max_seen: 0,
        }
    }

    /// The channels this stream was queried with, in caller order.
    pub fn channels(&self) -> &[String] {
        &self.spec.channels
    }

    /// Convert the stream into its continuation.
    ///
    /// The watermark is the greatest `lastModified` observed or the clock
    /// snapshot taken at stream start, whichever is larger.
    pub fn into_continuation(self) -> Continuation {
        let payload = CursorPayload {
            channels: self.spec.channels,
            schema: self.spec.schema_value,
            continue_params: ContinueParams {
                last_discovered: wall_clock_ms(),
                if_modified_since: self.spec.start_clock.max(self.max_seen),
            },
            actor: self.spec.viewer.map(|s| s.actor),
        };
        Continuation {
            cursor: payload.encode(),
        }
    }

    /// Run one row through the dedup/visibility/mask/predicate pipeline.
    fn consider(&mut self, row: ViewRow) -> Option<DiscoverEvent> {
        // Rows without documents carry nothing to evaluate.
        let doc = row.doc?;
        if !self.processed.insert(doc.url.clone()) {
            return None;
        }
        self.max_seen = self.max_seen.max(doc.last_modified);

        if doc.tombstone {
            // Fresh streams hide deletions; continuations surface them so
            // consumers can reconcile.
            return self
                .spec
                .replay
                .then(|| DiscoverEvent::Tombstone { url: doc.url });
        }
        if !acl::is_visible(&doc, self.spec.viewer.as_ref()) {
            return None;
        }
        let masked = acl::mask(doc, &self.spec.channels, self.spec.viewer.as_ref());
        if !self.spec.schema.matches(&masked) {
            return None;
        }
        Some(DiscoverEvent::Object(masked))
    }
}

impl Iterator for DiscoverStream {
    type Item = EngineResult<DiscoverEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.current_rows.next() {
                if let Some(event) = self.consider(row) {
                    return Some(Ok(event));
                }
                continue;
            }

            let channel = self.pending_channels.pop_front()?;
            let (start, end) = index::scan_bounds(
                &channel,
                &self.spec.start_suffix,
                &self.spec.end_suffix,
            );
            match self
                .spec
                .backend
                .range(OBJECTS_BY_CHANNEL, &start, &end, true)
            {
                Ok(rows) => self.current_rows = rows.into_iter(),
                Err(e) => {
                    self.pending_channels.clear();
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

/// Wall-clock milliseconds since the UNIX epoch.
pub(crate) fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
