use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use graffiti_store::{MemoryBackend, ObjectBackend};
use graffiti_types::{
    decode_object_url, dedup_channels, encode_object_url, mint_object_id, GraffitiObject, Session,
};

use crate::acl;
use crate::config::EngineConfig;
use crate::cursor::CursorPayload;
use crate::discover::{wall_clock_ms, DiscoverStream, StreamSpec};
use crate::error::{EngineError, EngineResult};
use crate::index::{self, ORPHANS_BY_ACTOR};
use crate::schema::CompiledSchema;

/// The caller-supplied part of a new object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDraft {
    /// The JSON payload. Must be a JSON object.
    pub value: Value,
    /// Channels to publish into. Empty makes the object an orphan,
    /// recoverable only by its owner.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Optional allow-list; absent means public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ObjectDraft {
    /// A draft with the given payload, no channels, public.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            channels: Vec::new(),
            allowed: None,
        }
    }

    /// Publish into the given channels.
    pub fn in_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict visibility to the given actors (plus the owner).
    pub fn allowed_to<I, S>(mut self, actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(actors.into_iter().map(Into::into).collect());
        self
    }
}

/// The Graffiti object database engine.
///
/// Owns a storage backend and exposes the five public operations: `post`,
/// `get`, `delete`, `discover`, and `resume` (the cursor continuation),
/// plus the owner-scoped orphan listing. The engine is `Send + Sync`;
/// operations may be issued from any thread.
pub struct GraffitiEngine {
    backend: Arc<dyn ObjectBackend>,
    config: EngineConfig,
    /// Compiled schemas memoized by their serialized form.
    schemas: Mutex<HashMap<String, Arc<CompiledSchema>>>,
}

impl GraffitiEngine {
    /// Create an engine over a fresh in-memory backend.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let backend = Arc::new(MemoryBackend::new(config.name.clone()));
        Self::with_backend(config, backend)
    }

    /// Create an engine over an existing backend, installing the
    /// discovery and orphan views if they are not already present.
    pub fn with_backend(
        config: EngineConfig,
        backend: Arc<dyn ObjectBackend>,
    ) -> EngineResult<Self> {
        index::install_views(backend.as_ref())?;
        info!(name = %config.name, "graffiti engine started");
        Ok(Self {
            backend,
            config,
            schemas: Mutex::new(HashMap::new()),
        })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying storage backend.
    pub fn backend(&self) -> &Arc<dyn ObjectBackend> {
        &self.backend
    }

    /// Compile a schema, reusing a previous compilation of the same
    /// serialized form.
    fn compile_cached(&self, schema: &Value) -> EngineResult<Arc<CompiledSchema>> {
        let key = schema.to_string();
        let mut cache = self.schemas.lock().expect("schema cache poisoned");
        if let Some(compiled) = cache.get(&key) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Arc::new(CompiledSchema::compile(schema)?);
        cache.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    // ---------------------------------------------------------------
    // CRUD
    // ---------------------------------------------------------------

    /// Create a new object owned by the session's actor.
    ///
    /// Mints a fresh id, stamps `lastModified` from the backend clock,
    /// and stores the record atomically. Returns the canonical object.
    pub fn post(&self, draft: ObjectDraft, session: &Session) -> EngineResult<GraffitiObject> {
        if !draft.value.is_object() {
            return Err(EngineError::InvalidObject(
                "value must be a JSON object".into(),
            ));
        }

        let id = mint_object_id();
        let object = GraffitiObject {
            url: encode_object_url(&session.actor, &id),
            actor: session.actor.clone(),
            value: draft.value,
            channels: dedup_channels(draft.channels),
            allowed: draft.allowed,
            last_modified: self.backend.tick(),
            tombstone: false,
        };
        self.backend.put(object.clone())?;
        debug!(url = %object.url, channels = object.channels.len(), "object posted");
        Ok(object)
    }

    /// Read one object by url, masked for the caller and filtered by the
    /// schema.
    ///
    /// Absent, tombstoned, and invisible records are all `NotFound`; a
    /// visible record that fails the predicate is `SchemaMismatch`.
    pub fn get(
        &self,
        url: &str,
        schema: &Value,
        session: Option<&Session>,
    ) -> EngineResult<GraffitiObject> {
        let compiled = self.compile_cached(schema)?;
        let record = self.backend.get(url)?.ok_or(EngineError::NotFound)?;
        if record.tombstone || !acl::is_visible(&record, session) {
            return Err(EngineError::NotFound);
        }
        let masked = acl::mask(record, &[], session);
        if !compiled.matches(&masked) {
            return Err(EngineError::SchemaMismatch);
        }
        Ok(masked)
    }

    /// Tombstone an object. Owner-only.
    ///
    /// The tombstone keeps the object's channels so continuation feeds
    /// can report the deletion, and takes a fresh `lastModified`. The
    /// write is retried until it commits or a concurrent delete is
    /// observed to have won (the terminal state either way).
    pub fn delete(&self, url: &str, session: &Session) -> EngineResult<()> {
        let (actor, _id) = decode_object_url(url)?;
        if actor != session.actor {
            return Err(EngineError::Forbidden);
        }

        let mut first_attempt = true;
        loop {
            let record = self.backend.get(url)?.ok_or(EngineError::NotFound)?;
            if record.tombstone {
                // Already deleted: an error on the first look, success if
                // a concurrent delete beat our retry.
                return if first_attempt {
                    Err(EngineError::NotFound)
                } else {
                    Ok(())
                };
            }
            let tombstone = record.into_tombstone(self.backend.tick());
            if self.backend.put(tombstone)?.winner {
                debug!(url, "object deleted");
                return Ok(());
            }
            first_attempt = false;
        }
    }

    /// List the caller's orphans: live objects with no channels, in
    /// ascending `lastModified` order.
    pub fn recover_orphans(&self, session: &Session) -> EngineResult<Vec<GraffitiObject>> {
        let (start, end) = index::scan_bounds(&session.actor, "", index::END_SENTINEL);
        let rows = self.backend.range(ORPHANS_BY_ACTOR, &start, &end, true)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.doc)
            .filter(|doc| !doc.tombstone)
            .map(|doc| acl::mask(doc, &[], Some(session)))
            .collect())
    }

    // ---------------------------------------------------------------
    // Discovery
    // ---------------------------------------------------------------

    /// Open a fresh discovery stream over the given channels.
    ///
    /// The stream yields every visible, schema-matching, non-tombstoned
    /// object indexed under the channels (deduplicated across them) with
    /// `lastModified` at or below the clock sampled here. Draining the
    /// stream and converting it yields the continuation cursor.
    pub fn discover(
        &self,
        channels: Vec<String>,
        schema: &Value,
        session: Option<&Session>,
    ) -> EngineResult<DiscoverStream> {
        let compiled = self.compile_cached(schema)?;
        let start_clock = self.backend.info()?.update_seq;
        let clamp = index::pad15(start_clock);
        let end_suffix = compiled.end_suffix().min(clamp.as_str()).to_string();

        Ok(DiscoverStream::new(StreamSpec {
            backend: Arc::clone(&self.backend),
            schema: Arc::clone(&compiled),
            schema_value: schema.clone(),
            channels,
            viewer: session.cloned(),
            replay: false,
            start_clock,
            start_suffix: compiled.start_suffix().to_string(),
            end_suffix,
        }))
    }

    /// Resume a discovery stream from a cursor (the `continue` operation;
    /// renamed because `continue` is a keyword).
    ///
    /// The resumed scan reports records with `lastModified` strictly
    /// above the cursor's watermark, and emits tombstones so consumers
    /// can reconcile deletions. A resume arriving within the continue
    /// buffer of the previous one waits out the remainder first.
    pub fn resume(
        &self,
        cursor: &str,
        session: Option<&Session>,
    ) -> EngineResult<DiscoverStream> {
        let payload = CursorPayload::parse(cursor)?;
        if let Some(bound) = &payload.actor {
            if session.map(|s| s.actor.as_str()) != Some(bound.as_str()) {
                return Err(EngineError::Forbidden);
            }
        }

        let elapsed = wall_clock_ms().saturating_sub(payload.continue_params.last_discovered);
        let buffer_ms = self.config.continue_buffer.as_millis() as u64;
        if elapsed < buffer_ms {
            thread::sleep(Duration::from_millis(buffer_ms - elapsed));
        }

        let compiled = self.compile_cached(&payload.schema)?;
        let start_clock = self.backend.info()?.update_seq;
        let floor = index::pad15(payload.continue_params.if_modified_since.saturating_add(1));
        let start_suffix = compiled.start_suffix().max(floor.as_str()).to_string();
        let clamp = index::pad15(start_clock);
        let end_suffix = compiled.end_suffix().min(clamp.as_str()).to_string();

        debug!(
            if_modified_since = payload.continue_params.if_modified_since,
            start_clock,
            "discovery resumed"
        );

        Ok(DiscoverStream::new(StreamSpec {
            backend: Arc::clone(&self.backend),
            schema: Arc::clone(&compiled),
            schema_value: payload.schema,
            channels: payload.channels,
            viewer: session.cloned(),
            replay: true,
            start_clock,
            start_suffix,
            end_suffix,
        }))
    }
}

impl std::fmt::Debug for GraffitiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraffitiEngine")
            .field("name", &self.config.name)
            .finish()
    }
}
