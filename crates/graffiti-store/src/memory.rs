use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use rand::Rng;
use tracing::debug;

use graffiti_types::GraffitiObject;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BackendInfo, MapFn, ObjectBackend, PutOutcome, ViewRow};

/// In-memory, `BTreeMap`-based backend for tests and embedding.
///
/// One `RwLock` guards the primary namespace and all materialized views,
/// making every put atomic with respect to its view maintenance. The
/// logical clock lives in an `AtomicU64` so `tick` never contends with
/// readers.
pub struct MemoryBackend {
    name: String,
    seq: AtomicU64,
    inner: RwLock<State>,
}

/// A stored record plus its backend-assigned revision id.
struct Versioned {
    rev: String,
    object: GraffitiObject,
}

struct MaterializedView {
    map: MapFn,
    /// Rows keyed by `(view key, url)`; the value side is always null.
    rows: BTreeMap<(String, String), ()>,
}

#[derive(Default)]
struct State {
    docs: BTreeMap<String, Versioned>,
    views: BTreeMap<String, MaterializedView>,
}

impl MemoryBackend {
    /// Create an empty backend with the given logical database name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seq: AtomicU64::new(0),
            inner: RwLock::new(State::default()),
        }
    }

    /// The logical database name this backend was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of records stored, tombstones included.
    pub fn len(&self) -> usize {
        self.inner.read().expect("backend lock poisoned").docs.len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Revision id for a record: the clock value joined with fresh entropy
    /// so concurrent writes at the same clock value still order totally.
    fn make_rev(last_modified: u64) -> String {
        let entropy: [u8; 8] = rand::thread_rng().gen();
        format!("{last_modified}-{}", hex::encode(entropy))
    }
}

impl ObjectBackend for MemoryBackend {
    fn get(&self, url: &str) -> StoreResult<Option<GraffitiObject>> {
        let state = self.inner.read().expect("backend lock poisoned");
        Ok(state.docs.get(url).map(|v| v.object.clone()))
    }

    fn put(&self, object: GraffitiObject) -> StoreResult<PutOutcome> {
        let rev = Self::make_rev(object.last_modified);
        let mut state = self.inner.write().expect("backend lock poisoned");
        let State { docs, views } = &mut *state;

        let winner = match docs.get(&object.url) {
            None => true,
            // Last-writer-wins: higher clock value, then largest rev.
            Some(existing) => {
                (object.last_modified, rev.as_str())
                    > (existing.object.last_modified, existing.rev.as_str())
            }
        };

        if winner {
            if let Some(old) = docs.get(&object.url) {
                for view in views.values_mut() {
                    for key in (view.map)(&old.object) {
                        view.rows.remove(&(key, object.url.clone()));
                    }
                }
            }
            for view in views.values_mut() {
                for key in (view.map)(&object) {
                    view.rows.insert((key, object.url.clone()), ());
                }
            }
            debug!(url = %object.url, last_modified = object.last_modified, "record stored");
            docs.insert(
                object.url.clone(),
                Versioned {
                    rev: rev.clone(),
                    object,
                },
            );
        }

        Ok(PutOutcome { rev, winner })
    }

    fn range(
        &self,
        view: &str,
        start: &str,
        end: &str,
        include_docs: bool,
    ) -> StoreResult<Vec<ViewRow>> {
        let state = self.inner.read().expect("backend lock poisoned");
        let materialized = state
            .views
            .get(view)
            .ok_or_else(|| StoreError::UnknownView(view.to_string()))?;

        let lower = (start.to_string(), String::new());
        let rows = materialized
            .rows
            .range(lower..)
            .take_while(|((key, _), _)| key.as_str() <= end)
            .map(|((key, url), _)| ViewRow {
                key: key.clone(),
                url: url.clone(),
                doc: if include_docs {
                    state.docs.get(url).map(|v| v.object.clone())
                } else {
                    None
                },
            })
            .collect();
        Ok(rows)
    }

    fn ensure_view(&self, name: &str, map: MapFn) -> StoreResult<()> {
        let mut state = self.inner.write().expect("backend lock poisoned");
        if state.views.contains_key(name) {
            // Re-installation conflict, absorbed.
            return Ok(());
        }

        let mut rows = BTreeMap::new();
        for (url, versioned) in &state.docs {
            for key in map(&versioned.object) {
                rows.insert((key, url.clone()), ());
            }
        }
        debug!(view = name, rows = rows.len(), "view installed");
        state
            .views
            .insert(name.to_string(), MaterializedView { map, rows });
        Ok(())
    }

    fn info(&self) -> StoreResult<BackendInfo> {
        Ok(BackendInfo {
            update_seq: self.seq.load(Ordering::SeqCst),
        })
    }

    fn tick(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("name", &self.name)
            .field("records", &self.len())
            .finish()
    }
}
