use std::sync::Arc;

use graffiti_types::GraffitiObject;

use crate::error::StoreResult;

/// A view map function: given a record, emit the index keys it appears
/// under. Supplied by the engine when installing a view; the backend
/// re-runs it on every winning put.
pub type MapFn = Arc<dyn Fn(&GraffitiObject) -> Vec<String> + Send + Sync>;

/// One row of a view range scan, ordered by `(key, url)`.
#[derive(Clone, Debug)]
pub struct ViewRow {
    /// The emitted index key.
    pub key: String,
    /// Primary key of the record that emitted this row.
    pub url: String,
    /// The record itself, attached when the scan requested documents.
    pub doc: Option<GraffitiObject>,
}

/// Result of an atomic put.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutOutcome {
    /// Backend-assigned revision id of the incoming record.
    pub rev: String,
    /// `true` if the incoming record won the last-writer-wins merge and is
    /// now the stored state for its url. Losers are superseded silently.
    pub winner: bool,
}

/// A snapshot of backend-wide state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendInfo {
    /// Current value of the monotonic logical clock. Every stored record
    /// carries a `last_modified` at or below this value.
    pub update_seq: u64,
}

/// Ordered key-value storage with materialized secondary views.
///
/// All implementations must satisfy these invariants:
/// - `put` is atomic and resolves concurrent writes to the same url by
///   last-writer-wins: higher `last_modified` wins; ties break by
///   lexicographic comparison of the backend-assigned revision ids,
///   largest winning. The losing record is superseded without error.
/// - `tick` is strictly monotonic across the life of the backend and is
///   the only source of `last_modified` values.
/// - `range` returns rows sorted by `(key, url)` and holds no locks after
///   returning.
/// - Re-installing an existing view is a no-op, not an error.
pub trait ObjectBackend: Send + Sync {
    /// Read the record stored under `url`, tombstone or live.
    ///
    /// Returns `Ok(None)` if the url has never been written.
    fn get(&self, url: &str) -> StoreResult<Option<GraffitiObject>>;

    /// Atomically upsert a record under its url.
    fn put(&self, object: GraffitiObject) -> StoreResult<PutOutcome>;

    /// Upsert multiple records.
    ///
    /// Default implementation calls [`ObjectBackend::put`] per record.
    /// Backends may override for better performance.
    fn bulk_put(&self, objects: Vec<GraffitiObject>) -> StoreResult<Vec<PutOutcome>> {
        objects.into_iter().map(|obj| self.put(obj)).collect()
    }

    /// Inclusive lexicographic range scan over the named view.
    ///
    /// Rows whose key falls in `[start, end]` are returned in `(key, url)`
    /// order, with documents attached when `include_docs` is set.
    fn range(
        &self,
        view: &str,
        start: &str,
        end: &str,
        include_docs: bool,
    ) -> StoreResult<Vec<ViewRow>>;

    /// Install a materialized view under `name`, mapping every current and
    /// future record through `map`. Installing an existing name again is
    /// absorbed as a no-op.
    fn ensure_view(&self, name: &str, map: MapFn) -> StoreResult<()>;

    /// Read the current logical clock without advancing it.
    fn info(&self) -> StoreResult<BackendInfo>;

    /// Advance the logical clock and return its new value. Writers stamp
    /// `last_modified` from this.
    fn tick(&self) -> u64;
}
