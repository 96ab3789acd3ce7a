//! Storage backend boundary for the Graffiti object database.
//!
//! The engine talks to storage exclusively through the [`ObjectBackend`]
//! trait: an ordered key-value store with atomic last-writer-wins puts,
//! range scans over materialized secondary views, and a monotonic logical
//! clock that stamps every write.
//!
//! # Design Rules
//!
//! 1. `put` is atomic: a record either wins the last-writer-wins merge and
//!    becomes visible (with its views re-mapped) or is silently superseded.
//! 2. Range scans collect their rows inside a single lock acquisition and
//!    release before returning — callers never hold backend locks.
//! 3. The backend never interprets `value` payloads; only the fields that
//!    drive ordering and indexing (`url`, `last_modified`, `channels`,
//!    `actor`) are examined by view map functions supplied by the engine.
//! 4. Installing a view that already exists is absorbed as a no-op.
//! 5. All storage errors are propagated, never silently ignored.
//!
//! # Backends
//!
//! - [`MemoryBackend`] — `BTreeMap`-based reference backend for tests and
//!   embedding.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use traits::{BackendInfo, MapFn, ObjectBackend, PutOutcome, ViewRow};
