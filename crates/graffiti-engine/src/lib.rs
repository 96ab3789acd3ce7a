//! The Graffiti object database engine.
//!
//! A local, embeddable store for the Graffiti data model: actor-owned
//! JSON objects grouped into channels, discoverable by schema-filtered
//! streaming queries, with tombstone-based deletion and a resumable
//! change feed.
//!
//! # Public operations
//!
//! - [`GraffitiEngine::post`] — create an object owned by the session's
//!   actor
//! - [`GraffitiEngine::get`] — point read, masked and schema-filtered
//! - [`GraffitiEngine::delete`] — owner-only tombstoning
//! - [`GraffitiEngine::discover`] — streaming channel discovery ending in
//!   a [`Continuation`]
//! - [`GraffitiEngine::resume`] — continue a discovery stream from its
//!   cursor, replaying deletions as tombstone events
//! - [`GraffitiEngine::recover_orphans`] — owner-scoped listing of
//!   objects with no channels
//!
//! # Example
//!
//! ```
//! use graffiti_engine::{EngineConfig, GraffitiEngine, ObjectDraft, Session};
//! use serde_json::json;
//!
//! # fn main() -> graffiti_engine::EngineResult<()> {
//! let engine = GraffitiEngine::new(EngineConfig::default())?;
//! let session = Session::new("alice");
//!
//! let posted = engine.post(
//!     ObjectDraft::new(json!({ "note": "hello" })).in_channels(["demo"]),
//!     &session,
//! )?;
//!
//! let fetched = engine.get(&posted.url, &json!({}), Some(&session))?;
//! assert_eq!(fetched, posted);
//! # Ok(())
//! # }
//! ```

pub mod acl;
pub mod config;
pub mod cursor;
pub mod discover;
pub mod engine;
pub mod error;
pub mod index;
pub mod schema;
pub mod session;

pub use config::EngineConfig;
pub use discover::{Continuation, DiscoverEvent, DiscoverStream};
pub use engine::{GraffitiEngine, ObjectDraft};
pub use error::{EngineError, EngineResult};
pub use schema::CompiledSchema;
pub use session::{SessionEvent, SessionEventStream, SessionEvents, SessionManager};

// Re-export the foundation types callers hold at the API boundary.
pub use graffiti_types::{GraffitiObject, Session};
