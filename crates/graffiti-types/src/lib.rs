//! Foundation types for the Graffiti object database.
//!
//! This crate provides the record, identity, and encoding primitives used
//! throughout the engine. Every other Graffiti crate depends on
//! `graffiti-types`.
//!
//! # Key Types
//!
//! - [`GraffitiObject`] — the persisted record: an actor-owned JSON value
//!   tagged with channels and an optional allow-list
//! - [`Session`] — the `{actor}` token handed to every engine call
//! - [`url`] — the object-URL codec, the only authority mapping a url to
//!   its owning actor
//! - [`id`] — cryptographically random object identifier minting

pub mod error;
pub mod id;
pub mod object;
pub mod session;
pub mod url;

pub use error::TypeError;
pub use id::mint_object_id;
pub use object::{dedup_channels, GraffitiObject};
pub use session::{session_actor, Session};
pub use url::{decode_object_url, encode_object_url};
