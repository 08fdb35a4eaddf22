//!
//! lostfound storage module
//! ------------------------
//! Durable key-value storage for the client session. The session manager only needs
//! three string entries (access token, refresh token, serialized user) to survive a
//! process restart, so the surface is a tiny string-to-string store behind a trait.
//!
//! Two backends ship with the crate:
//! - `MemoryStore`: process-local map, used by tests and `--ephemeral` runs.
//! - `FileStore`: a single JSON object on disk, rewritten atomically on every mutation.

pub mod kv;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
