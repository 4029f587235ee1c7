//! # In-memory storage backend
//!
//! Implements the entity-store and blob-store traits with plain maps behind
//! locks. Serves as the reference backend for tests and local runs; a hosted
//! document store slots in behind the same traits without touching the
//! domain layer.

pub mod blob_store;
pub mod store;

pub use blob_store::MemoryBlobStore;
pub use store::MemoryStore;
