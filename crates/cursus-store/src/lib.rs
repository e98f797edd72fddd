//! Cursus Store — in-memory reference implementation of the
//! [`ResourceStore`](cursus_core::store::ResourceStore) port.
//!
//! Used by tests and embedders that need the storage-layer guarantees
//! the core assumes (index uniqueness, parent existence, cascading
//! delete) without a database.

mod memory;

pub use memory::MemoryStore;
