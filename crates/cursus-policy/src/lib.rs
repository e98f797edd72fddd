//! Cursus Policy — ownership-chain resolution, mutation
//! authorization, role-based visibility filters, and sibling
//! order-index management.
//!
//! Every component is a pure function of its inputs plus the storage
//! port: nothing here holds state between calls, spawns tasks, or
//! blocks on anything but the port itself.

pub mod config;
pub mod graph;
pub mod guard;
pub mod sequence;
pub mod visibility;

pub use config::SequenceConfig;
pub use graph::{Ownership, ResourceGraph};
pub use guard::{Action, GuardOptions, OwnershipGuard};
pub use sequence::SequenceManager;
