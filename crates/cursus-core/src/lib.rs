//! Cursus Core — domain models, error taxonomy, the storage port, and
//! the declarative visibility filter shared across all crates.

pub mod error;
pub mod filter;
pub mod models;
pub mod store;

pub use error::{CursusError, CursusResult, DenyReason};
pub use filter::{FieldPredicate, FilterExpr, FilterTarget, VisibilityClause};
pub use models::course::Course;
pub use models::principal::{Principal, Role};
pub use models::resource::{LifecycleStatus, ParentRef, Resource, ResourceKind};
pub use store::{ResourceStore, SiblingScope};
