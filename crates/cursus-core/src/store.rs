//! Storage port trait and the sibling-scope key.
//!
//! All storage operations are async. The core does not manage
//! transactions: it assumes each call is atomic from its own
//! perspective, and that the store enforces a unique
//! `(parent, order_index)` constraint per sequenced kind.

use uuid::Uuid;

use crate::error::CursusResult;
use crate::models::resource::{ParentRef, Resource, ResourceKind};

/// Key identifying one ordered sibling collection: all resources of
/// one kind under one immediate parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiblingScope {
    pub parent: ParentRef,
    pub kind: ResourceKind,
}

impl SiblingScope {
    pub fn new(parent: ParentRef, kind: ResourceKind) -> Self {
        Self { parent, kind }
    }

    /// The scope a resource participates in, if any: the resource
    /// must be of a sequenced kind and have a parent.
    pub fn of(resource: &Resource) -> Option<Self> {
        if !resource.kind.is_sequenced() {
            return None;
        }
        resource.parent.map(|parent| Self::new(parent, resource.kind))
    }
}

impl std::fmt::Display for SiblingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} scope of {} {}",
            self.kind, self.parent.kind, self.parent.id
        )
    }
}

/// The storage collaborator the core calls through.
pub trait ResourceStore: Send + Sync {
    /// Fetch a resource by kind + id; `None` when missing.
    fn get(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> impl Future<Output = CursusResult<Option<Resource>>> + Send;

    /// All resources in one sibling scope, in no particular order.
    fn list_siblings(
        &self,
        scope: SiblingScope,
    ) -> impl Future<Output = CursusResult<Vec<Resource>>> + Send;

    /// Create a new resource. Fails `AlreadyExists` on an id
    /// collision and `IndexTaken` on a `(parent, order_index)`
    /// collision in a sequenced kind.
    fn insert(&self, resource: Resource) -> impl Future<Output = CursusResult<Resource>> + Send;

    /// Update an existing resource. Fails `NotFound` if the id is
    /// gone — a write never resurrects a concurrently deleted row.
    fn save(&self, resource: Resource) -> impl Future<Output = CursusResult<Resource>> + Send;

    /// Atomic batch update (renumber, index swap). Fails `NotFound`
    /// if any id is gone and `IndexTaken` if the batch's end state
    /// violates index uniqueness; on failure nothing is applied.
    fn save_all(&self, resources: Vec<Resource>) -> impl Future<Output = CursusResult<()>> + Send;

    /// Delete a resource and, cascading, its descendants.
    fn delete(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> impl Future<Output = CursusResult<()>> + Send;
}
