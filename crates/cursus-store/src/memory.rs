//! In-memory implementation of [`ResourceStore`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use cursus_core::error::{CursusError, CursusResult};
use cursus_core::filter::{FilterExpr, FilterTarget};
use cursus_core::models::resource::{LifecycleStatus, Resource, ResourceKind};
use cursus_core::store::{ResourceStore, SiblingScope};
use tracing::debug;
use uuid::Uuid;

/// Bound on parent hops when deriving effective status or the owning
/// teacher for a row; mirrors the policy layer's chain bound.
const MAX_CHAIN_HOPS: usize = 8;

/// In-memory resource store.
///
/// Enforces the constraints the core assumes of real storage: a
/// unique `(parent, order_index)` per sequenced kind, parent
/// existence on insert, and cascading delete. Every call runs under
/// one lock, so each is atomic with respect to concurrent callers —
/// the in-memory stand-in for a database transaction.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Uuid, Resource>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// List resources of `kind` matching `filter` — the reference
    /// interpretation of a visibility filter. Each row is flattened
    /// into a [`FilterTarget`] by walking its ownership chain for the
    /// effective status and owning teacher.
    pub fn list_filtered(
        &self,
        kind: ResourceKind,
        filter: &FilterExpr,
    ) -> CursusResult<Vec<Resource>> {
        let map = self.read()?;
        Ok(map
            .values()
            .filter(|r| r.kind == kind)
            .filter(|r| filter.matches(&derive_target(&map, r)))
            .cloned()
            .collect())
    }

    fn read(&self) -> CursusResult<RwLockReadGuard<'_, HashMap<Uuid, Resource>>> {
        self.inner
            .read()
            .map_err(|_| CursusError::Storage("store lock poisoned".into()))
    }

    fn write(&self) -> CursusResult<RwLockWriteGuard<'_, HashMap<Uuid, Resource>>> {
        self.inner
            .write()
            .map_err(|_| CursusError::Storage("store lock poisoned".into()))
    }
}

impl ResourceStore for MemoryStore {
    async fn get(&self, kind: ResourceKind, id: Uuid) -> CursusResult<Option<Resource>> {
        let map = self.read()?;
        Ok(map.get(&id).filter(|r| r.kind == kind).cloned())
    }

    async fn list_siblings(&self, scope: SiblingScope) -> CursusResult<Vec<Resource>> {
        let map = self.read()?;
        Ok(map
            .values()
            .filter(|r| r.kind == scope.kind && r.parent == Some(scope.parent))
            .cloned()
            .collect())
    }

    async fn insert(&self, resource: Resource) -> CursusResult<Resource> {
        let mut map = self.write()?;
        if map.contains_key(&resource.id) {
            return Err(CursusError::AlreadyExists {
                kind: resource.kind,
                id: resource.id,
            });
        }
        if let Some(parent) = resource.parent
            && !map.get(&parent.id).is_some_and(|p| p.kind == parent.kind)
        {
            return Err(CursusError::NotFound {
                kind: parent.kind,
                id: parent.id,
            });
        }
        if let Some(scope) = SiblingScope::of(&resource)
            && let Some(index) = resource.order_index
            && index_is_taken(&map, scope, index, resource.id)
        {
            return Err(CursusError::IndexTaken { scope, index });
        }
        map.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn save(&self, mut resource: Resource) -> CursusResult<Resource> {
        let mut map = self.write()?;
        if !map
            .get(&resource.id)
            .is_some_and(|r| r.kind == resource.kind)
        {
            return Err(CursusError::NotFound {
                kind: resource.kind,
                id: resource.id,
            });
        }
        if let Some(scope) = SiblingScope::of(&resource)
            && let Some(index) = resource.order_index
            && index_is_taken(&map, scope, index, resource.id)
        {
            return Err(CursusError::IndexTaken { scope, index });
        }
        resource.updated_at = Utc::now();
        map.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn save_all(&self, resources: Vec<Resource>) -> CursusResult<()> {
        let mut map = self.write()?;
        for resource in &resources {
            if !map
                .get(&resource.id)
                .is_some_and(|r| r.kind == resource.kind)
            {
                return Err(CursusError::NotFound {
                    kind: resource.kind,
                    id: resource.id,
                });
            }
        }

        // Stage the whole batch, then validate its end state; only a
        // valid batch replaces the live map.
        let mut staged = map.clone();
        let now = Utc::now();
        for mut resource in resources {
            resource.updated_at = now;
            staged.insert(resource.id, resource);
        }
        let mut seen = std::collections::HashSet::new();
        for resource in staged.values() {
            if let Some(scope) = SiblingScope::of(resource)
                && let Some(index) = resource.order_index
                && !seen.insert((scope, index))
            {
                return Err(CursusError::IndexTaken { scope, index });
            }
        }

        *map = staged;
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, id: Uuid) -> CursusResult<()> {
        let mut map = self.write()?;
        if !map.get(&id).is_some_and(|r| r.kind == kind) {
            return Err(CursusError::NotFound { kind, id });
        }

        // Breadth-first cascade over the subtree rooted at `id`.
        let mut doomed = vec![id];
        let mut cursor = 0;
        while cursor < doomed.len() {
            let parent_id = doomed[cursor];
            cursor += 1;
            doomed.extend(
                map.values()
                    .filter(|r| r.parent.is_some_and(|p| p.id == parent_id))
                    .map(|r| r.id),
            );
        }
        for doomed_id in &doomed {
            map.remove(doomed_id);
        }
        if doomed.len() > 1 {
            debug!(%kind, %id, cascade = doomed.len() - 1, "cascading delete");
        }
        Ok(())
    }
}

fn index_is_taken(
    map: &HashMap<Uuid, Resource>,
    scope: SiblingScope,
    index: u32,
    except: Uuid,
) -> bool {
    map.values().any(|r| {
        r.id != except
            && r.kind == scope.kind
            && r.parent == Some(scope.parent)
            && r.order_index == Some(index)
    })
}

fn derive_target(map: &HashMap<Uuid, Resource>, resource: &Resource) -> FilterTarget {
    FilterTarget {
        effective_status: effective_status(map, resource),
        owner_id: resource.owner_id,
        owning_teacher_id: owning_teacher(map, resource),
        title: resource.title.clone(),
    }
}

/// A row's own status, or the nearest status-bearing ancestor's.
fn effective_status(
    map: &HashMap<Uuid, Resource>,
    resource: &Resource,
) -> Option<LifecycleStatus> {
    let mut current = resource;
    for _ in 0..MAX_CHAIN_HOPS {
        if let Some(status) = current.status {
            return Some(status);
        }
        current = map.get(&current.parent?.id)?;
    }
    None
}

/// The teacher owning the course at the root of the row's chain, if
/// the chain terminates at a course.
fn owning_teacher(map: &HashMap<Uuid, Resource>, resource: &Resource) -> Option<Uuid> {
    let mut current = resource;
    for _ in 0..MAX_CHAIN_HOPS {
        if current.kind == ResourceKind::Course {
            return current.owner_id;
        }
        current = map.get(&current.parent?.id)?;
    }
    None
}
