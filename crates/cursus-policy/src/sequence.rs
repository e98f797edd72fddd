//! Sibling order-index management.
//!
//! Sequenced sibling collections (modules of a course, chapters of a
//! module, questions of an exam) keep a contiguous, duplicate-free,
//! 1-based order index. This module owns that invariant: assignment
//! on insert, swap on reorder, renumbering after delete.
//!
//! Atomicity against concurrent writers of the same scope comes from
//! the store's unique `(parent, order_index)` constraint, never from
//! in-process locking — multiple process instances are expected. An
//! auto-indexed insert that loses the race sees `IndexTaken` and
//! retries with a freshly computed index.

use std::collections::HashSet;

use cursus_core::error::{CursusError, CursusResult};
use cursus_core::models::resource::{Resource, ResourceKind};
use cursus_core::store::{ResourceStore, SiblingScope};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SequenceConfig;

/// Assigns, validates, and repairs sibling order indices.
pub struct SequenceManager<S: ResourceStore> {
    store: S,
    config: SequenceConfig,
}

impl<S: ResourceStore> SequenceManager<S> {
    pub fn new(store: S, config: SequenceConfig) -> Self {
        Self { store, config }
    }

    /// Next free index in `scope`: `max + 1`, or 1 when the scope is
    /// empty.
    ///
    /// Read-then-decide: only safe against concurrent writers when
    /// the subsequent insert goes through [`Self::insert`], which
    /// retries on conflict.
    pub async fn next_index(&self, scope: SiblingScope) -> CursusResult<u32> {
        ensure_sequenced(scope)?;
        let siblings = self.load_checked(scope).await?;
        Ok(max_index(&siblings) + 1)
    }

    /// Validate an explicit target index against the current scope
    /// contents: an empty scope accepts only 1, a populated scope
    /// accepts `1..=max`.
    pub async fn validate_explicit_index(
        &self,
        scope: SiblingScope,
        candidate: u32,
    ) -> CursusResult<()> {
        ensure_sequenced(scope)?;
        let siblings = self.load_checked(scope).await?;
        if siblings.is_empty() {
            if candidate != 1 {
                return Err(CursusError::EmptyScopeIndex { candidate });
            }
            return Ok(());
        }
        let max = max_index(&siblings);
        if candidate < 1 || candidate > max {
            return Err(CursusError::InvalidIndex { candidate, max });
        }
        Ok(())
    }

    /// Reassign `1..=N` across the scope in current index order,
    /// persisting the changed rows as one atomic batch.
    ///
    /// Invoked after every deletion in a sequenced scope, and the
    /// only sanctioned repair path for duplicate indices — so the
    /// read here deliberately skips the duplicate check. Idempotent:
    /// a second pass changes nothing.
    pub async fn renumber(&self, scope: SiblingScope) -> CursusResult<()> {
        ensure_sequenced(scope)?;
        let mut siblings = self.store.list_siblings(scope).await?;
        // Ties and index-less rows sort last, by id, so the pass is
        // deterministic even on corrupt data.
        siblings.sort_by_key(|s| (s.order_index.unwrap_or(u32::MAX), s.id));

        let mut changed = Vec::new();
        for (position, mut sibling) in siblings.into_iter().enumerate() {
            let want = position as u32 + 1;
            if sibling.order_index != Some(want) {
                sibling.order_index = Some(want);
                changed.push(sibling);
            }
        }
        if changed.is_empty() {
            return Ok(());
        }
        debug!(%scope, reassigned = changed.len(), "renumbered sibling scope");
        self.store.save_all(changed).await
    }

    /// Insert a new sequenced resource, maintaining the index
    /// invariant.
    ///
    /// Without an explicit index the next free one is assigned,
    /// retrying up to `max_insert_retries` times when a concurrent
    /// writer takes it first. With an explicit index the candidate
    /// must be in `1..=max+1`; a collision displaces the current
    /// occupant to the append slot `max + 1` the new resource would
    /// otherwise have taken — a swap, not a shift of every sibling.
    pub async fn insert(&self, resource: Resource) -> CursusResult<Resource> {
        let scope = scope_of(&resource)?;
        match resource.order_index {
            Some(candidate) => self.insert_at(scope, resource, candidate).await,
            None => self.insert_appending(scope, resource).await,
        }
    }

    /// Delete a sequenced resource and renumber the scope it leaves.
    ///
    /// The delete and the renumber are two store calls, so an append
    /// that lands between them can leave a gap past the renumbered
    /// range. The unique constraint still rules out duplicates, and
    /// the next renumber of the scope closes such a gap.
    pub async fn remove(&self, kind: ResourceKind, id: Uuid) -> CursusResult<()> {
        if !kind.is_sequenced() {
            return Err(CursusError::NotSequenced { kind });
        }
        let resource = self.fetch(kind, id).await?;
        let scope = scope_of(&resource)?;
        self.store.delete(kind, id).await?;
        self.renumber(scope).await
    }

    /// Move a resource to `new_index`, swapping with the sibling that
    /// currently holds it.
    ///
    /// The displaced sibling takes the index the moving resource
    /// vacated, so the index set is unchanged. Both rows persist as
    /// one atomic batch.
    pub async fn reorder(
        &self,
        kind: ResourceKind,
        id: Uuid,
        new_index: u32,
    ) -> CursusResult<Resource> {
        if !kind.is_sequenced() {
            return Err(CursusError::NotSequenced { kind });
        }
        let resource = self.fetch(kind, id).await?;
        let scope = scope_of(&resource)?;
        let siblings = self.load_checked(scope).await?;

        let max = max_index(&siblings);
        if new_index < 1 || new_index > max {
            return Err(CursusError::InvalidIndex {
                candidate: new_index,
                max,
            });
        }
        let current = resource.order_index.ok_or_else(|| {
            CursusError::Storage(format!("{kind} {id} carries no order index"))
        })?;
        if new_index == current {
            return Ok(resource);
        }

        let mut batch = Vec::with_capacity(2);
        if let Some(occupant) = siblings
            .iter()
            .find(|s| s.id != id && s.order_index == Some(new_index))
        {
            let mut displaced = occupant.clone();
            displaced.order_index = Some(current);
            batch.push(displaced);
        }
        let mut moved = resource;
        moved.order_index = Some(new_index);
        batch.push(moved.clone());

        self.store.save_all(batch).await?;
        Ok(moved)
    }

    async fn insert_appending(
        &self,
        scope: SiblingScope,
        mut resource: Resource,
    ) -> CursusResult<Resource> {
        let mut attempts = 0;
        loop {
            let index = self.next_index(scope).await?;
            resource.order_index = Some(index);
            match self.store.insert(resource.clone()).await {
                Ok(inserted) => return Ok(inserted),
                Err(CursusError::IndexTaken { .. })
                    if attempts < self.config.max_insert_retries =>
                {
                    attempts += 1;
                    debug!(%scope, index, attempt = attempts, "insert lost index race, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn insert_at(
        &self,
        scope: SiblingScope,
        mut resource: Resource,
        candidate: u32,
    ) -> CursusResult<Resource> {
        let siblings = self.load_checked(scope).await?;
        if siblings.is_empty() {
            if candidate != 1 {
                return Err(CursusError::EmptyScopeIndex { candidate });
            }
            return self.store.insert(resource).await;
        }

        let max = max_index(&siblings);
        if candidate < 1 || candidate > max + 1 {
            return Err(CursusError::InvalidIndex {
                candidate,
                max: max + 1,
            });
        }

        let Some(occupant) = siblings
            .iter()
            .find(|s| s.order_index == Some(candidate))
            .cloned()
        else {
            // The append slot itself; nothing to displace.
            return self.store.insert(resource).await;
        };

        // Land the new row on the free append slot first, then swap
        // it with the occupant in one atomic batch. A failure at
        // either step leaves the indices contiguous.
        resource.order_index = Some(max + 1);
        let mut moved = self.store.insert(resource).await?;
        moved.order_index = Some(candidate);

        let mut displaced = occupant;
        displaced.order_index = Some(max + 1);
        self.store.save_all(vec![displaced, moved.clone()]).await?;
        Ok(moved)
    }

    /// Load a scope and fail on duplicate indices rather than
    /// silently repairing: a repair could reorder content the caller
    /// did not intend to touch.
    async fn load_checked(&self, scope: SiblingScope) -> CursusResult<Vec<Resource>> {
        let siblings = self.store.list_siblings(scope).await?;
        let mut seen = HashSet::new();
        for sibling in &siblings {
            if let Some(index) = sibling.order_index
                && !seen.insert(index)
            {
                warn!(%scope, index, "duplicate order index detected");
                return Err(CursusError::DuplicateIndex { scope, index });
            }
        }
        Ok(siblings)
    }

    async fn fetch(&self, kind: ResourceKind, id: Uuid) -> CursusResult<Resource> {
        self.store
            .get(kind, id)
            .await?
            .ok_or(CursusError::NotFound { kind, id })
    }
}

fn ensure_sequenced(scope: SiblingScope) -> CursusResult<()> {
    if !scope.kind.is_sequenced() {
        return Err(CursusError::NotSequenced { kind: scope.kind });
    }
    Ok(())
}

fn scope_of(resource: &Resource) -> CursusResult<SiblingScope> {
    if !resource.kind.is_sequenced() {
        return Err(CursusError::NotSequenced {
            kind: resource.kind,
        });
    }
    SiblingScope::of(resource).ok_or_else(|| {
        CursusError::Storage(format!(
            "{} {} has no parent to scope its order index",
            resource.kind, resource.id
        ))
    })
}

fn max_index(siblings: &[Resource]) -> u32 {
    siblings
        .iter()
        .filter_map(|s| s.order_index)
        .max()
        .unwrap_or(0)
}
