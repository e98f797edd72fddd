//! Ownership-chain resolution.

use cursus_core::error::{CursusError, CursusResult};
use cursus_core::models::course::Course;
use cursus_core::models::resource::{Resource, ResourceKind};
use cursus_core::store::ResourceStore;
use uuid::Uuid;

/// Maximum parent hops when walking an ownership chain.
///
/// The real hierarchy is at most four levels deep
/// (option → question → exam → module → course); a longer chain is
/// corrupt data, not a deeper tree.
pub const MAX_CHAIN_HOPS: usize = 8;

/// The root of an ownership chain.
#[derive(Debug, Clone)]
pub enum Ownership {
    /// Chain terminates at a course, owned by a teacher.
    Course(Course),
    /// Chain terminates at a user-private root (pretest or exam
    /// attempt), owned by a single user rather than a teacher.
    User { user_id: Uuid },
}

/// Read-only resolver walking parent references up to the owning
/// course, or the owning user for user-private chains.
///
/// Generic over the store so the policy layer has no dependency on
/// any concrete storage crate.
#[derive(Clone)]
pub struct ResourceGraph<S: ResourceStore> {
    store: S,
}

impl<S: ResourceStore> ResourceGraph<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve the ownership of `(kind, id)`.
    ///
    /// Fails with `NotFound` if the resource or any link in its chain
    /// is missing (e.g. deleted concurrently), and with `Storage` if
    /// the chain is corrupt: a root that is neither a course nor a
    /// user-private kind, a course without teacher or status, or a
    /// walk exceeding [`MAX_CHAIN_HOPS`]. No side effects.
    pub async fn resolve_ownership(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> CursusResult<Ownership> {
        let mut current = self.fetch(kind, id).await?;

        for _ in 0..MAX_CHAIN_HOPS {
            match current.kind {
                ResourceKind::Course => {
                    let course = Course::from_resource(&current).ok_or_else(|| {
                        CursusError::Storage(format!(
                            "course {} is missing its teacher or status",
                            current.id
                        ))
                    })?;
                    return Ok(Ownership::Course(course));
                }
                ResourceKind::Pretest | ResourceKind::ExamAttempt => {
                    let user_id = current.owner_id.ok_or_else(|| {
                        CursusError::Storage(format!(
                            "{} {} is missing its owner",
                            current.kind, current.id
                        ))
                    })?;
                    return Ok(Ownership::User { user_id });
                }
                _ => {}
            }

            let parent = current.parent.ok_or_else(|| {
                CursusError::Storage(format!(
                    "{} {} has no parent and is not a chain root",
                    current.kind, current.id
                ))
            })?;
            current = self.fetch(parent.kind, parent.id).await?;
        }

        Err(CursusError::Storage(format!(
            "ownership chain from {kind} {id} exceeds {MAX_CHAIN_HOPS} hops"
        )))
    }

    async fn fetch(&self, kind: ResourceKind, id: Uuid) -> CursusResult<Resource> {
        self.store
            .get(kind, id)
            .await?
            .ok_or(CursusError::NotFound { kind, id })
    }
}
