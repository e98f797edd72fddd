//! Mutation authorization.

use cursus_core::error::{CursusError, CursusResult, DenyReason};
use cursus_core::models::principal::{Principal, Role};
use cursus_core::models::resource::{LifecycleStatus, ResourceKind};
use cursus_core::store::ResourceStore;
use tracing::debug;
use uuid::Uuid;

use crate::graph::{Ownership, ResourceGraph};

/// The operation being authorized.
///
/// The decision table does not branch on it — it exists for
/// call-site clarity and log context. List/read paths do not go
/// through the guard at all; they use `visibility` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Delete,
}

/// Per-call-site authorization options.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardOptions {
    /// Restrict admins to courses still in Draft status. Chosen by
    /// the call site (update endpoints set it, delete endpoints
    /// typically do not); the guard only enforces it.
    pub admin_draft_only: bool,
}

/// Authorizes single-resource mutations by resolving the ownership
/// chain and applying the role/ownership decision table.
pub struct OwnershipGuard<S: ResourceStore> {
    graph: ResourceGraph<S>,
}

impl<S: ResourceStore> OwnershipGuard<S> {
    pub fn new(store: S) -> Self {
        Self {
            graph: ResourceGraph::new(store),
        }
    }

    /// Decide whether `principal` may perform `action` on the
    /// resource `(kind, id)`.
    ///
    /// Decision table, in order:
    /// 1. Admin: allow, unless `admin_draft_only` is set and the
    ///    owning course is not in Draft (or the chain is user-scoped,
    ///    with no course to be in Draft at all).
    /// 2. Teacher on a course-owned chain: allow iff they own the
    ///    course.
    /// 3. Any non-admin on a user-scoped chain: allow iff they are
    ///    the owning user.
    /// 4. Everything else: insufficient permissions.
    ///
    /// A missing resource or chain link propagates as `NotFound`,
    /// never as a denial, so callers can answer "missing" rather
    /// than "forbidden". The resolve is read-only and safe to race:
    /// a resource deleted after a successful authorize surfaces as
    /// `NotFound` from the subsequent write.
    pub async fn authorize(
        &self,
        principal: &Principal,
        action: Action,
        kind: ResourceKind,
        id: Uuid,
        options: GuardOptions,
    ) -> CursusResult<()> {
        let ownership = self.graph.resolve_ownership(kind, id).await?;

        let verdict = match (principal.role, &ownership) {
            (Role::Admin, Ownership::Course(course)) => {
                if options.admin_draft_only && course.status != LifecycleStatus::Draft {
                    Err(DenyReason::AdminRestrictedToDraftCourses)
                } else {
                    Ok(())
                }
            }
            (Role::Admin, Ownership::User { .. }) => {
                if options.admin_draft_only {
                    // No course exists to be in Draft; deny conservatively.
                    Err(DenyReason::AdminRestrictedToDraftCourses)
                } else {
                    Ok(())
                }
            }
            (Role::Teacher, Ownership::Course(course)) => {
                if course.teacher_id == principal.user_id {
                    Ok(())
                } else {
                    Err(DenyReason::NotOwningTeacher)
                }
            }
            (_, Ownership::User { user_id }) => {
                if *user_id == principal.user_id {
                    Ok(())
                } else {
                    Err(DenyReason::NotResourceOwner)
                }
            }
            (_, Ownership::Course(_)) => Err(DenyReason::InsufficientPermissions),
        };

        verdict.map_err(|reason| {
            debug!(
                user_id = %principal.user_id,
                role = ?principal.role,
                ?action,
                %kind,
                %id,
                %reason,
                "mutation denied"
            );
            CursusError::Denied { reason }
        })
    }
}
