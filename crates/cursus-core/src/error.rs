//! Error types for the Cursus core.

use thiserror::Error;
use uuid::Uuid;

use crate::models::resource::ResourceKind;
use crate::store::SiblingScope;

/// Why a mutation was refused.
///
/// Typed so callers map denials to transport codes without inspecting
/// free text; `Display` gives the human-readable reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    AdminRestrictedToDraftCourses,
    NotOwningTeacher,
    NotResourceOwner,
    InsufficientPermissions,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::AdminRestrictedToDraftCourses => "admin restricted to draft courses",
            Self::NotOwningTeacher => "not the owning teacher",
            Self::NotResourceOwner => "not the resource owner",
            Self::InsufficientPermissions => "insufficient permissions",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Error)]
pub enum CursusError {
    /// Resource or a link in its ownership chain is missing. Never
    /// conflated with `Denied`: callers answer "missing", not
    /// "forbidden".
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: Uuid },

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: ResourceKind, id: Uuid },

    #[error("access denied: {reason}")]
    Denied { reason: DenyReason },

    #[error("order index {candidate} out of range 1..={max}")]
    InvalidIndex { candidate: u32, max: u32 },

    #[error("order index {candidate} invalid: scope is empty, only 1 is accepted")]
    EmptyScopeIndex { candidate: u32 },

    #[error("{kind} does not carry an order index")]
    NotSequenced { kind: ResourceKind },

    /// Integrity violation found while reading a sibling scope. Fatal
    /// for the operation; an explicit renumber is the only repair path.
    #[error("duplicate order index {index} in {scope}")]
    DuplicateIndex { scope: SiblingScope, index: u32 },

    /// Storage unique-constraint conflict on write; the retry trigger
    /// for auto-indexed inserts.
    #[error("order index {index} already taken in {scope}")]
    IndexTaken { scope: SiblingScope, index: u32 },

    #[error("storage error: {0}")]
    Storage(String),
}

pub type CursusResult<T> = Result<T, CursusError>;
