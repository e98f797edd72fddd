//! Declarative visibility filters.
//!
//! A [`FilterExpr`] is a disjunction of clauses; each clause is a
//! conjunction of field predicates. The policy layer builds these as
//! plain data and the storage collaborator interprets them — as a
//! query, or in memory against a flattened [`FilterTarget`] per row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::resource::LifecycleStatus;

/// One field predicate within a visibility clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldPredicate {
    /// The resource's effective status: its own, or the nearest
    /// status-bearing ancestor's for kinds that carry none.
    StatusIs(LifecycleStatus),
    /// Direct owner match (pretests, exam attempts).
    OwnerIs(Uuid),
    /// The owning course's teacher, resolved through the chain.
    OwningTeacherIs(Uuid),
    /// Case-insensitive substring match against the display field.
    TitleContains(String),
}

impl FieldPredicate {
    fn matches(&self, target: &FilterTarget) -> bool {
        match self {
            Self::StatusIs(status) => target.effective_status == Some(*status),
            Self::OwnerIs(owner) => target.owner_id == Some(*owner),
            Self::OwningTeacherIs(teacher) => target.owning_teacher_id == Some(*teacher),
            Self::TitleContains(needle) => target
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

/// A conjunction of predicates. Empty means "matches everything".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibilityClause {
    pub predicates: Vec<FieldPredicate>,
}

impl VisibilityClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: FieldPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn matches(&self, target: &FilterTarget) -> bool {
        self.predicates.iter().all(|p| p.matches(target))
    }
}

/// A disjunction of clauses. Empty means "matches nothing" — the
/// deny-all default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    pub clauses: Vec<VisibilityClause>,
}

impl FilterExpr {
    /// The deny-all filter.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(clauses: Vec<VisibilityClause>) -> Self {
        Self { clauses }
    }

    pub fn or(mut self, clause: VisibilityClause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn matches(&self, target: &FilterTarget) -> bool {
        self.clauses.iter().any(|c| c.matches(target))
    }
}

/// Flattened per-row view the storage collaborator derives when
/// evaluating a filter against one resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterTarget {
    pub effective_status: Option<LifecycleStatus>,
    pub owner_id: Option<Uuid>,
    pub owning_teacher_id: Option<Uuid>,
    pub title: String,
}
