//! Hierarchical resource domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of a hierarchical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Course,
    Module,
    Chapter,
    Exam,
    Question,
    QuestionOption,
    Pretest,
    ExamAttempt,
}

impl ResourceKind {
    /// Kinds whose sibling collections carry a contiguous 1-based
    /// order index.
    pub fn is_sequenced(self) -> bool {
        matches!(self, Self::Module | Self::Chapter | Self::Question)
    }

    /// Kinds owned by a single user rather than scoped to a course.
    pub fn is_user_private(self) -> bool {
        matches!(self, Self::Pretest | Self::ExamAttempt)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Course => "course",
            Self::Module => "module",
            Self::Chapter => "chapter",
            Self::Exam => "exam",
            Self::Question => "question",
            Self::QuestionOption => "question option",
            Self::Pretest => "pretest",
            Self::ExamAttempt => "exam attempt",
        };
        f.write_str(name)
    }
}

/// Lifecycle state carried by courses and exams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStatus {
    Draft,
    Published,
    Archived,
}

/// Typed link to a resource's immediate parent, so chain walking
/// needs no per-kind dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub kind: ResourceKind,
    pub id: Uuid,
}

impl ParentRef {
    pub fn new(kind: ResourceKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Any node of the course hierarchy.
///
/// `title` is the designated display field: course/module/chapter/
/// exam/pretest title, question text, or option answer text — the
/// storage collaborator maps the right source column in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub parent: Option<ParentRef>,
    /// 1-based position among siblings; `Some` only for sequenced kinds.
    pub order_index: Option<u32>,
    /// Lifecycle state; `Some` only for courses and exams.
    pub status: Option<LifecycleStatus>,
    /// Owning teacher (courses) or owning user (pretests, attempts).
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub fn new(kind: ResourceKind, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            parent: None,
            order_index: None,
            status: None,
            owner_id: None,
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_parent(mut self, kind: ResourceKind, id: Uuid) -> Self {
        self.parent = Some(ParentRef::new(kind, id));
        self
    }

    pub fn with_order_index(mut self, index: u32) -> Self {
        self.order_index = Some(index);
        self
    }

    pub fn with_status(mut self, status: LifecycleStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}
