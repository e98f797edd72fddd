//! Course read view.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::resource::{LifecycleStatus, Resource, ResourceKind};

/// Typed view of a course node — what ownership resolution returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub title: String,
    pub status: LifecycleStatus,
}

impl Course {
    /// Extract the typed view from a raw resource node.
    ///
    /// Returns `None` if the resource is not a course or is missing
    /// its teacher or status fields.
    pub fn from_resource(resource: &Resource) -> Option<Self> {
        if resource.kind != ResourceKind::Course {
            return None;
        }
        Some(Self {
            id: resource.id,
            teacher_id: resource.owner_id?,
            title: resource.title.clone(),
            status: resource.status?,
        })
    }
}
