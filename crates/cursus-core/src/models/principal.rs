//! Authenticated caller identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role carried by a verified token.
///
/// `Other` is the defensive arm for roles the platform does not know;
/// policy treats it like the most restricted role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Other,
}

/// The resolved `(user, role)` pair handed in by the authentication
/// collaborator. The core never constructs one from credentials.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}
