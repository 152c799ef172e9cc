// src/models/user.rs

use serde::{Deserialize, Serialize};

/// User role, as carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Creator,
    Moderator,
    Admin,
}

impl Role {
    /// Moderators and admins may moderate discussions.
    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

/// Minimal author projection attached to every comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub name: Option<String>,
    /// Avatar URL.
    pub image: Option<String>,
}
