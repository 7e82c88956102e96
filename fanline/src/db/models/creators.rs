//! Database models for creators.

use crate::api::models::creators::{CreatorCreate, CreatorUpdate};
use crate::types::CreatorId;
use chrono::{DateTime, Utc};

/// Database request for creating a new creator
#[derive(Debug, Clone)]
pub struct CreatorCreateDBRequest {
    pub name: String,
    /// Already normalized (trimmed, lowercased)
    pub slug: String,
    /// Hashed credential
    pub password: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub personality: Option<String>,
}

impl CreatorCreateDBRequest {
    /// Build from the admin request once the password has been hashed
    pub fn new(api: CreatorCreate, password_hash: String) -> Self {
        Self {
            name: api.name.trim().to_string(),
            slug: api.slug.trim().to_lowercase(),
            password: Some(password_hash),
            bio: api.bio,
            avatar_url: api.avatar_url,
            personality: api.personality,
        }
    }
}

/// Database request for updating a creator
#[derive(Debug, Clone, Default)]
pub struct CreatorUpdateDBRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub personality: Option<String>,
    pub is_active: Option<bool>,
}

impl From<CreatorUpdate> for CreatorUpdateDBRequest {
    fn from(api: CreatorUpdate) -> Self {
        Self {
            name: api.name,
            bio: api.bio,
            avatar_url: api.avatar_url,
            personality: api.personality,
            is_active: None,
        }
    }
}

/// Database response for a creator
#[derive(Debug, Clone)]
pub struct CreatorDBResponse {
    pub id: CreatorId,
    pub name: String,
    pub slug: String,
    /// Stored credential: argon2 or bcrypt hash, or a legacy plaintext value
    pub password: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub personality: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
