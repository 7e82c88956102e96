//! API request/response models for creators.

use crate::db::models::creators::CreatorDBResponse;
use crate::types::CreatorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Admin request to onboard a creator
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatorCreate {
    pub name: String,
    pub slug: String,
    pub password: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub personality: Option<String>,
}

/// A creator editing their own profile. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreatorUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub personality: Option<String>,
}

/// Public view of a creator
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatorResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CreatorId,
    pub name: String,
    pub slug: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Full creator profile, shown to the creator themselves and to admins
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatorProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CreatorId,
    pub name: String,
    pub slug: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub personality: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// The authenticated creator making a request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentCreator {
    #[schema(value_type = String, format = "uuid")]
    pub id: CreatorId,
    pub name: String,
    pub slug: String,
}

impl From<CreatorDBResponse> for CreatorResponse {
    fn from(db: CreatorDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            bio: db.bio,
            avatar_url: db.avatar_url,
        }
    }
}

impl From<CreatorDBResponse> for CreatorProfileResponse {
    fn from(db: CreatorDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            bio: db.bio,
            avatar_url: db.avatar_url,
            personality: db.personality,
            is_active: db.is_active,
            created_at: db.created_at,
        }
    }
}

impl From<CreatorDBResponse> for CurrentCreator {
    fn from(db: CreatorDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
        }
    }
}
