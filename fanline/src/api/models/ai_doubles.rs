//! API request/response models for AI doubles (user-owned voice/persona profiles).

use super::pagination::Pagination;
use crate::db::models::ai_doubles::AiDoubleDBResponse;
use crate::types::{AiDoubleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AiDoubleStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

crate::text_enum!(AiDoubleStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiDoubleCreate {
    pub name: String,
    pub system_prompt: Option<String>,
}

/// Omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AiDoubleUpdate {
    pub name: Option<String>,
    pub voice_id: Option<String>,
    pub voice_name: Option<String>,
    pub system_prompt: Option<String>,
    pub is_public: Option<bool>,
    pub status: Option<AiDoubleStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiDoubleResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AiDoubleId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub name: String,
    pub status: AiDoubleStatus,
    pub voice_id: Option<String>,
    pub voice_name: Option<String>,
    pub system_prompt: Option<String>,
    pub share_slug: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// What anyone holding the share link can see
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SharedAiDoubleResponse {
    pub name: String,
    pub voice_id: Option<String>,
    pub voice_name: Option<String>,
    pub share_slug: String,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Query parameters for the admin AI double listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAiDoublesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    pub status: Option<AiDoubleStatus>,
}

impl From<AiDoubleDBResponse> for AiDoubleResponse {
    fn from(db: AiDoubleDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            status: db.status,
            voice_id: db.voice_id,
            voice_name: db.voice_name,
            system_prompt: db.system_prompt,
            share_slug: db.share_slug,
            is_public: db.is_public,
            created_at: db.created_at,
            completed_at: db.completed_at,
        }
    }
}

impl From<AiDoubleDBResponse> for SharedAiDoubleResponse {
    fn from(db: AiDoubleDBResponse) -> Self {
        Self {
            name: db.name,
            voice_id: db.voice_id,
            voice_name: db.voice_name,
            share_slug: db.share_slug,
            completed_at: db.completed_at,
        }
    }
}
