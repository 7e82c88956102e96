//! Database models for AI doubles.

use crate::api::models::ai_doubles::{AiDoubleStatus, AiDoubleUpdate};
use crate::types::{AiDoubleId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating an AI double
#[derive(Debug, Clone)]
pub struct AiDoubleCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub system_prompt: Option<String>,
    pub share_slug: String,
}

/// Database request for updating an AI double
#[derive(Debug, Clone, Default)]
pub struct AiDoubleUpdateDBRequest {
    pub name: Option<String>,
    pub voice_id: Option<String>,
    pub voice_name: Option<String>,
    pub system_prompt: Option<String>,
    pub is_public: Option<bool>,
    pub status: Option<AiDoubleStatus>,
}

impl From<AiDoubleUpdate> for AiDoubleUpdateDBRequest {
    fn from(api: AiDoubleUpdate) -> Self {
        Self {
            name: api.name,
            voice_id: api.voice_id,
            voice_name: api.voice_name,
            system_prompt: api.system_prompt,
            is_public: api.is_public,
            status: api.status,
        }
    }
}

/// Database response for an AI double
#[derive(Debug, Clone)]
pub struct AiDoubleDBResponse {
    pub id: AiDoubleId,
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
