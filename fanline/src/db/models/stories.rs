//! Database models for stories.

use crate::api::models::stories::{MediaType, StoryStatus, StoryUpdate};
use crate::types::{CreatorId, StoryId};
use chrono::{DateTime, Utc};

/// Database request for publishing a story
#[derive(Debug, Clone)]
pub struct StoryCreateDBRequest {
    pub creator_id: CreatorId,
    pub title: Option<String>,
    pub media_url: String,
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub duration_hours: i32,
    pub is_locked: bool,
}

/// Database request for editing a story
#[derive(Debug, Clone, Default)]
pub struct StoryUpdateDBRequest {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub is_locked: Option<bool>,
    pub is_active: Option<bool>,
}

impl From<StoryUpdate> for StoryUpdateDBRequest {
    fn from(api: StoryUpdate) -> Self {
        Self {
            title: api.title,
            caption: api.caption,
            is_locked: api.is_locked,
            is_active: api.is_active,
        }
    }
}

/// Database response for a story, with its status computed at query time
#[derive(Debug, Clone)]
pub struct StoryDBResponse {
    pub id: StoryId,
    pub creator_id: CreatorId,
    pub title: Option<String>,
    pub media_url: String,
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub duration_hours: i32,
    pub is_locked: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub view_count: i32,
    pub status: StoryStatus,
}
