//! API request/response models for stories.

use crate::db::models::stories::StoryDBResponse;
use crate::types::{CreatorId, StoryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

crate::text_enum!(MediaType {
    Image => "image",
    Video => "video",
});

/// Visibility of a story as seen by its owner, computed at read time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Active,
    Expired,
    Inactive,
}

crate::text_enum!(StoryStatus {
    Active => "active",
    Expired => "expired",
    Inactive => "inactive",
});

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoryCreate {
    pub title: Option<String>,
    pub media_url: String,
    pub media_type: MediaType,
    pub caption: Option<String>,
    /// Hours until the story expires (default 24)
    pub duration_hours: Option<i32>,
    /// Only subscribers can see the media (default false)
    pub is_locked: Option<bool>,
}

/// Omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StoryUpdate {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub is_locked: Option<bool>,
    pub is_active: Option<bool>,
}

/// A story as its creator sees it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: StoryId,
    #[schema(value_type = String, format = "uuid")]
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

/// A story as the public sees it. Locked media is withheld from non-subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicStoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: StoryId,
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
    pub title: Option<String>,
    pub media_url: Option<String>,
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub view_count: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListStoriesQuery {
    /// Only stories from this creator
    #[param(value_type = Option<String>, format = "uuid")]
    pub creator_id: Option<CreatorId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoryViewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub story_id: StoryId,
    pub view_count: i32,
}

impl From<StoryDBResponse> for StoryResponse {
    fn from(db: StoryDBResponse) -> Self {
        Self {
            id: db.id,
            creator_id: db.creator_id,
            title: db.title,
            media_url: db.media_url,
            media_type: db.media_type,
            caption: db.caption,
            duration_hours: db.duration_hours,
            is_locked: db.is_locked,
            is_active: db.is_active,
            created_at: db.created_at,
            expires_at: db.expires_at,
            view_count: db.view_count,
            status: db.status,
        }
    }
}

impl PublicStoryResponse {
    /// Build the public view; `unlocked` says whether the viewer may see locked media.
    pub fn new(db: StoryDBResponse, unlocked: bool) -> Self {
        let media_url = (!db.is_locked || unlocked).then_some(db.media_url);
        Self {
            id: db.id,
            creator_id: db.creator_id,
            title: db.title,
            media_url,
            media_type: db.media_type,
            caption: db.caption,
            is_locked: db.is_locked,
            created_at: db.created_at,
            expires_at: db.expires_at,
            view_count: db.view_count,
        }
    }
}
