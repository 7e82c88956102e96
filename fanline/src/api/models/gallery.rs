//! API request/response models for creator gallery photos.

use crate::db::models::gallery_photos::GalleryPhotoDBResponse;
use crate::types::{CreatorId, GalleryPhotoId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GalleryPhotoCreate {
    pub url: String,
    /// Only subscribers can see the photo (default false)
    pub is_locked: Option<bool>,
    /// Position in the gallery; appended at the end when omitted
    pub order: Option<i32>,
}

/// Locked photos have their URL withheld from non-subscribers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GalleryPhotoResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: GalleryPhotoId,
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
    pub url: Option<String>,
    pub is_locked: bool,
    pub order: i32,
}

impl GalleryPhotoResponse {
    /// Build the response; `unlocked` says whether the viewer may see locked photos.
    pub fn new(db: GalleryPhotoDBResponse, unlocked: bool) -> Self {
        Self {
            id: db.id,
            creator_id: db.creator_id,
            url: (!db.is_locked || unlocked).then_some(db.url),
            is_locked: db.is_locked,
            order: db.order,
        }
    }
}
