//! Database models for gallery photos.

use crate::types::{CreatorId, GalleryPhotoId};

/// Database request for adding a photo to a creator's gallery
#[derive(Debug, Clone)]
pub struct GalleryPhotoCreateDBRequest {
    pub creator_id: CreatorId,
    pub url: String,
    pub is_locked: bool,
    /// `None` appends after the current last photo
    pub order: Option<i32>,
}

/// Database response for a gallery photo
#[derive(Debug, Clone)]
pub struct GalleryPhotoDBResponse {
    pub id: GalleryPhotoId,
    pub creator_id: CreatorId,
    pub url: String,
    pub is_locked: bool,
    pub order: i32,
}
