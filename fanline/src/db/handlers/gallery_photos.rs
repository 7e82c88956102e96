//! Database repository for creator gallery photos.

use crate::db::{
    errors::Result,
    models::gallery_photos::{GalleryPhotoCreateDBRequest, GalleryPhotoDBResponse},
};
use crate::types::{CreatorId, GalleryPhotoId, abbrev_uuid};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct GalleryPhoto {
    pub id: GalleryPhotoId,
    pub creator_id: CreatorId,
    pub url: String,
    pub is_locked: bool,
    pub order: i32,
}

impl From<GalleryPhoto> for GalleryPhotoDBResponse {
    fn from(p: GalleryPhoto) -> Self {
        Self {
            id: p.id,
            creator_id: p.creator_id,
            url: p.url,
            is_locked: p.is_locked,
            order: p.order,
        }
    }
}

pub struct GalleryPhotos<'c> {
    db: &'c mut PgConnection,
}

impl<'c> GalleryPhotos<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(creator_id = %abbrev_uuid(&request.creator_id)), err)]
    pub async fn create(&mut self, request: &GalleryPhotoCreateDBRequest) -> Result<GalleryPhotoDBResponse> {
        let photo = sqlx::query_as::<_, GalleryPhoto>(
            r#"
            INSERT INTO gallery_photos (creator_id, url, is_locked, "order")
            VALUES (
                $1, $2, $3,
                COALESCE($4, (SELECT COALESCE(MAX("order"), -1) + 1 FROM gallery_photos WHERE creator_id = $1))
            )
            RETURNING *
            "#,
        )
        .bind(request.creator_id)
        .bind(&request.url)
        .bind(request.is_locked)
        .bind(request.order)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(photo.into())
    }

    /// A creator's gallery in display order.
    #[instrument(skip(self), fields(creator_id = %abbrev_uuid(&creator_id)), err)]
    pub async fn list_for_creator(&mut self, creator_id: CreatorId) -> Result<Vec<GalleryPhotoDBResponse>> {
        let photos =
            sqlx::query_as::<_, GalleryPhoto>(r#"SELECT * FROM gallery_photos WHERE creator_id = $1 ORDER BY "order", id"#)
                .bind(creator_id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(photos.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(photo_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: GalleryPhotoId, creator_id: CreatorId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM gallery_photos WHERE id = $1 AND creator_id = $2")
            .bind(id)
            .bind(creator_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
