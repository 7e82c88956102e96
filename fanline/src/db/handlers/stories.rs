//! Database repository for stories and story views.
//!
//! A story's status is derived in SQL at read time: `inactive` when switched off, `expired` once
//! `expires_at` has passed, `active` otherwise. Public listings only ever see active stories.

use crate::api::models::stories::{MediaType, StoryStatus};
use crate::db::{
    errors::{DbError, Result},
    models::stories::{StoryCreateDBRequest, StoryDBResponse, StoryUpdateDBRequest},
};
use crate::types::{CreatorId, StoryId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection};
use tracing::instrument;

const STATUS_EXPR: &str = "CASE WHEN NOT is_active THEN 'inactive' WHEN expires_at <= NOW() THEN 'expired' ELSE 'active' END";

#[derive(Debug, Clone, FromRow)]
struct Story {
    pub id: StoryId,
    pub creator_id: CreatorId,
    pub title: Option<String>,
    pub media_url: String,
    #[sqlx(try_from = "String")]
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub duration_hours: i32,
    pub is_locked: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub view_count: i32,
    #[sqlx(try_from = "String")]
    pub status: StoryStatus,
}

impl From<Story> for StoryDBResponse {
    fn from(s: Story) -> Self {
        Self {
            id: s.id,
            creator_id: s.creator_id,
            title: s.title,
            media_url: s.media_url,
            media_type: s.media_type,
            caption: s.caption,
            duration_hours: s.duration_hours,
            is_locked: s.is_locked,
            is_active: s.is_active,
            created_at: s.created_at,
            expires_at: s.expires_at,
            view_count: s.view_count,
            status: s.status,
        }
    }
}

pub struct Stories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Stories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Publish a story; it expires `duration_hours` after creation.
    #[instrument(skip(self, request), fields(creator_id = %abbrev_uuid(&request.creator_id), duration_hours = request.duration_hours), err)]
    pub async fn create(&mut self, request: &StoryCreateDBRequest) -> Result<StoryDBResponse> {
        let sql = format!(
            r#"
            INSERT INTO stories (creator_id, title, media_url, media_type, caption, duration_hours, is_locked, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW() + make_interval(hours => $6))
            RETURNING *, {STATUS_EXPR} AS status
            "#
        );
        let story = sqlx::query_as::<_, Story>(&sql)
            .bind(request.creator_id)
            .bind(&request.title)
            .bind(&request.media_url)
            .bind(request.media_type.as_str())
            .bind(&request.caption)
            .bind(request.duration_hours)
            .bind(request.is_locked)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(story.into())
    }

    #[instrument(skip(self), fields(story_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: StoryId) -> Result<Option<StoryDBResponse>> {
        let sql = format!("SELECT *, {STATUS_EXPR} AS status FROM stories WHERE id = $1");
        let story = sqlx::query_as::<_, Story>(&sql).bind(id).fetch_optional(&mut *self.db).await?;

        Ok(story.map(Into::into))
    }

    /// Active, unexpired stories from active creators, newest first.
    #[instrument(skip(self), err)]
    pub async fn list_public(&mut self, creator_id: Option<CreatorId>) -> Result<Vec<StoryDBResponse>> {
        let sql = format!(
            r#"
            SELECT *, {STATUS_EXPR} AS status FROM stories
            WHERE is_active
              AND expires_at > NOW()
              AND ($1::uuid IS NULL OR creator_id = $1)
              AND creator_id IN (SELECT id FROM creators WHERE is_active)
            ORDER BY created_at DESC
            "#
        );
        let stories = sqlx::query_as::<_, Story>(&sql)
            .bind(creator_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(stories.into_iter().map(Into::into).collect())
    }

    /// Every story a creator has posted, with its computed status, newest first.
    #[instrument(skip(self), fields(creator_id = %abbrev_uuid(&creator_id)), err)]
    pub async fn list_for_creator(&mut self, creator_id: CreatorId) -> Result<Vec<StoryDBResponse>> {
        let sql = format!("SELECT *, {STATUS_EXPR} AS status FROM stories WHERE creator_id = $1 ORDER BY created_at DESC");
        let stories = sqlx::query_as::<_, Story>(&sql)
            .bind(creator_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(stories.into_iter().map(Into::into).collect())
    }

    /// Edit a story owned by `creator_id`. Stories of other creators are reported as not found.
    #[instrument(skip(self, request), fields(story_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: StoryId, creator_id: CreatorId, request: &StoryUpdateDBRequest) -> Result<StoryDBResponse> {
        let sql = format!(
            r#"
            UPDATE stories SET
                title = COALESCE($3, title),
                caption = COALESCE($4, caption),
                is_locked = COALESCE($5, is_locked),
                is_active = COALESCE($6, is_active)
            WHERE id = $1 AND creator_id = $2
            RETURNING *, {STATUS_EXPR} AS status
            "#
        );
        let story = sqlx::query_as::<_, Story>(&sql)
            .bind(id)
            .bind(creator_id)
            .bind(&request.title)
            .bind(&request.caption)
            .bind(request.is_locked)
            .bind(request.is_active)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(story.into())
    }

    /// Delete a story owned by `creator_id`; its views go with it.
    #[instrument(skip(self), fields(story_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: StoryId, creator_id: CreatorId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND creator_id = $2")
            .bind(id)
            .bind(creator_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record that a user viewed a story and return the story's distinct view count.
    ///
    /// Repeat views by the same user are ignored, so the count only moves on a first view.
    #[instrument(skip(self), fields(story_id = %abbrev_uuid(&story_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn record_view(&mut self, story_id: StoryId, user_id: UserId) -> Result<i32> {
        let mut tx = self.db.begin().await?;

        sqlx::query("INSERT INTO story_views (story_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(story_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let views: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM story_views WHERE story_id = $1")
            .bind(story_id)
            .fetch_one(&mut *tx)
            .await?;
        let views = i32::try_from(views).unwrap_or(i32::MAX);

        let view_count: i32 = sqlx::query_scalar("UPDATE stories SET view_count = $2 WHERE id = $1 RETURNING view_count")
            .bind(story_id)
            .bind(views)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        tx.commit().await?;
        Ok(view_count)
    }
}
