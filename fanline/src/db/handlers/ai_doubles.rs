//! Database repository for AI doubles.

use crate::api::models::ai_doubles::AiDoubleStatus;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::ai_doubles::{AiDoubleCreateDBRequest, AiDoubleDBResponse, AiDoubleUpdateDBRequest},
};
use crate::types::{AiDoubleId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing AI doubles
#[derive(Debug, Clone, Default)]
pub struct AiDoubleFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
    pub status: Option<AiDoubleStatus>,
}

#[derive(Debug, Clone, FromRow)]
struct AiDouble {
    pub id: AiDoubleId,
    pub user_id: UserId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub status: AiDoubleStatus,
    pub voice_id: Option<String>,
    pub voice_name: Option<String>,
    pub system_prompt: Option<String>,
    pub share_slug: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<AiDouble> for AiDoubleDBResponse {
    fn from(d: AiDouble) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            name: d.name,
            status: d.status,
            voice_id: d.voice_id,
            voice_name: d.voice_name,
            system_prompt: d.system_prompt,
            share_slug: d.share_slug,
            is_public: d.is_public,
            created_at: d.created_at,
            completed_at: d.completed_at,
        }
    }
}

fn push_filter(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &AiDoubleFilter) {
    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ");
        query.push_bind(user_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
}

pub struct AiDoubles<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for AiDoubles<'c> {
    type CreateRequest = AiDoubleCreateDBRequest;
    type UpdateRequest = AiDoubleUpdateDBRequest;
    type Response = AiDoubleDBResponse;
    type Id = AiDoubleId;
    type Filter = AiDoubleFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), share_slug = %request.share_slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let double = sqlx::query_as::<_, AiDouble>(
            r#"
            INSERT INTO ai_doubles (user_id, name, system_prompt, share_slug, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.system_prompt)
        .bind(&request.share_slug)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(double.into())
    }

    #[instrument(skip(self), fields(ai_double_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let double = sqlx::query_as::<_, AiDouble>("SELECT * FROM ai_doubles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(double.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM ai_doubles WHERE 1=1");
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let doubles = query.build_query_as::<AiDouble>().fetch_all(&mut *self.db).await?;
        Ok(doubles.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(ai_double_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ai_doubles WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Partial update. Moving to `completed` stamps `completed_at` the first time.
    #[instrument(skip(self, request), fields(ai_double_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let double = sqlx::query_as::<_, AiDouble>(
            r#"
            UPDATE ai_doubles SET
                name = COALESCE($2, name),
                voice_id = COALESCE($3, voice_id),
                voice_name = COALESCE($4, voice_name),
                system_prompt = COALESCE($5, system_prompt),
                is_public = COALESCE($6, is_public),
                status = COALESCE($7, status),
                completed_at = CASE
                    WHEN $7 = 'completed' AND completed_at IS NULL THEN NOW()
                    ELSE completed_at
                END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.voice_id)
        .bind(&request.voice_name)
        .bind(&request.system_prompt)
        .bind(request.is_public)
        .bind(request.status.map(|s| s.as_str()))
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(double.into())
    }
}

impl<'c> AiDoubles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_share_slug(&mut self, share_slug: &str) -> Result<Option<AiDoubleDBResponse>> {
        let double = sqlx::query_as::<_, AiDouble>("SELECT * FROM ai_doubles WHERE share_slug = $1")
            .bind(share_slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(double.map(Into::into))
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &AiDoubleFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM ai_doubles WHERE 1=1");
        push_filter(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
