//! Database repository for creators.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::creators::{CreatorCreateDBRequest, CreatorDBResponse, CreatorUpdateDBRequest},
};
use crate::types::{CreatorId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing creators
#[derive(Debug, Clone, Default)]
pub struct CreatorFilter {
    pub skip: i64,
    pub limit: i64,
    /// Hide deactivated creators (public listings)
    pub active_only: bool,
}

impl CreatorFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            active_only: false,
        }
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Creator {
    pub id: CreatorId,
    pub name: String,
    pub slug: String,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub personality: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Creator> for CreatorDBResponse {
    fn from(c: Creator) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            password: c.password,
            bio: c.bio,
            avatar_url: c.avatar_url,
            personality: c.personality,
            is_active: c.is_active,
            created_at: c.created_at,
        }
    }
}

pub struct Creators<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Creators<'c> {
    type CreateRequest = CreatorCreateDBRequest;
    type UpdateRequest = CreatorUpdateDBRequest;
    type Response = CreatorDBResponse;
    type Id = CreatorId;
    type Filter = CreatorFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let creator = sqlx::query_as::<_, Creator>(
            r#"
            INSERT INTO creators (name, slug, password, bio, avatar_url, personality)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.password)
        .bind(&request.bio)
        .bind(&request.avatar_url)
        .bind(&request.personality)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(creator.into())
    }

    #[instrument(skip(self), fields(creator_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let creator = sqlx::query_as::<_, Creator>("SELECT * FROM creators WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(creator.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM creators WHERE 1=1");
        if filter.active_only {
            query.push(" AND is_active");
        }
        query.push(" ORDER BY name, created_at LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let creators = query.build_query_as::<Creator>().fetch_all(&mut *self.db).await?;
        Ok(creators.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(creator_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM creators WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(creator_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let creator = sqlx::query_as::<_, Creator>(
            r#"
            UPDATE creators SET
                name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                avatar_url = COALESCE($4, avatar_url),
                personality = COALESCE($5, personality),
                is_active = COALESCE($6, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.bio)
        .bind(&request.avatar_url)
        .bind(&request.personality)
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(creator.into())
    }
}

impl<'c> Creators<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a creator by slug, regardless of whether they are active.
    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<CreatorDBResponse>> {
        let creator = sqlx::query_as::<_, Creator>("SELECT * FROM creators WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(creator.map(Into::into))
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &CreatorFilter) -> Result<i64> {
        let sql = if filter.active_only {
            "SELECT COUNT(*) FROM creators WHERE is_active"
        } else {
            "SELECT COUNT(*) FROM creators"
        };
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
