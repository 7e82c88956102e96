//! Database repository for content requests.
//!
//! Status changes are plain writes here. The caller locks the row with
//! [`ContentRequests::lock_for_update`] inside a transaction, checks the transition, then writes.

use crate::api::models::content_requests::ContentRequestStatus;
use crate::db::{
    errors::{DbError, Result},
    models::content_requests::{ContentRequestCreateDBRequest, ContentRequestDBResponse},
};
use crate::types::{ContentRequestId, CreatorId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing content requests
#[derive(Debug, Clone, Default)]
pub struct ContentRequestFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
    pub creator_id: Option<CreatorId>,
    pub status: Option<ContentRequestStatus>,
}

#[derive(Debug, Clone, FromRow)]
struct ContentRequest {
    pub id: ContentRequestId,
    pub creator_id: CreatorId,
    pub user_id: UserId,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: ContentRequestStatus,
    pub price: Option<Decimal>,
    pub paypal_authorization_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ContentRequest> for ContentRequestDBResponse {
    fn from(r: ContentRequest) -> Self {
        Self {
            id: r.id,
            creator_id: r.creator_id,
            user_id: r.user_id,
            message: r.message,
            status: r.status,
            price: r.price,
            paypal_authorization_id: r.paypal_authorization_id,
            created_at: r.created_at,
        }
    }
}

fn push_filter(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &ContentRequestFilter) {
    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ");
        query.push_bind(user_id);
    }
    if let Some(creator_id) = filter.creator_id {
        query.push(" AND creator_id = ");
        query.push_bind(creator_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
}

pub struct ContentRequests<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ContentRequests<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), creator_id = %abbrev_uuid(&request.creator_id)), err)]
    pub async fn create(&mut self, request: &ContentRequestCreateDBRequest) -> Result<ContentRequestDBResponse> {
        let created = sqlx::query_as::<_, ContentRequest>(
            r#"
            INSERT INTO content_requests (creator_id, user_id, message, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING *
            "#,
        )
        .bind(request.creator_id)
        .bind(request.user_id)
        .bind(&request.message)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(created.into())
    }

    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ContentRequestId) -> Result<Option<ContentRequestDBResponse>> {
        let request = sqlx::query_as::<_, ContentRequest>("SELECT * FROM content_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(request.map(Into::into))
    }

    /// Fetch a request and hold its row lock until the surrounding transaction ends.
    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_for_update(&mut self, id: ContentRequestId) -> Result<Option<ContentRequestDBResponse>> {
        let request = sqlx::query_as::<_, ContentRequest>("SELECT * FROM content_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(request.map(Into::into))
    }

    /// Record the creator's quote and move the request to `priced`.
    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id), price = %price), err)]
    pub async fn set_price(&mut self, id: ContentRequestId, price: Decimal) -> Result<ContentRequestDBResponse> {
        let updated = sqlx::query_as::<_, ContentRequest>(
            "UPDATE content_requests SET price = $2, status = 'priced' WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(price)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(updated.into())
    }

    /// Store the payment authorization and move the request to `authorized`.
    #[instrument(skip(self, authorization_id), fields(request_id = %abbrev_uuid(&id)), err)]
    pub async fn set_authorized(&mut self, id: ContentRequestId, authorization_id: &str) -> Result<ContentRequestDBResponse> {
        let updated = sqlx::query_as::<_, ContentRequest>(
            "UPDATE content_requests SET paypal_authorization_id = $2, status = 'authorized' WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(authorization_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(updated.into())
    }

    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id), status = %status), err)]
    pub async fn set_status(&mut self, id: ContentRequestId, status: ContentRequestStatus) -> Result<ContentRequestDBResponse> {
        let updated = sqlx::query_as::<_, ContentRequest>("UPDATE content_requests SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(updated.into())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &ContentRequestFilter) -> Result<Vec<ContentRequestDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM content_requests WHERE 1=1");
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let requests = query.build_query_as::<ContentRequest>().fetch_all(&mut *self.db).await?;
        Ok(requests.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ContentRequestFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM content_requests WHERE 1=1");
        push_filter(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_creator, create_test_user};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_lifecycle_writes(pool: PgPool) {
        let user = create_test_user(&pool, "fan@example.com").await;
        let creator = create_test_creator(&pool, "luna").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ContentRequests::new(&mut conn);

        let created = repo
            .create(&ContentRequestCreateDBRequest {
                creator_id: creator.id,
                user_id: user.id,
                message: "A sunset photo please".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.status, ContentRequestStatus::Pending);
        assert!(created.price.is_none());

        let priced = repo.set_price(created.id, Decimal::new(2500, 2)).await.unwrap();
        assert_eq!(priced.status, ContentRequestStatus::Priced);
        assert_eq!(priced.price, Some(Decimal::new(2500, 2)));

        let authorized = repo.set_authorized(created.id, "FAKE-AUTH-123").await.unwrap();
        assert_eq!(authorized.status, ContentRequestStatus::Authorized);
        assert_eq!(authorized.paypal_authorization_id.as_deref(), Some("FAKE-AUTH-123"));

        let delivered = repo.set_status(created.id, ContentRequestStatus::Delivered).await.unwrap();
        assert_eq!(delivered.status, ContentRequestStatus::Delivered);
        assert_eq!(delivered.price, Some(Decimal::new(2500, 2)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_non_positive_price_is_check_violation(pool: PgPool) {
        let user = create_test_user(&pool, "fan@example.com").await;
        let creator = create_test_creator(&pool, "luna").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ContentRequests::new(&mut conn);

        let created = repo
            .create(&ContentRequestCreateDBRequest {
                creator_id: creator.id,
                user_id: user.id,
                message: "Anything".to_string(),
            })
            .await
            .unwrap();

        let err = repo.set_price(created.id, Decimal::ZERO).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_filtering_by_party_and_status(pool: PgPool) {
        let user = create_test_user(&pool, "fan@example.com").await;
        let luna = create_test_creator(&pool, "luna").await;
        let sol = create_test_creator(&pool, "sol").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ContentRequests::new(&mut conn);

        for creator_id in [luna.id, luna.id, sol.id] {
            repo.create(&ContentRequestCreateDBRequest {
                creator_id,
                user_id: user.id,
                message: "hi".to_string(),
            })
            .await
            .unwrap();
        }
        let first = repo
            .list(&ContentRequestFilter {
                limit: 1,
                creator_id: Some(luna.id),
                ..Default::default()
            })
            .await
            .unwrap();
        repo.set_status(first[0].id, ContentRequestStatus::Cancelled).await.unwrap();

        let for_luna = ContentRequestFilter {
            limit: 10,
            creator_id: Some(luna.id),
            ..Default::default()
        };
        assert_eq!(repo.count(&for_luna).await.unwrap(), 2);

        let pending_for_luna = ContentRequestFilter {
            status: Some(ContentRequestStatus::Pending),
            ..for_luna.clone()
        };
        assert_eq!(repo.list(&pending_for_luna).await.unwrap().len(), 1);

        let for_user = ContentRequestFilter {
            limit: 10,
            user_id: Some(user.id),
            ..Default::default()
        };
        assert_eq!(repo.list(&for_user).await.unwrap().len(), 3);
    }
}
