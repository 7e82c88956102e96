//! Database repository for subscriptions.

use crate::api::models::subscriptions::SubscriptionStatus;
use crate::db::{errors::Result, models::subscriptions::SubscriptionDBResponse};
use crate::types::{CreatorId, SubscriptionId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for the admin subscription listing
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<SubscriptionStatus>,
}

#[derive(Debug, Clone, FromRow)]
struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub creator_id: CreatorId,
    #[sqlx(try_from = "String")]
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionDBResponse {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            creator_id: s.creator_id,
            status: s.status,
            created_at: s.created_at,
        }
    }
}

pub struct Subscriptions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Subscriptions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Subscribe a user to a creator, re-activating a cancelled subscription if one exists.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), creator_id = %abbrev_uuid(&creator_id)), err)]
    pub async fn subscribe(&mut self, user_id: UserId, creator_id: CreatorId) -> Result<SubscriptionDBResponse> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, creator_id, status)
            VALUES ($1, $2, 'active')
            ON CONFLICT ON CONSTRAINT subscriptions_user_creator_unique
            DO UPDATE SET status = 'active'
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(creator_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subscription.into())
    }

    /// Cancel one of the user's subscriptions. Returns `None` when the subscription does not
    /// exist or belongs to someone else.
    #[instrument(skip(self), fields(subscription_id = %abbrev_uuid(&id)), err)]
    pub async fn cancel(&mut self, id: SubscriptionId, user_id: UserId) -> Result<Option<SubscriptionDBResponse>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "UPDATE subscriptions SET status = 'cancelled' WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(subscription.map(Into::into))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<SubscriptionDBResponse>> {
        let subscriptions =
            sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(subscriptions.into_iter().map(Into::into).collect())
    }

    /// Whether the user currently holds an active subscription to the creator.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), creator_id = %abbrev_uuid(&creator_id)), err)]
    pub async fn is_active(&mut self, user_id: UserId, creator_id: CreatorId) -> Result<bool> {
        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND creator_id = $2 AND status = 'active')",
        )
        .bind(user_id)
        .bind(creator_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(active)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &SubscriptionFilter) -> Result<Vec<SubscriptionDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM subscriptions WHERE 1=1");
        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let subscriptions = query.build_query_as::<Subscription>().fetch_all(&mut *self.db).await?;
        Ok(subscriptions.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &SubscriptionFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM subscriptions WHERE 1=1");
        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status.as_str());
        }

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
