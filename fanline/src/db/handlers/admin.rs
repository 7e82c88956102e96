//! Platform-wide aggregates for the admin dashboard.

use crate::api::models::content_requests::ContentRequestStatus;
use crate::db::{
    errors::{DbError, Result},
    models::admin::PlatformStatsDBResponse,
};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, FromRow)]
struct Totals {
    total_users: i64,
    active_users: i64,
    total_creators: i64,
    total_messages: i64,
    active_subscriptions: i64,
}

/// Count users, creators, messages, subscriptions, and content requests by status.
#[instrument(skip(db), err)]
pub async fn platform_stats(db: &mut PgConnection) -> Result<PlatformStatsDBResponse> {
    let totals = sqlx::query_as::<_, Totals>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE is_active) AS active_users,
            (SELECT COUNT(*) FROM creators) AS total_creators,
            (SELECT COUNT(*) FROM messages) AS total_messages,
            (SELECT COUNT(*) FROM subscriptions WHERE status = 'active') AS active_subscriptions
        "#,
    )
    .fetch_one(&mut *db)
    .await?;

    let rows: Vec<(String, i64)> = sqlx::query_as("SELECT status, COUNT(*) FROM content_requests GROUP BY status")
        .fetch_all(&mut *db)
        .await?;

    let content_requests_by_status = rows
        .into_iter()
        .map(|(status, count)| {
            status
                .parse::<ContentRequestStatus>()
                .map(|status| (status, count))
                .map_err(|e| DbError::Other(e.into()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PlatformStatsDBResponse {
        total_users: totals.total_users,
        active_users: totals.active_users,
        total_creators: totals.total_creators,
        total_messages: totals.total_messages,
        active_subscriptions: totals.active_subscriptions,
        content_requests_by_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{ContentRequests, Subscriptions};
    use crate::db::models::content_requests::ContentRequestCreateDBRequest;
    use crate::test::utils::{create_test_creator, create_test_user};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_empty_platform(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let stats = platform_stats(&mut conn).await.unwrap();

        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.total_creators, 0);
        assert!(stats.content_requests_by_status.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_counts(pool: PgPool) {
        let user = create_test_user(&pool, "fan@example.com").await;
        create_test_user(&pool, "other@example.com").await;
        let creator = create_test_creator(&pool, "luna").await;

        let mut conn = pool.acquire().await.unwrap();
        Subscriptions::new(&mut conn).subscribe(user.id, creator.id).await.unwrap();
        let mut requests = ContentRequests::new(&mut conn);
        for _ in 0..2 {
            requests
                .create(&ContentRequestCreateDBRequest {
                    creator_id: creator.id,
                    user_id: user.id,
                    message: "hi".to_string(),
                })
                .await
                .unwrap();
        }

        let stats = platform_stats(&mut conn).await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 2);
        assert_eq!(stats.total_creators, 1);
        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.active_subscriptions, 1);
        assert_eq!(stats.content_requests_by_status, vec![(ContentRequestStatus::Pending, 2)]);
    }
}
