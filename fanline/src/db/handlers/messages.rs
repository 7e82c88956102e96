//! Database repository for messages.
//!
//! Besides plain inserts and reads this repository owns the automatic-message trigger: after a
//! user message is stored, every configured trigger whose threshold equals the number of user
//! messages in the conversation inserts a creator message, unless that exact creator message is
//! already there. The send and the triggered inserts commit together.

use crate::api::models::messages::MessageRole;
use crate::config::AutoMessageTrigger;
use crate::db::{
    errors::Result,
    models::messages::{ConversationSummaryDBResponse, MessageCreateDBRequest, MessageDBResponse},
};
use crate::types::{CreatorId, MessageId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for the admin message listing
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
    pub creator_id: Option<CreatorId>,
}

#[derive(Debug, Clone, FromRow)]
struct Message {
    pub id: MessageId,
    pub user_id: UserId,
    pub creator_id: CreatorId,
    #[sqlx(try_from = "String")]
    pub role: MessageRole,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDBResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            creator_id: m.creator_id,
            role: m.role,
            content: m.content,
            image_url: m.image_url,
            created_at: m.created_at,
        }
    }
}

/// Triggers that fire once a conversation holds exactly `user_message_count` user messages.
pub fn triggers_for_count(triggers: &[AutoMessageTrigger], user_message_count: i64) -> impl Iterator<Item = &AutoMessageTrigger> {
    triggers.iter().filter(move |t| t.after_user_messages == user_message_count)
}

fn push_filter(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &MessageFilter) {
    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ");
        query.push_bind(user_id);
    }
    if let Some(creator_id) = filter.creator_id {
        query.push(" AND creator_id = ");
        query.push_bind(creator_id);
    }
}

pub struct Messages<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Messages<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert one message. Timestamps come from the wall clock so messages written in the same
    /// transaction still order correctly.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), creator_id = %abbrev_uuid(&request.creator_id), role = %request.role), err)]
    pub async fn create(&mut self, request: &MessageCreateDBRequest) -> Result<MessageDBResponse> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (user_id, creator_id, role, content, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, clock_timestamp())
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.creator_id)
        .bind(request.role.as_str())
        .bind(&request.content)
        .bind(&request.image_url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(message.into())
    }

    /// Store a user message and run the automatic-message triggers for its conversation.
    ///
    /// Returns the stored message and the creator messages inserted by triggers.
    #[instrument(skip(self, request, triggers), fields(user_id = %abbrev_uuid(&request.user_id), creator_id = %abbrev_uuid(&request.creator_id)), err)]
    pub async fn send_user_message(
        &mut self,
        request: &MessageCreateDBRequest,
        triggers: &[AutoMessageTrigger],
    ) -> Result<(MessageDBResponse, Vec<MessageDBResponse>)> {
        let mut tx = self.db.begin().await?;
        let mut repo = Messages::new(&mut tx);

        let message = repo.create(request).await?;
        let count = repo.count_user_messages(request.user_id, request.creator_id).await?;

        let mut auto_replies = Vec::new();
        for trigger in triggers_for_count(triggers, count) {
            if repo
                .creator_message_exists(request.user_id, request.creator_id, &trigger.content, trigger.image_url.as_deref())
                .await?
            {
                tracing::debug!(threshold = trigger.after_user_messages, "Auto reply already present, skipping");
                continue;
            }

            let reply = repo
                .create(&MessageCreateDBRequest {
                    user_id: request.user_id,
                    creator_id: request.creator_id,
                    role: MessageRole::Creator,
                    content: trigger.content.clone(),
                    image_url: trigger.image_url.clone(),
                })
                .await?;
            auto_replies.push(reply);
        }

        tx.commit().await?;

        if !auto_replies.is_empty() {
            tracing::info!(count = auto_replies.len(), user_messages = count, "Inserted automatic creator messages");
        }

        Ok((message, auto_replies))
    }

    /// Every message between one user and one creator, oldest first.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), creator_id = %abbrev_uuid(&creator_id)), err)]
    pub async fn list_conversation(&mut self, user_id: UserId, creator_id: CreatorId) -> Result<Vec<MessageDBResponse>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE user_id = $1 AND creator_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(creator_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), err)]
    pub async fn count_user_messages(&mut self, user_id: UserId, creator_id: CreatorId) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE user_id = $1 AND creator_id = $2 AND role = 'user'")
                .bind(user_id)
                .bind(creator_id)
                .fetch_one(&mut *self.db)
                .await?;

        Ok(count)
    }

    #[instrument(skip(self, content, image_url), err)]
    pub async fn creator_message_exists(
        &mut self,
        user_id: UserId,
        creator_id: CreatorId,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM messages
                WHERE user_id = $1 AND creator_id = $2 AND role = 'creator'
                  AND content = $3 AND image_url IS NOT DISTINCT FROM $4
            )
            "#,
        )
        .bind(user_id)
        .bind(creator_id)
        .bind(content)
        .bind(image_url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    /// Whether the user has ever messaged or subscribed to the creator.
    #[instrument(skip(self), err)]
    pub async fn has_relationship(&mut self, user_id: UserId, creator_id: CreatorId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM messages WHERE user_id = $1 AND creator_id = $2)
                OR EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND creator_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(creator_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    /// A creator's inbox: one row per user, most recent conversation first.
    #[instrument(skip(self), fields(creator_id = %abbrev_uuid(&creator_id)), err)]
    pub async fn list_conversations(&mut self, creator_id: CreatorId) -> Result<Vec<ConversationSummaryDBResponse>> {
        let conversations = sqlx::query_as::<_, ConversationSummaryDBResponse>(
            r#"
            SELECT
                m.user_id,
                u.name AS user_name,
                u.email AS user_email,
                COUNT(*) AS message_count,
                MAX(m.created_at) AS last_message_at
            FROM messages m
            JOIN users u ON u.id = m.user_id
            WHERE m.creator_id = $1
            GROUP BY m.user_id, u.name, u.email
            ORDER BY last_message_at DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(conversations)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &MessageFilter) -> Result<Vec<MessageDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM messages WHERE 1=1");
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let messages = query.build_query_as::<Message>().fetch_all(&mut *self.db).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &MessageFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM messages WHERE 1=1");
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

    fn trigger(after: i64, content: &str) -> AutoMessageTrigger {
        AutoMessageTrigger {
            after_user_messages: after,
            content: content.to_string(),
            image_url: None,
        }
    }

    fn user_message(user_id: UserId, creator_id: CreatorId, content: &str) -> MessageCreateDBRequest {
        MessageCreateDBRequest {
            user_id,
            creator_id,
            role: MessageRole::User,
            content: content.to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_triggers_for_count() {
        let triggers = vec![trigger(1, "welcome"), trigger(3, "thanks"), trigger(3, "bonus")];

        let fired: Vec<_> = triggers_for_count(&triggers, 3).map(|t| t.content.as_str()).collect();
        assert_eq!(fired, vec!["thanks", "bonus"]);
        assert_eq!(triggers_for_count(&triggers, 2).count(), 0);
        assert_eq!(triggers_for_count(&[], 1).count(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_trigger_fires_exactly_once_at_threshold(pool: PgPool) {
        let user = create_test_user(&pool, "fan@example.com").await;
        let creator = create_test_creator(&pool, "luna").await;
        let triggers = vec![trigger(2, "Thanks for chatting! Here's a photo")];

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        let (_, replies) = repo.send_user_message(&user_message(user.id, creator.id, "hi"), &triggers).await.unwrap();
        assert!(replies.is_empty());

        let (_, replies) = repo.send_user_message(&user_message(user.id, creator.id, "hello?"), &triggers).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].role, MessageRole::Creator);
        assert_eq!(replies[0].content, "Thanks for chatting! Here's a photo");

        let (_, replies) = repo.send_user_message(&user_message(user.id, creator.id, "again"), &triggers).await.unwrap();
        assert!(replies.is_empty());

        let conversation = repo.list_conversation(user.id, creator.id).await.unwrap();
        let roles: Vec<_> = conversation.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::User, MessageRole::Creator, MessageRole::User]
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_trigger_skips_existing_identical_reply(pool: PgPool) {
        let user = create_test_user(&pool, "fan@example.com").await;
        let creator = create_test_creator(&pool, "luna").await;
        let triggers = vec![trigger(1, "welcome!")];

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        repo.create(&MessageCreateDBRequest {
            user_id: user.id,
            creator_id: creator.id,
            role: MessageRole::Creator,
            content: "welcome!".to_string(),
            image_url: None,
        })
        .await
        .unwrap();

        let (_, replies) = repo.send_user_message(&user_message(user.id, creator.id, "hi"), &triggers).await.unwrap();
        assert!(replies.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_triggers_are_per_conversation(pool: PgPool) {
        let a = create_test_user(&pool, "a@example.com").await;
        let b = create_test_user(&pool, "b@example.com").await;
        let creator = create_test_creator(&pool, "luna").await;
        let triggers = vec![trigger(1, "welcome!")];

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        let (_, replies_a) = repo.send_user_message(&user_message(a.id, creator.id, "hi"), &triggers).await.unwrap();
        let (_, replies_b) = repo.send_user_message(&user_message(b.id, creator.id, "hey"), &triggers).await.unwrap();
        assert_eq!(replies_a.len(), 1);
        assert_eq!(replies_b.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_inbox_and_relationship(pool: PgPool) {
        let a = create_test_user(&pool, "a@example.com").await;
        let b = create_test_user(&pool, "b@example.com").await;
        let stranger = create_test_user(&pool, "c@example.com").await;
        let creator = create_test_creator(&pool, "luna").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Messages::new(&mut conn);

        repo.create(&user_message(a.id, creator.id, "one")).await.unwrap();
        repo.create(&user_message(a.id, creator.id, "two")).await.unwrap();
        repo.create(&user_message(b.id, creator.id, "three")).await.unwrap();

        let inbox = repo.list_conversations(creator.id).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].user_id, b.id);
        assert_eq!(inbox[1].message_count, 2);
        assert_eq!(inbox[1].user_email, "a@example.com");

        assert!(repo.has_relationship(a.id, creator.id).await.unwrap());
        assert!(!repo.has_relationship(stranger.id, creator.id).await.unwrap());

        let filter = MessageFilter {
            skip: 0,
            limit: 10,
            user_id: Some(a.id),
            creator_id: None,
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        assert_eq!(repo.count(&MessageFilter::default()).await.unwrap(), 3);
    }
}
