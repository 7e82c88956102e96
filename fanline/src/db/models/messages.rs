//! Database models for messages.

use crate::api::models::messages::MessageRole;
use crate::types::{CreatorId, MessageId, UserId};
use chrono::{DateTime, Utc};

/// Database request for inserting a message
#[derive(Debug, Clone)]
pub struct MessageCreateDBRequest {
    pub user_id: UserId,
    pub creator_id: CreatorId,
    pub role: MessageRole,
    pub content: String,
    pub image_url: Option<String>,
}

/// Database response for a message
#[derive(Debug, Clone)]
pub struct MessageDBResponse {
    pub id: MessageId,
    pub user_id: UserId,
    pub creator_id: CreatorId,
    pub role: MessageRole,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One conversation in a creator's inbox
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationSummaryDBResponse {
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub user_email: String,
    pub message_count: i64,
    pub last_message_at: DateTime<Utc>,
}
