//! API request/response models for messages.

use super::pagination::Pagination;
use crate::db::models::messages::{ConversationSummaryDBResponse, MessageDBResponse};
use crate::types::{CreatorId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Creator,
}

crate::text_enum!(MessageRole {
    User => "user",
    Creator => "creator",
});

/// A user writing to a creator
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageCreate {
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
    pub content: String,
    pub image_url: Option<String>,
}

/// A creator replying to a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatorMessageCreate {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: MessageId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
    pub role: MessageRole,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a user sending a message: the stored message plus any creator messages the
/// automatic-message triggers inserted alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    pub message: MessageResponse,
    pub auto_replies: Vec<MessageResponse>,
}

/// Query parameters for a user reading a conversation. The whole conversation is returned.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ConversationQuery {
    #[param(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
}

/// Query parameters for a creator reading a conversation. The whole conversation is returned.
#[derive(Debug, Deserialize, IntoParams)]
pub struct CreatorConversationQuery {
    #[param(value_type = String, format = "uuid")]
    pub user_id: UserId,
}

/// Query parameters for the admin message listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMessagesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[param(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,

    #[param(value_type = Option<String>, format = "uuid")]
    pub creator_id: Option<CreatorId>,
}

/// One row of a creator's inbox
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationSummaryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub user_email: String,
    pub message_count: i64,
    pub last_message_at: DateTime<Utc>,
}

impl From<MessageDBResponse> for MessageResponse {
    fn from(db: MessageDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            creator_id: db.creator_id,
            role: db.role,
            content: db.content,
            image_url: db.image_url,
            created_at: db.created_at,
        }
    }
}

impl From<ConversationSummaryDBResponse> for ConversationSummaryResponse {
    fn from(db: ConversationSummaryDBResponse) -> Self {
        Self {
            user_id: db.user_id,
            user_name: db.user_name,
            user_email: db.user_email,
            message_count: db.message_count,
            last_message_at: db.last_message_at,
        }
    }
}
