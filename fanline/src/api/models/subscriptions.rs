//! API request/response models for subscriptions.

use super::pagination::Pagination;
use crate::db::models::subscriptions::SubscriptionDBResponse;
use crate::types::{CreatorId, SubscriptionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

crate::text_enum!(SubscriptionStatus {
    Active => "active",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionCreate {
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SubscriptionId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for the admin subscription listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListSubscriptionsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    pub status: Option<SubscriptionStatus>,
}

impl From<SubscriptionDBResponse> for SubscriptionResponse {
    fn from(db: SubscriptionDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            creator_id: db.creator_id,
            status: db.status,
            created_at: db.created_at,
        }
    }
}
