//! Database models for subscriptions.

use crate::api::models::subscriptions::SubscriptionStatus;
use crate::types::{CreatorId, SubscriptionId, UserId};
use chrono::{DateTime, Utc};

/// Database response for a subscription
#[derive(Debug, Clone)]
pub struct SubscriptionDBResponse {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub creator_id: CreatorId,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}
