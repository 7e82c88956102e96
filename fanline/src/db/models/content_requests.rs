//! Database models for content requests.

use crate::api::models::content_requests::ContentRequestStatus;
use crate::types::{ContentRequestId, CreatorId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for opening a content request
#[derive(Debug, Clone)]
pub struct ContentRequestCreateDBRequest {
    pub creator_id: CreatorId,
    pub user_id: UserId,
    pub message: String,
}

/// Database response for a content request
#[derive(Debug, Clone)]
pub struct ContentRequestDBResponse {
    pub id: ContentRequestId,
    pub creator_id: CreatorId,
    pub user_id: UserId,
    pub message: String,
    pub status: ContentRequestStatus,
    pub price: Option<Decimal>,
    pub paypal_authorization_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
