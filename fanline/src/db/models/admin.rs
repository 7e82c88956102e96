//! Database models for admin aggregates.

use crate::api::models::content_requests::ContentRequestStatus;

/// Platform-wide counts for the admin dashboard
#[derive(Debug, Clone)]
pub struct PlatformStatsDBResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub total_creators: i64,
    pub total_messages: i64,
    pub active_subscriptions: i64,
    /// Only statuses with at least one request appear
    pub content_requests_by_status: Vec<(ContentRequestStatus, i64)>,
}
