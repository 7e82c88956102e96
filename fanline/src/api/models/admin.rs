//! API response models for the admin dashboard.

use crate::db::models::admin::PlatformStatsDBResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content request counts, one field per status
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ContentRequestCounts {
    pub pending: i64,
    pub priced: i64,
    pub authorized: i64,
    pub delivered: i64,
    pub paid: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlatformStatsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub total_creators: i64,
    pub total_messages: i64,
    pub active_subscriptions: i64,
    pub content_requests: ContentRequestCounts,
}

impl From<PlatformStatsDBResponse> for PlatformStatsResponse {
    fn from(db: PlatformStatsDBResponse) -> Self {
        use super::content_requests::ContentRequestStatus;

        let mut content_requests = ContentRequestCounts::default();
        for (status, count) in db.content_requests_by_status {
            let slot = match status {
                ContentRequestStatus::Pending => &mut content_requests.pending,
                ContentRequestStatus::Priced => &mut content_requests.priced,
                ContentRequestStatus::Authorized => &mut content_requests.authorized,
                ContentRequestStatus::Delivered => &mut content_requests.delivered,
                ContentRequestStatus::Paid => &mut content_requests.paid,
                ContentRequestStatus::Cancelled => &mut content_requests.cancelled,
            };
            *slot = count;
        }

        Self {
            total_users: db.total_users,
            active_users: db.active_users,
            total_creators: db.total_creators,
            total_messages: db.total_messages,
            active_subscriptions: db.active_subscriptions,
            content_requests,
        }
    }
}
