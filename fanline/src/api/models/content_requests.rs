//! API request/response models for content requests.

use super::pagination::Pagination;
use crate::db::models::content_requests::ContentRequestDBResponse;
use crate::types::{ContentRequestId, CreatorId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Lifecycle of a custom content order.
///
/// `pending -> priced -> authorized -> delivered`, with `cancelled` reachable from any state
/// before delivery. `paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentRequestStatus {
    Pending,
    Priced,
    Authorized,
    Delivered,
    Paid,
    Cancelled,
}

crate::text_enum!(ContentRequestStatus {
    Pending => "pending",
    Priced => "priced",
    Authorized => "authorized",
    Delivered => "delivered",
    Paid => "paid",
    Cancelled => "cancelled",
});

impl ContentRequestStatus {
    /// Whether a request in this state may move to `next`.
    pub fn can_transition_to(self, next: ContentRequestStatus) -> bool {
        use ContentRequestStatus::*;
        matches!(
            (self, next),
            (Pending, Priced) | (Priced, Authorized) | (Authorized, Delivered) | (Pending | Priced | Authorized, Cancelled)
        )
    }

    /// Delivered and paid requests can no longer be cancelled.
    pub fn is_settled(self) -> bool {
        matches!(self, ContentRequestStatus::Delivered | ContentRequestStatus::Paid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentRequestCreate {
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
    pub message: String,
}

/// A creator quoting a price for a pending request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetPriceRequest {
    #[schema(value_type = String, example = "25.00")]
    pub price: Decimal,
}

/// A creator fulfilling an authorized request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeliverRequest {
    /// Text sent to the user along with the delivery
    pub content: Option<String>,
    /// Delivered media, attached to the delivery message
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentRequestResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ContentRequestId,
    #[schema(value_type = String, format = "uuid")]
    pub creator_id: CreatorId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub message: String,
    pub status: ContentRequestStatus,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub paypal_authorization_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing content requests
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListContentRequestsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    pub status: Option<ContentRequestStatus>,
}

impl From<ContentRequestDBResponse> for ContentRequestResponse {
    fn from(db: ContentRequestDBResponse) -> Self {
        Self {
            id: db.id,
            creator_id: db.creator_id,
            user_id: db.user_id,
            message: db.message,
            status: db.status,
            price: db.price,
            paypal_authorization_id: db.paypal_authorization_id,
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ContentRequestStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Pending.can_transition_to(Priced));
        assert!(Priced.can_transition_to(Authorized));
        assert!(Authorized.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Authorized));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Priced.can_transition_to(Priced));
        assert!(!Delivered.can_transition_to(Authorized));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_cancellation_guard() {
        for status in [Pending, Priced, Authorized] {
            assert!(!status.is_settled());
            assert!(status.can_transition_to(Cancelled), "{status} should be cancellable");
        }
        for status in [Delivered, Paid, Cancelled] {
            assert!(!status.can_transition_to(Cancelled), "{status} should not be cancellable");
        }
        assert!(Delivered.is_settled());
        assert!(Paid.is_settled());
    }

    #[test]
    fn test_text_round_trip() {
        for status in ContentRequestStatus::ALL {
            assert_eq!(status.as_str().parse::<ContentRequestStatus>().unwrap(), *status);
        }
        assert!("refunded".parse::<ContentRequestStatus>().is_err());
    }
}
