//! Payment provider abstraction layer
//!
//! Content requests are paid through a two-step flow: the user's payment is first *authorized*
//! (funds held) when they accept a creator's price, then *captured* when the creator delivers.
//! A held authorization is *voided* when the request is cancelled.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{config::PaymentConfig, types::ContentRequestId};

pub mod dummy;

/// Create a payment provider from configuration
///
/// This is the single point where we convert config into provider instances.
pub fn create_provider(config: PaymentConfig) -> Box<dyn PaymentProvider> {
    match config {
        PaymentConfig::Dummy(dummy_config) => Box::new(dummy::DummyProvider::from(dummy_config)),
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Invalid payment data: {0}")]
    InvalidData(String),
}

/// A successful hold of funds for a content request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Provider-side authorization id, stored on the content request
    pub authorization_id: String,
}

/// A successful capture of previously authorized funds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Provider-side capture id
    pub capture_id: String,
}

/// Abstract payment provider interface
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Hold `amount` for the given content request.
    async fn authorize(&self, request_id: ContentRequestId, amount: Decimal) -> Result<Authorization>;

    /// Capture funds held by a previous authorization.
    async fn capture(&self, authorization_id: &str) -> Result<Capture>;

    /// Release funds held by a previous authorization.
    async fn void(&self, authorization_id: &str) -> Result<()>;
}
