//! Dummy payment provider implementation
//!
//! Fabricates authorization and capture ids without contacting any gateway. Useful for
//! development and tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    config::DummyConfig,
    payment_providers::{Authorization, Capture, PaymentError, PaymentProvider, Result},
    types::{ContentRequestId, abbrev_uuid},
};

const AUTH_PREFIX: &str = "FAKE-AUTH-";
const CAPTURE_PREFIX: &str = "FAKE-CAPTURE-";

/// Dummy payment provider that approves everything (unless told to decline)
pub struct DummyProvider {
    decline_all: bool,
}

impl DummyProvider {
    pub fn new(decline_all: bool) -> Self {
        Self { decline_all }
    }
}

impl From<DummyConfig> for DummyProvider {
    fn from(config: DummyConfig) -> Self {
        Self::new(config.decline_all)
    }
}

/// Ids we hand out are `FAKE-AUTH-<uuid>`; anything else was not issued here.
fn check_authorization_id(authorization_id: &str) -> Result<()> {
    authorization_id
        .strip_prefix(AUTH_PREFIX)
        .and_then(|rest| Uuid::parse_str(rest).ok())
        .map(|_| ())
        .ok_or_else(|| PaymentError::InvalidData(format!("Unknown authorization id: {authorization_id}")))
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    async fn authorize(&self, request_id: ContentRequestId, amount: Decimal) -> Result<Authorization> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidData("Amount must be positive".to_string()));
        }
        if self.decline_all {
            tracing::info!("Dummy provider declined authorization for request {}", abbrev_uuid(&request_id));
            return Err(PaymentError::Declined("dummy provider is configured to decline".to_string()));
        }

        let authorization_id = format!("{AUTH_PREFIX}{}", Uuid::new_v4());
        tracing::info!(
            "Dummy provider authorized {} for request {} as {}",
            amount,
            abbrev_uuid(&request_id),
            authorization_id
        );

        Ok(Authorization { authorization_id })
    }

    async fn capture(&self, authorization_id: &str) -> Result<Capture> {
        check_authorization_id(authorization_id)?;

        let capture_id = format!("{CAPTURE_PREFIX}{}", Uuid::new_v4());
        tracing::info!("Dummy provider captured {} as {}", authorization_id, capture_id);

        Ok(Capture { capture_id })
    }

    async fn void(&self, authorization_id: &str) -> Result<()> {
        check_authorization_id(authorization_id)?;

        tracing::info!("Dummy provider voided {}", authorization_id);
        Ok(())
    }
}
