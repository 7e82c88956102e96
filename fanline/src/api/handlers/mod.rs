//! HTTP request handlers for all API endpoints.
//!
//! Each handler parses its input through [`crate::api::extract`] (`JsonBody`, `QueryParams`,
//! `PathParams`), checks who is calling through the extractors in [`crate::auth::current_user`],
//! runs its queries through the repositories in [`crate::db::handlers`], and shapes the response.
//!
//! # Handler Modules
//!
//! - [`auth`]: User registration and login, creator login, logout
//! - [`creators`]: Public creator profiles and galleries, creator self-service
//! - [`subscriptions`]: Subscribing to and cancelling creators
//! - [`messages`]: Conversations from both sides, with the automatic-message trigger
//! - [`content_requests`]: Custom content orders and their payment lifecycle
//! - [`stories`]: Story publishing, public feeds, view tracking
//! - [`ai_doubles`]: User voice/persona profiles and public share links
//! - [`admin`]: Password-protected read endpoints and creator onboarding
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which renders as a status code plus
//! `{"error": "<message>"}`.

pub mod admin;
pub mod ai_doubles;
pub mod auth;
pub mod content_requests;
pub mod creators;
pub mod messages;
pub mod stories;
pub mod subscriptions;

use crate::errors::Error;

/// Trim a required text field, rejecting it when nothing is left.
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} is required"),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  hi ", "content").unwrap(), "hi");

        let err = required_text(" \n\t", "content").unwrap_err();
        assert_eq!(err.user_message(), "content is required");
    }
}
