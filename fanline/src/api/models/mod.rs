//! API request and response data models.
//!
//! API models are distinct from database models ([`crate::db::models`]) so the wire format and
//! the storage representation can evolve independently. Every model is annotated with `utoipa`
//! for the generated OpenAPI document.
//!
//! - [`auth`]: Login, registration and session payloads
//! - [`users`], [`creators`]: Account views (hashes and stored passwords are never returned)
//! - [`subscriptions`], [`messages`]: Conversations between users and creators
//! - [`content_requests`]: Paid custom-content orders and their lifecycle
//! - [`stories`], [`gallery`]: Creator media
//! - [`ai_doubles`]: User voice/persona profiles
//! - [`admin`]: Dashboard aggregates
//! - [`pagination`]: Shared `skip`/`limit` parameters and the paginated envelope

pub mod admin;
pub mod ai_doubles;
pub mod auth;
pub mod content_requests;
pub mod creators;
pub mod gallery;
pub mod messages;
pub mod pagination;
pub mod stories;
pub mod subscriptions;
pub mod users;
