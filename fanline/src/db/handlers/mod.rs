//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `PgConnection`, binds parameters into runtime-checked
//! queries, and returns models from [`crate::db::models`]. Tables with plain CRUD semantics
//! implement the [`Repository`] trait; the rest expose only the operations the API needs.
//!
//! # Available Repositories
//!
//! - [`Users`]: User accounts and login bookkeeping
//! - [`Creators`]: Creator accounts and public profiles
//! - [`Subscriptions`]: User to creator subscriptions
//! - [`Messages`]: Conversations and the automatic-message trigger
//! - [`ContentRequests`]: Custom content orders and their status transitions
//! - [`Stories`]: Ephemeral media posts and view tracking
//! - [`GalleryPhotos`]: Creator gallery
//! - [`AiDoubles`]: User voice/persona profiles
//! - [`admin`]: Platform-wide aggregates

pub mod admin;
pub mod ai_doubles;
pub mod content_requests;
pub mod creators;
pub mod gallery_photos;
pub mod messages;
pub mod repository;
pub mod stories;
pub mod subscriptions;
pub mod users;

pub use ai_doubles::AiDoubles;
pub use content_requests::ContentRequests;
pub use creators::Creators;
pub use gallery_photos::GalleryPhotos;
pub use messages::Messages;
pub use repository::Repository;
pub use stories::Stories;
pub use subscriptions::Subscriptions;
pub use users::Users;
