//! Database record structures.
//!
//! `*CreateDBRequest` / `*UpdateDBRequest` describe writes, `*DBResponse` the rows handed back
//! to the API layer. Row structs that mirror table columns exactly stay private to the
//! repositories in [`crate::db::handlers`].

pub mod admin;
pub mod ai_doubles;
pub mod content_requests;
pub mod creators;
pub mod gallery_photos;
pub mod messages;
pub mod stories;
pub mod subscriptions;
pub mod users;
