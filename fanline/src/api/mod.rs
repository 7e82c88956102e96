//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`extract`]**: Request extractors sharing the service's error shape
//!
//! # API Structure
//!
//! - **Authentication** (`/api/auth/*`, `/api/creators/login`): sessions for users and creators
//! - **Creators** (`/api/creators/*`, `/api/creator/profile`, `/api/creator/gallery`)
//! - **Subscriptions** (`/api/subscriptions/*`)
//! - **Messages** (`/api/messages`, `/api/creator/messages`, `/api/creator/conversations`)
//! - **Content requests** (`/api/content-requests/*`, `/api/creator/content-requests/*`)
//! - **Stories** (`/api/stories/*`, `/api/creator/stories/*`, `/api/creator/my-stories`)
//! - **AI doubles** (`/api/ai-doubles/*`)
//! - **Admin** (`/api/admin/*`): read endpoints guarded by the admin password
//!
//! API documentation is available at `/api/docs` when the server is running.

pub mod extract;
pub mod handlers;
pub mod models;
