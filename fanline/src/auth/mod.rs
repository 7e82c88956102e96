//! Authentication for users, creators, and the admin surface.
//!
//! # Sessions
//!
//! Users log in with email and password, creators with slug and password. Both receive an HS256
//! JWT naming the account and its kind, returned in the JSON body and as an HTTP-only cookie.
//! Requests may present the token either way: the session cookie or `Authorization: Bearer`.
//!
//! # Admin access
//!
//! Admin routes are not tied to an account. They require the `x-admin-password` header to match
//! the configured admin password; with no admin password configured the admin surface is closed.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for the authenticated principal in handlers
//! - [`password`]: Argon2 hashing plus verification of legacy bcrypt and plaintext credentials
//! - [`session`]: JWT creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use fanline::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.email)
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod session;
