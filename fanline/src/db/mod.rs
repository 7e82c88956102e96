//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations, one per table
//! - [`models`]: Database record structures
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Repositories borrow a `PgConnection`, so they work the same over a pooled connection or a
//! transaction. Status transitions and multi-statement writes should use a transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = ContentRequests::new(&mut tx);
//! let request = repo.lock_for_update(id).await?;
//! // ... check and apply the transition ...
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are applied on startup through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
