//! CRUD trait shared by the table-backed repositories.

use crate::db::errors::Result;

/// CRUD over one table, implemented by [`Users`](super::Users), [`Creators`](super::Creators)
/// and [`AiDoubles`](super::AiDoubles).
///
/// Tables with lifecycle rules (messages, content requests, stories) expose purpose-built
/// methods instead, since a generic `update` would let callers skip their transitions.
#[async_trait::async_trait]
pub trait Repository {
    /// Insert payload, with hashes and slugs already computed
    type CreateRequest;

    /// Partial update; `None` fields are left unchanged
    type UpdateRequest;

    /// Row as returned to callers
    type Response;

    type Id: Send + Sync;

    /// Search and paging options for [`Repository::list`]
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Returns whether a row was removed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Fails with `DbError::NotFound` when no row has this id
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
