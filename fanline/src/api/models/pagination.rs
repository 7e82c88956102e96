//! Offset pagination for admin and content-request listings.
//!
//! Query structs embed [`Pagination`] with `#[serde(flatten)]`. Flattened fields reach serde as
//! strings, so both values are parsed with `DisplayFromStr`.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Page size when `limit` is omitted.
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page a client may ask for.
pub const MAX_LIMIT: i64 = 100;

/// `skip` / `limit` query parameters.
///
/// Out-of-range values are clamped rather than rejected: a negative `skip` reads as 0 and
/// `limit` lands in `1..=MAX_LIMIT`.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Rows to skip
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Rows to return
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn skip(&self) -> i64 {
        self.skip.map_or(0, |skip| skip.max(0))
    }

    pub fn limit(&self) -> i64 {
        self.limit.map_or(DEFAULT_LIMIT, |limit| limit.clamp(1, MAX_LIMIT))
    }

    /// `(skip, limit)` after clamping, ready for a repository filter.
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

/// One page of results. `skip` and `limit` echo the clamped values actually used.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub data: Vec<T>,
    /// Rows matching the filter across all pages
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        Self {
            data,
            total_count,
            skip,
            limit,
        }
    }
}
