//! Classification of `sqlx` failures into cases handlers can act on.

use sqlx::{error::DatabaseError, postgres::PgDatabaseError};
use thiserror::Error;

/// Errors returned by the repositories
#[derive(Error, Debug)]
pub enum DbError {
    /// No row matched, from `fetch_one` or an explicit lookup
    #[error("Entity not found")]
    NotFound,

    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
        /// Value from the `Key (...)=(...)` detail, when Postgres supplies one
        conflicting_value: Option<String>,
    },

    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// A status or range `CHECK` rejected the row
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let db_err: &dyn DatabaseError = match &err {
            sqlx::Error::RowNotFound => return DbError::NotFound,
            sqlx::Error::Database(db_err) => &**db_err,
            _ => return DbError::Other(err.into()),
        };

        let constraint = owned(db_err.constraint());
        let table = owned(db_err.table());
        let message = db_err.message().to_string();

        if db_err.is_unique_violation() {
            let conflicting_value = db_err
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(PgDatabaseError::detail)
                .and_then(detail_value);
            DbError::UniqueViolation {
                constraint,
                table,
                message,
                conflicting_value,
            }
        } else if db_err.is_foreign_key_violation() {
            DbError::ForeignKeyViolation { constraint, table, message }
        } else if db_err.is_check_violation() {
            DbError::CheckViolation { constraint, table, message }
        } else {
            DbError::Other(err.into())
        }
    }
}

/// Pull `some-creator` out of `Key (slug)=(some-creator) already exists.`
fn detail_value(detail: &str) -> Option<String> {
    let (_, rest) = detail.split_once("=(")?;
    let (value, _) = rest.split_once(") ")?;
    Some(value.to_string())
}

pub type Result<T> = std::result::Result<T, DbError>;
