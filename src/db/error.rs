use std::path::PathBuf;

use rusqlite::{Error as SqlError, ErrorCode};
use thiserror::Error;

/// Result alias used by every persistence helper.
pub type Result<T> = std::result::Result<T, Error>;

/// The natural-key tables a lookup can miss on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Song,
    Category,
    Genre,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Song => "song",
            Entity::Category => "category",
            Entity::Genre => "genre",
        };
        f.write_str(name)
    }
}

/// Failures raised by the data-access layer. `operation` carries a fixed tag
/// naming the helper that failed so log lines and footer messages stay
/// greppable.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: Entity, key: String },

    #[error("{operation}: value already exists")]
    ConstraintViolation {
        operation: &'static str,
        #[source]
        source: SqlError,
    },

    #[error("could not open database at {}", path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: SqlError,
    },

    #[error("could not create database directory {}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("{operation} failed")]
    Database {
        operation: &'static str,
        #[source]
        source: SqlError,
    },
}

impl Error {
    /// Tag a raw SQLite error with the operation that produced it, splitting
    /// out constraint failures so callers can match on them.
    pub(crate) fn from_sql(operation: &'static str, source: SqlError) -> Self {
        if matches!(
            source.sqlite_error_code(),
            Some(ErrorCode::ConstraintViolation)
        ) {
            Error::ConstraintViolation { operation, source }
        } else {
            Error::Database { operation, source }
        }
    }

    pub(crate) fn not_found(entity: Entity, key: &str) -> Self {
        Error::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. } | Error::CreateDirectory { .. }
        )
    }
}

/// Extension used at every call site: `.sql_context("insert_genre")?`.
pub(crate) trait SqlResultExt<T> {
    fn sql_context(self, operation: &'static str) -> Result<T>;
}

impl<T> SqlResultExt<T> for std::result::Result<T, SqlError> {
    fn sql_context(self, operation: &'static str) -> Result<T> {
        self.map_err(|err| Error::from_sql(operation, err))
    }
}
