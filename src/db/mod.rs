//! Persistence layer split across logical submodules. Every public operation
//! lives on [`Database`] and opens its own connection for the duration of the
//! call.

mod categories;
mod connection;
mod error;
mod genres;
mod names;
mod songs;

pub use connection::Database;
pub use error::{Entity, Error, Result};

#[cfg(test)]
pub(crate) use connection::tests::temp_db;
