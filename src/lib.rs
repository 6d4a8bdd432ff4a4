//! Core library surface for the songbook TUI.
//!
//! `db` owns the SQLite store, `models` the in-memory songbook it loads into,
//! and `ui` the terminal front-end. `config` and `logging` bootstrap the
//! binary.
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod ui;

/// Settings read from `config.toml`.
pub use config::AppConfig;

/// Persistence handle and its error type.
pub use db::{Database, Error};

/// Domain types the layers pass around.
pub use models::{SongDraft, SongRecord, Songbook};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
