use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info};

use super::error::{Error, Result, SqlResultExt};

/// Collation registered on every connection. SQLite's built-in `NOCASE`
/// only folds ASCII letters; this one folds any Unicode case.
pub(crate) const UNICASE: &str = "UNICASE";

/// Case-insensitive ordering behind [`UNICASE`].
pub(crate) fn unicase_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Schema script run on every startup. Names are unique ignoring case, songs
/// hang off exactly one category and link to genres through `songs_genres`;
/// the cascade rules keep both sides consistent without application code.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS genres(
        id INTEGER PRIMARY KEY NOT NULL,
        genre TEXT UNIQUE NOT NULL COLLATE UNICASE
    );
    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY NOT NULL,
        category TEXT UNIQUE NOT NULL COLLATE UNICASE
    );
    CREATE TABLE IF NOT EXISTS songs(
        id INTEGER PRIMARY KEY NOT NULL,
        title TEXT UNIQUE NOT NULL COLLATE UNICASE,
        id_category INTEGER NOT NULL,
        song_image TEXT DEFAULT '',
        song_text TEXT DEFAULT '',
        last_performed TEXT NOT NULL,
        is_recently INTEGER DEFAULT 0,
        comment TEXT DEFAULT '',
        FOREIGN KEY(id_category) REFERENCES categories(id) ON DELETE CASCADE ON UPDATE CASCADE
    );
    CREATE TABLE IF NOT EXISTS songs_genres(
        id_song INTEGER NOT NULL,
        id_genre INTEGER NOT NULL,
        PRIMARY KEY (id_song, id_genre),
        FOREIGN KEY(id_song) REFERENCES songs(id) ON DELETE CASCADE ON UPDATE CASCADE,
        FOREIGN KEY(id_genre) REFERENCES genres(id) ON DELETE CASCADE ON UPDATE CASCADE
    );
";

/// Handle to the songbook database file. The handle never keeps a connection
/// alive: each operation opens one through [`Database::connect`] and drops it
/// before returning, so concurrent access is left to SQLite's own locking.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the containing directory and the four tables if they are
    /// missing. Safe to call repeatedly; existing rows are left untouched.
    pub fn ensure_schema(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = self.connect()?;
        conn.execute_batch(SCHEMA).sql_context("ensure_schema")?;
        debug!(path = %self.path.display(), "schema ready");
        Ok(())
    }

    /// Open a fresh connection with foreign keys enforced and the [`UNICASE`]
    /// collation installed. The connection is closed when the caller drops it.
    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(|source| Error::Connection {
            path: self.path.clone(),
            source,
        })?;
        conn.execute("PRAGMA foreign_keys = ON", [])
            .and_then(|_| conn.create_collation(UNICASE, unicase_cmp))
            .map_err(|source| Error::Connection {
                path: self.path.clone(),
                source,
            })?;
        Ok(conn)
    }

    /// Delete every category and genre. Songs and links disappear through the
    /// cascade rules.
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().sql_context("clear")?;
        tx.execute("DELETE FROM categories", []).sql_context("clear")?;
        tx.execute("DELETE FROM genres", []).sql_context("clear")?;
        tx.commit().sql_context("clear")?;
        info!("cleared songbook");
        Ok(())
    }
}
