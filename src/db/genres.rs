use tracing::info;

use super::connection::Database;
use super::error::Result;
use super::names::GENRES;

impl Database {
    pub fn genres(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        GENRES.fetch_all(&conn, "fetch_genres")
    }

    pub fn insert_genre(&self, name: &str) -> Result<()> {
        let conn = self.connect()?;
        GENRES.insert(&conn, name, "insert_genre")?;
        info!(genre = name, "inserted genre");
        Ok(())
    }

    /// Resolve genre names to ids in input order over a single connection.
    /// The first unknown name aborts with `NotFound`.
    pub fn genre_ids<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<i64>> {
        let conn = self.connect()?;
        names
            .iter()
            .map(|name| GENRES.lookup_id(&conn, name.as_ref(), "genre_ids"))
            .collect()
    }

    pub fn rename_genre(&self, old: &str, new: &str) -> Result<()> {
        let conn = self.connect()?;
        GENRES.rename(&conn, old, new, "rename_genre")?;
        info!(from = old, to = new, "renamed genre");
        Ok(())
    }

    /// Delete genres by name. Only the `songs_genres` links cascade; the songs
    /// themselves stay in the database.
    pub fn delete_genres<S: AsRef<str>>(&self, names: &[S]) -> Result<usize> {
        let mut conn = self.connect()?;
        let deleted = GENRES.delete_many(&mut conn, names, "delete_genres")?;
        info!(requested = names.len(), deleted, "deleted genres");
        Ok(deleted)
    }
}
