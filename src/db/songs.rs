use rusqlite::{params, Transaction};
use tracing::{debug, info};

use crate::models::{SongDraft, SongRecord, Songbook};

use super::connection::Database;
use super::error::{Entity, Error, Result, SqlResultExt};
use super::names::{CATEGORIES, GENRES};

impl Database {
    /// Read every song with its category and genres, folded into one record
    /// per title. Rows come back in song insertion order and, per song, in
    /// link insertion order, so genre lists keep the order they were added.
    /// A song whose genres were all deleted is still returned, with an empty
    /// genre list.
    pub fn load_songbook(&self) -> Result<Songbook> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT songs.title, genres.genre, categories.category, songs.song_image,
                        songs.song_text, songs.last_performed, songs.is_recently, songs.comment
                 FROM songs
                 JOIN categories ON songs.id_category = categories.id
                 LEFT JOIN songs_genres ON songs_genres.id_song = songs.id
                 LEFT JOIN genres ON songs_genres.id_genre = genres.id
                 ORDER BY songs.id, songs_genres.rowid",
            )
            .sql_context("load_songbook")?;

        let mut rows = stmt.query([]).sql_context("load_songbook")?;
        let mut book = Songbook::new();
        while let Some(row) = rows.next().sql_context("load_songbook")? {
            let read = || -> rusqlite::Result<(String, Option<String>, SongRecord)> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    SongRecord {
                        genres: Vec::new(),
                        category: row.get(2)?,
                        song_image: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        song_text: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        last_performed: row.get(5)?,
                        is_recently: row.get::<_, Option<i64>>(6)?.unwrap_or(0) != 0,
                        comment: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    },
                ))
            };
            let (title, genre, record) = read().sql_context("load_songbook")?;
            book.absorb_row(title, genre, record);
        }

        debug!(songs = book.len(), "loaded songbook");
        Ok(book)
    }

    /// Resolve a song title (case-insensitive) to its row id.
    pub fn song_id(&self, title: &str) -> Result<i64> {
        let conn = self.connect()?;
        song_id_in(&conn, title, "song_id")
    }

    /// Insert a song together with its genre links. Nothing is written unless
    /// the category, every genre and the song row itself all check out.
    pub fn insert_song(&self, draft: &SongDraft) -> Result<()> {
        validate(draft)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction().sql_context("insert_song")?;

        let category_id = CATEGORIES.lookup_id(&tx, &draft.category, "insert_song")?;
        tx.execute(
            "INSERT INTO songs (title, id_category, song_image, song_text,
                                last_performed, is_recently, comment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                draft.title,
                category_id,
                draft.song_image,
                draft.song_text,
                draft.last_performed,
                draft.is_recently as i64,
                draft.comment
            ],
        )
        .sql_context("insert_song")?;
        let song_id = tx.last_insert_rowid();
        link_genres(&tx, song_id, &draft.genres, "insert_song")?;

        tx.commit().sql_context("insert_song")?;
        info!(title = %draft.title, "inserted song");
        Ok(())
    }

    /// Rewrite an existing song, including a possible title change, and
    /// replace its genre links.
    pub fn update_song(&self, original_title: &str, draft: &SongDraft) -> Result<()> {
        validate(draft)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction().sql_context("update_song")?;

        let song_id = song_id_in(&tx, original_title, "update_song")?;
        let category_id = CATEGORIES.lookup_id(&tx, &draft.category, "update_song")?;
        tx.execute(
            "UPDATE songs
             SET title = ?1, id_category = ?2, song_image = ?3, song_text = ?4,
                 last_performed = ?5, is_recently = ?6, comment = ?7
             WHERE id = ?8",
            params![
                draft.title,
                category_id,
                draft.song_image,
                draft.song_text,
                draft.last_performed,
                draft.is_recently as i64,
                draft.comment,
                song_id
            ],
        )
        .sql_context("update_song")?;
        tx.execute("DELETE FROM songs_genres WHERE id_song = ?1", params![song_id])
            .sql_context("update_song")?;
        link_genres(&tx, song_id, &draft.genres, "update_song")?;

        tx.commit().sql_context("update_song")?;
        info!(from = original_title, to = %draft.title, "updated song");
        Ok(())
    }

    /// Flip the "performed recently" flag for one song.
    pub fn set_recently(&self, title: &str, recently: bool) -> Result<()> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE songs SET is_recently = ?1 WHERE title = ?2",
                params![recently as i64, title],
            )
            .sql_context("set_recently")?;
        if updated == 0 {
            return Err(Error::not_found(Entity::Song, title));
        }
        debug!(title, recently, "updated recency flag");
        Ok(())
    }

    /// Delete songs by title in one transaction; genre links cascade. Unknown
    /// titles are skipped.
    pub fn delete_songs<S: AsRef<str>>(&self, titles: &[S]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().sql_context("delete_songs")?;
        let mut deleted = 0;
        {
            let mut stmt = tx
                .prepare("DELETE FROM songs WHERE title = ?1")
                .sql_context("delete_songs")?;
            for title in titles {
                deleted += stmt
                    .execute(params![title.as_ref()])
                    .sql_context("delete_songs")?;
            }
        }
        tx.commit().sql_context("delete_songs")?;
        info!(requested = titles.len(), deleted, "deleted songs");
        Ok(deleted)
    }
}

fn song_id_in(conn: &rusqlite::Connection, title: &str, operation: &'static str) -> Result<i64> {
    use rusqlite::OptionalExtension;

    conn.query_row("SELECT id FROM songs WHERE title = ?1", params![title], |row| {
        row.get(0)
    })
    .optional()
    .sql_context(operation)?
    .ok_or_else(|| Error::not_found(Entity::Song, title))
}

fn link_genres(
    tx: &Transaction<'_>,
    song_id: i64,
    genres: &[String],
    operation: &'static str,
) -> Result<()> {
    let mut stmt = tx
        .prepare("INSERT OR IGNORE INTO songs_genres (id_song, id_genre) VALUES (?1, ?2)")
        .sql_context(operation)?;
    for genre in genres {
        let genre_id = GENRES.lookup_id(tx, genre, operation)?;
        stmt.execute(params![song_id, genre_id])
            .sql_context(operation)?;
    }
    Ok(())
}

fn validate(draft: &SongDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(Error::InvalidInput("song title is required"));
    }
    if draft.category.trim().is_empty() {
        return Err(Error::InvalidInput("song category is required"));
    }
    if draft.genres.is_empty() {
        return Err(Error::InvalidInput("a song needs at least one genre"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::db::connection::tests::temp_db;
    use crate::db::Database;
    use crate::models::SongDraft;

    fn seeded() -> (tempfile::TempDir, Database) {
        let (dir, db) = temp_db();
        db.insert_category("Rock").unwrap();
        db.insert_category("Folk").unwrap();
        for genre in ["Acoustic", "Ballad", "Electric"] {
            db.insert_genre(genre).unwrap();
        }
        (dir, db)
    }

    #[test]
    fn empty_schema_reads_as_empty_songbook() {
        let (_dir, db) = temp_db();
        assert!(db.load_songbook().unwrap().is_empty());
    }

    #[test]
    fn song_with_many_genres_appears_once() {
        let (_dir, db) = seeded();
        let draft = SongDraft {
            song_image: "img/song1.png".into(),
            song_text: "la la la".into(),
            last_performed: "01.02.2024".into(),
            is_recently: true,
            comment: "crowd favourite".into(),
            ..SongDraft::new("Song1", "Rock", ["Electric", "Acoustic", "Ballad"])
        };
        db.insert_song(&draft).unwrap();

        let book = db.load_songbook().unwrap();

        assert_eq!(book.len(), 1);
        let record = book.get("Song1").unwrap();
        assert_eq!(record.genres, vec!["Electric", "Acoustic", "Ballad"]);
        assert_eq!(record.category, "Rock");
        assert_eq!(record.song_image, "img/song1.png");
        assert_eq!(record.song_text, "la la la");
        assert_eq!(record.last_performed, "01.02.2024");
        assert!(record.is_recently);
        assert_eq!(record.comment, "crowd favourite");
    }

    #[test]
    fn insert_rolls_back_on_unknown_genre() {
        let (_dir, db) = seeded();
        let err = db
            .insert_song(&SongDraft::new("Song1", "Rock", ["Acoustic", "Polka"]))
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(db.song_id("Song1").unwrap_err().is_not_found());
    }

    #[test]
    fn insert_rejects_unknown_category_and_empty_genres() {
        let (_dir, db) = seeded();
        assert!(db
            .insert_song(&SongDraft::new("Song1", "Jazz", ["Acoustic"]))
            .unwrap_err()
            .is_not_found());
        let no_genres: [&str; 0] = [];
        assert!(matches!(
            db.insert_song(&SongDraft::new("Song1", "Rock", no_genres)),
            Err(crate::db::Error::InvalidInput(_))
        ));
    }

    #[test]
    fn duplicate_title_differing_in_case_is_rejected() {
        let (_dir, db) = seeded();
        db.insert_song(&SongDraft::new("Song1", "Rock", ["Acoustic"]))
            .unwrap();
        assert!(db
            .insert_song(&SongDraft::new("SONG1", "Folk", ["Ballad"]))
            .unwrap_err()
            .is_constraint_violation());
    }

    #[test]
    fn update_replaces_fields_and_links() {
        let (_dir, db) = seeded();
        db.insert_song(&SongDraft::new("Song1", "Rock", ["Acoustic", "Ballad"]))
            .unwrap();

        let draft = SongDraft {
            comment: "reworked".into(),
            ..SongDraft::new("Song One", "Folk", ["Electric"])
        };
        db.update_song("song1", &draft).unwrap();

        let book = db.load_songbook().unwrap();
        assert!(book.get("Song1").is_none());
        let record = book.get("Song One").unwrap();
        assert_eq!(record.category, "Folk");
        assert_eq!(record.genres, vec!["Electric"]);
        assert_eq!(record.comment, "reworked");
    }

    #[test]
    fn update_of_missing_song_is_not_found() {
        let (_dir, db) = seeded();
        assert!(db
            .update_song("Ghost", &SongDraft::new("Ghost", "Rock", ["Acoustic"]))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn recency_flag_round_trips() {
        let (_dir, db) = seeded();
        db.insert_song(&SongDraft::new("Song1", "Rock", ["Acoustic"]))
            .unwrap();

        db.set_recently("Song1", true).unwrap();
        assert!(db.load_songbook().unwrap().get("Song1").unwrap().is_recently);

        db.set_recently("Song1", false).unwrap();
        assert!(!db.load_songbook().unwrap().get("Song1").unwrap().is_recently);

        assert!(db.set_recently("Ghost", true).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_songs_removes_rows_and_links() {
        let (_dir, db) = seeded();
        db.insert_song(&SongDraft::new("Song1", "Rock", ["Acoustic"]))
            .unwrap();
        db.insert_song(&SongDraft::new("Song2", "Rock", ["Ballad"]))
            .unwrap();

        assert_eq!(db.delete_songs(&["Song1", "Ghost"]).unwrap(), 1);

        let links: i64 = db
            .connect()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM songs_genres", [], |row| row.get(0))
            .unwrap();
        assert_eq!(links, 1);
        assert_eq!(
            db.load_songbook().unwrap().titles().collect::<Vec<_>>(),
            vec!["Song2"]
        );
    }
}
