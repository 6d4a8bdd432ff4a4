use tracing::info;

use super::connection::Database;
use super::error::Result;
use super::names::CATEGORIES;

impl Database {
    /// Every category name, ordered case-insensitively for the list panel.
    pub fn categories(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        CATEGORIES.fetch_all(&conn, "fetch_categories")
    }

    /// Insert one category. Duplicates (ignoring case) are rejected by the
    /// unique index and surface as `ConstraintViolation`.
    pub fn insert_category(&self, name: &str) -> Result<()> {
        let conn = self.connect()?;
        CATEGORIES.insert(&conn, name, "insert_category")?;
        info!(category = name, "inserted category");
        Ok(())
    }

    /// Resolve a category name to its row id.
    pub fn category_id(&self, name: &str) -> Result<i64> {
        let conn = self.connect()?;
        CATEGORIES.lookup_id(&conn, name, "category_id")
    }

    pub fn rename_category(&self, old: &str, new: &str) -> Result<()> {
        let conn = self.connect()?;
        CATEGORIES.rename(&conn, old, new, "rename_category")?;
        info!(from = old, to = new, "renamed category");
        Ok(())
    }

    /// Delete categories by name. Songs filed under them go too, courtesy of
    /// `ON DELETE CASCADE`.
    pub fn delete_categories<S: AsRef<str>>(&self, names: &[S]) -> Result<usize> {
        let mut conn = self.connect()?;
        let deleted = CATEGORIES.delete_many(&mut conn, names, "delete_categories")?;
        info!(requested = names.len(), deleted, "deleted categories");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::connection::tests::temp_db;
    use crate::models::SongDraft;

    #[test]
    fn categories_are_listed_case_insensitively() {
        let (_dir, db) = temp_db();
        for name in ["wedding", "Ballads", "Covers"] {
            db.insert_category(name).unwrap();
        }
        assert_eq!(db.categories().unwrap(), vec!["Ballads", "Covers", "wedding"]);
    }

    #[test]
    fn case_variant_duplicate_is_rejected() {
        let (_dir, db) = temp_db();
        db.insert_category("Rock").unwrap();

        let err = db.insert_category("rOCK").unwrap_err();

        assert!(err.is_constraint_violation(), "unexpected error: {err:?}");
        assert_eq!(db.categories().unwrap(), vec!["Rock"]);
    }

    #[test]
    fn cyrillic_case_variant_is_rejected_and_found() {
        let (_dir, db) = temp_db();
        db.insert_category("Рок").unwrap();

        let err = db.insert_category("РОК").unwrap_err();

        assert!(err.is_constraint_violation(), "unexpected error: {err:?}");
        assert_eq!(db.categories().unwrap(), vec!["Рок"]);
        assert_eq!(db.category_id("рок").unwrap(), db.category_id("Рок").unwrap());
    }

    #[test]
    fn non_ascii_names_sort_ignoring_case() {
        let (_dir, db) = temp_db();
        for name in ["романс", "Бард", "Авторская"] {
            db.insert_category(name).unwrap();
        }
        assert_eq!(db.categories().unwrap(), vec!["Авторская", "Бард", "романс"]);
    }

    #[test]
    fn missing_category_lookup_is_not_found() {
        let (_dir, db) = temp_db();
        assert!(db.category_id("Jazz").unwrap_err().is_not_found());
    }

    #[test]
    fn lookup_ignores_case() {
        let (_dir, db) = temp_db();
        db.insert_category("Rock").unwrap();
        assert_eq!(db.category_id("ROCK").unwrap(), db.category_id("Rock").unwrap());
    }

    #[test]
    fn rename_keeps_songs_attached() {
        let (_dir, db) = temp_db();
        db.insert_category("Rock").unwrap();
        db.insert_genre("Acoustic").unwrap();
        db.insert_song(&SongDraft::new("Song1", "Rock", ["Acoustic"]))
            .unwrap();

        db.rename_category("Rock", "Classic Rock").unwrap();

        let book = db.load_songbook().unwrap();
        assert_eq!(book.get("Song1").unwrap().category, "Classic Rock");
    }

    #[test]
    fn rename_errors() {
        let (_dir, db) = temp_db();
        db.insert_category("Rock").unwrap();
        db.insert_category("Pop").unwrap();

        assert!(db.rename_category("Jazz", "Blues").unwrap_err().is_not_found());
        assert!(db
            .rename_category("Pop", "ROCK")
            .unwrap_err()
            .is_constraint_violation());
    }

    #[test]
    fn deleting_a_category_cascades_to_its_songs() {
        let (_dir, db) = temp_db();
        db.insert_category("Rock").unwrap();
        db.insert_category("Folk").unwrap();
        db.insert_genre("Acoustic").unwrap();
        db.insert_song(&SongDraft::new("Song1", "Rock", ["Acoustic"]))
            .unwrap();
        db.insert_song(&SongDraft::new("Song2", "Folk", ["Acoustic"]))
            .unwrap();

        let deleted = db.delete_categories(&["Rock", "Missing"]).unwrap();

        assert_eq!(deleted, 1);
        assert!(db.song_id("Song1").unwrap_err().is_not_found());
        let book = db.load_songbook().unwrap();
        assert_eq!(book.titles().collect::<Vec<_>>(), vec!["Song2"]);
    }
}
