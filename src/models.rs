//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. They stay plain data holders so persistence and presentation can each
//! own their logic.

use std::collections::btree_map::{self, BTreeMap};

/// Everything known about one song apart from its title, which is the key of
/// the [`Songbook`] map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongRecord {
    /// Genre names in the order the links were created. Not de-duplicated.
    pub genres: Vec<String>,
    pub category: String,
    /// Path to a cover or sheet image, kept as raw text.
    pub song_image: String,
    /// Lyrics shown in the side pane.
    pub song_text: String,
    /// Free-form date string; the database does not interpret it.
    pub last_performed: String,
    pub is_recently: bool,
    pub comment: String,
}

/// All songs keyed by title. Iteration is lexicographic by title, which is
/// the order the song panel uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Songbook {
    songs: BTreeMap<String, SongRecord>,
}

impl Songbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one joined row into the map. The first row for a title creates the
    /// record; later rows append their genre and overwrite the scalar fields,
    /// which are identical across a song's rows. A row without a genre still
    /// creates the record.
    pub(crate) fn absorb_row(&mut self, title: String, genre: Option<String>, row: SongRecord) {
        let entry = self.songs.entry(title).or_default();
        entry.genres.extend(genre);
        entry.category = row.category;
        entry.song_image = row.song_image;
        entry.song_text = row.song_text;
        entry.last_performed = row.last_performed;
        entry.is_recently = row.is_recently;
        entry.comment = row.comment;
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&SongRecord> {
        self.songs.get(title)
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.songs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, SongRecord> {
        self.songs.iter()
    }
}

impl IntoIterator for Songbook {
    type Item = (String, SongRecord);
    type IntoIter = btree_map::IntoIter<String, SongRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.songs.into_iter()
    }
}

/// Input for creating or rewriting a song. Category and genres are referenced
/// by name and resolved to ids inside the write transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongDraft {
    pub title: String,
    pub category: String,
    pub genres: Vec<String>,
    pub song_image: String,
    pub song_text: String,
    pub last_performed: String,
    pub is_recently: bool,
    pub comment: String,
}

impl SongDraft {
    /// Draft with the required fields set and the rest empty.
    pub fn new<I, S>(title: &str, category: &str, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.to_string(),
            category: category.to_string(),
            genres: genres.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Prefill an edit form from a stored record.
    pub fn from_record(title: &str, record: &SongRecord) -> Self {
        Self {
            title: title.to_string(),
            category: record.category.clone(),
            genres: record.genres.clone(),
            song_image: record.song_image.clone(),
            song_text: record.song_text.clone(),
            last_performed: record.last_performed.clone(),
            is_recently: record.is_recently,
            comment: record.comment.clone(),
        }
    }
}
