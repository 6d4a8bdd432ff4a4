use std::collections::BTreeSet;

use crate::models::{SongRecord, Songbook};

/// Which panel keyboard navigation applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Focus {
    Categories,
    Genres,
    Songs,
}

impl Focus {
    pub(crate) fn next(self) -> Self {
        match self {
            Focus::Categories => Focus::Genres,
            Focus::Genres => Focus::Songs,
            Focus::Songs => Focus::Categories,
        }
    }

    pub(crate) fn previous(self) -> Self {
        match self {
            Focus::Categories => Focus::Songs,
            Focus::Genres => Focus::Categories,
            Focus::Songs => Focus::Genres,
        }
    }
}

/// Clamp-move a cursor inside `len` items.
fn moved(selected: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (selected as isize + offset).clamp(0, len as isize - 1) as usize
}

/// Backing state for the category and genre lists. Marks let the user pick
/// several rows for a bulk delete; they are cleared on every repaint.
#[derive(Default)]
pub(crate) struct NamePanel {
    pub(crate) names: Vec<String>,
    pub(crate) selected: usize,
    pub(crate) marked: BTreeSet<String>,
}

impl NamePanel {
    pub(crate) fn set_names(&mut self, names: Vec<String>) {
        self.names = names;
        self.marked.clear();
        self.ensure_in_bounds();
    }

    pub(crate) fn current(&self) -> Option<&str> {
        self.names.get(self.selected).map(String::as_str)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = moved(self.selected, offset, self.names.len());
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.names.len().saturating_sub(1);
    }

    pub(crate) fn toggle_mark(&mut self) {
        if let Some(name) = self.names.get(self.selected).cloned() {
            if !self.marked.remove(&name) {
                self.marked.insert(name);
            }
        }
    }

    pub(crate) fn is_marked(&self, name: &str) -> bool {
        self.marked.contains(name)
    }

    pub(crate) fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Rows an action applies to: the marked rows in list order, or the
    /// cursor row when nothing is marked.
    pub(crate) fn targets(&self) -> Vec<String> {
        if self.marked.is_empty() {
            self.current().map(str::to_string).into_iter().collect()
        } else {
            self.names
                .iter()
                .filter(|name| self.marked.contains(*name))
                .cloned()
                .collect()
        }
    }

    /// Move the cursor onto `name` if it is listed.
    pub(crate) fn focus_name(&mut self, name: &str) {
        if let Some(idx) = self
            .names
            .iter()
            .position(|candidate| same_text(candidate, name))
        {
            self.selected = idx;
        }
    }

    fn ensure_in_bounds(&mut self) {
        if self.selected >= self.names.len() {
            self.selected = self.names.len().saturating_sub(1);
        }
    }
}

/// Wrapper around the loaded songbook with the search and recent-only
/// filters applied.
#[derive(Default)]
pub(crate) struct SongPanel {
    pub(crate) book: Songbook,
    pub(crate) visible: Vec<String>,
    pub(crate) filter: Option<String>,
    pub(crate) only_recent: bool,
    pub(crate) selected: usize,
}

impl SongPanel {
    pub(crate) fn set_songbook(&mut self, book: Songbook) {
        self.book = book;
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let query = self
            .filter
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        self.visible = self
            .book
            .iter()
            .filter(|(_, record)| !self.only_recent || record.is_recently)
            .filter(|(title, record)| match &query {
                Some(q) => matches_query(title, record, q),
                None => true,
            })
            .map(|(title, _)| title.clone())
            .collect();

        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }

    pub(crate) fn has_filter(&self) -> bool {
        self.filter
            .as_ref()
            .map(|q| !q.trim().is_empty())
            .unwrap_or(false)
    }

    pub(crate) fn toggle_only_recent(&mut self) -> bool {
        self.only_recent = !self.only_recent;
        self.apply_filter();
        self.only_recent
    }

    /// Number of songs matching the active search, zero when not searching.
    pub(crate) fn found(&self) -> usize {
        if self.has_filter() {
            self.visible.len()
        } else {
            0
        }
    }

    pub(crate) fn current(&self) -> Option<(&str, &SongRecord)> {
        let title = self.visible.get(self.selected)?;
        self.book.get(title).map(|record| (title.as_str(), record))
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = moved(self.selected, offset, self.visible.len());
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    pub(crate) fn focus_title(&mut self, title: &str) {
        if let Some(idx) = self
            .visible
            .iter()
            .position(|candidate| same_text(candidate, title))
        {
            self.selected = idx;
        }
    }
}

/// Equality ignoring case, for any script.
fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn matches_query(title: &str, record: &SongRecord, query: &str) -> bool {
    title.to_lowercase().contains(query)
        || record.category.to_lowercase().contains(query)
        || record.comment.to_lowercase().contains(query)
        || record
            .genres
            .iter()
            .any(|genre| genre.to_lowercase().contains(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn book() -> Songbook {
        let mut book = Songbook::new();
        let mut add = |title: &str, genre: &str, category: &str, recent: bool| {
            book.absorb_row(
                title.to_string(),
                Some(genre.to_string()),
                SongRecord {
                    category: category.to_string(),
                    is_recently: recent,
                    ..SongRecord::default()
                },
            );
        };
        add("Alpha", "Blues", "Covers", false);
        add("Bravo", "Acoustic", "Originals", true);
        add("Charlie", "Acoustic", "Covers", false);
        book
    }

    #[test]
    fn targets_prefer_marks_in_list_order() {
        let mut panel = NamePanel::default();
        panel.set_names(names(&["Ballads", "Covers", "Originals"]));
        assert_eq!(panel.targets(), vec!["Ballads"]);

        panel.select_last();
        panel.toggle_mark();
        panel.select_first();
        panel.toggle_mark();
        panel.move_selection(1);

        assert_eq!(panel.targets(), vec!["Ballads", "Originals"]);
        assert_eq!(panel.marked_count(), 2);
    }

    #[test]
    fn repaint_clears_marks_and_clamps_cursor() {
        let mut panel = NamePanel::default();
        panel.set_names(names(&["a", "b", "c"]));
        panel.select_last();
        panel.toggle_mark();

        panel.set_names(names(&["a"]));

        assert_eq!(panel.marked_count(), 0);
        assert_eq!(panel.current(), Some("a"));
    }

    #[test]
    fn focus_matches_cyrillic_names_in_any_case() {
        let mut panel = NamePanel::default();
        panel.set_names(names(&["Бард", "Романс", "Рок"]));

        panel.focus_name("РОК");

        assert_eq!(panel.current(), Some("Рок"));
    }

    #[test]
    fn empty_panel_has_no_targets() {
        let mut panel = NamePanel::default();
        panel.set_names(Vec::new());
        panel.move_selection(3);
        assert!(panel.targets().is_empty());
        assert!(panel.current().is_none());
    }

    #[test]
    fn search_matches_title_genre_and_category() {
        let mut panel = SongPanel::default();
        panel.set_songbook(book());
        assert_eq!(panel.found(), 0);

        panel.set_filter(Some("acou".into()));
        assert_eq!(panel.visible, vec!["Bravo", "Charlie"]);
        assert_eq!(panel.found(), 2);

        panel.set_filter(Some("covers".into()));
        assert_eq!(panel.visible, vec!["Alpha", "Charlie"]);

        panel.set_filter(None);
        assert_eq!(panel.visible.len(), 3);
    }

    #[test]
    fn recent_filter_combines_with_search() {
        let mut panel = SongPanel::default();
        panel.set_songbook(book());
        panel.select_last();

        assert!(panel.toggle_only_recent());
        assert_eq!(panel.visible, vec!["Bravo"]);
        assert_eq!(panel.current().map(|(title, _)| title), Some("Bravo"));

        panel.set_filter(Some("blues".into()));
        assert!(panel.visible.is_empty());
        assert!(panel.current().is_none());
    }
}
