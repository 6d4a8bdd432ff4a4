use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::SongDraft;

/// The two single-name entities. They share one form and one panel type, so
/// this enum carries the wording that differs between them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum NameKind {
    Category,
    Genre,
}

impl NameKind {
    pub(crate) fn singular(self) -> &'static str {
        match self {
            NameKind::Category => "category",
            NameKind::Genre => "genre",
        }
    }

    pub(crate) fn plural(self) -> &'static str {
        match self {
            NameKind::Category => "categories",
            NameKind::Genre => "genres",
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            NameKind::Category => "Category",
            NameKind::Genre => "Genre",
        }
    }
}

/// Single-field form used to add or rename a category or genre.
#[derive(Default, Clone)]
pub(crate) struct NameForm {
    pub(crate) value: String,
    pub(crate) error: Option<String>,
}

impl NameForm {
    /// Prefill with the current name when editing.
    pub(crate) fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    pub(crate) fn parse_input(&self, kind: NameKind) -> Result<String> {
        let value = self.value.trim();
        if value.is_empty() {
            return Err(anyhow!("{} name is required.", kind.title()));
        }
        Ok(value.to_string())
    }

    pub(crate) fn build_line(&self, field_name: &str) -> Line<'static> {
        let display = if self.value.is_empty() {
            "<required>".to_string()
        } else {
            self.value.clone()
        };
        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, Style::default().fg(Color::Yellow)),
        ])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.value.chars().count()
    }
}

/// Fields of the song form, in tab order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum SongField {
    #[default]
    Title,
    Category,
    Genres,
    LastPerformed,
    Recently,
    Image,
    Comment,
    Lyrics,
}

impl SongField {
    pub(crate) const ALL: [SongField; 8] = [
        SongField::Title,
        SongField::Category,
        SongField::Genres,
        SongField::LastPerformed,
        SongField::Recently,
        SongField::Image,
        SongField::Comment,
        SongField::Lyrics,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            SongField::Title => "Title",
            SongField::Category => "Category",
            SongField::Genres => "Genres",
            SongField::LastPerformed => "Last performed",
            SongField::Recently => "Recently",
            SongField::Image => "Image",
            SongField::Comment => "Comment",
            SongField::Lyrics => "Lyrics",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|field| *field == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Form state for song creation/editing, including category autocomplete.
#[derive(Default, Clone)]
pub(crate) struct SongForm {
    pub(crate) title: String,
    pub(crate) category: String,
    /// Comma-separated genre names.
    pub(crate) genres: String,
    pub(crate) last_performed: String,
    pub(crate) is_recently: bool,
    pub(crate) song_image: String,
    pub(crate) comment: String,
    pub(crate) song_text: String,
    pub(crate) active: SongField,
    pub(crate) error: Option<String>,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

impl SongForm {
    pub(crate) fn from_draft(draft: &SongDraft) -> Self {
        Self {
            title: draft.title.clone(),
            category: draft.category.clone(),
            genres: draft.genres.join(", "),
            last_performed: draft.last_performed.clone(),
            is_recently: draft.is_recently,
            song_image: draft.song_image.clone(),
            comment: draft.comment.clone(),
            song_text: draft.song_text.clone(),
            ..Self::default()
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
        self.clear_suggestion();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
        self.clear_suggestion();
    }

    fn active_text_mut(&mut self) -> Option<&mut String> {
        match self.active {
            SongField::Title => Some(&mut self.title),
            SongField::Category => Some(&mut self.category),
            SongField::Genres => Some(&mut self.genres),
            SongField::LastPerformed => Some(&mut self.last_performed),
            SongField::Recently => None,
            SongField::Image => Some(&mut self.song_image),
            SongField::Comment => Some(&mut self.comment),
            SongField::Lyrics => Some(&mut self.song_text),
        }
    }

    /// Insert a character into the active field. The recency field is a
    /// checkbox: space toggles it, `y`/`n` set it.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active == SongField::Recently {
            match ch {
                ' ' => self.is_recently = !self.is_recently,
                'y' | 'Y' => self.is_recently = true,
                'n' | 'N' => self.is_recently = false,
                _ => return false,
            }
            return true;
        }
        if self.active == SongField::Category {
            self.autocomplete_disabled = false;
        }
        match self.active_text_mut() {
            Some(text) => {
                text.push(ch);
                true
            }
            None => false,
        }
    }

    /// Lyrics are the only multi-line field.
    pub(crate) fn push_newline(&mut self) -> bool {
        if self.active == SongField::Lyrics {
            self.song_text.push('\n');
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        if self.active == SongField::Category {
            self.autocomplete_disabled = false;
        }
        if let Some(text) = self.active_text_mut() {
            text.pop();
        }
    }

    /// Validate and normalize the inputs into a draft for the database.
    pub(crate) fn parse_inputs(&self) -> Result<SongDraft> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Song title is required."));
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(anyhow!("Song category is required."));
        }
        let genres: Vec<String> = self
            .genres
            .split(',')
            .map(str::trim)
            .filter(|genre| !genre.is_empty())
            .map(str::to_string)
            .collect();
        if genres.is_empty() {
            return Err(anyhow!("At least one genre is required."));
        }

        Ok(SongDraft {
            title: title.to_string(),
            category: category.to_string(),
            genres,
            song_image: self.song_image.trim().to_string(),
            song_text: self.song_text.clone(),
            last_performed: self.last_performed.trim().to_string(),
            is_recently: self.is_recently,
            comment: self.comment.trim().to_string(),
        })
    }

    /// Update the category autocomplete suggestion based on current input.
    pub(crate) fn update_suggestion(&mut self, categories: &[String]) {
        if self.active != SongField::Category
            || self.autocomplete_disabled
            || self.category.is_empty()
        {
            self.clear_suggestion();
            return;
        }

        let current_lower = self.category.to_lowercase();
        self.suggestion = categories
            .iter()
            .find(|candidate| candidate.to_lowercase().starts_with(&current_lower))
            .filter(|candidate| candidate.to_lowercase() != current_lower)
            .cloned();
    }

    /// Apply the suggested category. Returns whether anything changed so Tab
    /// can fall through to field switching.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        if self.suggestion_suffix().is_none() {
            return false;
        }
        match self.suggestion.take() {
            Some(candidate) => {
                self.category = candidate;
                self.autocomplete_disabled = true;
                true
            }
            None => false,
        }
    }

    /// Dismiss the suggestion for the rest of this edit.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.has_active_suggestion() {
            self.autocomplete_disabled = true;
            self.suggestion = None;
            return true;
        }
        false
    }

    fn clear_suggestion(&mut self) {
        self.suggestion = None;
    }

    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let suffix: String = candidate.chars().skip(self.category.chars().count()).collect();
        if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        }
    }

    pub(crate) fn has_active_suggestion(&self) -> bool {
        self.active == SongField::Category && self.suggestion.is_some()
    }

    /// Render one form row. Lyrics collapse to their last line plus a line
    /// count so the popup keeps a fixed height.
    pub(crate) fn build_line(&self, field: SongField) -> Line<'static> {
        let is_active = self.active == field;
        let (value, placeholder) = match field {
            SongField::Title => (self.title.clone(), "<required>"),
            SongField::Category => (self.category.clone(), "<required>"),
            SongField::Genres => (self.genres.clone(), "<required, comma separated>"),
            SongField::LastPerformed => (self.last_performed.clone(), "<optional>"),
            SongField::Recently => {
                let mark = if self.is_recently { "[x]" } else { "[ ]" };
                (mark.to_string(), "")
            }
            SongField::Image => (self.song_image.clone(), "<optional>"),
            SongField::Comment => (self.comment.clone(), "<optional>"),
            SongField::Lyrics => (self.lyrics_preview(), "<optional, Ctrl-N for new line>"),
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value
        };

        let mut spans = vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ];
        if field == SongField::Category && is_active {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }
        Line::from(spans)
    }

    fn lyrics_preview(&self) -> String {
        let lines = self.song_text.split('\n').count();
        let last = self.song_text.rsplit('\n').next().unwrap_or_default();
        if lines > 1 {
            format!("(+{} lines) {last}", lines - 1)
        } else {
            last.to_string()
        }
    }

    /// Cursor column offset of the active field's value.
    pub(crate) fn cursor_offset(&self) -> usize {
        let prefix = self.active.label().chars().count() + 2;
        let value = match self.active {
            SongField::Recently => 1,
            SongField::Lyrics => self.lyrics_preview().chars().count(),
            SongField::Title => self.title.chars().count(),
            SongField::Category => self.category.chars().count(),
            SongField::Genres => self.genres.chars().count(),
            SongField::LastPerformed => self.last_performed.chars().count(),
            SongField::Image => self.song_image.chars().count(),
            SongField::Comment => self.comment.chars().count(),
        };
        prefix + value
    }

    pub(crate) fn active_row(&self) -> usize {
        self.active.index()
    }
}

/// What a pending Y/N confirmation will delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DeleteTarget {
    Names(NameKind),
    Songs,
    Everything,
}

#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) target: DeleteTarget,
    pub(crate) names: Vec<String>,
}

impl ConfirmDelete {
    pub(crate) fn lines(&self) -> Vec<String> {
        match &self.target {
            DeleteTarget::Names(NameKind::Category) => vec![
                format!("Delete {}?", quoted_list(&self.names)),
                "Every song filed under these categories is deleted too.".to_string(),
            ],
            DeleteTarget::Names(NameKind::Genre) => vec![
                format!("Delete {}?", quoted_list(&self.names)),
                "Songs keep their other genres; this cannot be undone.".to_string(),
            ],
            DeleteTarget::Songs => vec![
                format!("Delete {} permanently?", quoted_list(&self.names)),
                "Lyrics and notes for it are lost.".to_string(),
            ],
            DeleteTarget::Everything => vec![
                "Delete every category and genre?".to_string(),
                "This empties the whole songbook.".to_string(),
            ],
        }
    }
}

fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
