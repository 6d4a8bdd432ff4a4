use std::collections::VecDeque;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::db::Database;
use crate::models::SongDraft;

use super::forms::{ConfirmDelete, DeleteTarget, NameForm, NameKind, SongField, SongForm};
use super::helpers::{centered_rect, describe_db_error, song_row_lines, surface_error};
use super::screens::{Focus, NamePanel, SongPanel};

/// Footer space: a border, the status line, the counters and the key hints.
const FOOTER_HEIGHT: u16 = 4;

/// Fine-grained modes layered over the three-panel main view.
enum Mode {
    Normal,
    AddingName {
        kind: NameKind,
        form: NameForm,
    },
    EditingName {
        kind: NameKind,
        original: String,
        form: NameForm,
    },
    CreatingSong(SongForm),
    EditingSong {
        original: String,
        form: SongForm,
    },
    ConfirmDelete(ConfirmDelete),
    Searching(SearchState),
}

/// State for an active inline search over the song list.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Blocking message box. While any alert is queued it swallows input until
/// dismissed.
struct Alert {
    title: String,
    message: String,
    severity: Severity,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Severity {
    Info,
    Critical,
}

/// Central application state shared across the TUI.
pub struct App {
    db: Database,
    categories: NamePanel,
    genres: NamePanel,
    songs: SongPanel,
    focus: Focus,
    mode: Mode,
    status: Option<StatusMessage>,
    alerts: VecDeque<Alert>,
    saved_search: Option<SearchState>,
}

impl App {
    /// Build the app and paint all three lists from the database.
    pub fn new(db: Database) -> Self {
        let mut app = Self {
            db,
            categories: NamePanel::default(),
            genres: NamePanel::default(),
            songs: SongPanel::default(),
            focus: Focus::Songs,
            mode: Mode::Normal,
            status: None,
            alerts: VecDeque::new(),
            saved_search: None,
        };
        app.refresh_all();
        app
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if !self.alerts.is_empty() {
            if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.alerts.pop_front();
            }
            return Ok(false);
        }

        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingName { kind, form } => self.handle_name_form(code, kind, None, form)?,
            Mode::EditingName {
                kind,
                original,
                form,
            } => self.handle_name_form(code, kind, Some(original), form)?,
            Mode::CreatingSong(form) => self.handle_song_form(code, None, form)?,
            Mode::EditingSong { original, form } => {
                self.handle_song_form(code, Some(original), form)?
            }
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.songs.has_filter() {
                    self.songs.set_filter(None);
                    self.clear_status();
                } else {
                    *exit = true;
                }
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Home => match self.focus {
                Focus::Categories => self.categories.select_first(),
                Focus::Genres => self.genres.select_first(),
                Focus::Songs => self.songs.select_first(),
            },
            KeyCode::End => match self.focus {
                Focus::Categories => self.categories.select_last(),
                Focus::Genres => self.genres.select_last(),
                Focus::Songs => self.songs.select_last(),
            },
            KeyCode::Char(' ') => match self.focus {
                Focus::Categories => self.categories.toggle_mark(),
                Focus::Genres => self.genres.toggle_mark(),
                Focus::Songs => self.toggle_recently(),
            },
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.refresh_all();
                self.set_status("Reloaded from the database.", StatusKind::Info);
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.focus = Focus::Songs;
                self.clear_status();
                return Ok(Mode::Searching(SearchState {
                    query: self.songs.filter.clone().unwrap_or_default(),
                }));
            }
            KeyCode::Enter => {
                if self.focus == Focus::Songs {
                    self.open_song_image();
                }
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(match self.focus {
                    Focus::Categories => Mode::AddingName {
                        kind: NameKind::Category,
                        form: NameForm::default(),
                    },
                    Focus::Genres => Mode::AddingName {
                        kind: NameKind::Genre,
                        form: NameForm::default(),
                    },
                    Focus::Songs => Mode::CreatingSong(SongForm::default()),
                });
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.clear_status();
                return Ok(self.begin_edit());
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                self.clear_status();
                return Ok(self.begin_delete());
            }
            KeyCode::Char('X') => {
                self.clear_status();
                return Ok(Mode::ConfirmDelete(ConfirmDelete {
                    target: DeleteTarget::Everything,
                    names: Vec::new(),
                }));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn name_panel(&self, kind: NameKind) -> &NamePanel {
        match kind {
            NameKind::Category => &self.categories,
            NameKind::Genre => &self.genres,
        }
    }

    fn focused_kind(&self) -> Option<NameKind> {
        match self.focus {
            Focus::Categories => Some(NameKind::Category),
            Focus::Genres => Some(NameKind::Genre),
            Focus::Songs => None,
        }
    }

    fn begin_edit(&mut self) -> Mode {
        if let Some(kind) = self.focused_kind() {
            let panel = self.name_panel(kind);
            if panel.marked_count() > 1 {
                self.set_status(
                    format!(
                        "You cannot edit several {} at once. Select one {}.",
                        kind.plural(),
                        kind.singular()
                    ),
                    StatusKind::Error,
                );
                return Mode::Normal;
            }
            match panel.targets().into_iter().next() {
                Some(original) => Mode::EditingName {
                    kind,
                    form: NameForm::with_value(&original),
                    original,
                },
                None => {
                    self.set_status(
                        format!("Nothing to edit. The {} list is empty.", kind.singular()),
                        StatusKind::Error,
                    );
                    Mode::Normal
                }
            }
        } else {
            self.edit_current_song()
        }
    }

    fn edit_current_song(&mut self) -> Mode {
        match self.songs.current() {
            Some((title, record)) => Mode::EditingSong {
                original: title.to_string(),
                form: SongForm::from_draft(&SongDraft::from_record(title, record)),
            },
            None => {
                self.set_status("No song selected to edit.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn begin_delete(&mut self) -> Mode {
        if let Some(kind) = self.focused_kind() {
            let names = self.name_panel(kind).targets();
            if names.is_empty() {
                self.set_status(
                    format!("Nothing to delete. The {} list is empty.", kind.singular()),
                    StatusKind::Error,
                );
                return Mode::Normal;
            }
            Mode::ConfirmDelete(ConfirmDelete {
                target: DeleteTarget::Names(kind),
                names,
            })
        } else {
            match self.songs.current() {
                Some((title, _)) => Mode::ConfirmDelete(ConfirmDelete {
                    target: DeleteTarget::Songs,
                    names: vec![title.to_string()],
                }),
                None => {
                    self.set_status("No song selected to delete.", StatusKind::Error);
                    Mode::Normal
                }
            }
        }
    }

    fn handle_name_form(
        &mut self,
        code: KeyCode,
        kind: NameKind,
        original: Option<String>,
        mut form: NameForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_name(kind, original.as_deref(), &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if !keep_open {
            return Ok(Mode::Normal);
        }
        Ok(match original {
            Some(original) => Mode::EditingName {
                kind,
                original,
                form,
            },
            None => Mode::AddingName { kind, form },
        })
    }

    fn save_name(&mut self, kind: NameKind, original: Option<&str>, form: &NameForm) -> Result<()> {
        let name = form.parse_input(kind)?;
        let subject = format!("{} '{name}'", kind.title());
        let outcome = match (kind, original) {
            (NameKind::Category, None) => self.db.insert_category(&name),
            (NameKind::Genre, None) => self.db.insert_genre(&name),
            (NameKind::Category, Some(old)) => self.db.rename_category(old, &name),
            (NameKind::Genre, Some(old)) => self.db.rename_genre(old, &name),
        };
        if let Err(err) = outcome {
            warn!(error = %err, "failed to save {}", kind.singular());
            return Err(describe_db_error(&err, &subject));
        }

        match kind {
            NameKind::Category => {
                self.refresh_categories();
                self.categories.focus_name(&name);
            }
            NameKind::Genre => {
                self.refresh_genres();
                self.genres.focus_name(&name);
            }
        }
        let verb = if original.is_some() {
            // Renames show up in every song row.
            self.refresh_songs();
            "Renamed"
        } else {
            "Added"
        };
        self.set_status(format!("{verb} {} '{name}'.", kind.singular()), StatusKind::Info);
        Ok(())
    }

    fn handle_song_form(
        &mut self,
        code: KeyCode,
        original: Option<String>,
        mut form: SongForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                if !form.cancel_autocomplete() {
                    self.set_status("Cancelled.", StatusKind::Info);
                    keep_open = false;
                }
            }
            KeyCode::Tab => {
                let consumed = form.has_active_suggestion() && form.accept_suggestion();
                if !consumed {
                    form.next_field();
                }
                form.update_suggestion(&self.categories.names);
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                form.update_suggestion(&self.categories.names);
            }
            KeyCode::Down => {
                form.next_field();
                form.update_suggestion(&self.categories.names);
            }
            KeyCode::Backspace => {
                form.backspace();
                form.update_suggestion(&self.categories.names);
            }
            KeyCode::Enter => match self.save_song(original.as_deref(), &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                    form.update_suggestion(&self.categories.names);
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(match original {
                Some(original) => Mode::EditingSong { original, form },
                None => Mode::CreatingSong(form),
            })
        } else if let Some(state) = self.saved_search.take() {
            Ok(Mode::Searching(state))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn save_song(&mut self, original: Option<&str>, form: &SongForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let subject = format!("Song '{}'", draft.title);
        let outcome = match original {
            None => self.db.insert_song(&draft),
            Some(old) => self.db.update_song(old, &draft),
        };
        if let Err(err) = outcome {
            warn!(error = %err, title = %draft.title, "failed to save song");
            return Err(describe_db_error(&err, &subject));
        }

        self.refresh_all();
        self.songs.focus_title(&draft.title);
        let verb = if original.is_some() { "Updated" } else { "Added" };
        self.set_status(format!("{verb} song '{}'.", draft.title), StatusKind::Info);
        Ok(())
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.perform_delete(&confirm);
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    /// Run the confirmed delete. The panels are repainted from the database
    /// only after the call succeeds; on failure they keep showing what was
    /// loaded last.
    fn perform_delete(&mut self, confirm: &ConfirmDelete) {
        let outcome = match &confirm.target {
            DeleteTarget::Names(NameKind::Category) => {
                self.db.delete_categories(&confirm.names).map(|_| ())
            }
            DeleteTarget::Names(NameKind::Genre) => {
                self.db.delete_genres(&confirm.names).map(|_| ())
            }
            DeleteTarget::Songs => self.db.delete_songs(&confirm.names).map(|_| ()),
            DeleteTarget::Everything => self.db.clear(),
        };

        if let Err(err) = outcome {
            warn!(error = %err, "delete failed");
            self.set_status(
                surface_error(&describe_db_error(&err, "Entry")),
                StatusKind::Error,
            );
            self.push_alert(
                "Opening database",
                "Error accessing the database. Nothing was deleted.",
                Severity::Critical,
            );
            return;
        }

        let message = match &confirm.target {
            DeleteTarget::Names(kind) => {
                match kind {
                    NameKind::Category => self.refresh_categories(),
                    NameKind::Genre => self.refresh_genres(),
                }
                self.refresh_songs();
                format!("Deleted {} {}.", confirm.names.len(), counted(kind, confirm.names.len()))
            }
            DeleteTarget::Songs => {
                self.refresh_songs();
                format!("Deleted song '{}'.", confirm.names.join("', '"))
            }
            DeleteTarget::Everything => {
                self.refresh_all();
                "Songbook cleared.".to_string()
            }
        };
        self.set_status(message, StatusKind::Info);
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.songs.set_filter(None);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => return Ok(Mode::Normal),
            KeyCode::Up => self.songs.move_selection(-1),
            KeyCode::Down => self.songs.move_selection(1),
            KeyCode::PageUp => self.songs.move_selection(-5),
            KeyCode::PageDown => self.songs.move_selection(5),
            KeyCode::Home => self.songs.select_first(),
            KeyCode::End => self.songs.select_last(),
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }

        if state.query.trim().is_empty() {
            self.songs.set_filter(None);
        } else {
            self.songs.set_filter(Some(state.query.clone()));
        }
        Ok(Mode::Searching(state))
    }

    /// Ctrl-E while searching: edit the highlighted song, then come back to
    /// the search.
    pub(crate) fn handle_ctrl_e(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Searching(_)) || !self.alerts.is_empty() {
            return Ok(());
        }

        let previous = mem::replace(&mut self.mode, Mode::Normal);
        if let Mode::Searching(state) = previous {
            self.saved_search = Some(state);
        }
        self.mode = self.edit_current_song();
        if matches!(self.mode, Mode::Normal) {
            self.mode = self
                .saved_search
                .take()
                .map(Mode::Searching)
                .unwrap_or(Mode::Normal);
        }
        Ok(())
    }

    /// Ctrl-L: show only recently performed songs, or everything again.
    pub(crate) fn handle_ctrl_l(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Normal | Mode::Searching(_)) {
            return Ok(());
        }
        let message = if self.songs.toggle_only_recent() {
            "Showing recently performed songs."
        } else {
            "Showing all songs."
        };
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    /// Ctrl-N: line break in the lyrics field of the song form.
    pub(crate) fn handle_ctrl_n(&mut self) -> Result<()> {
        if let Mode::CreatingSong(form) | Mode::EditingSong { form, .. } = &mut self.mode {
            form.push_newline();
        }
        Ok(())
    }

    fn toggle_recently(&mut self) {
        let Some((title, record)) = self.songs.current() else {
            return;
        };
        let title = title.to_string();
        let flag = !record.is_recently;
        match self.db.set_recently(&title, flag) {
            Ok(()) => {
                self.refresh_songs();
                self.songs.focus_title(&title);
            }
            Err(err) => {
                warn!(error = %err, "failed to update recency flag");
                self.set_status(
                    surface_error(&describe_db_error(&err, "Song")),
                    StatusKind::Error,
                );
                self.push_alert(
                    "Opening database",
                    "Error writing to the database. The song was not changed.",
                    Severity::Critical,
                );
            }
        }
    }

    fn open_song_image(&mut self) {
        let Some((title, record)) = self.songs.current() else {
            return;
        };
        let image = record.song_image.trim().to_string();
        let title = title.to_string();
        if image.is_empty() {
            self.set_status("This song does not have an image.", StatusKind::Error);
        } else if let Err(err) = open_path(&image) {
            self.set_status(format!("Failed to open image: {err}"), StatusKind::Error);
        } else {
            self.set_status(format!("Opened image for '{title}'."), StatusKind::Info);
        }
    }

    fn move_selection(&mut self, offset: isize) {
        match self.focus {
            Focus::Categories => self.categories.move_selection(offset),
            Focus::Genres => self.genres.move_selection(offset),
            Focus::Songs => self.songs.move_selection(offset),
        }
    }

    fn refresh_all(&mut self) {
        self.refresh_genres();
        self.refresh_categories();
        self.refresh_songs();
    }

    fn refresh_categories(&mut self) {
        match self.db.categories() {
            Ok(names) => {
                if names.is_empty() {
                    self.push_alert(
                        "Fill in the category list",
                        "Your category list is empty.\nFocus Categories and press '+' to add one.",
                        Severity::Info,
                    );
                }
                self.categories.set_names(names);
            }
            Err(err) => {
                warn!(error = %err, "failed to read categories");
                self.push_alert(
                    "Opening database",
                    "Error reading categories from the database.",
                    Severity::Critical,
                );
            }
        }
    }

    fn refresh_genres(&mut self) {
        match self.db.genres() {
            Ok(names) => {
                if names.is_empty() {
                    self.push_alert(
                        "Fill in the genre list",
                        "Your genre list is empty.\nFocus Genres and press '+' to add one.",
                        Severity::Info,
                    );
                }
                self.genres.set_names(names);
            }
            Err(err) => {
                warn!(error = %err, "failed to read genres");
                self.push_alert(
                    "Opening database",
                    "Error reading genres from the database.",
                    Severity::Critical,
                );
            }
        }
    }

    fn refresh_songs(&mut self) {
        match self.db.load_songbook() {
            Ok(book) => {
                if book.is_empty() {
                    self.push_alert(
                        "Show all songs",
                        "Your songbook is empty.\nFocus Songs and press '+' to add one.",
                        Severity::Info,
                    );
                }
                self.songs.set_songbook(book);
            }
            Err(err) => {
                warn!(error = %err, "failed to read songbook");
                self.push_alert(
                    "Opening database",
                    "Error accessing the database.",
                    Severity::Critical,
                );
            }
        }
    }

    fn push_alert(&mut self, title: &str, message: &str, severity: Severity) {
        self.alerts.push_back(Alert {
            title: title.to_string(),
            message: message.to_string(),
            severity,
        });
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
            .split(area);
        let (content_area, footer_area) = (chunks[0], chunks[1]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(45),
                Constraint::Percentage(30),
            ])
            .split(content_area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[0]);

        self.draw_name_panel(frame, left[0], NameKind::Category);
        self.draw_name_panel(frame, left[1], NameKind::Genre);
        self.draw_song_panel(frame, columns[1]);
        self.draw_lyrics(frame, columns[2]);
        self.draw_footer(frame, footer_area);

        match &self.mode {
            Mode::AddingName { kind, form } => {
                self.draw_name_form(frame, area, &format!("Add {}", kind.title()), form)
            }
            Mode::EditingName { kind, form, .. } => {
                self.draw_name_form(frame, area, &format!("Edit {}", kind.title()), form)
            }
            Mode::CreatingSong(form) => self.draw_song_form(frame, area, "Add Song", form),
            Mode::EditingSong { form, .. } => self.draw_song_form(frame, area, "Edit Song", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm(frame, area, confirm),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }

        if let Some(alert) = self.alerts.front() {
            self.draw_alert(frame, area, alert);
        }
    }

    fn panel_block(&self, title: String, focus: Focus) -> Block<'static> {
        let block = Block::default().borders(Borders::ALL).title(title);
        if self.focus == focus {
            block.border_style(Style::default().fg(Color::Yellow))
        } else {
            block
        }
    }

    fn draw_name_panel(&self, frame: &mut Frame, area: Rect, kind: NameKind) {
        let (panel, focus) = match kind {
            NameKind::Category => (&self.categories, Focus::Categories),
            NameKind::Genre => (&self.genres, Focus::Genres),
        };
        let block = self.panel_block(format!("{} ({})", title_case(kind.plural()), panel.names.len()), focus);

        if panel.names.is_empty() {
            let message = Paragraph::new(format!("No {} yet. Press '+' to add one.", kind.plural()))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = panel
            .names
            .iter()
            .map(|name| {
                let mark = if panel.is_marked(name) { "[x] " } else { "[ ] " };
                ListItem::new(format!("{mark}{name}"))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(panel.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_song_panel(&self, frame: &mut Frame, area: Rect) {
        let mut title = format!("Songs ({})", self.songs.visible.len());
        if self.songs.only_recent {
            title.push_str(" • recent only");
        }
        if let Some(filter) = self.songs.filter.as_ref().filter(|_| self.songs.has_filter()) {
            title.push_str(&format!(" • search: {filter}"));
        }
        let block = self.panel_block(title, Focus::Songs);

        if self.songs.visible.is_empty() {
            let text = if self.songs.book.is_empty() {
                "Your songbook is empty. Press '+' to add a song."
            } else {
                "No songs match the current filters."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .songs
            .visible
            .iter()
            .filter_map(|title| self.songs.book.get(title).map(|record| (title, record)))
            .map(|(title, record)| {
                let mut lines: Vec<Line> = song_row_lines(title, record)
                    .into_iter()
                    .map(Line::from)
                    .collect();
                if let Some(first) = lines.first_mut() {
                    *first = first.clone().style(Style::default().add_modifier(Modifier::BOLD));
                }
                ListItem::new(lines)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(self.songs.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_lyrics(&self, frame: &mut Frame, area: Rect) {
        let (title, text) = match self.songs.current() {
            Some((title, record)) => (format!("Lyrics: {title}"), record.song_text.clone()),
            None => ("Lyrics".to_string(), String::new()),
        };
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let selected = match self.focus {
            Focus::Categories => self.categories.marked_count(),
            Focus::Genres => self.genres.marked_count(),
            Focus::Songs => 0,
        };
        let counters = Line::from(format!(
            "Total records: {}   Selected: {}   Found: {}",
            self.songs.book.len(),
            selected,
            self.songs.found()
        ));

        let paragraph = Paragraph::new(vec![status_line, counters, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hint = |key: &'static str, label: &'static str| {
            [Span::styled(key, key_style), Span::raw(label)]
        };

        let spans: Vec<Span<'static>> = match (&self.mode, self.focus) {
            (Mode::Searching(_), _) => [
                hint("[type]", " Filter   "),
                hint("[↑↓]", " Select   "),
                hint("[Ctrl-E]", " Edit   "),
                hint("[Enter]", " Keep   "),
                hint("[Esc]", " Clear"),
            ]
            .concat(),
            (_, Focus::Songs) => [
                hint("[Tab]", " Panel   "),
                hint("[↑↓]", " Select   "),
                hint("[Space]", " Recently   "),
                hint("[Enter]", " Image   "),
                hint("[f]", " Search   "),
                hint("[Ctrl-L]", " Recent only   "),
                hint("[+]", " Add   "),
                hint("[e]", " Edit   "),
                hint("[-]", " Delete   "),
                hint("[q]", " Quit"),
            ]
            .concat(),
            _ => [
                hint("[Tab]", " Panel   "),
                hint("[↑↓]", " Select   "),
                hint("[Space]", " Mark   "),
                hint("[+]", " Add   "),
                hint("[e]", " Edit   "),
                hint("[-]", " Delete marked   "),
                hint("[r]", " Reload   "),
                hint("[X]", " Clear all   "),
                hint("[q]", " Quit"),
            ]
            .concat(),
        };
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_name_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &NameForm) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![form.build_line("Name"), Line::from("")];
        lines.push(match &form.error {
            Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        });

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        let cursor_x = inner.x + "Name: ".len() as u16 + form.value_len() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_song_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &SongForm) {
        let popup_area = centered_rect(80, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = SongField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(match &form.error {
            Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(
                "Enter to save • Tab/↑↓ to switch • Space toggles Recently • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        });

        frame.render_widget(Paragraph::new(lines), inner);
        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active_row() as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Deletion")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = confirm.lines().into_iter().map(Line::from).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_alert(&self, frame: &mut Frame, area: Rect, alert: &Alert) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let color = match alert.severity {
            Severity::Info => Color::Cyan,
            Severity::Critical => Color::Red,
        };
        let block = Block::default()
            .title(alert.title.clone())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let mut lines: Vec<Line> = alert.message.lines().map(|line| Line::from(line.to_string())).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Enter to continue.",
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }
}

fn counted(kind: &NameKind, count: usize) -> &'static str {
    if count == 1 {
        kind.singular()
    } else {
        kind.plural()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::temp_db;

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn dismiss_alerts(app: &mut App) -> Vec<(String, Severity)> {
        let mut seen = Vec::new();
        while let Some(alert) = app.alerts.front() {
            seen.push((alert.title.clone(), alert.severity));
            app.handle_key(KeyCode::Enter).unwrap();
        }
        seen
    }

    fn add_name(app: &mut App, focus: Focus, name: &str) {
        app.focus = focus;
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(app, name);
        app.handle_key(KeyCode::Enter).unwrap();
        dismiss_alerts(app);
    }

    fn seeded_app() -> (tempfile::TempDir, App) {
        let (dir, db) = temp_db();
        db.insert_category("Rock").unwrap();
        db.insert_category("Folk").unwrap();
        db.insert_genre("Acoustic").unwrap();
        db.insert_song(&SongDraft::new("Song1", "Rock", ["Acoustic"]))
            .unwrap();
        db.insert_song(&SongDraft::new("Song2", "Folk", ["Acoustic"]))
            .unwrap();
        let mut app = App::new(db);
        dismiss_alerts(&mut app);
        (dir, app)
    }

    #[test]
    fn empty_database_raises_one_notice_per_list() {
        let (_dir, db) = temp_db();
        let mut app = App::new(db);

        let seen = dismiss_alerts(&mut app);

        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(_, severity)| *severity == Severity::Info));
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn alerts_swallow_other_keys() {
        let (_dir, db) = temp_db();
        let mut app = App::new(db);
        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        assert_eq!(app.alerts.len(), 3);
    }

    #[test]
    fn adding_a_category_refreshes_the_panel() {
        let (_dir, db) = temp_db();
        let mut app = App::new(db);
        dismiss_alerts(&mut app);

        add_name(&mut app, Focus::Categories, "Rock");

        assert_eq!(app.categories.names, vec!["Rock"]);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn duplicate_name_keeps_form_open_with_error() {
        let (_dir, mut app) = seeded_app();
        app.focus = Focus::Genres;
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "acoustic");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::AddingName { form, .. } => {
                assert_eq!(
                    form.error.as_deref(),
                    Some("Genre 'acoustic' already exists.")
                );
            }
            _ => panic!("form should stay open"),
        }
        assert_eq!(app.genres.names, vec!["Acoustic"]);
    }

    #[test]
    fn declining_confirmation_changes_nothing() {
        let (_dir, mut app) = seeded_app();
        app.focus = Focus::Categories;
        app.handle_key(KeyCode::Char('-')).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));

        app.handle_key(KeyCode::Char('n')).unwrap();

        assert_eq!(app.categories.names.len(), 2);
        assert_eq!(app.songs.book.len(), 2);
    }

    #[test]
    fn deleting_marked_categories_cascades_to_songs() {
        let (_dir, mut app) = seeded_app();
        app.focus = Focus::Categories;
        // Categories are listed Folk, Rock; mark Rock.
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Char(' ')).unwrap();
        app.handle_key(KeyCode::Char('-')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();
        dismiss_alerts(&mut app);

        assert_eq!(app.categories.names, vec!["Folk"]);
        assert_eq!(app.songs.book.titles().collect::<Vec<_>>(), vec!["Song2"]);
    }

    #[test]
    fn failed_delete_leaves_panels_untouched() {
        let (dir, mut app) = seeded_app();
        // Swap the database for an empty file so the DELETE has no table.
        std::fs::remove_file(dir.path().join("database").join("songs.db")).unwrap();

        app.focus = Focus::Categories;
        app.handle_key(KeyCode::Char('-')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();

        let seen = dismiss_alerts(&mut app);
        assert_eq!(seen, vec![("Opening database".to_string(), Severity::Critical)]);
        assert_eq!(app.categories.names, vec!["Folk", "Rock"]);
        assert_eq!(app.songs.book.len(), 2);
    }

    #[test]
    fn editing_several_marked_names_is_refused() {
        let (_dir, mut app) = seeded_app();
        app.focus = Focus::Categories;
        app.handle_key(KeyCode::Char(' ')).unwrap();
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Char(' ')).unwrap();

        app.handle_key(KeyCode::Char('e')).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert!(matches!(
            app.status,
            Some(StatusMessage {
                kind: StatusKind::Error,
                ..
            })
        ));
    }

    #[test]
    fn renaming_a_category_updates_song_rows() {
        let (_dir, mut app) = seeded_app();
        app.focus = Focus::Categories;
        app.handle_key(KeyCode::End).unwrap();
        app.handle_key(KeyCode::Char('e')).unwrap();
        for _ in 0.."Rock".len() {
            app.handle_key(KeyCode::Backspace).unwrap();
        }
        type_text(&mut app, "Classic Rock");
        app.handle_key(KeyCode::Enter).unwrap();

        assert_eq!(app.categories.names, vec!["Classic Rock", "Folk"]);
        assert_eq!(app.songs.book.get("Song1").unwrap().category, "Classic Rock");
    }

    #[test]
    fn song_form_creates_song_with_autocompleted_category() {
        let (_dir, mut app) = seeded_app();
        app.focus = Focus::Songs;
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Song3");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "ro");
        // First Tab accepts the suggestion, second moves to genres.
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Acoustic");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let record = app.songs.book.get("Song3").unwrap();
        assert_eq!(record.category, "Rock");
        assert_eq!(record.genres, vec!["Acoustic"]);
        assert_eq!(app.songs.current().map(|(title, _)| title), Some("Song3"));
    }

    #[test]
    fn space_on_song_toggles_recency() {
        let (_dir, mut app) = seeded_app();
        app.focus = Focus::Songs;
        app.handle_key(KeyCode::Char(' ')).unwrap();
        assert!(app.songs.book.get("Song1").unwrap().is_recently);

        app.handle_ctrl_l().unwrap();
        assert_eq!(app.songs.visible, vec!["Song1"]);
    }

    #[test]
    fn failed_recency_write_raises_critical_alert() {
        let (dir, mut app) = seeded_app();
        std::fs::remove_file(dir.path().join("database").join("songs.db")).unwrap();

        app.focus = Focus::Songs;
        app.handle_key(KeyCode::Char(' ')).unwrap();

        let seen = dismiss_alerts(&mut app);
        assert_eq!(seen, vec![("Opening database".to_string(), Severity::Critical)]);
        assert!(!app.songs.book.get("Song1").unwrap().is_recently);
    }

    #[test]
    fn song_without_genres_can_still_be_deleted() {
        let (_dir, mut app) = seeded_app();
        app.focus = Focus::Genres;
        app.handle_key(KeyCode::Char('-')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();
        dismiss_alerts(&mut app);

        assert!(app.genres.names.is_empty());
        assert_eq!(app.songs.visible, vec!["Song1", "Song2"]);
        assert!(app.songs.book.get("Song1").unwrap().genres.is_empty());

        app.focus = Focus::Songs;
        app.handle_key(KeyCode::Home).unwrap();
        app.handle_key(KeyCode::Char('-')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();
        dismiss_alerts(&mut app);

        assert_eq!(app.songs.visible, vec!["Song2"]);
    }

    #[test]
    fn search_then_delete_song() {
        let (_dir, mut app) = seeded_app();
        app.handle_key(KeyCode::Char('f')).unwrap();
        type_text(&mut app, "song2");
        assert_eq!(app.songs.found(), 1);
        app.handle_key(KeyCode::Enter).unwrap();

        app.handle_key(KeyCode::Char('-')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();
        dismiss_alerts(&mut app);

        assert!(app.songs.book.get("Song2").is_none());
        assert!(app.songs.book.get("Song1").is_some());
    }

    #[test]
    fn clear_everything_empties_all_panels() {
        let (_dir, mut app) = seeded_app();
        app.handle_key(KeyCode::Char('X')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        dismiss_alerts(&mut app);

        assert!(app.categories.names.is_empty());
        assert!(app.genres.names.is_empty());
        assert!(app.songs.book.is_empty());
    }
}
