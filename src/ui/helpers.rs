use anyhow::{anyhow, Error};
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::db;
use crate::models::SongRecord;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Turn a persistence failure into a message for the footer or a form.
/// `subject` names the thing the user tried to write, e.g. "Category 'Rock'".
pub(crate) fn describe_db_error(err: &db::Error, subject: &str) -> Error {
    match err {
        db::Error::ConstraintViolation { .. } => anyhow!("{subject} already exists."),
        db::Error::NotFound { entity, key } => anyhow!("The {entity} '{key}' does not exist."),
        db::Error::Connection { .. } | db::Error::CreateDirectory { .. } => {
            anyhow!("Could not open the database.")
        }
        db::Error::InvalidInput(message) => anyhow!("{}.", capitalize(message)),
        db::Error::Database { .. } => anyhow!("Database error: {err}."),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Text rows for one song entry: a checkbox and the title, then genres,
/// category, last-performed date and comment, each indented so they start
/// under the first letter after the title.
pub(crate) fn song_row_lines(title: &str, record: &SongRecord) -> Vec<String> {
    let checkbox = if record.is_recently { "[x] " } else { "[ ] " };
    let head = format!("{title}:");
    let indent = " ".repeat(checkbox.chars().count() + head.chars().count());

    let details = [
        record.genres.join(", "),
        record.category.clone(),
        record.last_performed.clone(),
        record.comment.clone(),
    ];

    let mut lines = Vec::with_capacity(details.len() + 1);
    lines.push(format!("{checkbox}{head}"));
    lines.extend(details.iter().map(|detail| format!("{indent}{detail}")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_rows_align_under_title() {
        let record = SongRecord {
            genres: vec!["Acoustic".into(), "Ballad".into()],
            category: "Rock".into(),
            last_performed: "01.01.2024".into(),
            is_recently: true,
            comment: "encore".into(),
            ..SongRecord::default()
        };

        let lines = song_row_lines("Song1", &record);

        assert_eq!(
            lines,
            vec![
                "[x] Song1:",
                "          Acoustic, Ballad",
                "          Rock",
                "          01.01.2024",
                "          encore",
            ]
        );
    }

    #[test]
    fn unchecked_songs_show_empty_box() {
        let lines = song_row_lines("A", &SongRecord::default());
        assert_eq!(lines[0], "[ ] A:");
        assert_eq!(lines[1], "      ");
    }

    #[test]
    fn db_errors_become_user_messages() {
        let err = db::Error::NotFound {
            entity: db::Entity::Genre,
            key: "Polka".into(),
        };
        assert_eq!(
            describe_db_error(&err, "Song 'x'").to_string(),
            "The genre 'Polka' does not exist."
        );
        assert_eq!(
            describe_db_error(&db::Error::InvalidInput("a song needs at least one genre"), "x")
                .to_string(),
            "A song needs at least one genre."
        );
    }
}
