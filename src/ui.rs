//! Ratatui front-end for the songbook: categories and genres stacked on the
//! left, the song list in the middle, lyrics of the highlighted song on the
//! right and a footer with counters and key hints.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
