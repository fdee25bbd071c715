//! Terminal front end: a numbered main menu with popups for adding, removing
//! and searching, plus list and statistics screens.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
