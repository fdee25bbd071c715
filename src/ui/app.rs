use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    BarChart, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap,
};
use ratatui::Frame;
use tracing::{info, warn};

use crate::error::{LibraryError, StoreError};
use crate::library::{Committed, Library};
use crate::models::Book;
use crate::models::SortOrder;
use crate::stats::books_noun;

use super::forms::{BookField, BookForm, ChoiceInput, RemovalChoice, SearchForm, TitlePrompt};
use super::helpers::{book_line, centered_rect, step_index, surface_error};
use super::screens::{BookListScreen, SearchResultsScreen, StatsScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Header space for the application title and library summary.
const HEADER_HEIGHT: u16 = 3;
/// Rows moved by PageUp/PageDown in list views.
const PAGE_STEP: isize = 10;
/// Main menu entries. Their 1-based position is the shortcut digit.
const MENU_ITEMS: [&str; 6] = [
    "Add a book",
    "Remove a book",
    "Search for a book",
    "Display all books",
    "Display statistics",
    "Exit",
];

/// What a main menu entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Add,
    Remove,
    Search,
    List,
    Statistics,
    Exit,
}

impl MenuAction {
    fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(MenuAction::Add),
            1 => Some(MenuAction::Remove),
            2 => Some(MenuAction::Search),
            3 => Some(MenuAction::List),
            4 => Some(MenuAction::Statistics),
            5 => Some(MenuAction::Exit),
            _ => None,
        }
    }
}

/// High-level navigation states. The menu is home; every other screen goes
/// back to it with Esc.
enum Screen {
    Menu,
    Books(BookListScreen),
    Results(SearchResultsScreen),
    Stats(StatsScreen),
}

/// Popups layered over the current screen.
enum Mode {
    Normal,
    Adding(BookForm),
    Removing(TitlePrompt),
    ChoosingRemoval(RemovalChoice),
    Searching(SearchForm),
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

/// Central application state for the terminal front end. The library is
/// owned here for the whole session.
pub struct App {
    library: Library,
    authors: Vec<String>,
    menu_selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Wrap an opened library. A load warning is shown in the footer right
    /// away so the user knows why the library looks empty.
    pub fn new(library: Library, load_warning: Option<StoreError>) -> Self {
        let authors = library.authors();
        let mut app = Self {
            library,
            authors,
            menu_selected: 0,
            screen: Screen::Menu,
            mode: Mode::Normal,
            status: None,
        };
        if let Some(err) = load_warning {
            app.set_status(
                format!("Could not load library ({err}). Starting with an empty library."),
                StatusKind::Error,
            );
        }
        app
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Flush the collection to disk. Runs on every way out of the loop.
    pub fn save(&mut self) -> Result<()> {
        self.library.flush().with_context(|| {
            format!(
                "failed to save library to {}",
                self.library.store().path().display()
            )
        })?;
        info!(books = self.library.len(), "library saved");
        Ok(())
    }

    /// Ctrl+S: write the library now and report the outcome in the footer.
    pub fn save_now(&mut self) {
        match self.save() {
            Ok(()) => self.set_status(
                format!("Saved {} {}.", self.library.len(), books_noun(self.library.len())),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(
                format!("Save failed: {}", surface_error(&err)),
                StatusKind::Error,
            ),
        }
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Adding(form) => self.handle_add(code, form),
            Mode::Removing(prompt) => self.handle_remove_prompt(code, prompt),
            Mode::ChoosingRemoval(choice) => self.handle_removal_choice(code, choice),
            Mode::Searching(form) => self.handle_search(code, form),
        };

        exit
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        if code == KeyCode::Char('q') {
            *exit = true;
            return Mode::Normal;
        }

        let len = self.library.len();
        let mut back_to_menu = false;
        let mut status_to_set: Option<(String, StatusKind)> = None;
        let mut next_mode = Mode::Normal;

        match self.screen {
            Screen::Menu => return self.handle_menu_key(code, exit),
            Screen::Books(ref mut list) => match code {
                KeyCode::Esc | KeyCode::Backspace => back_to_menu = true,
                KeyCode::Up => list.move_selection(-1, len),
                KeyCode::Down => list.move_selection(1, len),
                KeyCode::PageUp => list.move_selection(-PAGE_STEP, len),
                KeyCode::PageDown => list.move_selection(PAGE_STEP, len),
                KeyCode::Home => list.selected = 0,
                KeyCode::End => list.select_last(len),
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    let order = list.cycle_order();
                    status_to_set = Some((format!("Sorted by {}.", order.label()), StatusKind::Info));
                }
                _ => {}
            },
            Screen::Results(ref mut results) => match code {
                KeyCode::Esc | KeyCode::Backspace => back_to_menu = true,
                KeyCode::Up => results.move_selection(-1),
                KeyCode::Down => results.move_selection(1),
                KeyCode::PageUp => results.move_selection(-PAGE_STEP),
                KeyCode::PageDown => results.move_selection(PAGE_STEP),
                KeyCode::Char('/') => {
                    next_mode = Mode::Searching(SearchForm {
                        field: results.field,
                        ..SearchForm::default()
                    });
                }
                _ => {}
            },
            Screen::Stats(ref mut stats) => match code {
                KeyCode::Esc | KeyCode::Backspace => back_to_menu = true,
                KeyCode::Up => stats.scroll_by(-1),
                KeyCode::Down => stats.scroll_by(1),
                KeyCode::PageUp => stats.scroll_by(-(PAGE_STEP as i32)),
                KeyCode::PageDown => stats.scroll_by(PAGE_STEP as i32),
                _ => {}
            },
        }

        if back_to_menu {
            self.screen = Screen::Menu;
            self.clear_status();
        }
        if let Some((text, kind)) = status_to_set {
            self.set_status(text, kind);
        }
        next_mode
    }

    fn handle_menu_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Esc => *exit = true,
            KeyCode::Up => {
                self.menu_selected = step_index(self.menu_selected, MENU_ITEMS.len(), -1)
            }
            KeyCode::Down => {
                self.menu_selected = step_index(self.menu_selected, MENU_ITEMS.len(), 1)
            }
            KeyCode::Enter => return self.activate(self.menu_selected, exit),
            KeyCode::Char(ch) => match ch.to_digit(10) {
                Some(digit) if (1..=MENU_ITEMS.len()).contains(&(digit as usize)) => {
                    self.menu_selected = digit as usize - 1;
                    return self.activate(self.menu_selected, exit);
                }
                _ => self.set_status(
                    format!(
                        "Invalid choice. Please enter a number between 1 and {}.",
                        MENU_ITEMS.len()
                    ),
                    StatusKind::Error,
                ),
            },
            _ => {}
        }
        Mode::Normal
    }

    fn activate(&mut self, idx: usize, exit: &mut bool) -> Mode {
        let Some(action) = MenuAction::from_index(idx) else {
            return Mode::Normal;
        };
        self.clear_status();

        match action {
            MenuAction::Add => Mode::Adding(BookForm::default()),
            MenuAction::Remove | MenuAction::Search if self.library.is_empty() => {
                self.set_status("The library is empty.", StatusKind::Error);
                Mode::Normal
            }
            MenuAction::Remove => Mode::Removing(TitlePrompt::default()),
            MenuAction::Search => Mode::Searching(SearchForm::default()),
            MenuAction::List => {
                self.screen = Screen::Books(BookListScreen::new(SortOrder::Title));
                Mode::Normal
            }
            MenuAction::Statistics => {
                self.screen = Screen::Stats(StatsScreen::new(self.library.statistics()));
                Mode::Normal
            }
            MenuAction::Exit => {
                *exit = true;
                Mode::Normal
            }
        }
    }

    fn handle_add(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                if !form.cancel_autocomplete() {
                    self.set_status("Add book cancelled.", StatusKind::Info);
                    keep_open = false;
                }
            }
            KeyCode::Tab => {
                if !form.accept_suggestion() {
                    form.focus_next();
                }
                form.update_suggestion(&self.authors);
            }
            KeyCode::Down => {
                form.focus_next();
                form.update_suggestion(&self.authors);
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus_previous();
                form.update_suggestion(&self.authors);
            }
            KeyCode::Backspace => {
                form.backspace();
                form.update_suggestion(&self.authors);
            }
            KeyCode::Enter => match self.library.add(&form.to_draft()) {
                Ok(committed) => {
                    self.after_commit(committed, "Added");
                    keep_open = false;
                }
                Err(err) => {
                    let message = err.to_string();
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                    form.update_suggestion(&self.authors);
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::Adding(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_remove_prompt(&mut self, code: KeyCode, mut prompt: TitlePrompt) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Backspace => {
                prompt.title.pop();
                Mode::Removing(prompt)
            }
            KeyCode::Enter => match self.library.remove(&prompt.title, None) {
                Ok(committed) => {
                    self.after_commit(committed, "Removed");
                    Mode::Normal
                }
                Err(LibraryError::Ambiguous { title, count }) => {
                    let candidates: Vec<Book> = self
                        .library
                        .matches_for_title(&title)
                        .into_iter()
                        .cloned()
                        .collect();
                    self.set_status(
                        format!("Multiple books found with that title ({count})."),
                        StatusKind::Info,
                    );
                    Mode::ChoosingRemoval(RemovalChoice::new(title, candidates))
                }
                Err(err) => {
                    let message = err.to_string();
                    prompt.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Mode::Removing(prompt)
                }
            },
            KeyCode::Char(ch) if !ch.is_control() => {
                prompt.title.push(ch);
                prompt.error = None;
                Mode::Removing(prompt)
            }
            _ => Mode::Removing(prompt),
        }
    }

    fn handle_removal_choice(&mut self, code: KeyCode, mut choice: RemovalChoice) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Operation cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Up => choice.move_selection(-1),
            KeyCode::Down => choice.move_selection(1),
            KeyCode::Backspace => {
                choice.input.pop();
            }
            KeyCode::Char(ch) => {
                if choice.push_digit(ch) {
                    choice.error = None;
                } else {
                    choice.error = Some("Please enter a valid number.".to_string());
                }
            }
            KeyCode::Enter => match choice.resolve() {
                ChoiceInput::Cancel => {
                    self.set_status("Operation cancelled.", StatusKind::Info);
                    return Mode::Normal;
                }
                ChoiceInput::Pick(number) => {
                    match self.library.remove(&choice.title, Some(number)) {
                        Ok(committed) => {
                            self.after_commit(committed, "Removed");
                            return Mode::Normal;
                        }
                        Err(err) => {
                            warn!("removal choice rejected: {err}");
                            choice.error = Some(err.to_string());
                            choice.input.clear();
                        }
                    }
                }
            },
            _ => {}
        }
        Mode::ChoosingRemoval(choice)
    }

    fn handle_search(&mut self, code: KeyCode, mut form: SearchForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Search cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.field = form.field.next(),
            KeyCode::Backspace => {
                form.term.pop();
            }
            KeyCode::Enter => match self.library.search(form.field, &form.term) {
                Ok(found) => {
                    let results: Vec<Book> = found.into_iter().cloned().collect();
                    let screen =
                        SearchResultsScreen::new(form.field, form.term.trim().to_string(), results);
                    self.set_status(screen.heading(), StatusKind::Info);
                    self.screen = Screen::Results(screen);
                    return Mode::Normal;
                }
                Err(err) => {
                    let message = err.to_string();
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) if !ch.is_control() => {
                form.term.push(ch);
                form.error = None;
            }
            _ => {}
        }
        Mode::Searching(form)
    }

    /// Report a finished add/remove and bring open screens up to date.
    fn after_commit(&mut self, committed: Committed<Book>, verb: &str) {
        let book = committed.value;
        match committed.save_error {
            None => self.set_status(
                format!("{verb} '{}' by {}.", book.title, book.author),
                StatusKind::Info,
            ),
            Some(err) => self.set_status(
                format!(
                    "{verb} '{}', but the library could not be saved: {err}",
                    book.title
                ),
                StatusKind::Error,
            ),
        }
        self.authors = self.library.authors();
        self.refresh_screen();
    }

    fn refresh_screen(&mut self) {
        let len = self.library.len();
        match &mut self.screen {
            Screen::Menu => {}
            Screen::Books(list) => list.move_selection(0, len),
            Screen::Results(results) => {
                results.results = self
                    .library
                    .search(results.field, &results.term)
                    .map(|found| found.into_iter().cloned().collect())
                    .unwrap_or_default();
                results.move_selection(0);
            }
            Screen::Stats(stats) => *stats = StatsScreen::new(self.library.statistics()),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT.min(area.height)),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        match &self.screen {
            Screen::Menu => self.draw_menu(frame, chunks[1]),
            Screen::Books(list) => self.draw_book_list(frame, chunks[1], list),
            Screen::Results(results) => self.draw_results(frame, chunks[1], results),
            Screen::Stats(stats) => self.draw_stats(frame, chunks[1], stats),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::Adding(form) => self.draw_book_form(frame, area, form),
            Mode::Removing(prompt) => self.draw_remove_prompt(frame, area, prompt),
            Mode::ChoosingRemoval(choice) => self.draw_removal_choice(frame, area, choice),
            Mode::Searching(form) => self.draw_search_form(frame, area, form),
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let count = self.library.len();
        let lines = vec![
            Line::from(Span::styled(
                "Personal Library Manager",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!(
                    "{count} {} in {}",
                    books_noun(count),
                    self.library.store().path().display()
                ),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let header = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, area);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, label)| ListItem::new(format!("{}. {label}", idx + 1)))
            .collect();
        let list = List::new(items)
            .block(Block::default().title("Main Menu").borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let menu_area = centered_rect(50, 60, area);
        let mut state = ListState::default().with_selected(Some(self.menu_selected));
        frame.render_stateful_widget(list, menu_area, &mut state);
    }

    fn draw_book_list(&self, frame: &mut Frame, area: Rect, list: &BookListScreen) {
        let title = format!("Your Library - {}", list.order.label());
        if self.library.is_empty() {
            let message = Paragraph::new("Your library is empty. Add some books to get started!")
                .alignment(Alignment::Center)
                .block(Block::default().title(title).borders(Borders::ALL));
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .library
            .sorted(list.order)
            .into_iter()
            .enumerate()
            .map(|(idx, book)| ListItem::new(book_line(idx + 1, book)))
            .collect();
        self.render_book_items(frame, area, title, items, list.selected);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect, results: &SearchResultsScreen) {
        let items: Vec<ListItem> = results
            .results
            .iter()
            .enumerate()
            .map(|(idx, book)| ListItem::new(book_line(idx + 1, book)))
            .collect();
        self.render_book_items(frame, area, results.heading(), items, results.selected);
    }

    fn render_book_items(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: String,
        items: Vec<ListItem>,
        selected: usize,
    ) {
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = ListState::default().with_selected(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_stats(&self, frame: &mut Frame, area: Rect, screen: &StatsScreen) {
        let stats = &screen.stats;
        let block = Block::default()
            .title("Library Statistics")
            .borders(Borders::ALL);
        if stats.total == 0 {
            let message = Paragraph::new("Your library is empty. Add some books to see statistics!")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let heading = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(format!("Total books: {}", stats.total)),
            Line::from(format!("Books read: {}", stats.read)),
            Line::from(format!("Books unread: {}", stats.unread)),
            Line::from(format!("Percentage read: {}", stats.percent_label())),
            Line::from(""),
            Line::from(Span::styled("Books by genre", heading)),
        ];
        for (genre, count) in &stats.genres {
            lines.push(Line::from(format!("- {genre}: {count} {}", books_noun(*count))));
        }
        if let Some((oldest, newest)) = stats.year_range {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Publication years", heading)));
            lines.push(Line::from(format!("{oldest} - {newest}")));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Top authors", heading)));
        for entry in &stats.top_authors {
            lines.push(Line::from(format!(
                "- {}: {} {}",
                entry.author,
                entry.books,
                books_noun(entry.books)
            )));
        }

        let summary = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .scroll((screen.scroll, 0));
        frame.render_widget(summary, columns[0]);

        let charts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let genre_bars = screen.genre_bars();
        let genre_chart = BarChart::default()
            .block(Block::default().title("Genres").borders(Borders::ALL))
            .data(genre_bars.as_slice())
            .bar_width(9)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
        frame.render_widget(genre_chart, charts[0]);

        let year_labels: Vec<(String, u64)> = stats
            .years
            .iter()
            .map(|(year, count)| (year.to_string(), *count as u64))
            .collect();
        let year_bars: Vec<(&str, u64)> = year_labels
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        let year_chart = BarChart::default()
            .block(Block::default().title("Publication Years").borders(Borders::ALL))
            .data(year_bars.as_slice())
            .bar_width(5)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Magenta))
            .value_style(Style::default().fg(Color::Black).bg(Color::Magenta));
        frame.render_widget(year_chart, charts[1]);
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

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Adding(_)) => &[
                ("[Enter]", " Save   "),
                ("[Tab]", " Next/Accept   "),
                ("[Space]", " Toggle read   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::Removing(_)) => &[("[Enter]", " Confirm   "), ("[Esc]", " Cancel")],
            (_, Mode::Searching(_)) => &[
                ("[Enter]", " Search   "),
                ("[Tab]", " Field   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::ChoosingRemoval(_)) => &[
                ("[1-9]", " Choose   "),
                ("[Up/Down]", " Navigate   "),
                ("[0/Esc]", " Cancel"),
            ],
            (Screen::Menu, _) => &[
                ("[1-6]", " Select   "),
                ("[Up/Down]", " Navigate   "),
                ("[Enter]", " Open   "),
                ("[Ctrl+S]", " Save   "),
                ("[q]", " Save & Quit"),
            ],
            (Screen::Books(_), _) => &[
                ("[Up/Down]", " Scroll   "),
                ("[s]", " Sort   "),
                ("[Esc]", " Menu   "),
                ("[q]", " Save & Quit"),
            ],
            (Screen::Results(_), _) => &[
                ("[Up/Down]", " Scroll   "),
                ("[/]", " New search   "),
                ("[Esc]", " Menu   "),
                ("[q]", " Save & Quit"),
            ],
            (Screen::Stats(_), _) => &[
                ("[Up/Down]", " Scroll   "),
                ("[Esc]", " Menu   "),
                ("[q]", " Save & Quit"),
            ],
        };

        Line::from(
            keys.iter()
                .flat_map(|(key, action)| {
                    [Span::styled(*key, key_style), Span::raw(*action)]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add a New Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = BookField::ALL
            .into_iter()
            .map(|field| form.build_line(field))
            .collect();
        lines.push(Line::from(""));
        lines.push(self.hint_or_error(
            form.error.as_deref(),
            "Enter to save - Tab to switch/accept - Esc to cancel",
        ));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((
            inner.x + form.cursor_offset(),
            inner.y + form.active.row(),
        ));
    }

    fn draw_remove_prompt(&self, frame: &mut Frame, area: Rect, prompt: &TitlePrompt) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Remove a Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Title: {}", prompt.title)),
            Line::from(""),
            self.hint_or_error(
                prompt.error.as_deref(),
                "Enter the title of the book to remove, then press Enter.",
            ),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        frame.set_cursor_position((
            inner.x + "Title: ".len() as u16 + prompt.title.chars().count() as u16,
            inner.y,
        ));
    }

    fn draw_removal_choice(&self, frame: &mut Frame, area: Rect, choice: &RemovalChoice) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Multiple books titled \"{}\"", choice.title))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(inner);

        let items: Vec<ListItem> = choice
            .candidates
            .iter()
            .enumerate()
            .map(|(idx, book)| ListItem::new(format!("{}. {}", idx + 1, book.label())))
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(choice.selected));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let prompt = format!(
            "Number of the book to remove (1-{}), or 0 to cancel: {}",
            choice.candidates.len(),
            choice.input
        );
        let lines = vec![
            Line::from(prompt),
            self.hint_or_error(choice.error.as_deref(), ""),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[1]);
    }

    fn draw_search_form(&self, frame: &mut Frame, area: Rect, form: &SearchForm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Search Books").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let prefix = format!("{}: ", form.field.label());
        let lines = vec![
            form.build_line(),
            Line::from(format!("{prefix}{}", form.term)),
            Line::from(""),
            self.hint_or_error(
                form.error.as_deref(),
                "Tab to change field - Enter to search - Esc to cancel",
            ),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        frame.set_cursor_position((
            inner.x + prefix.len() as u16 + form.term.chars().count() as u16,
            inner.y + 1,
        ));
    }

    fn hint_or_error(&self, error: Option<&str>, hint: &str) -> Line<'static> {
        match error {
            Some(error) => Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )),
            None => Line::from(Span::styled(
                hint.to_string(),
                Style::default().fg(Color::Gray),
            )),
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::store::LibraryStore;
    use tempfile::TempDir;

    fn app_in(dir: &TempDir) -> App {
        let store = LibraryStore::new(dir.path().join("library.json"));
        let (library, warning) = Library::open(store, Rules::default());
        App::new(library, warning)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch));
        }
    }

    fn add_book(app: &mut App, title: &str, author: &str, year: &str) {
        app.handle_key(KeyCode::Char('1'));
        type_text(app, title);
        app.handle_key(KeyCode::Down);
        type_text(app, author);
        app.handle_key(KeyCode::Down);
        type_text(app, year);
        app.handle_key(KeyCode::Enter);
    }

    #[test]
    fn add_through_the_form_persists() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);

        add_book(&mut app, "Dune", "Frank Herbert", "1965");

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.library().len(), 1);
        assert_eq!(app.library().books()[0].genre, "Unknown");
        let (on_disk, _) = app.library().store().load();
        assert_eq!(on_disk.len(), 1);
    }

    #[test]
    fn invalid_form_stays_open_with_error() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);

        app.handle_key(KeyCode::Char('1'));
        type_text(&mut app, "Dune");
        app.handle_key(KeyCode::Enter);

        match &app.mode {
            Mode::Adding(form) => assert_eq!(form.error.as_deref(), Some("Author is required.")),
            _ => panic!("form should stay open"),
        }
        assert!(app.library().is_empty());
    }

    #[test]
    fn invalid_menu_key_reprompts() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);

        assert!(!app.handle_key(KeyCode::Char('9')));
        assert!(!app.handle_key(KeyCode::Char('x')));
        assert!(matches!(app.screen, Screen::Menu));
        assert!(app.status.is_some());
    }

    #[test]
    fn remove_on_empty_library_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);

        app.handle_key(KeyCode::Char('2'));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(
            app.status.as_ref().map(|status| status.text.as_str()),
            Some("The library is empty.")
        );
    }

    #[test]
    fn duplicate_titles_open_the_chooser() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);
        add_book(&mut app, "Persuasion", "Jane Austen", "1817");
        add_book(&mut app, "Persuasion", "Someone Else", "2001");
        add_book(&mut app, "Persuasion", "Third Author", "2015");

        app.handle_key(KeyCode::Char('2'));
        type_text(&mut app, "persuasion");
        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.mode, Mode::ChoosingRemoval(_)));

        app.handle_key(KeyCode::Char('7'));
        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.mode, Mode::ChoosingRemoval(_)));
        assert_eq!(app.library().len(), 3);

        app.handle_key(KeyCode::Char('2'));
        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Normal));
        let authors: Vec<&str> = app
            .library()
            .books()
            .iter()
            .map(|book| book.author.as_str())
            .collect();
        assert_eq!(authors, vec!["Jane Austen", "Third Author"]);
    }

    #[test]
    fn zero_cancels_the_chooser() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);
        add_book(&mut app, "Emma", "Jane Austen", "1815");
        add_book(&mut app, "Emma", "Other", "1999");

        app.handle_key(KeyCode::Char('2'));
        type_text(&mut app, "Emma");
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Char('0'));
        app.handle_key(KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.library().len(), 2);
    }

    #[test]
    fn search_switches_to_results() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);
        add_book(&mut app, "Dune", "Frank Herbert", "1965");
        add_book(&mut app, "Emma", "Jane Austen", "1815");

        app.handle_key(KeyCode::Char('3'));
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "AUSTEN");
        app.handle_key(KeyCode::Enter);

        match &app.screen {
            Screen::Results(results) => {
                assert_eq!(results.results.len(), 1);
                assert_eq!(results.results[0].title, "Emma");
            }
            _ => panic!("expected results screen"),
        }
    }

    fn footer_text(app: &App) -> String {
        app.footer_instructions()
            .spans
            .iter()
            .map(|span| span.content.to_string())
            .collect()
    }

    #[test]
    fn tab_hint_only_where_tab_switches_fields() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);
        add_book(&mut app, "Dune", "Frank Herbert", "1965");

        app.handle_key(KeyCode::Char('2'));
        assert!(matches!(app.mode, Mode::Removing(_)));
        assert!(!footer_text(&app).contains("[Tab]"));

        app.handle_key(KeyCode::Esc);
        app.handle_key(KeyCode::Char('3'));
        assert!(matches!(app.mode, Mode::Searching(_)));
        assert!(footer_text(&app).contains("[Tab] Field"));
    }

    #[test]
    fn q_exits_and_save_writes_file() {
        let dir = TempDir::new().expect("temp dir");
        let mut app = app_in(&dir);

        assert!(app.handle_key(KeyCode::Char('q')));
        app.save().expect("save");
        assert!(dir.path().join("library.json").exists());
    }
}
