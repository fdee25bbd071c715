use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, BookDraft, SearchField};

/// Fields of the "add book" form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Year,
    Genre,
    Read,
}

impl BookField {
    pub(crate) const ALL: [BookField; 5] = [
        BookField::Title,
        BookField::Author,
        BookField::Year,
        BookField::Genre,
        BookField::Read,
    ];

    fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Year => "Year",
            BookField::Genre => "Genre",
            BookField::Read => "Read",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            BookField::Title | BookField::Author | BookField::Year => "<required>",
            BookField::Genre => "<Unknown>",
            BookField::Read => "",
        }
    }

    /// Row of the field inside the form popup.
    pub(crate) fn row(self) -> u16 {
        match self {
            BookField::Title => 0,
            BookField::Author => 1,
            BookField::Year => 2,
            BookField::Genre => 3,
            BookField::Read => 4,
        }
    }

    fn next(self) -> Self {
        match self {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Year,
            BookField::Year => BookField::Genre,
            BookField::Genre => BookField::Read,
            BookField::Read => BookField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            BookField::Title => BookField::Read,
            BookField::Author => BookField::Title,
            BookField::Year => BookField::Author,
            BookField::Genre => BookField::Year,
            BookField::Read => BookField::Genre,
        }
    }
}

/// Form state for adding a book, including author autocomplete tracking.
#[derive(Default, Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) genre: String,
    pub(crate) read: bool,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

impl BookForm {
    /// Move focus to the next field.
    pub(crate) fn focus_next(&mut self) {
        self.active = self.active.next();
        self.clear_suggestion_off_author();
    }

    pub(crate) fn focus_previous(&mut self) {
        self.active = self.active.previous();
        self.clear_suggestion_off_author();
    }

    fn clear_suggestion_off_author(&mut self) {
        if self.active != BookField::Author {
            self.suggestion = None;
        }
    }

    /// Insert a character into the active field. Years only take digits and
    /// the read flag reacts to space, `y` and `n`.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::Author => {
                self.autocomplete_disabled = false;
                self.author.push(ch);
            }
            BookField::Year => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.year.push(ch);
            }
            BookField::Genre => self.genre.push(ch),
            BookField::Read => match ch {
                ' ' => self.read = !self.read,
                'y' | 'Y' => self.read = true,
                'n' | 'N' => self.read = false,
                _ => return false,
            },
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
                self.autocomplete_disabled = false;
            }
            BookField::Year => {
                self.year.pop();
            }
            BookField::Genre => {
                self.genre.pop();
            }
            BookField::Read => {}
        }
    }

    /// Raw values handed to the library, which owns validation.
    pub(crate) fn to_draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            year: self.year.clone(),
            genre: self.genre.clone(),
            read: self.read,
        }
    }

    /// Offer the first known author that starts with what has been typed so
    /// far (two characters minimum, case-insensitive).
    pub(crate) fn update_suggestion(&mut self, authors: &[String]) {
        if self.active != BookField::Author
            || self.autocomplete_disabled
            || self.author.chars().count() < 2
        {
            self.suggestion = None;
            return;
        }

        let typed = self.author.to_lowercase();
        self.suggestion = authors
            .iter()
            .find(|candidate| candidate.to_lowercase().starts_with(&typed))
            .filter(|candidate| candidate.to_lowercase() != typed)
            .cloned();
    }

    /// Replace the author with the suggestion.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        if self.active != BookField::Author || self.suggestion_suffix().is_none() {
            return false;
        }
        match self.suggestion.take() {
            Some(candidate) => {
                self.author = candidate;
                self.autocomplete_disabled = true;
                true
            }
            None => false,
        }
    }

    /// Dismiss the suggestion for the rest of this interaction.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.active == BookField::Author && self.suggestion.is_some() {
            self.autocomplete_disabled = true;
            self.suggestion = None;
            return true;
        }
        false
    }

    /// Characters still missing from the suggestion, shown ghosted.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let suffix: String = candidate.chars().skip(self.author.chars().count()).collect();
        if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        }
    }

    fn value(&self, field: BookField) -> String {
        match field {
            BookField::Title => self.title.clone(),
            BookField::Author => self.author.clone(),
            BookField::Year => self.year.clone(),
            BookField::Genre => self.genre.clone(),
            BookField::Read => {
                let label = if self.read { "[x] Read" } else { "[ ] Unread" };
                label.to_string()
            }
        }
    }

    /// Render one form row, with the ghosted suggestion after the author.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![Span::raw(format!("{}: ", field.label()))];
        if value.is_empty() {
            spans.push(Span::styled(field.placeholder().to_string(), style));
        } else {
            spans.push(Span::styled(value, style));
        }
        if field == BookField::Author && is_active {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }
        Line::from(spans)
    }

    /// Column of the cursor inside the form, relative to its left edge.
    pub(crate) fn cursor_offset(&self) -> u16 {
        let prefix = format!("{}: ", self.active.label()).len();
        let typed = match self.active {
            BookField::Read => 1,
            field => self.value(field).chars().count(),
        };
        (prefix + typed) as u16
    }
}

/// Title prompt shown when removing a book.
#[derive(Default, Clone, Debug)]
pub(crate) struct TitlePrompt {
    pub(crate) title: String,
    pub(crate) error: Option<String>,
}

/// Chooser shown when several books share the title being removed.
#[derive(Clone, Debug)]
pub(crate) struct RemovalChoice {
    pub(crate) title: String,
    pub(crate) candidates: Vec<Book>,
    pub(crate) selected: usize,
    /// Digits typed so far; Enter uses them instead of the highlighted row.
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

/// What the user asked for in the removal chooser.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ChoiceInput {
    Cancel,
    Pick(usize),
}

impl RemovalChoice {
    pub(crate) fn new(title: String, candidates: Vec<Book>) -> Self {
        Self {
            title,
            candidates,
            selected: 0,
            input: String::new(),
            error: None,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = super::helpers::step_index(self.selected, self.candidates.len(), offset);
        self.input.clear();
    }

    pub(crate) fn push_digit(&mut self, ch: char) -> bool {
        if ch.is_ascii_digit() && self.input.len() < 4 {
            self.input.push(ch);
            true
        } else {
            false
        }
    }

    /// Interpret the typed number (or the highlighted row when nothing was
    /// typed). `0` cancels; range checking is left to the library.
    pub(crate) fn resolve(&self) -> ChoiceInput {
        if self.input.is_empty() {
            return ChoiceInput::Pick(self.selected + 1);
        }
        match self.input.parse::<usize>() {
            Ok(0) => ChoiceInput::Cancel,
            Ok(choice) => ChoiceInput::Pick(choice),
            Err(_) => ChoiceInput::Pick(usize::MAX),
        }
    }
}

/// Field selector plus search term.
#[derive(Default, Clone, Debug)]
pub(crate) struct SearchForm {
    pub(crate) field: SearchField,
    pub(crate) term: String,
    pub(crate) error: Option<String>,
}

impl SearchForm {
    pub(crate) fn build_line(&self) -> Line<'static> {
        let mut spans = vec![Span::raw("Search by: ")];
        for (idx, field) in SearchField::ALL.into_iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw(" / "));
            }
            let style = if field == self.field {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(field.label(), style));
        }
        Line::from(spans)
    }
}
