use crate::models::{Book, SearchField, SortOrder};
use crate::stats::Statistics;

use super::helpers::step_index;

/// Sorted listing of the whole collection. Only the order and cursor live
/// here; the rows are re-derived from the library on every draw so the view
/// never goes stale after an add or removal.
pub(crate) struct BookListScreen {
    pub(crate) order: SortOrder,
    pub(crate) selected: usize,
}

impl BookListScreen {
    pub(crate) fn new(order: SortOrder) -> Self {
        Self { order, selected: 0 }
    }

    pub(crate) fn cycle_order(&mut self) -> SortOrder {
        self.order = self.order.next();
        self.selected = 0;
        self.order
    }

    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        self.selected = step_index(self.selected, len, offset);
    }

    pub(crate) fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }
}

/// Results of one search, captured when it ran.
pub(crate) struct SearchResultsScreen {
    pub(crate) field: SearchField,
    pub(crate) term: String,
    pub(crate) results: Vec<Book>,
    pub(crate) selected: usize,
}

impl SearchResultsScreen {
    pub(crate) fn new(field: SearchField, term: String, results: Vec<Book>) -> Self {
        Self {
            field,
            term,
            results,
            selected: 0,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.results.len(), offset);
    }

    pub(crate) fn heading(&self) -> String {
        if self.results.is_empty() {
            format!(
                "No books found with {} matching \"{}\"",
                self.field.label().to_lowercase(),
                self.term
            )
        } else {
            format!(
                "Found {} matching book(s) for {} \"{}\"",
                self.results.len(),
                self.field.label().to_lowercase(),
                self.term
            )
        }
    }
}

/// Statistics computed when the screen was opened.
pub(crate) struct StatsScreen {
    pub(crate) stats: Statistics,
    pub(crate) scroll: u16,
}

impl StatsScreen {
    pub(crate) fn new(stats: Statistics) -> Self {
        Self { stats, scroll: 0 }
    }

    pub(crate) fn scroll_by(&mut self, offset: i32) {
        self.scroll = (self.scroll as i32 + offset).clamp(0, u16::MAX as i32) as u16;
    }

    /// `(genre, count)` pairs for the bar chart.
    pub(crate) fn genre_bars(&self) -> Vec<(&str, u64)> {
        self.stats
            .genres
            .iter()
            .map(|(genre, count)| (genre.as_str(), *count as u64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycling_order_resets_cursor() {
        let mut screen = BookListScreen::new(SortOrder::Title);
        screen.move_selection(2, 5);
        assert_eq!(screen.selected, 2);
        assert_eq!(screen.cycle_order(), SortOrder::Author);
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn search_heading_reflects_results() {
        let empty = SearchResultsScreen::new(SearchField::Genre, "poetry".into(), Vec::new());
        assert_eq!(empty.heading(), "No books found with genre matching \"poetry\"");
    }

    #[test]
    fn genre_bars_follow_genre_order() {
        let books = vec![
            Book {
                title: "B".into(),
                author: "X".into(),
                year: 2000,
                genre: "Poetry".into(),
                read: true,
            },
            Book {
                title: "A".into(),
                author: "X".into(),
                year: 2000,
                genre: "Drama".into(),
                read: true,
            },
        ];
        let screen = StatsScreen::new(Statistics::compute(&books, 5));
        assert_eq!(screen.genre_bars(), vec![("Drama", 1), ("Poetry", 1)]);
    }
}
