use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::Book;

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

/// Move `current` by `offset` within `0..len`, clamping at both ends.
pub(crate) fn step_index(current: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = current as isize + offset;
    target.clamp(0, len as isize - 1) as usize
}

/// One listing row: numbered title line with the read flag colored.
pub(crate) fn book_line(number: usize, book: &Book) -> Line<'static> {
    let status_style = if book.read {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };
    Line::from(vec![
        Span::styled(
            format!("{number:>3}. "),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            book.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" by {} ({}) - {} - ", book.author, book.year, book.genre)),
        Span::styled(book.status(), status_style),
    ])
}
