//! HTML rendering. Every piece of user-supplied text passes through
//! [`escape`] before it reaches the page.

use std::fmt::Write as _;

use axum::response::Html;

use crate::models::{Book, SearchField, SortOrder};
use crate::stats::{books_noun, Statistics};

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;display:flex;min-height:100vh;color:#222}\
nav{width:13rem;background:#f3f1ec;padding:1rem;flex-shrink:0}\
nav a{display:block;padding:.4rem .6rem;color:#333;text-decoration:none;border-radius:4px}\
nav a.active{background:#4a6fa5;color:#fff}\
main{flex:1;padding:1.5rem 2rem;max-width:60rem}\
.cards{display:grid;grid-template-columns:repeat(auto-fill,minmax(16rem,1fr));gap:.8rem}\
.card{border:1px solid #ddd;border-left:4px solid #4a6fa5;border-radius:6px;padding:.6rem .9rem}\
.card h3{margin:.1rem 0 .3rem}.card p{margin:.15rem 0}\
.read{color:#2e7d32}.unread{color:#c62828}\
.notice{padding:.6rem .9rem;border-radius:6px;margin-bottom:1rem}\
.success{background:#e8f5e9}.error{background:#ffebee}.warning{background:#fff8e1}.info{background:#e3f2fd}\
.metrics{display:flex;gap:1rem}.metric{border:1px solid #ddd;border-radius:6px;padding:.6rem 1rem}\
.metric strong{display:block;font-size:1.5rem}\
.bar{display:flex;align-items:center;gap:.5rem;margin:.2rem 0}\
.bar span.label{width:8rem;text-align:right}.bar span.fill{background:#4a6fa5;height:1rem}\
label{display:block;margin:.5rem 0 .2rem}input[type=text],input[type=number],select{width:20rem;padding:.3rem}\
button{margin-top:.8rem;padding:.4rem 1rem}";

const NAV: [(&str, &str); 5] = [
    ("/", "View Library"),
    ("/add", "Add Book"),
    ("/remove", "Remove Book"),
    ("/search", "Search Books"),
    ("/stats", "Statistics"),
];

/// Severity of a page banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeKind {
    fn class(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Warning => "warning",
            NoticeKind::Info => "info",
        }
    }
}

/// A one-off banner shown above the page body.
#[derive(Debug, Clone)]
pub(crate) struct Notice {
    pub(crate) kind: NoticeKind,
    pub(crate) text: String,
}

impl Notice {
    pub(crate) fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Escape text for use in element content and quoted attribute values.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wrap `body` in the shared page frame with the sidebar.
fn layout(active: &str, heading: &str, notices: &[Notice], body: &str) -> Html<String> {
    let mut nav = String::new();
    for (href, label) in NAV {
        let class = if href == active { " class=\"active\"" } else { "" };
        let _ = write!(nav, "<a href=\"{href}\"{class}>{label}</a>");
    }

    let mut banners = String::new();
    for notice in notices {
        let _ = write!(
            banners,
            "<div class=\"notice {}\">{}</div>",
            notice.kind.class(),
            escape(&notice.text)
        );
    }

    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
<title>{heading} - Personal Library Manager</title><style>{STYLE}</style></head>\
<body><nav><h2>Menu</h2>{nav}<hr><p><small>Tip: add your favorite books to start building your personal library!</small></p></nav>\
<main><h1>Personal Library Manager</h1><h2>{heading}</h2>{banners}{body}</main></body></html>"
    ))
}

/// One result card built from the record's own fields.
fn book_card(book: &Book) -> String {
    let (class, status) = if book.read {
        ("read", "Read")
    } else {
        ("unread", "Unread")
    };
    format!(
        "<div class=\"card\"><h3>{}</h3><p>by {}</p><p>{} - {}</p><p class=\"{class}\">{status}</p></div>",
        escape(&book.title),
        escape(&book.author),
        book.year,
        escape(&book.genre),
    )
}

fn cards<'a>(books: impl IntoIterator<Item = &'a Book>) -> String {
    let mut html = String::from("<div class=\"cards\">");
    for book in books {
        html.push_str(&book_card(book));
    }
    html.push_str("</div>");
    html
}

pub(crate) fn library_page(books: &[&Book], order: SortOrder, notices: &[Notice]) -> Html<String> {
    if books.is_empty() {
        return layout(
            "/",
            "Your Library",
            notices,
            "<div class=\"notice info\">Your library is empty. Add some books to get started!</div>",
        );
    }

    let mut body = String::from("<form method=\"get\" action=\"/\"><label for=\"sort\">Sort by</label><select id=\"sort\" name=\"sort\" onchange=\"this.form.submit()\">");
    for option in SortOrder::ALL {
        let selected = if option == order { " selected" } else { "" };
        let _ = write!(
            body,
            "<option value=\"{}\"{selected}>{}</option>",
            option.key(),
            option.label()
        );
    }
    body.push_str("</select> <button type=\"submit\">Apply</button></form>");
    let _ = write!(body, "<p>{} {}</p>", books.len(), books_noun(books.len()));
    body.push_str(&cards(books.iter().copied()));
    layout("/", "Your Library", notices, &body)
}

/// Values pre-filled into the add form.
#[derive(Debug, Clone)]
pub(crate) struct AddDefaults {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) genre: String,
    pub(crate) read: bool,
    pub(crate) max_year: i32,
}

pub(crate) fn add_page(values: &AddDefaults, notices: &[Notice]) -> Html<String> {
    let (read_checked, unread_checked) = if values.read {
        (" checked", "")
    } else {
        ("", " checked")
    };
    let body = format!(
        "<form method=\"post\" action=\"/add\">\
<label for=\"title\">Title*</label><input type=\"text\" id=\"title\" name=\"title\" value=\"{}\">\
<label for=\"author\">Author*</label><input type=\"text\" id=\"author\" name=\"author\" value=\"{}\">\
<label for=\"year\">Publication Year*</label><input type=\"number\" id=\"year\" name=\"year\" min=\"1\" max=\"{}\" step=\"1\" value=\"{}\">\
<label for=\"genre\">Genre</label><input type=\"text\" id=\"genre\" name=\"genre\" value=\"{}\">\
<label>Read Status*</label>\
<label><input type=\"radio\" name=\"read\" value=\"yes\"{read_checked}> Read</label>\
<label><input type=\"radio\" name=\"read\" value=\"no\"{unread_checked}> Unread</label>\
<button type=\"submit\">Add Book</button></form>",
        escape(&values.title),
        escape(&values.author),
        values.max_year,
        escape(&values.year),
        escape(&values.genre),
    );
    layout("/add", "Add a New Book", notices, &body)
}

/// Remove page: a title form, the candidates when a title was ambiguous, and
/// a picker over the whole collection.
pub(crate) fn remove_page(
    books: &[Book],
    ambiguous: Option<(&str, &[&Book])>,
    notices: &[Notice],
) -> Html<String> {
    if books.is_empty() {
        return layout(
            "/remove",
            "Remove a Book",
            notices,
            "<div class=\"notice warning\">The library is empty.</div>",
        );
    }

    let mut body = String::new();
    if let Some((title, candidates)) = ambiguous {
        let _ = write!(
            body,
            "<form method=\"post\" action=\"/remove\"><p>Multiple books found with that title. Choose one:</p>\
<input type=\"hidden\" name=\"title\" value=\"{}\">",
            escape(title)
        );
        for (idx, book) in candidates.iter().enumerate() {
            let checked = if idx == 0 { " checked" } else { "" };
            let _ = write!(
                body,
                "<label><input type=\"radio\" name=\"choice\" value=\"{}\"{checked}> {}</label>",
                idx + 1,
                escape(&book.label())
            );
        }
        body.push_str(
            "<button type=\"submit\">Remove Book</button> <a href=\"/remove\">Cancel</a></form><hr>",
        );
    }

    body.push_str(
        "<form method=\"post\" action=\"/remove\"><label for=\"title\">Title</label>\
<input type=\"text\" id=\"title\" name=\"title\"><button type=\"submit\">Remove by Title</button></form><hr>\
<form method=\"post\" action=\"/remove/position\"><label for=\"position\">Select a book to remove</label>\
<select id=\"position\" name=\"position\">",
    );
    for (idx, book) in books.iter().enumerate() {
        let _ = write!(
            body,
            "<option value=\"{idx}\">{}</option>",
            escape(&book.label())
        );
    }
    body.push_str("</select> <button type=\"submit\">Remove Book</button></form>");
    layout("/remove", "Remove a Book", notices, &body)
}

pub(crate) fn search_page(
    field: SearchField,
    term: &str,
    results: Option<&[&Book]>,
    notices: &[Notice],
) -> Html<String> {
    let mut body = String::from("<form method=\"get\" action=\"/search\"><label>Search by</label>");
    for option in SearchField::ALL {
        let checked = if option == field { " checked" } else { "" };
        let value = option.label().to_lowercase();
        let _ = write!(
            body,
            "<label><input type=\"radio\" name=\"field\" value=\"{value}\"{checked}> {}</label>",
            option.label()
        );
    }
    let _ = write!(
        body,
        "<label for=\"term\">Enter {} to search</label><input type=\"text\" id=\"term\" name=\"term\" value=\"{}\">\
<button type=\"submit\">Search</button></form>",
        field.label(),
        escape(term)
    );

    match results {
        Some([]) => body.push_str(
            "<div class=\"notice info\">No books found matching your search.</div>",
        ),
        Some(found) => {
            let _ = write!(
                body,
                "<div class=\"notice success\">Found {} matching book(s):</div>",
                found.len()
            );
            body.push_str(&cards(found.iter().copied()));
        }
        None => {}
    }
    layout("/search", "Search Books", notices, &body)
}

fn bar_rows<K: std::fmt::Display>(rows: impl IntoIterator<Item = (K, usize)>, max: usize) -> String {
    let mut html = String::new();
    for (label, count) in rows {
        let width = if max == 0 { 0 } else { count * 100 / max };
        let _ = write!(
            html,
            "<div class=\"bar\"><span class=\"label\">{}</span><span class=\"fill\" style=\"width:{width}%\"></span><span>{count}</span></div>",
            escape(&label.to_string())
        );
    }
    html
}

pub(crate) fn stats_page(stats: &Statistics, notices: &[Notice]) -> Html<String> {
    if stats.total == 0 {
        return layout(
            "/stats",
            "Library Statistics",
            notices,
            "<div class=\"notice info\">Your library is empty. Add some books to see statistics!</div>",
        );
    }

    let mut body = format!(
        "<div class=\"metrics\">\
<div class=\"metric\">Total Books<strong>{}</strong></div>\
<div class=\"metric\">Books Read<strong>{} ({})</strong></div>\
<div class=\"metric\">Books Unread<strong>{}</strong></div></div>",
        stats.total,
        stats.read,
        stats.percent_label(),
        stats.unread
    );

    body.push_str("<h3>Books by Genre</h3>");
    let genre_max = stats.genres.values().copied().max().unwrap_or(0);
    body.push_str(&bar_rows(
        stats.genres.iter().map(|(genre, count)| (genre.as_str(), *count)),
        genre_max,
    ));
    body.push_str("<ul>");
    for (genre, count) in &stats.genres {
        let _ = write!(
            body,
            "<li>{}: {count} {}</li>",
            escape(genre),
            books_noun(*count)
        );
    }
    body.push_str("</ul>");

    body.push_str("<h3>Publication Years</h3>");
    if let Some((oldest, newest)) = stats.year_range {
        let _ = write!(
            body,
            "<p>Publication years range from {oldest} to {newest}</p>"
        );
    }
    let year_max = stats.years.values().copied().max().unwrap_or(0);
    body.push_str(&bar_rows(
        stats.years.iter().map(|(year, count)| (*year, *count)),
        year_max,
    ));

    body.push_str("<h3>Top Authors</h3><ul>");
    for entry in &stats.top_authors {
        let _ = write!(
            body,
            "<li>{}: {} {}</li>",
            escape(&entry.author),
            entry.books,
            books_noun(entry.books)
        );
    }
    body.push_str("</ul>");
    layout("/stats", "Library Statistics", notices, &body)
}
