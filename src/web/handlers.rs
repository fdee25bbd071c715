use axum::extract::{Query, State};
use axum::response::Html;
use axum::Form;
use chrono::{Datelike, Local};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{LibraryError, StoreError};
use crate::library::Committed;
use crate::models::{Book, BookDraft, SearchField, SortOrder, UNKNOWN_GENRE};

use super::pages::{self, AddDefaults, Notice, NoticeKind};
use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    sort: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AddForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    year: String,
    #[serde(default)]
    genre: String,
    /// `yes` or `no`.
    read: Option<String>,
}

impl AddForm {
    fn is_read(&self) -> bool {
        self.read.as_deref() == Some("yes")
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RemoveForm {
    #[serde(default)]
    title: String,
    /// 1-based choice among books sharing the title; `0` cancels.
    choice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PositionForm {
    position: usize,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    field: SearchField,
    term: Option<String>,
}

/// Load warning (first page only) followed by any page-specific notices.
fn notices(state: &AppState, extra: impl IntoIterator<Item = Notice>) -> Vec<Notice> {
    state
        .take_load_warning()
        .map(|text| Notice::new(NoticeKind::Warning, text))
        .into_iter()
        .chain(extra)
        .collect()
}

fn save_notice(save_error: Option<StoreError>) -> Option<Notice> {
    save_error.map(|err| {
        warn!("library change kept in memory only: {err}");
        Notice::new(
            NoticeKind::Error,
            format!("Error: Could not save library to file ({err})."),
        )
    })
}

fn removal_notices(committed: Committed<Book>) -> Vec<Notice> {
    let book = committed.value;
    let mut out = vec![Notice::new(
        NoticeKind::Success,
        format!("Removed: {} by {}", book.title, book.author),
    )];
    out.extend(save_notice(committed.save_error));
    out
}

fn blank_add_form(max_year: i32) -> AddDefaults {
    let year = Local::now().year().clamp(1, max_year);
    AddDefaults {
        title: String::new(),
        author: String::new(),
        year: year.to_string(),
        genre: UNKNOWN_GENRE.to_string(),
        read: true,
        max_year,
    }
}

pub(crate) async fn library_view(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Html<String> {
    let order = query.sort.unwrap_or_default();
    let notices = notices(&state, None);
    let library = state.library();
    pages::library_page(&library.sorted(order), order, &notices)
}

pub(crate) async fn add_form(State(state): State<AppState>) -> Html<String> {
    let notices = notices(&state, None);
    let max_year = state.library().rules().max_year;
    pages::add_page(&blank_add_form(max_year), &notices)
}

pub(crate) async fn add_book(
    State(state): State<AppState>,
    Form(form): Form<AddForm>,
) -> Html<String> {
    let draft = BookDraft {
        title: form.title.clone(),
        author: form.author.clone(),
        year: form.year.clone(),
        genre: form.genre.clone(),
        read: form.is_read(),
    };

    let mut library = state.library();
    let max_year = library.rules().max_year;
    match library.add(&draft) {
        Ok(committed) => {
            drop(library);
            let book = committed.value;
            let mut extra = vec![Notice::new(
                NoticeKind::Success,
                format!("Added '{}' to your library!", book.title),
            )];
            extra.extend(save_notice(committed.save_error));
            pages::add_page(&blank_add_form(max_year), &notices(&state, extra))
        }
        Err(err) => {
            drop(library);
            debug!("add rejected: {err}");
            let message = match err {
                LibraryError::MissingField(_) => "Title and Author are required fields!".to_string(),
                other => other.to_string(),
            };
            let values = AddDefaults {
                title: form.title,
                author: form.author,
                year: form.year,
                genre: form.genre,
                read: draft.read,
                max_year,
            };
            pages::add_page(
                &values,
                &notices(&state, [Notice::new(NoticeKind::Error, message)]),
            )
        }
    }
}

pub(crate) async fn remove_form(State(state): State<AppState>) -> Html<String> {
    let notices = notices(&state, None);
    let library = state.library();
    pages::remove_page(library.books(), None, &notices)
}

pub(crate) async fn remove_book(
    State(state): State<AppState>,
    Form(form): Form<RemoveForm>,
) -> Html<String> {
    let choice = match form.choice.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<usize>() {
            Ok(0) => {
                let notices = notices(&state, [Notice::new(NoticeKind::Info, "Operation cancelled.")]);
                let library = state.library();
                return pages::remove_page(library.books(), None, &notices);
            }
            Ok(choice) => Some(choice),
            Err(_) => {
                let notices = notices(
                    &state,
                    [Notice::new(NoticeKind::Error, "Please enter a valid number.")],
                );
                let library = state.library();
                let candidates = library.matches_for_title(&form.title);
                return pages::remove_page(
                    library.books(),
                    Some((form.title.trim(), candidates.as_slice())),
                    &notices,
                );
            }
        },
    };

    let mut library = state.library();
    match library.remove(&form.title, choice) {
        Ok(committed) => {
            drop(library);
            let notices = notices(&state, removal_notices(committed));
            let library = state.library();
            pages::remove_page(library.books(), None, &notices)
        }
        Err(err @ (LibraryError::Ambiguous { .. } | LibraryError::InvalidSelection { .. })) => {
            drop(library);
            let notice = match err {
                LibraryError::Ambiguous { .. } => Notice::new(
                    NoticeKind::Info,
                    "Multiple books found with that title.",
                ),
                other => Notice::new(NoticeKind::Error, other.to_string()),
            };
            let notices = notices(&state, [notice]);
            let library = state.library();
            let candidates = library.matches_for_title(&form.title);
            pages::remove_page(
                library.books(),
                Some((form.title.trim(), candidates.as_slice())),
                &notices,
            )
        }
        Err(err) => {
            drop(library);
            let notices = notices(&state, [Notice::new(NoticeKind::Error, err.to_string())]);
            let library = state.library();
            pages::remove_page(library.books(), None, &notices)
        }
    }
}

pub(crate) async fn remove_position(
    State(state): State<AppState>,
    Form(form): Form<PositionForm>,
) -> Html<String> {
    let outcome = state.library().remove_at(form.position);
    let extra = match outcome {
        Ok(committed) => removal_notices(committed),
        Err(err) => vec![Notice::new(NoticeKind::Error, err.to_string())],
    };
    let notices = notices(&state, extra);
    let library = state.library();
    pages::remove_page(library.books(), None, &notices)
}

pub(crate) async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Html<String> {
    let term = query.term.unwrap_or_default();
    let mut extra = Vec::new();
    let library = state.library();

    if library.is_empty() {
        extra.push(Notice::new(NoticeKind::Warning, "The library is empty."));
        drop(library);
        return pages::search_page(query.field, &term, None, &notices(&state, extra));
    }

    // A bare GET /search just shows the form.
    if term.trim().is_empty() {
        drop(library);
        return pages::search_page(query.field, &term, None, &notices(&state, extra));
    }

    let results = library.search(query.field, &term).unwrap_or_default();
    let page_notices = notices(&state, extra);
    pages::search_page(query.field, &term, Some(results.as_slice()), &page_notices)
}

pub(crate) async fn statistics(State(state): State<AppState>) -> Html<String> {
    let notices = notices(&state, None);
    let stats = state.library().statistics();
    pages::stats_page(&stats, &notices)
}
