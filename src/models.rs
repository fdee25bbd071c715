//! Domain models shared by the store, the record operations and both front
//! ends. `Book` mirrors one entry of the JSON library file field for field so
//! serde can read and write it without an intermediate representation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// Genre stored when the user leaves the genre blank.
pub const UNKNOWN_GENRE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One book in the collection. There is no identifier: removal and search work
/// on the fields directly, so duplicate titles are allowed.
pub struct Book {
    /// Display title. Case is preserved; comparisons lowercase it.
    pub title: String,
    pub author: String,
    /// Publication year, always within `1..=max_year` when added through
    /// [`BookDraft::validate`].
    pub year: i32,
    pub genre: String,
    /// Whether the book has been read.
    pub read: bool,
}

impl Book {
    /// `Title by Author (Year)`, used wherever several candidates have to be
    /// told apart (removal choosers, select boxes).
    pub fn label(&self) -> String {
        format!("{} by {} ({})", self.title, self.author, self.year)
    }

    /// Human-readable read flag.
    pub fn status(&self) -> &'static str {
        if self.read {
            "Read"
        } else {
            "Unread"
        }
    }
}

impl fmt::Display for Book {
    /// `Title by Author (Year) - Genre - Status`, the one-line listing format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} ({}) - {} - {}",
            self.title,
            self.author,
            self.year,
            self.genre,
            self.status()
        )
    }
}

/// Raw user input for a new book. Both front ends collect text, so the year
/// stays a string until [`BookDraft::validate`] parses it; that keeps the
/// "non-numeric year" rule in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub year: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub read: bool,
}

impl BookDraft {
    /// Check the required fields and the year bound, returning the normalized
    /// record. Text fields are trimmed and a blank genre becomes `Unknown`.
    pub fn validate(&self, max_year: i32) -> Result<Book, LibraryError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(LibraryError::MissingField("Title"));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(LibraryError::MissingField("Author"));
        }

        let year_raw = self.year.trim();
        let year = year_raw
            .parse::<i32>()
            .ok()
            .filter(|year| (1..=max_year).contains(year))
            .ok_or_else(|| LibraryError::InvalidYear {
                input: year_raw.to_string(),
                max: max_year,
            })?;

        let genre = match self.genre.trim() {
            "" => UNKNOWN_GENRE,
            genre => genre,
        };

        Ok(Book {
            title: title.to_string(),
            author: author.to_string(),
            year,
            genre: genre.to_string(),
            read: self.read,
        })
    }
}

/// Field a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    #[default]
    Title,
    Author,
    Genre,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [SearchField::Title, SearchField::Author, SearchField::Genre];

    pub fn label(self) -> &'static str {
        match self {
            SearchField::Title => "Title",
            SearchField::Author => "Author",
            SearchField::Genre => "Genre",
        }
    }

    /// Borrow the matching field from a book.
    pub fn value_of(self, book: &Book) -> &str {
        match self {
            SearchField::Title => &book.title,
            SearchField::Author => &book.author,
            SearchField::Genre => &book.genre,
        }
    }

    /// Cycle Title -> Author -> Genre -> Title.
    pub fn next(self) -> Self {
        match self {
            SearchField::Title => SearchField::Author,
            SearchField::Author => SearchField::Genre,
            SearchField::Genre => SearchField::Title,
        }
    }
}

/// Presentation orders offered by the listing views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Title A-Z.
    #[default]
    Title,
    /// Author A-Z, then title.
    Author,
    /// Year, newest first.
    Newest,
    /// Year, oldest first.
    Oldest,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Title,
        SortOrder::Author,
        SortOrder::Newest,
        SortOrder::Oldest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Title => "Title (A-Z)",
            SortOrder::Author => "Author (A-Z)",
            SortOrder::Newest => "Year (Newest First)",
            SortOrder::Oldest => "Year (Oldest First)",
        }
    }

    /// Query-string value used by the web front end.
    pub fn key(self) -> &'static str {
        match self {
            SortOrder::Title => "title",
            SortOrder::Author => "author",
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortOrder::Title => SortOrder::Author,
            SortOrder::Author => SortOrder::Newest,
            SortOrder::Newest => SortOrder::Oldest,
            SortOrder::Oldest => SortOrder::Title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, author: &str, year: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            year: year.to_string(),
            genre: String::new(),
            read: false,
        }
    }

    #[test]
    fn validate_trims_and_defaults_genre() {
        let book = draft("  Dune ", " Frank Herbert", "1965")
            .validate(2100)
            .expect("valid draft");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.year, 1965);
        assert_eq!(book.genre, UNKNOWN_GENRE);
    }

    #[test]
    fn validate_rejects_blank_title_before_author() {
        let err = draft("   ", "", "1965").validate(2100).unwrap_err();
        assert_eq!(err, LibraryError::MissingField("Title"));

        let err = draft("Dune", " ", "1965").validate(2100).unwrap_err();
        assert_eq!(err, LibraryError::MissingField("Author"));
    }

    #[test]
    fn validate_rejects_years_outside_bound() {
        for year in ["0", "-5", "2101", "nineteen", ""] {
            let err = draft("Dune", "Frank Herbert", year)
                .validate(2100)
                .unwrap_err();
            assert!(
                matches!(err, LibraryError::InvalidYear { max: 2100, .. }),
                "{year} should be rejected"
            );
        }
        assert!(draft("Dune", "Frank Herbert", "2100").validate(2100).is_ok());
        assert!(draft("Dune", "Frank Herbert", "1").validate(2100).is_ok());
    }

    #[test]
    fn display_formats_listing_line() {
        let book = Book {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            year: 1965,
            genre: "Sci-Fi".into(),
            read: true,
        };
        assert_eq!(
            book.to_string(),
            "Dune by Frank Herbert (1965) - Sci-Fi - Read"
        );
        assert_eq!(book.label(), "Dune by Frank Herbert (1965)");
    }

    #[test]
    fn book_json_uses_stable_field_names() {
        let json = r#"{"title":"Emma","author":"Jane Austen","year":1815,"genre":"Classic","read":false}"#;
        let book: Book = serde_json::from_str(json).expect("parse");
        assert_eq!(book.author, "Jane Austen");
        assert!(serde_json::from_str::<Book>(r#"{"title":"Emma","author":"Jane Austen","year":1815}"#).is_err());
    }
}
