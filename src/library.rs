//! The in-memory collection and every record operation the front ends call.
//!
//! `Library` owns the books and the store they came from. Mutating operations
//! flush the whole collection right away; reads never touch the disk.

use tracing::info;

use crate::config::Rules;
use crate::error::{LibraryError, StoreError};
use crate::models::{Book, BookDraft, SearchField, SortOrder};
use crate::stats::Statistics;
use crate::store::LibraryStore;

/// Result of a mutating operation that did take effect in memory.
///
/// `save_error` is set when flushing to disk failed. The change is kept in
/// memory so a later save (for instance on exit) can retry it.
#[derive(Debug)]
#[must_use]
pub struct Committed<T> {
    pub value: T,
    pub save_error: Option<StoreError>,
}

/// A book collection bound to its backing file.
#[derive(Debug)]
pub struct Library {
    books: Vec<Book>,
    store: LibraryStore,
    rules: Rules,
}

impl Library {
    /// Load the collection from `store`. A load warning is handed back next to
    /// the (then empty) library instead of failing.
    pub fn open(store: LibraryStore, rules: Rules) -> (Self, Option<StoreError>) {
        let (books, warning) = store.load();
        info!(path = %store.path().display(), books = books.len(), "library opened");
        (Self { books, store, rules }, warning)
    }

    /// Build a library around books that are already in memory.
    pub fn with_books(books: Vec<Book>, store: LibraryStore, rules: Rules) -> Self {
        Self { books, store, rules }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn store(&self) -> &LibraryStore {
        &self.store
    }

    /// Validate `draft`, append it and persist.
    pub fn add(&mut self, draft: &BookDraft) -> Result<Committed<Book>, LibraryError> {
        let book = draft.validate(self.rules.max_year)?;
        self.books.push(book.clone());
        info!(title = %book.title, author = %book.author, "book added");
        Ok(self.commit(book))
    }

    /// Books whose title equals `title`, ignoring case and surrounding
    /// whitespace, in collection order. These are the candidates a caller
    /// lists when [`Library::remove`] reports [`LibraryError::Ambiguous`].
    pub fn matches_for_title(&self, title: &str) -> Vec<&Book> {
        self.match_positions(title)
            .into_iter()
            .map(|idx| &self.books[idx])
            .collect()
    }

    fn match_positions(&self, title: &str) -> Vec<usize> {
        let wanted = title.trim().to_lowercase();
        self.books
            .iter()
            .enumerate()
            .filter(|(_, book)| book.title.to_lowercase() == wanted)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Remove a book by title.
    ///
    /// `choice` is the 1-based position among the matching books. It may be
    /// omitted when exactly one book matches; with several matches and no
    /// choice the call fails with [`LibraryError::Ambiguous`] and nothing
    /// changes.
    pub fn remove(
        &mut self,
        title: &str,
        choice: Option<usize>,
    ) -> Result<Committed<Book>, LibraryError> {
        let positions = self.match_positions(title);
        let count = positions.len();

        let idx = match (count, choice) {
            (0, _) => return Err(LibraryError::NotFound(title.trim().to_string())),
            (1, None) => positions[0],
            (_, None) => {
                return Err(LibraryError::Ambiguous {
                    title: title.trim().to_string(),
                    count,
                })
            }
            (_, Some(choice)) => {
                if choice == 0 || choice > count {
                    return Err(LibraryError::InvalidSelection { choice, count });
                }
                positions[choice - 1]
            }
        };

        Ok(self.take(idx))
    }

    /// Remove the book at a 0-based position in collection order.
    pub fn remove_at(&mut self, position: usize) -> Result<Committed<Book>, LibraryError> {
        if position >= self.books.len() {
            return Err(LibraryError::InvalidSelection {
                choice: position + 1,
                count: self.books.len(),
            });
        }
        Ok(self.take(position))
    }

    fn take(&mut self, idx: usize) -> Committed<Book> {
        let removed = self.books.remove(idx);
        info!(title = %removed.title, author = %removed.author, "book removed");
        self.commit(removed)
    }

    /// Case-insensitive substring search on one field, in collection order.
    pub fn search(&self, field: SearchField, term: &str) -> Result<Vec<&Book>, LibraryError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Err(LibraryError::EmptySearchTerm);
        }
        Ok(self
            .books
            .iter()
            .filter(|book| field.value_of(book).to_lowercase().contains(&needle))
            .collect())
    }

    /// A sorted view of the collection. The collection itself keeps its order.
    pub fn sorted(&self, order: SortOrder) -> Vec<&Book> {
        let mut view: Vec<&Book> = self.books.iter().collect();
        match order {
            SortOrder::Title => view.sort_by_cached_key(|book| book.title.to_lowercase()),
            SortOrder::Author => view.sort_by_cached_key(|book| {
                (book.author.to_lowercase(), book.title.to_lowercase())
            }),
            SortOrder::Newest => view.sort_by(|a, b| b.year.cmp(&a.year)),
            SortOrder::Oldest => view.sort_by_key(|book| book.year),
        }
        view
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::compute(&self.books, self.rules.top_authors)
    }

    /// Distinct authors in first-appearance order, for autocompletion.
    ///
    /// Authors are grouped by their exact stored spelling, the same rule the
    /// statistics ranking uses.
    pub fn authors(&self) -> Vec<String> {
        let mut authors: Vec<String> = Vec::new();
        for book in &self.books {
            if !authors.contains(&book.author) {
                authors.push(book.author.clone());
            }
        }
        authors
    }

    /// Write the whole collection to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.store.save(&self.books)
    }

    fn commit<T>(&self, value: T) -> Committed<T> {
        Committed {
            value,
            save_error: self.flush().err(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn library_in(dir: &TempDir) -> Library {
        let store = LibraryStore::new(dir.path().join("library.json"));
        Library::open(store, Rules::default()).0
    }

    fn draft(title: &str, author: &str, year: i32, genre: &str) -> BookDraft {
        BookDraft {
            title: title.into(),
            author: author.into(),
            year: year.to_string(),
            genre: genre.into(),
            read: false,
        }
    }

    fn add(library: &mut Library, title: &str, author: &str, year: i32, genre: &str) {
        let committed = library
            .add(&draft(title, author, year, genre))
            .expect("add book");
        assert!(committed.save_error.is_none());
    }

    #[test]
    fn add_appends_and_persists() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);

        let committed = library
            .add(&draft("Dune", "Frank Herbert", 1965, "Sci-Fi"))
            .expect("add");

        assert_eq!(committed.value.title, "Dune");
        assert_eq!(library.len(), 1);
        let (on_disk, _) = library.store().load();
        assert_eq!(on_disk, library.books());
    }

    #[test]
    fn add_with_blank_author_leaves_file_untouched() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "Dune", "Frank Herbert", 1965, "Sci-Fi");
        let before = std::fs::read_to_string(library.store().path()).expect("read");

        let err = library
            .add(&draft("Emma", "  ", 1815, "Classic"))
            .unwrap_err();

        assert_eq!(err, LibraryError::MissingField("Author"));
        assert_eq!(library.len(), 1);
        let after = std::fs::read_to_string(library.store().path()).expect("read");
        assert_eq!(before, after);
    }

    #[test]
    fn add_respects_configured_year_ceiling() {
        let dir = TempDir::new().expect("temp dir");
        let store = LibraryStore::new(dir.path().join("library.json"));
        let rules = Rules {
            max_year: 2000,
            ..Rules::default()
        };
        let (mut library, _) = Library::open(store, rules);

        let err = library
            .add(&draft("Future", "Someone", 2001, ""))
            .unwrap_err();
        assert!(matches!(err, LibraryError::InvalidYear { max: 2000, .. }));
    }

    #[test]
    fn failed_save_keeps_book_in_memory() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("library.json");
        std::fs::create_dir(&path).expect("mkdir");
        std::fs::write(path.join("blocker"), "x").expect("write");
        let mut library = Library::with_books(Vec::new(), LibraryStore::new(&path), Rules::default());

        let committed = library
            .add(&draft("Dune", "Frank Herbert", 1965, "Sci-Fi"))
            .expect("validation passes");

        assert!(committed.save_error.is_some());
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn remove_single_match_ignores_case() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "Dune", "Frank Herbert", 1965, "Sci-Fi");
        add(&mut library, "Emma", "Jane Austen", 1815, "Classic");

        let removed = library.remove("  dUNE ", None).expect("remove");

        assert_eq!(removed.value.title, "Dune");
        assert_eq!(library.len(), 1);
        let (on_disk, _) = library.store().load();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].title, "Emma");
    }

    #[test]
    fn remove_unknown_title_is_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "Dune", "Frank Herbert", 1965, "Sci-Fi");

        let err = library.remove("Dune Messiah", None).unwrap_err();
        assert_eq!(err, LibraryError::NotFound("Dune Messiah".into()));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn remove_duplicates_requires_a_choice() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "Persuasion", "Jane Austen", 1817, "Classic");
        add(&mut library, "Solaris", "Stanislaw Lem", 1961, "Sci-Fi");
        add(&mut library, "persuasion", "Someone Else", 2001, "Romance");
        add(&mut library, "PERSUASION", "Third Author", 2015, "Essay");

        let err = library.remove("Persuasion", None).unwrap_err();
        assert_eq!(
            err,
            LibraryError::Ambiguous {
                title: "Persuasion".into(),
                count: 3
            }
        );

        let candidates: Vec<String> = library
            .matches_for_title("persuasion")
            .iter()
            .map(|book| book.author.clone())
            .collect();
        assert_eq!(candidates, vec!["Jane Austen", "Someone Else", "Third Author"]);

        let err = library.remove("Persuasion", Some(4)).unwrap_err();
        assert_eq!(err, LibraryError::InvalidSelection { choice: 4, count: 3 });
        assert_eq!(library.len(), 4);

        let removed = library.remove("Persuasion", Some(2)).expect("remove");
        assert_eq!(removed.value.author, "Someone Else");
        let remaining: Vec<&str> = library.books().iter().map(|b| b.author.as_str()).collect();
        assert_eq!(remaining, vec!["Jane Austen", "Stanislaw Lem", "Third Author"]);
    }

    #[test]
    fn remove_at_checks_bounds() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "Dune", "Frank Herbert", 1965, "Sci-Fi");

        assert!(library.remove_at(1).is_err());
        let removed = library.remove_at(0).expect("remove");
        assert_eq!(removed.value.title, "Dune");
        assert!(library.is_empty());
    }

    #[test]
    fn search_genre_is_case_insensitive_and_ordered() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "The Hobbit", "J. R. R. Tolkien", 1937, "Fantasy");
        add(&mut library, "Neuromancer", "William Gibson", 1984, "Sci-Fi");
        add(&mut library, "Earthsea", "Ursula K. Le Guin", 1968, "fantasy");

        let titles: Vec<&str> = library
            .search(SearchField::Genre, "Fantasy")
            .expect("search")
            .iter()
            .map(|book| book.title.as_str())
            .collect();
        assert_eq!(titles, vec!["The Hobbit", "Earthsea"]);

        let by_author = library.search(SearchField::Author, "gib").expect("search");
        assert_eq!(by_author.len(), 1);
    }

    #[test]
    fn search_rejects_blank_term() {
        let dir = TempDir::new().expect("temp dir");
        let library = library_in(&dir);
        assert_eq!(
            library.search(SearchField::Title, "   ").unwrap_err(),
            LibraryError::EmptySearchTerm
        );
    }

    #[test]
    fn sorted_views_leave_collection_order_alone() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "b", "Zed", 2001, "");
        add(&mut library, "A", "amy", 1999, "");
        add(&mut library, "c", "Amy", 2020, "");

        let years = |order| -> Vec<i32> {
            library.sorted(order).iter().map(|book| book.year).collect()
        };
        assert_eq!(years(SortOrder::Oldest), vec![1999, 2001, 2020]);
        assert_eq!(years(SortOrder::Newest), vec![2020, 2001, 1999]);
        assert_eq!(years(SortOrder::Title), vec![1999, 2001, 2020]);
        assert_eq!(years(SortOrder::Author), vec![1999, 2020, 2001]);

        let original: Vec<i32> = library.books().iter().map(|book| book.year).collect();
        assert_eq!(original, vec![2001, 1999, 2020]);
    }

    #[test]
    fn authors_are_distinct_in_first_appearance_order() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "A", "Iain Banks", 1987, "");
        add(&mut library, "B", "Ann Leckie", 2013, "");
        add(&mut library, "C", "Iain Banks", 1990, "");
        assert_eq!(library.authors(), vec!["Iain Banks", "Ann Leckie"]);
    }

    #[test]
    fn authors_group_like_the_ranking() {
        let dir = TempDir::new().expect("temp dir");
        let mut library = library_in(&dir);
        add(&mut library, "A", "Émile Zola", 1885, "");
        add(&mut library, "B", "ÉMILE ZOLA", 1877, "");

        let ranked: Vec<String> = library
            .statistics()
            .top_authors
            .into_iter()
            .map(|entry| entry.author)
            .collect();
        assert_eq!(library.authors(), ranked);
    }
}
