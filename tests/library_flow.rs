use std::fs;

use personal_library::{
    BookDraft, Library, LibraryError, LibraryStore, Rules, SearchField, SortOrder,
};
use tempfile::TempDir;

fn draft(title: &str, author: &str, year: &str, genre: &str, read: bool) -> BookDraft {
    BookDraft {
        title: title.to_string(),
        author: author.to_string(),
        year: year.to_string(),
        genre: genre.to_string(),
        read,
    }
}

fn open(dir: &TempDir) -> Library {
    let store = LibraryStore::new(dir.path().join("library.json"));
    let (library, warning) = Library::open(store, Rules::default());
    assert!(warning.is_none());
    library
}

fn add(library: &mut Library, title: &str, author: &str, year: &str, genre: &str, read: bool) {
    let committed = library
        .add(&draft(title, author, year, genre, read))
        .expect("valid book");
    assert!(committed.save_error.is_none());
}

#[test]
fn dune_scenario() {
    let dir = TempDir::new().expect("temp dir");
    let mut library = open(&dir);
    add(&mut library, "Dune", "Frank Herbert", "1965", "Sci-Fi", true);
    add(&mut library, "Emma", "Jane Austen", "1815", "", false);
    add(&mut library, "Dune Messiah", "Frank Herbert", "1969", "Sci-Fi", true);

    let stats = library.statistics();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.read, 2);
    assert_eq!(stats.percent_label(), "66.7%");
    assert_eq!(stats.genres.get("Sci-Fi"), Some(&2));
    assert_eq!(stats.genres.get("Unknown"), Some(&1));
    assert_eq!(stats.year_range, Some((1815, 1969)));
    assert_eq!(stats.top_authors[0].author, "Frank Herbert");
    assert_eq!(stats.top_authors[0].books, 2);
    assert_eq!(stats.top_authors[1].author, "Jane Austen");

    let reopened = open(&dir);
    assert_eq!(reopened.books(), library.books());
}

#[test]
fn rejected_add_leaves_file_untouched() {
    let dir = TempDir::new().expect("temp dir");
    let mut library = open(&dir);
    add(&mut library, "Dune", "Frank Herbert", "1965", "Sci-Fi", true);
    let before = fs::read(dir.path().join("library.json")).expect("read");

    assert_eq!(
        library.add(&draft("", "Someone", "2000", "", false)).err(),
        Some(LibraryError::MissingField("Title"))
    );
    assert_eq!(
        library.add(&draft("Title", "   ", "2000", "", false)).err(),
        Some(LibraryError::MissingField("Author"))
    );

    let after = fs::read(dir.path().join("library.json")).expect("read");
    assert_eq!(before, after);
    assert_eq!(library.len(), 1);
}

#[test]
fn duplicate_titles_need_a_choice() {
    let dir = TempDir::new().expect("temp dir");
    let mut library = open(&dir);
    add(&mut library, "Persuasion", "Jane Austen", "1817", "Romance", true);
    add(&mut library, "Persuasion", "Second Author", "1990", "Drama", false);
    add(&mut library, "Persuasion", "Third Author", "2010", "Drama", false);

    assert!(matches!(
        library.remove("PERSUASION", None),
        Err(LibraryError::Ambiguous { count: 3, .. })
    ));

    let removed = library.remove("persuasion", Some(2)).expect("choice 2");
    assert_eq!(removed.value.author, "Second Author");

    let reopened = open(&dir);
    let authors: Vec<&str> = reopened.books().iter().map(|b| b.author.as_str()).collect();
    assert_eq!(authors, vec!["Jane Austen", "Third Author"]);
}

#[test]
fn single_match_removal_persists() {
    let dir = TempDir::new().expect("temp dir");
    let mut library = open(&dir);
    add(&mut library, "Dune", "Frank Herbert", "1965", "Sci-Fi", true);
    add(&mut library, "Emma", "Jane Austen", "1815", "Romance", false);

    library.remove(" emma ", None).expect("single match");
    assert_eq!(open(&dir).len(), 1);

    assert!(matches!(
        library.remove("Missing", None),
        Err(LibraryError::NotFound(_))
    ));
}

#[test]
fn search_and_sort_leave_collection_order_alone() {
    let dir = TempDir::new().expect("temp dir");
    let mut library = open(&dir);
    add(&mut library, "B", "X", "2001", "Fantasy", false);
    add(&mut library, "A", "Y", "1999", "fantasy", false);
    add(&mut library, "C", "Z", "2020", "Sci-Fi", false);

    let found = library.search(SearchField::Genre, "Fantasy").expect("search");
    let titles: Vec<&str> = found.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "A"]);

    let years: Vec<i32> = library
        .sorted(SortOrder::Oldest)
        .iter()
        .map(|b| b.year)
        .collect();
    assert_eq!(years, vec![1999, 2001, 2020]);

    let stored: Vec<i32> = library.books().iter().map(|b| b.year).collect();
    assert_eq!(stored, vec![2001, 1999, 2020]);
}

#[test]
fn empty_library_statistics() {
    let dir = TempDir::new().expect("temp dir");
    let stats = open(&dir).statistics();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.read + stats.unread, stats.total);
    assert_eq!(stats.percent_label(), "0.0%");
    assert!(stats.year_range.is_none());
}
