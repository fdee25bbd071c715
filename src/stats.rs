//! Read-only aggregation over the collection.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::Book;

/// How many authors the ranking keeps unless configured otherwise.
pub const DEFAULT_TOP_AUTHORS: usize = 5;

/// An author and the number of books recorded for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCount {
    pub author: String,
    pub books: usize,
}

/// Snapshot of the collection's aggregate numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total: usize,
    pub read: usize,
    pub unread: usize,
    /// Share of read books in percent; `0.0` for an empty collection.
    pub percent_read: f64,
    /// Books per genre, iterated in genre-name order.
    pub genres: BTreeMap<String, usize>,
    /// Books per publication year, oldest first.
    pub years: BTreeMap<i32, usize>,
    /// `(oldest, newest)`, only when at least two books span two or more
    /// distinct years.
    pub year_range: Option<(i32, i32)>,
    /// Most prolific authors, highest count first. Ties keep the order in
    /// which the authors first appear in the collection.
    pub top_authors: Vec<AuthorCount>,
}

impl Statistics {
    /// Aggregate `books`, keeping at most `top_n` authors in the ranking.
    pub fn compute(books: &[Book], top_n: usize) -> Self {
        let total = books.len();
        let read = books.iter().filter(|book| book.read).count();
        let percent_read = if total == 0 {
            0.0
        } else {
            read as f64 * 100.0 / total as f64
        };

        let mut genres = BTreeMap::new();
        let mut years = BTreeMap::new();
        for book in books {
            *genres.entry(book.genre.clone()).or_insert(0) += 1;
            *years.entry(book.year).or_insert(0) += 1;
        }

        Self {
            total,
            read,
            unread: total - read,
            percent_read,
            genres,
            year_range: year_range(books),
            years,
            top_authors: rank_authors(books, top_n),
        }
    }

    /// Percent read with one decimal place, e.g. `66.7%`.
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent_read)
    }
}

fn year_range(books: &[Book]) -> Option<(i32, i32)> {
    if books.len() < 2 {
        return None;
    }
    let distinct: BTreeSet<i32> = books.iter().map(|book| book.year).collect();
    if distinct.len() < 2 {
        return None;
    }
    Some((*distinct.first()?, *distinct.last()?))
}

/// Count books per author in first-appearance order, then stable-sort by
/// count so equal counts stay in that order.
fn rank_authors(books: &[Book], top_n: usize) -> Vec<AuthorCount> {
    let mut ranking: Vec<AuthorCount> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for book in books {
        match positions.get(book.author.as_str()) {
            Some(&idx) => ranking[idx].books += 1,
            None => {
                positions.insert(&book.author, ranking.len());
                ranking.push(AuthorCount {
                    author: book.author.clone(),
                    books: 1,
                });
            }
        }
    }

    ranking.sort_by(|a, b| b.books.cmp(&a.books));
    ranking.truncate(top_n);
    ranking
}

/// `book` or `books` depending on `count`.
pub fn books_noun(count: usize) -> &'static str {
    if count == 1 {
        "book"
    } else {
        "books"
    }
}
