//! Error types shared by the record operations, the JSON store, and the
//! settings loader. Front ends surface these messages verbatim, so the
//! `Display` strings are written for people rather than logs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Problems raised by record operations. None of them mutate the collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LibraryError {
    /// A required field (title or author) was blank after trimming.
    #[error("{0} is required.")]
    MissingField(&'static str),
    #[error("Year must be a whole number between 1 and {max} (got \"{input}\").")]
    InvalidYear { input: String, max: i32 },
    #[error("Search term cannot be empty.")]
    EmptySearchTerm,
    #[error("No book found with the title \"{0}\".")]
    NotFound(String),
    /// Several books share the title; the caller must pick one of them.
    #[error("{count} books are titled \"{title}\". Choose which one to remove.")]
    Ambiguous { title: String, count: usize },
    #[error("Choice {choice} is out of range (1-{count}).")]
    InvalidSelection { choice: usize, count: usize },
}

/// Failures while reading or writing the library file. All of them are
/// recoverable: loading degrades to an empty collection and a failed save
/// leaves the in-memory collection untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a valid library file: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode the library: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("could not create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not save library to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Settings file problems. These are reported before any front end starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {} is invalid: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
