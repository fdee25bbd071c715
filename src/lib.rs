//! Personal library manager: a book collection kept in one JSON file, with a
//! terminal front end and a small web front end over the same operations.
pub mod config;
pub mod error;
pub mod library;
pub mod models;
pub mod stats;
pub mod store;
pub mod ui;
pub mod web;

pub use config::{Rules, Settings};
pub use error::{ConfigError, LibraryError, StoreError};
pub use library::{Committed, Library};
pub use models::{Book, BookDraft, SearchField, SortOrder};
pub use stats::Statistics;
pub use store::LibraryStore;

/// The interactive terminal entry point and state container.
pub use ui::{run_app, App};
