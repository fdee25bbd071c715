//! JSON file persistence for the book collection.
//!
//! The whole collection is read and written as one pretty-printed JSON array.
//! Saves go through a temporary file in the target directory followed by a
//! rename, so an interrupted write never leaves a half-written library behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::models::Book;

/// Suffix of the copy kept when an unreadable library file is found.
const CORRUPT_SUFFIX: &str = "corrupt";

/// Reads and writes the library file at a fixed path.
#[derive(Debug, Clone)]
pub struct LibraryStore {
    path: PathBuf,
}

impl LibraryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection.
    ///
    /// A missing file yields an empty collection with no warning. A file that
    /// cannot be read or parsed also yields an empty collection, together with
    /// the error as a warning for the caller to show. Loading never fails.
    pub fn load(&self) -> (Vec<Book>, Option<StoreError>) {
        match self.try_load() {
            Ok(books) => {
                debug!(path = %self.path.display(), count = books.len(), "library loaded");
                (books, None)
            }
            Err(err) => {
                warn!(path = %self.path.display(), "starting with an empty library: {err}");
                if matches!(err, StoreError::Parse { .. }) {
                    self.keep_corrupt_copy();
                }
                (Vec::new(), Some(err))
            }
        }
    }

    fn try_load(&self) -> Result<Vec<Book>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no library file yet");
            return Ok(Vec::new());
        }

        // Raw bytes, so invalid UTF-8 surfaces as a parse error like any other
        // malformed content.
        let contents = fs::read(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the library file with `books`.
    ///
    /// On failure the previous file is left as it was.
    pub fn save(&self, books: &[Book]) -> Result<(), StoreError> {
        let result = self.write_atomic(books);
        match &result {
            Ok(()) => debug!(path = %self.path.display(), count = books.len(), "library saved"),
            Err(err) => error!(path = %self.path.display(), "save failed: {err}"),
        }
        result
    }

    fn write_atomic(&self, books: &[Book]) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let json = encode(books)?;

        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(&json).map_err(write_err)?;
        temp.flush().map_err(write_err)?;
        temp.persist(&self.path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }

    /// Directory the temporary file is created in. A bare file name lives in
    /// the working directory.
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Best-effort copy of an unparsable file so the next save does not
    /// destroy the only copy of the user's data.
    fn keep_corrupt_copy(&self) {
        let backup = self.corrupt_copy_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => warn!(backup = %backup.display(), "kept a copy of the unreadable library"),
            Err(err) => warn!(backup = %backup.display(), "could not copy unreadable library: {err}"),
        }
    }

    /// `library.json` -> `library.json.corrupt`.
    pub fn corrupt_copy_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(CORRUPT_SUFFIX);
        PathBuf::from(name)
    }
}

/// Four-space indented JSON with the fields in declaration order.
fn encode(books: &[Book]) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    books
        .serialize(&mut serializer)
        .map_err(StoreError::Encode)?;
    buf.push(b'\n');
    Ok(buf)
}
