//! Book catalog: CSV sources, cleaning pipeline and the cleaned records.

mod load;
mod preprocess;

pub use load::{load_catalog, RawBookRow};
pub use preprocess::preprocess;

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Columns every joined catalog must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Book Name",
    "Author",
    "Rating",
    "Number of Reviews",
    "Price",
    "Description",
    "Ranks and Genre",
];

/// Fallback text for books without a description.
pub const MISSING_DESCRIPTION: &str = "No description available";

/// Fallback genre for books without rank/genre information.
pub const MISSING_GENRE: &str = "General";

/// Substitute document for rows whose text fields are all blank.
/// The vectorizer must never receive an empty document.
pub const EMPTY_METADATA_FALLBACK: &str = "general audiobook";

/// Errors fatal to a catalog load/fit. The previous published snapshot,
/// if any, stays usable when one of these is raised.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("catalog source not found: {0}")]
    MissingSource(PathBuf),

    #[error("required column '{column}' is missing from the joined catalog sources")]
    MissingColumn { column: String },

    #[error("catalog has no rows after cleaning")]
    EmptyCatalog,

    #[error("every metadata document is empty; refusing to fit on a degenerate corpus")]
    EmptyCorpus,

    #[error("failed to read catalog source: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of the cleaned working catalog.
///
/// Immutable after preprocessing, except for `cluster` which is written
/// exactly once by the model fit.
#[derive(Debug, Clone, Serialize)]
pub struct BookRecord {
    pub book_name: String,
    pub author: String,
    pub rating: f64,
    pub number_of_reviews: f64,
    pub price: f64,
    pub description: String,
    pub ranks_and_genre: String,
    /// Concatenated, case-normalized text used as vectorizer input.
    pub metadata: String,
    /// Bayesian-average of the rating against review-count evidence.
    pub confidence_score: f64,
    pub cluster: usize,
}

/// The cleaned catalog. Row index `i` is the record's identity for the
/// lifetime of a fit: the vector matrix built later is aligned by position
/// and any reordering would invalidate it.
#[derive(Debug, Clone)]
pub struct CleanedCatalog {
    books: Vec<BookRecord>,
    title_index: HashMap<String, usize>,
}

impl CleanedCatalog {
    pub(crate) fn new(books: Vec<BookRecord>) -> Self {
        let mut title_index = HashMap::with_capacity(books.len());
        for (idx, book) in books.iter().enumerate() {
            // First occurrence wins for ambiguous titles (same name,
            // different author).
            title_index.entry(book.book_name.clone()).or_insert(idx);
        }
        Self { books, title_index }
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn get(&self, idx: usize) -> Option<&BookRecord> {
        self.books.get(idx)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Exact, case-sensitive title lookup.
    pub fn find_title(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    pub fn book_names(&self) -> Vec<&str> {
        self.books.iter().map(|b| b.book_name.as_str()).collect()
    }

    /// Metadata documents in row order, for the vectorizer.
    pub fn metadata_documents(&self) -> Vec<&str> {
        self.books.iter().map(|b| b.metadata.as_str()).collect()
    }

    /// Write cluster labels back onto the rows, aligned by position.
    pub(crate) fn assign_clusters(&mut self, labels: &[usize]) {
        debug_assert_eq!(labels.len(), self.books.len());
        for (book, label) in self.books.iter_mut().zip(labels) {
            book.cluster = *label;
        }
    }

    /// Number of distinct cluster labels currently assigned.
    pub fn cluster_count(&self) -> usize {
        let mut labels: Vec<usize> = self.books.iter().map(|b| b.cluster).collect();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }
}
