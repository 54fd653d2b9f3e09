//! Catalog source loading and joining.

use super::{PipelineError, REQUIRED_COLUMNS};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

/// A raw catalog row as read from a CSV source, before cleaning.
///
/// `None` fields come from sources whose header lacks that column; the
/// join may fill them from another source.
#[derive(Debug, Clone, Default)]
pub struct RawBookRow {
    pub book_name: String,
    pub author: String,
    pub rating: Option<String>,
    pub number_of_reviews: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub ranks_and_genre: Option<String>,
}

impl RawBookRow {
    /// Identity key for joining and deduplication.
    pub fn key(&self) -> (String, String) {
        (
            self.book_name.trim().to_string(),
            self.author.trim().to_string(),
        )
    }

    /// Fill columns this source lacked from the joined row. Columns the
    /// primary source already carries keep the primary's value.
    fn fill_missing_from(&mut self, other: &RawBookRow) {
        fn fill(dst: &mut Option<String>, src: &Option<String>) {
            if dst.is_none() {
                *dst = src.clone();
            }
        }
        fill(&mut self.rating, &other.rating);
        fill(&mut self.number_of_reviews, &other.number_of_reviews);
        fill(&mut self.price, &other.price);
        fill(&mut self.description, &other.description);
        fill(&mut self.ranks_and_genre, &other.ranks_and_genre);
    }
}

struct SourceTable {
    columns: HashSet<String>,
    rows: Vec<RawBookRow>,
}

fn read_source(path: &Path) -> Result<SourceTable, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingSource(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let name_idx = position("Book Name").ok_or_else(|| PipelineError::MissingColumn {
        column: "Book Name".to_string(),
    })?;
    let author_idx = position("Author").ok_or_else(|| PipelineError::MissingColumn {
        column: "Author".to_string(),
    })?;
    let rating_idx = position("Rating");
    let reviews_idx = position("Number of Reviews");
    let price_idx = position("Price");
    let description_idx = position("Description");
    let genre_idx = position("Ranks and Genre");

    let columns: HashSet<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        // Malformed lines (e.g. leftover merge markers) are skipped,
        // not fatal.
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                skipped += 1;
                warn!("Skipping unparsable catalog line: {}", err);
                continue;
            }
        };
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::to_string);
        rows.push(RawBookRow {
            book_name: record.get(name_idx).unwrap_or_default().to_string(),
            author: record.get(author_idx).unwrap_or_default().to_string(),
            rating: field(rating_idx),
            number_of_reviews: field(reviews_idx),
            price: field(price_idx),
            description: field(description_idx),
            ranks_and_genre: field(genre_idx),
        });
    }
    if skipped > 0 {
        warn!("Skipped {} unparsable lines in {}", skipped, path.display());
    }

    Ok(SourceTable { columns, rows })
}

/// Load one or two catalog sources.
///
/// With a secondary source, rows are inner-joined on `(Book Name, Author)`
/// and the primary's values win for columns both sources carry. All of
/// [`REQUIRED_COLUMNS`] must be present after the join.
pub fn load_catalog(
    primary: &Path,
    secondary: Option<&Path>,
) -> Result<Vec<RawBookRow>, PipelineError> {
    let primary_table = read_source(primary)?;
    let mut columns = primary_table.columns;
    let mut rows = primary_table.rows;

    if let Some(secondary_path) = secondary {
        let secondary_table = read_source(secondary_path)?;
        let by_key: HashMap<(String, String), RawBookRow> = secondary_table
            .rows
            .into_iter()
            .map(|row| (row.key(), row))
            .collect();

        rows.retain_mut(|row| match by_key.get(&row.key()) {
            Some(other) => {
                row.fill_missing_from(other);
                true
            }
            None => false,
        });
        columns.extend(secondary_table.columns);
    }

    for column in REQUIRED_COLUMNS {
        if !columns.contains(column) {
            return Err(PipelineError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    info!(
        "Loaded {} catalog rows from {}{}",
        rows.len(),
        primary.display(),
        secondary
            .map(|p| format!(" joined with {}", p.display()))
            .unwrap_or_default()
    );
    Ok(rows)
}
