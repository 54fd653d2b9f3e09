//! Cleaning, imputation and derived-field construction.
//!
//! Order matters here: numeric coercion and imputation run before the
//! text fills, and the text fills run before metadata concatenation so
//! placeholder values never leak into the joined text.

use super::{
    BookRecord, CleanedCatalog, PipelineError, RawBookRow, EMPTY_METADATA_FALLBACK,
    MISSING_DESCRIPTION, MISSING_GENRE,
};
use std::collections::HashSet;
use tracing::info;

/// Clean raw rows into the working catalog.
pub fn preprocess(rows: Vec<RawBookRow>) -> Result<CleanedCatalog, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyCatalog);
    }

    // Drop exact (Book Name, Author) duplicates, first occurrence wins.
    let mut seen = HashSet::new();
    let rows: Vec<RawBookRow> = rows
        .into_iter()
        .filter(|row| seen.insert(row.key()))
        .collect();

    let parsed_ratings: Vec<Option<f64>> = rows
        .iter()
        .map(|row| parse_rating(row.rating.as_deref()))
        .collect();
    let reviews: Vec<f64> = rows
        .iter()
        .map(|row| parse_non_negative(row.number_of_reviews.as_deref()))
        .collect();
    let prices: Vec<f64> = rows
        .iter()
        .map(|row| parse_non_negative(row.price.as_deref()))
        .collect();

    // Impute missing ratings with the median of the valid ones.
    let valid_ratings: Vec<f64> = parsed_ratings.iter().copied().flatten().collect();
    let rating_median = percentile(&valid_ratings, 0.5).unwrap_or(0.0);
    let ratings: Vec<f64> = parsed_ratings
        .into_iter()
        .map(|r| r.unwrap_or(rating_median))
        .collect();

    // Evidence weight for the confidence score: the 75th percentile of
    // review counts, with the global mean rating as prior.
    let m = percentile(&reviews, 0.75).unwrap_or(0.0);
    let c = ratings.iter().sum::<f64>() / ratings.len() as f64;

    let books: Vec<BookRecord> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let book_name = row.book_name.trim().to_string();
            let author = row.author.trim().to_string();
            let description = text_or(row.description.as_deref(), MISSING_DESCRIPTION);
            let ranks_and_genre = text_or(row.ranks_and_genre.as_deref(), MISSING_GENRE);

            let metadata = format!(
                "{} {} {} {}",
                book_name, author, description, ranks_and_genre
            )
            .to_lowercase();
            let metadata = if metadata.trim().is_empty() {
                EMPTY_METADATA_FALLBACK.to_string()
            } else {
                metadata
            };

            BookRecord {
                book_name,
                author,
                rating: ratings[i],
                number_of_reviews: reviews[i],
                price: prices[i],
                description,
                ranks_and_genre,
                metadata,
                confidence_score: confidence_score(ratings[i], reviews[i], m, c),
                cluster: 0,
            }
        })
        .collect();

    info!(
        "Preprocessed catalog: {} unique books, rating median {:.2}, review weight m {:.1}",
        books.len(),
        rating_median,
        m
    );
    Ok(CleanedCatalog::new(books))
}

/// Parse a rating. `-1` is a "no rating" sentinel in some sources;
/// anything outside the plausible [0, 5] band counts as missing, not data.
fn parse_rating(raw: Option<&str>) -> Option<f64> {
    let value: f64 = raw?.trim().parse().ok()?;
    if !(0.0..=5.0).contains(&value) {
        return None;
    }
    Some(value)
}

fn parse_non_negative(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

fn text_or(raw: Option<&str>, fallback: &str) -> String {
    match raw {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => fallback.to_string(),
    }
}

/// Linear-interpolated percentile, `q` in [0, 1]. `None` on empty input.
fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("no NaN in cleaned values"));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn confidence_score(rating: f64, reviews: f64, m: f64, c: f64) -> f64 {
    let denom = reviews + m;
    if denom == 0.0 {
        // No evidence anywhere in the catalog, fall back to the prior.
        return c;
    }
    reviews / denom * rating + m / denom * c
}
