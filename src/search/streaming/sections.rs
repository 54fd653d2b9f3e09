//! Search section types for streaming structured search.
//!
//! Each section represents a distinct part of the streaming search response.

use serde::Serialize;

use crate::search::ResolvedSearchResult;

/// The type of content that was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Artist,
    Album,
    Track,
}

/// A section of the streaming search response.
///
/// Sections are emitted progressively via SSE, allowing the client to display
/// results as they become available.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum SearchSection {
    /// High-confidence single match - "This is what you wanted"
    PrimaryMatch {
        match_type: MatchType,
        item: ResolvedSearchResult,
        confidence: f64,
    },

    /// No clear winner - here are the top candidates
    TopResults { items: Vec<ResolvedSearchResult> },

    /// Popular tracks by the target artist
    PopularBy {
        target_id: String,
        target_type: MatchType,
        items: Vec<TrackSummary>,
    },

    /// Albums by the target artist
    AlbumsBy {
        target_id: String,
        items: Vec<AlbumSummary>,
    },

    /// Tracks from the target album
    TracksFrom {
        target_id: String,
        items: Vec<TrackSummary>,
    },

    /// Related artists (from artist metadata)
    RelatedArtists {
        target_id: String,
        items: Vec<ArtistSummary>,
    },

    /// Lower-relevance matches
    OtherResults { items: Vec<ResolvedSearchResult> },

    /// Stream complete
    Done { total_time_ms: u64 },
}

/// Summary of a track for enrichment sections.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    pub duration_ms: u64,
    pub track_number: Option<u32>,
    pub album_id: String,
    pub album_name: String,
    pub artist_names: Vec<String>,
    pub image_id: Option<String>,
}

/// Summary of an album for enrichment sections.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
    pub release_year: Option<i32>,
    pub track_count: u32,
    pub image_id: Option<String>,
    pub artist_names: Vec<String>,
}

/// Summary of an artist for enrichment sections.
#[derive(Debug, Clone, Serialize)]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
    pub image_id: Option<String>,
}
