//! Missing files watchdog.
//!
//! Scans for missing media files and queues repairs. The watchdog periodically
//! checks that all catalog content has corresponding media files on disk,
//! and queues download requests for any missing content.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::catalog_store::CatalogStore;

use super::audit_logger::AuditLogger;
use super::models::{
    DownloadContentType, MissingFilesMode, MissingFilesReport, MissingImageInfo, MissingTrackInfo,
    QueueItem, QueuePriority, QueueStatus, RequestSource,
};
use super::queue_store::DownloadQueueStore;

/// Missing files watchdog that scans catalog for missing media files.
///
/// The watchdog:
/// 1. Scans all tracks to find those missing audio files
/// 2. Scans all album images to find missing cover images
/// 3. Scans all artist images to find missing portrait images
/// 4. Queues repair downloads for missing content (if not already queued)
pub struct MissingFilesWatchdog {
    catalog_store: Arc<dyn CatalogStore>,
    queue_store: Arc<dyn DownloadQueueStore>,
    audit_logger: AuditLogger,
}

impl MissingFilesWatchdog {
    /// Create a new MissingFilesWatchdog.
    ///
    /// # Arguments
    /// * `catalog_store` - Catalog store for querying content
    /// * `queue_store` - Download queue store for checking/adding queue items
    /// * `audit_logger` - Audit logger for recording watchdog events
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        queue_store: Arc<dyn DownloadQueueStore>,
        audit_logger: AuditLogger,
    ) -> Self {
        Self {
            catalog_store,
            queue_store,
            audit_logger,
        }
    }

    /// Run a full scan and queue repairs for missing media files.
    ///
    /// Returns a report detailing what was found and what was queued.
    ///
    /// # Arguments
    /// * `mode` - The execution mode (DryRun or Actual)
    pub fn run_scan(&self, mode: MissingFilesMode) -> Result<MissingFilesReport> {
        let start = Instant::now();

        info!("Starting missing files scan in {:?} mode", mode);

        // Log scan start
        if let Err(e) = self.audit_logger.log_watchdog_scan_started() {
            warn!("Failed to log watchdog scan start: {}", e);
        }

        // Get totals for the scan summary
        let all_track_ids = self.catalog_store.list_all_track_ids()?;
        let all_album_image_ids = self.catalog_store.list_all_album_image_ids()?;
        let all_artist_image_ids = self.catalog_store.list_all_artist_image_ids()?;

        let total_tracks_scanned = all_track_ids.len();
        let total_album_images_scanned = all_album_image_ids.len();
        let total_artist_images_scanned = all_artist_image_ids.len();

        // Scan for missing content with detailed info
        let (missing_track_audio, missing_track_details) =
            self.scan_missing_track_audio_detailed(&all_track_ids)?;
        let (missing_album_images, missing_album_image_details) =
            self.scan_missing_album_images_detailed(&all_album_image_ids)?;
        let (missing_artist_images, missing_artist_image_details) =
            self.scan_missing_artist_images_detailed(&all_artist_image_ids)?;

        info!(
            "Missing files scan found {} missing track audio, {} missing album images, {} missing artist images",
            missing_track_audio.len(),
            missing_album_images.len(),
            missing_artist_images.len()
        );

        // Queue repairs for missing content only if in Actual mode
        let (items_queued, items_skipped) = match mode {
            MissingFilesMode::DryRun => {
                info!(
                    "Dry-run mode: would queue {} items",
                    missing_track_audio.len()
                        + missing_album_images.len()
                        + missing_artist_images.len()
                );
                (0, 0)
            }
            MissingFilesMode::Actual => self.queue_repairs(
                &missing_track_audio,
                &missing_album_images,
                &missing_artist_images,
            )?,
        };

        let scan_duration_ms = start.elapsed().as_millis() as i64;

        let report = MissingFilesReport {
            mode,
            total_tracks_scanned,
            total_album_images_scanned,
            total_artist_images_scanned,
            missing_track_audio,
            missing_track_details,
            missing_album_images,
            missing_album_image_details,
            missing_artist_images,
            missing_artist_image_details,
            items_queued,
            items_skipped,
            scan_duration_ms,
        };

        // Log scan completion
        if let Err(e) = self.audit_logger.log_missing_files_scan_completed(&report) {
            warn!("Failed to log watchdog scan completion: {}", e);
        }

        Ok(report)
    }

    /// Scan for tracks missing audio files with detailed information.
    ///
    /// Returns a tuple of (track IDs, detailed track info) for tracks missing audio files.
    fn scan_missing_track_audio_detailed(
        &self,
        track_ids: &[String],
    ) -> Result<(Vec<String>, Vec<MissingTrackInfo>)> {
        let mut missing_ids = Vec::new();
        let mut missing_details = Vec::new();

        for track_id in track_ids {
            let is_missing =
                if let Some(audio_path) = self.catalog_store.get_track_audio_path(track_id) {
                    if !audio_path.exists() {
                        debug!(
                            "Missing audio file for track {}: {:?}",
                            track_id, audio_path
                        );
                        true
                    } else {
                        false
                    }
                } else {
                    // Track has no audio_uri set - this is also considered missing
                    debug!("Track {} has no audio_uri set", track_id);
                    true
                };

            if is_missing {
                missing_ids.push(track_id.clone());

                // Gather detailed info from resolved track JSON
                let detail = self.get_track_detail(track_id);
                missing_details.push(detail);
            }
        }

        Ok((missing_ids, missing_details))
    }

    /// Get detailed information about a track for the report.
    fn get_track_detail(&self, track_id: &str) -> MissingTrackInfo {
        let mut track_name = String::from("Unknown");
        let mut album_id = None;
        let mut album_name = None;
        let mut artist_names = Vec::new();

        if let Ok(Some(track_json)) = self.catalog_store.get_resolved_track_json(track_id) {
            // Extract track name from resolved track JSON
            // ResolvedTrack has: track: Track, album: Album, artists: Vec<TrackArtist>
            if let Some(track) = track_json.get("track") {
                if let Some(name) = track.get("name").and_then(|n| n.as_str()) {
                    track_name = name.to_string();
                }
            }

            if let Some(album) = track_json.get("album") {
                if let Some(id) = album.get("id").and_then(|i| i.as_str()) {
                    album_id = Some(id.to_string());
                }
                if let Some(name) = album.get("name").and_then(|n| n.as_str()) {
                    album_name = Some(name.to_string());
                }
            }

            // ResolvedTrack.artists is Vec<TrackArtist> with { artist: Artist, role: ... }
            if let Some(artists) = track_json.get("artists").and_then(|a| a.as_array()) {
                for track_artist in artists {
                    if let Some(artist) = track_artist.get("artist") {
                        if let Some(name) = artist.get("name").and_then(|n| n.as_str()) {
                            artist_names.push(name.to_string());
                        }
                    }
                }
            }
        }

        MissingTrackInfo {
            track_id: track_id.to_string(),
            track_name,
            album_id,
            album_name,
            artist_names,
        }
    }

    /// Scan for album images missing files with detailed information.
    ///
    /// Returns a tuple of (image IDs, detailed image info) for missing album images.
    fn scan_missing_album_images_detailed(
        &self,
        image_ids: &[String],
    ) -> Result<(Vec<String>, Vec<MissingImageInfo>)> {
        let mut missing_ids = Vec::new();
        let mut missing_details = Vec::new();

        for image_id in image_ids {
            let image_path = self.catalog_store.get_image_path(image_id);
            if !image_path.exists() {
                debug!(
                    "Missing album image file for {}: {:?}",
                    image_id, image_path
                );
                missing_ids.push(image_id.clone());

                // Try to find which album uses this image
                let detail = self.get_album_image_detail(image_id);
                missing_details.push(detail);
            }
        }

        Ok((missing_ids, missing_details))
    }

    /// Get detailed information about an album image for the report.
    fn get_album_image_detail(&self, image_id: &str) -> MissingImageInfo {
        // We don't have a direct query for "which album uses this image"
        // For now, we'll just report the image ID. In a future enhancement,
        // we could add a reverse lookup.
        MissingImageInfo {
            image_id: image_id.to_string(),
            entity_id: String::new(),
            entity_name: String::from("(album lookup not implemented)"),
        }
    }

    /// Scan for artist images missing files with detailed information.
    ///
    /// Returns a tuple of (image IDs, detailed image info) for missing artist images.
    fn scan_missing_artist_images_detailed(
        &self,
        image_ids: &[String],
    ) -> Result<(Vec<String>, Vec<MissingImageInfo>)> {
        let mut missing_ids = Vec::new();
        let mut missing_details = Vec::new();

        for image_id in image_ids {
            let image_path = self.catalog_store.get_image_path(image_id);
            if !image_path.exists() {
                debug!(
                    "Missing artist image file for {}: {:?}",
                    image_id, image_path
                );
                missing_ids.push(image_id.clone());

                // Try to find which artist uses this image
                let detail = self.get_artist_image_detail(image_id);
                missing_details.push(detail);
            }
        }

        Ok((missing_ids, missing_details))
    }

    /// Get detailed information about an artist image for the report.
    fn get_artist_image_detail(&self, image_id: &str) -> MissingImageInfo {
        // We don't have a direct query for "which artist uses this image"
        // For now, we'll just report the image ID. In a future enhancement,
        // we could add a reverse lookup.
        MissingImageInfo {
            image_id: image_id.to_string(),
            entity_id: String::new(),
            entity_name: String::from("(artist lookup not implemented)"),
        }
    }

    /// Queue repairs for missing content.
    ///
    /// For each missing item:
    /// 1. Check if already in queue (any status)
    /// 2. Skip if already queued
    /// 3. Otherwise, create new queue item with Watchdog priority
    ///
    /// Returns (items_queued, items_skipped).
    fn queue_repairs(
        &self,
        missing_track_audio: &[String],
        missing_album_images: &[String],
        missing_artist_images: &[String],
    ) -> Result<(usize, usize)> {
        let mut queued = 0;
        let mut skipped = 0;

        // Queue missing track audio
        for track_id in missing_track_audio {
            if self.is_already_in_queue(DownloadContentType::TrackAudio, track_id)? {
                debug!("Track audio {} already in queue, skipping", track_id);
                skipped += 1;
                continue;
            }

            let queue_item = self.create_watchdog_queue_item(
                DownloadContentType::TrackAudio,
                track_id.clone(),
                "missing_audio_file",
            );

            match self.queue_store.enqueue(queue_item.clone()) {
                Ok(_) => {
                    if let Err(e) = self
                        .audit_logger
                        .log_watchdog_queued(&queue_item, "missing_audio_file")
                    {
                        warn!("Failed to log watchdog queue event: {}", e);
                    }
                    queued += 1;
                }
                Err(e) => {
                    warn!("Failed to queue track audio repair for {}: {}", track_id, e);
                }
            }
        }

        // Queue missing album images
        for image_id in missing_album_images {
            if self.is_already_in_queue(DownloadContentType::AlbumImage, image_id)? {
                debug!("Album image {} already in queue, skipping", image_id);
                skipped += 1;
                continue;
            }

            let queue_item = self.create_watchdog_queue_item(
                DownloadContentType::AlbumImage,
                image_id.clone(),
                "missing_album_image",
            );

            match self.queue_store.enqueue(queue_item.clone()) {
                Ok(_) => {
                    if let Err(e) = self
                        .audit_logger
                        .log_watchdog_queued(&queue_item, "missing_album_image")
                    {
                        warn!("Failed to log watchdog queue event: {}", e);
                    }
                    queued += 1;
                }
                Err(e) => {
                    warn!("Failed to queue album image repair for {}: {}", image_id, e);
                }
            }
        }

        // Queue missing artist images
        for image_id in missing_artist_images {
            if self.is_already_in_queue(DownloadContentType::ArtistImage, image_id)? {
                debug!("Artist image {} already in queue, skipping", image_id);
                skipped += 1;
                continue;
            }

            let queue_item = self.create_watchdog_queue_item(
                DownloadContentType::ArtistImage,
                image_id.clone(),
                "missing_artist_image",
            );

            match self.queue_store.enqueue(queue_item.clone()) {
                Ok(_) => {
                    if let Err(e) = self
                        .audit_logger
                        .log_watchdog_queued(&queue_item, "missing_artist_image")
                    {
                        warn!("Failed to log watchdog queue event: {}", e);
                    }
                    queued += 1;
                }
                Err(e) => {
                    warn!(
                        "Failed to queue artist image repair for {}: {}",
                        image_id, e
                    );
                }
            }
        }

        Ok((queued, skipped))
    }

    /// Check if an item is already in the download queue.
    fn is_already_in_queue(
        &self,
        content_type: DownloadContentType,
        content_id: &str,
    ) -> Result<bool> {
        self.queue_store.is_in_queue(content_type, content_id)
    }

    /// Create a queue item for watchdog-initiated repair.
    fn create_watchdog_queue_item(
        &self,
        content_type: DownloadContentType,
        content_id: String,
        _reason: &str,
    ) -> QueueItem {
        let now = chrono::Utc::now().timestamp();
        QueueItem {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: None,
            status: QueueStatus::Pending,
            priority: QueuePriority::Background,
            content_type,
            content_id,
            content_name: None,
            artist_name: None,
            request_source: RequestSource::Watchdog,
            requested_by_user_id: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            last_attempt_at: None,
            next_retry_at: None,
            retry_count: 0,
            max_retries: 5,
            error_type: None,
            error_message: None,
            bytes_downloaded: None,
            processing_duration_ms: None,
        }
    }
}
