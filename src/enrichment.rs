//! Release Enrichment (spec §4.D).
//!
//! Fills in track number, disc number, release date, release group id, and
//! album title on a `BoundPair` that the binding engine left incomplete
//! (e.g. a recording bound via a fast-path that skipped the full release
//! lookup). Never re-runs binding — if the release itself can't supply the
//! missing fields, enrichment fails closed.

use crate::error::FailureReason;
use crate::model::{BoundPair, Release};

/// A `BoundPair` is enrichment-complete when every field §3 requires before
/// path construction is present and non-default.
fn is_complete(pair: &BoundPair) -> bool {
    !pair.release_id.is_empty()
        && !pair.release_group_id.is_empty()
        && !pair.album_title.is_empty()
        && !pair.release_date.is_empty()
        && !pair.track_title.is_empty()
        && pair.track_number > 0
        && pair.disc_number > 0
}

/// Enrich a `BoundPair` against its already-bound release (spec §4.D).
/// `release` must be the release identified by `pair.release_id`.
pub fn enrich(mut pair: BoundPair, release: &Release) -> Result<BoundPair, FailureReason> {
    if pair.release_group_id.is_empty() {
        pair.release_group_id = release.release_group.id.clone();
    }
    if pair.album_title.is_empty() {
        pair.album_title = release.title.clone();
    }
    if pair.release_date.is_empty() {
        if let Some(date) = &release.date {
            pair.release_date = date.clone();
        }
    }
    if pair.track_number == 0 || pair.disc_number == 0 || pair.track_title.is_empty() {
        if let Some((disc, track, length_ms, title)) = release.find_track(&pair.recording_id) {
            pair.disc_number = disc;
            pair.track_number = track;
            if pair.duration_ms == 0 {
                if let Some(length_ms) = length_ms {
                    pair.duration_ms = length_ms;
                }
            }
            if pair.track_title.is_empty() {
                pair.track_title = title;
            }
        }
    }

    if is_complete(&pair) {
        Ok(pair)
    } else {
        Err(FailureReason::ReleaseEnrichmentIncomplete)
    }
}
