//! Canonical Path Builder (spec §4.F).
//!
//! `Music/{album_artist}/{album_title} ({YYYY})/Disc {disc}/{track:02} -
//! {title}.{ext}`. Refuses to build a path on incomplete metadata rather
//! than substituting a placeholder like "Unknown Album" (spec §4.F
//! invariant, §9 "never silently mint identity").

use crate::error::FailureReason;
use crate::model::BoundPair;
use unicode_normalization::UnicodeNormalization;

/// Characters forbidden in a path segment on the union of Windows/Unix
/// filesystems (spec §4.F), matching the set the original path builder
/// strips.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitize one path segment: strip forbidden characters, collapse
/// whitespace and repeated dots, trim trailing space/period and leading
/// dots (avoids accidental `..` traversal segments and hidden files on
/// Unix — supplemented from the original path builder, SPEC_FULL.md §11).
pub fn sanitize_segment(raw: &str) -> String {
    let nfc: String = raw.nfc().collect();
    let mut out = String::with_capacity(nfc.len());
    let mut last_was_space = false;
    for c in nfc.chars() {
        if FORBIDDEN.contains(&c) {
            continue;
        }
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.contains("..") {
        out = out.replace("..", ".");
    }
    let trimmed = out.trim_end_matches([' ', '.']);
    trimmed.trim_start_matches('.').to_string()
}

fn release_year(release_date: &str) -> Option<&str> {
    if release_date.len() >= 4 {
        Some(&release_date[0..4])
    } else {
        None
    }
}

/// Build the canonical relative path for a bound, enriched track (spec
/// §4.F). `album_artist` and `track_title` come from the intent/catalog
/// metadata already resolved upstream; `ext` is the media container
/// extension without a leading dot.
pub fn build_path(
    pair: &BoundPair,
    album_artist: &str,
    track_title: &str,
    ext: &str,
) -> Result<String, FailureReason> {
    if album_artist.trim().is_empty()
        || pair.album_title.trim().is_empty()
        || pair.release_date.trim().is_empty()
        || pair.track_number == 0
        || pair.disc_number == 0
        || track_title.trim().is_empty()
    {
        return Err(FailureReason::MusicReleaseMetadataIncompleteBeforePathBuild);
    }

    let year = release_year(&pair.release_date)
        .ok_or(FailureReason::MusicReleaseMetadataIncompleteBeforePathBuild)?;

    let artist_seg = sanitize_segment(album_artist);
    let album_seg = sanitize_segment(&pair.album_title);
    let title_seg = sanitize_segment(track_title);
    let ext_seg = sanitize_segment(ext);

    if artist_seg.is_empty() || album_seg.is_empty() || title_seg.is_empty() || ext_seg.is_empty() {
        return Err(FailureReason::MusicFilenameContractViolation {
            detail: "a path segment sanitized to empty".into(),
        });
    }

    Ok(format!(
        "Music/{artist}/{album} ({year})/Disc {disc}/{track:02} - {title}.{ext}",
        artist = artist_seg,
        album = album_seg,
        year = year,
        disc = pair.disc_number,
        track = pair.track_number,
        title = title_seg,
        ext = ext_seg,
    ))
}
