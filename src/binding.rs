//! MB Binding Engine (spec §4.C).
//!
//! Turns an `Intent` into a `BoundPair` by walking recording search results,
//! enumerating each candidate recording's releases, classifying them into
//! the album/compilation/single buckets, and picking the best release under
//! a fixed total order. Pure given the recordings/releases handed to it —
//! network I/O lives in `adapters.rs`. Grounded on the bucket-then-score-
//! then-tiebreak shape of `pick_best_release_with_reason`/
//! `search_release_groups` in `original_source/app/musicbrainz/service.py`.

use crate::error::{BindingError, FailureReason};
use crate::model::{Intent, Recording, Release, ReleaseGroupPrimaryType, ReleaseStatus, VariantTag};
use crate::normalize::{extract_variant_tags, normalize};
use crate::scoring;

/// Release bucket preference ordering (spec §4.C). `Ord` derives the
/// comparison the selection sort needs: declared in descending preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    Single,
    Compilation,
    Album,
}

/// Correctness-score field weights (spec §4.C Stage 4). Sum is `MAX_CORRECTNESS_SCORE`.
const WEIGHT_CORRECTNESS_ARTIST: f64 = 3.0;
const WEIGHT_CORRECTNESS_TRACK: f64 = 3.0;
const WEIGHT_CORRECTNESS_DURATION: f64 = 2.0;
const WEIGHT_CORRECTNESS_ALBUM: f64 = 1.0;
const MAX_CORRECTNESS_SCORE: f64 =
    WEIGHT_CORRECTNESS_ARTIST + WEIGHT_CORRECTNESS_TRACK + WEIGHT_CORRECTNESS_DURATION + WEIGHT_CORRECTNESS_ALBUM;

fn release_date_year(date: &str) -> u32 {
    date.get(0..4).and_then(|y| y.parse().ok()).unwrap_or(9999)
}

/// Exposed for `path_builder` (spec §3, §4.D).
pub fn release_date(release: &Release) -> Option<&str> {
    release.date.as_deref()
}

/// `release_date` contains a 4-digit year (spec §4.C Stage 2).
fn has_four_digit_year(date: Option<&str>) -> bool {
    date.map(|d| d.len() >= 4 && d.as_bytes()[..4].iter().all(u8::is_ascii_digit))
        .unwrap_or(false)
}

fn bucket_for(release: &Release) -> Option<Bucket> {
    match release.release_group.primary_type {
        ReleaseGroupPrimaryType::Album | ReleaseGroupPrimaryType::Ep if release.release_group.is_compilation() => {
            Some(Bucket::Compilation)
        }
        ReleaseGroupPrimaryType::Album | ReleaseGroupPrimaryType::Ep => Some(Bucket::Album),
        ReleaseGroupPrimaryType::Single => Some(Bucket::Single),
        // Broadcast, Other are not part of the three buckets: a release in
        // one of those groups is only usable as a last-resort fallback
        // (stage 3, `allow_non_album_fallback`).
        _ => None,
    }
}

/// Stage 2 usability filter (spec §4.C): `status = Official`, a non-empty
/// `album_title`, a `release_date` carrying a 4-digit year, and a resolvable
/// (disc, track, length, title) position for this recording (both disc and
/// track number `>= 1`). Returns the resolved track position so callers
/// never have to re-run `find_track` later.
fn usable_track_position(release: &Release, recording_id: &str) -> Option<(u32, u32, Option<u64>, String)> {
    if !matches!(release.status, ReleaseStatus::Official) {
        return None;
    }
    if release.title.trim().is_empty() {
        return None;
    }
    if !has_four_digit_year(release.date.as_deref()) {
        return None;
    }
    let (disc, track_number, length_ms, title) = release.find_track(recording_id)?;
    if disc == 0 || track_number == 0 {
        return None;
    }
    Some((disc, track_number, length_ms, title))
}

/// Stage 3 bucket rule: a compilation release is only usable when its title
/// matches the intent's album hint (if the caller gave one); otherwise a
/// same-titled compilation could silently replace the real album.
fn compilation_usable(release: &Release, intent: &Intent) -> bool {
    match &intent.album {
        Some(hint) => normalize(&release.title) == normalize(hint),
        None => true,
    }
}

/// `correctness_score` (spec §4.C Stage 4): the §4.B similarity subscores,
/// computed against the recording itself (not release-level metadata like
/// country or date — those only break ties via `completeness_score`).
fn correctness_score(recording: &Recording, release: &Release, intent: &Intent) -> f64 {
    let artist_sim = scoring::artist_similarity(&intent.artist, &[&recording.artist_credit_name]);
    let (track_sim, _) = scoring::track_similarity(&intent.track, &recording.title, &recording.aliases);
    let duration_sim = scoring::duration_score(intent.duration_hint_ms, recording.length_ms.map(|ms| ms / 1000));
    let album_sim = scoring::album_similarity(intent.album.as_deref(), Some(&release.title));

    artist_sim * WEIGHT_CORRECTNESS_ARTIST
        + track_sim * WEIGHT_CORRECTNESS_TRACK
        + duration_sim * WEIGHT_CORRECTNESS_DURATION
        + album_sim * WEIGHT_CORRECTNESS_ALBUM
}

/// Completeness score: how many of the optional-but-wanted fields the
/// release actually carries (spec §4.C) — a tie-break only, never part of
/// the acceptance threshold.
fn completeness_score(release: &Release) -> f64 {
    let mut score = 0.0;
    if release.has_isrc {
        score += 0.34;
    }
    if release.has_label {
        score += 0.33;
    }
    if release.has_barcode {
        score += 0.33;
    }
    score
}

struct Candidate<'a> {
    recording: &'a Recording,
    release: &'a Release,
    bucket: Bucket,
    correctness: f64,
    completeness: f64,
    disc: u32,
    track_number: u32,
    length_ms: Option<u64>,
    track_title: String,
}

/// Total order for selecting among usable (recording, release) pairs (spec
/// §4.C): bucket preference, then correctness desc, completeness desc,
/// country-match desc, earliest release date, then release_id ascending for
/// a fully deterministic tie break.
fn is_better(a: &Candidate, b: &Candidate, intent: &Intent) -> bool {
    if a.bucket != b.bucket {
        return a.bucket > b.bucket;
    }
    if (a.correctness - b.correctness).abs() > f64::EPSILON {
        return a.correctness > b.correctness;
    }
    if (a.completeness - b.completeness).abs() > f64::EPSILON {
        return a.completeness > b.completeness;
    }
    let a_country = intent
        .country_preference
        .as_deref()
        .map(|p| a.release.country.as_deref() == Some(p))
        .unwrap_or(false);
    let b_country = intent
        .country_preference
        .as_deref()
        .map(|p| b.release.country.as_deref() == Some(p))
        .unwrap_or(false);
    if a_country != b_country {
        return a_country;
    }
    let a_year = a.release.date.as_deref().map(release_date_year).unwrap_or(9999);
    let b_year = b.release.date.as_deref().map(release_date_year).unwrap_or(9999);
    if a_year != b_year {
        return a_year < b_year;
    }
    a.release.release_id < b.release.release_id
}

/// Stage 1: recording search filtering (spec §4.C). The catalog query already
/// did the artist/track matching; this stage only rejects recordings that
/// carry a disallowed discriminating variant tag, exceed the duration delta
/// gate, or look like a short preview clip when a full-length track is
/// expected.
fn filter_recordings<'a>(recordings: &'a [Recording], intent: &Intent) -> (Vec<&'a Recording>, Vec<FailureReason>) {
    let expects_full_length = intent.duration_hint_ms.map(|ms| ms > 60_000).unwrap_or(false);

    let mut survivors = Vec::new();
    let mut reasons = Vec::new();

    for r in recordings {
        let variant_tags = extract_variant_tags(&r.title);
        if let Some(variant) = variant_tags
            .iter()
            .copied()
            .find(|t| t.is_discriminating() && !intent.allow_variants.contains(t))
        {
            reasons.push(FailureReason::DisallowedVariant { variant });
            continue;
        }

        if let (Some(hint), Some(len)) = (intent.duration_hint_ms, r.length_ms) {
            let delta = hint.abs_diff(len);
            if delta > intent.thresholds.max_duration_delta_ms {
                reasons.push(FailureReason::DurationDeltaGtLimit {
                    delta_ms: delta,
                    limit_ms: intent.thresholds.max_duration_delta_ms,
                });
                continue;
            }
        }

        if expects_full_length && variant_tags.contains(&VariantTag::Preview) {
            if let Some(len) = r.length_ms {
                if (25_000..=40_000).contains(&len) {
                    reasons.push(FailureReason::Preview);
                    continue;
                }
            }
        }

        survivors.push(r);
    }

    (survivors, reasons)
}

/// Bind an intent against a set of candidate recordings and their resolved
/// releases (spec §4.C). `releases` must contain every release referenced by
/// `recording.release_refs` for any recording the caller intends to
/// consider — the caller (the adapter-facing orchestrator) is responsible
/// for fetching them.
pub fn bind(
    intent: &Intent,
    recordings: &[Recording],
    releases: &[Release],
) -> Result<crate::model::BoundPair, BindingError> {
    let mut reasons = Vec::new();

    let (filtered, filter_reasons) = filter_recordings(recordings, intent);
    reasons.extend(filter_reasons);
    if filtered.is_empty() {
        if reasons.is_empty() {
            reasons.push(FailureReason::NoCandidateAboveThreshold);
        }
        let final_reason = reasons.last().cloned().unwrap();
        return Err(BindingError::new(final_reason, reasons));
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for recording in &filtered {
        let mut any_release_for_recording = false;
        for release_id in &recording.release_refs {
            let Some(release) = releases.iter().find(|r| &r.release_id == release_id) else {
                continue;
            };
            any_release_for_recording = true;
            let Some((disc, track_number, length_ms, track_title)) =
                usable_track_position(release, &recording.recording_id)
            else {
                continue;
            };
            let Some(bucket) = bucket_for(release) else {
                continue;
            };
            if bucket == Bucket::Compilation && !compilation_usable(release, intent) {
                reasons.push(FailureReason::CompilationAlbumMismatch);
                continue;
            }
            candidates.push(Candidate {
                recording,
                release,
                bucket,
                correctness: correctness_score(recording, release, intent),
                completeness: completeness_score(release),
                disc,
                track_number,
                length_ms,
                track_title: if track_title.is_empty() { recording.title.clone() } else { track_title },
            });
        }
        if !any_release_for_recording {
            reasons.push(FailureReason::NoValidReleaseForRecording {
                recording_id: recording.recording_id.clone(),
            });
        }
    }

    if candidates.is_empty() && intent.allow_non_album_fallback {
        // Stage 3 fallback: accept any usable release regardless of bucket,
        // still subject to the compilation-title rule.
        for recording in &filtered {
            for release_id in &recording.release_refs {
                let Some(release) = releases.iter().find(|r| &r.release_id == release_id) else {
                    continue;
                };
                let Some((disc, track_number, length_ms, track_title)) =
                    usable_track_position(release, &recording.recording_id)
                else {
                    continue;
                };
                candidates.push(Candidate {
                    recording,
                    release,
                    bucket: Bucket::Single,
                    correctness: correctness_score(recording, release, intent),
                    completeness: completeness_score(release),
                    disc,
                    track_number,
                    length_ms,
                    track_title: if track_title.is_empty() { recording.title.clone() } else { track_title },
                });
            }
        }
    }

    let best = candidates
        .into_iter()
        .reduce(|a, b| if is_better(&a, &b, intent) { a } else { b });

    let Some(best) = best else {
        if reasons.is_empty() {
            reasons.push(FailureReason::NoCandidateAboveThreshold);
        }
        let final_reason = reasons.last().cloned().unwrap();
        return Err(BindingError::new(final_reason, reasons));
    };

    let combined = best.correctness / MAX_CORRECTNESS_SCORE;
    if combined < intent.thresholds.mb_binding_threshold {
        reasons.push(FailureReason::MbBindingBelowThreshold {
            score: combined,
            threshold: intent.thresholds.mb_binding_threshold,
        });
        return Err(BindingError::new(
            FailureReason::MbBindingBelowThreshold {
                score: combined,
                threshold: intent.thresholds.mb_binding_threshold,
            },
            reasons,
        ));
    }

    Ok(crate::model::BoundPair {
        recording_id: best.recording.recording_id.clone(),
        release_id: best.release.release_id.clone(),
        release_group_id: best.release.release_group.id.clone(),
        album_title: best.release.title.clone(),
        release_date: best.release.date.clone().unwrap_or_default(),
        track_number: best.track_number,
        disc_number: best.disc,
        duration_ms: best.length_ms.or(best.recording.length_ms).unwrap_or(0),
        track_title: best.track_title,
        isrc: best.recording.isrcs.first().cloned(),
        track_aliases: best.recording.aliases.iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Medium, MediumTrack, ReleaseGroup, ReleaseGroupSecondaryType};

    fn sample_recording() -> Recording {
        Recording {
            recording_id: "rec-1".into(),
            title: "Shuttin' Detroit Down".into(),
            artist_credit_name: "John Rich".into(),
            length_ms: Some(222_000),
            isrcs: vec!["USEP40900001".into()],
            ext_score: 100,
            release_refs: vec!["rel-album".into(), "rel-single".into()],
            aliases: vec![],
            disambiguation: None,
        }
    }

    fn album_release() -> Release {
        Release {
            release_id: "rel-album".into(),
            title: "Son of a Preacher Man".into(),
            status: ReleaseStatus::Official,
            country: Some("US".into()),
            date: Some("2009-05-19".into()),
            release_group: ReleaseGroup {
                id: "rg-album".into(),
                primary_type: ReleaseGroupPrimaryType::Album,
                secondary_types: vec![],
            },
            medium_list: vec![Medium {
                position: 1,
                tracks: vec![MediumTrack {
                    position: 3,
                    recording_id: "rec-1".into(),
                    length_ms: Some(222_000),
                    title: "Shuttin' Detroit Down".into(),
                }],
            }],
            has_isrc: true,
            has_label: true,
            has_barcode: true,
        }
    }

    fn single_release() -> Release {
        Release {
            release_id: "rel-single".into(),
            title: "Shuttin' Detroit Down".into(),
            status: ReleaseStatus::Official,
            country: Some("US".into()),
            date: Some("2009-02-01".into()),
            release_group: ReleaseGroup {
                id: "rg-single".into(),
                primary_type: ReleaseGroupPrimaryType::Single,
                secondary_types: vec![],
            },
            medium_list: vec![Medium {
                position: 1,
                tracks: vec![MediumTrack {
                    position: 1,
                    recording_id: "rec-1".into(),
                    length_ms: Some(222_000),
                    title: "Shuttin' Detroit Down".into(),
                }],
            }],
            has_isrc: true,
            has_label: false,
            has_barcode: false,
        }
    }

    #[test]
    fn album_bucket_beats_single_bucket() {
        let mut intent = Intent::new("John Rich", "Shuttin' Detroit Down");
        intent.duration_hint_ms = Some(222_000);
        intent.thresholds.mb_binding_threshold = 0.5;
        let recordings = vec![sample_recording()];
        let releases = vec![album_release(), single_release()];
        let bound = bind(&intent, &recordings, &releases).expect("should bind");
        assert_eq!(bound.release_id, "rel-album");
        assert_eq!(bound.track_number, 3);
        assert_eq!(bound.disc_number, 1);
        assert_eq!(bound.track_title, "Shuttin' Detroit Down");
    }

    #[test]
    fn ep_release_group_is_treated_as_album_bucket() {
        let mut intent = Intent::new("John Rich", "Shuttin' Detroit Down");
        intent.duration_hint_ms = Some(222_000);
        intent.thresholds.mb_binding_threshold = 0.5;
        let mut ep = album_release();
        ep.release_id = "rel-ep".into();
        ep.release_group.primary_type = ReleaseGroupPrimaryType::Ep;
        let recordings = vec![Recording {
            release_refs: vec!["rel-ep".into(), "rel-single".into()],
            ..sample_recording()
        }];
        let releases = vec![ep, single_release()];
        let bound = bind(&intent, &recordings, &releases).expect("should bind");
        assert_eq!(bound.release_id, "rel-ep");
    }

    #[test]
    fn compilation_rejected_when_title_does_not_match_album_hint() {
        let mut intent = Intent::new("John Rich", "Shuttin' Detroit Down");
        intent.album = Some("Son of a Preacher Man".into());
        intent.thresholds.mb_binding_threshold = 0.5;
        let recording = sample_recording();
        let mut compilation = single_release();
        compilation.release_id = "rel-comp".into();
        compilation.title = "Now That's What I Call Country".into();
        compilation.release_group.primary_type = ReleaseGroupPrimaryType::Album;
        compilation.release_group.secondary_types = vec![ReleaseGroupSecondaryType::Compilation];
        let recordings = vec![Recording {
            release_refs: vec!["rel-comp".into()],
            ..recording
        }];
        let releases = vec![compilation];
        let err = bind(&intent, &recordings, &releases).unwrap_err();
        assert!(err.reasons.contains(&FailureReason::CompilationAlbumMismatch));
    }

    #[test]
    fn below_threshold_fails_with_mb_binding_below_threshold() {
        let mut intent = Intent::new("John Rich", "Shuttin' Detroit Down");
        intent.thresholds.mb_binding_threshold = 0.99;
        let recordings = vec![sample_recording()];
        let releases = vec![single_release()];
        let err = bind(&intent, &recordings, &releases).unwrap_err();
        assert!(matches!(err.final_reason, FailureReason::MbBindingBelowThreshold { .. }));
    }

    #[test]
    fn dateless_release_is_not_usable() {
        let mut intent = Intent::new("John Rich", "Shuttin' Detroit Down");
        intent.duration_hint_ms = Some(222_000);
        intent.thresholds.mb_binding_threshold = 0.5;
        let mut dateless = album_release();
        dateless.date = None;
        let recordings = vec![sample_recording()];
        let releases = vec![dateless, single_release()];
        let bound = bind(&intent, &recordings, &releases).expect("should fall back to the single");
        assert_eq!(bound.release_id, "rel-single");
    }

    #[test]
    fn recording_with_disallowed_variant_tag_is_filtered_at_stage_one() {
        let mut intent = Intent::new("John Rich", "Shuttin' Detroit Down");
        intent.thresholds.mb_binding_threshold = 0.1;
        let recording = Recording {
            title: "Shuttin' Detroit Down (Live)".into(),
            ..sample_recording()
        };
        let releases = vec![single_release()];
        let err = bind(&intent, &[recording], &releases).unwrap_err();
        assert!(err
            .reasons
            .iter()
            .any(|r| matches!(r, FailureReason::DisallowedVariant { variant: VariantTag::Live })));
    }
}
