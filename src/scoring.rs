//! Scoring Kernel (spec §4.B).
//!
//! Pure functions only: every subscore and the combined `final_score` are
//! deterministic given the same `Intent`/`MediaCandidate` pair. Grounded on
//! the teacher's `duration_score` curve and `compute_artist_similarity`
//! token-Jaccard, generalized to the full candidate shape here.

use crate::error::FailureReason;
use crate::model::{Intent, MediaCandidate, ScoredCandidate, Subscores, TrackVariantUsed, VariantTag};
use crate::normalize::{extract_variant_tags, fold_to_ascii, noise_token_count, normalize, relax};
use rustc_hash::FxHashSet;

/// Fixed field weights (spec §4.B). Sum to 1.0.
const WEIGHT_ARTIST: f64 = 0.30;
const WEIGHT_TRACK: f64 = 0.35;
const WEIGHT_ALBUM: f64 = 0.10;
const WEIGHT_DURATION: f64 = 0.15;
const WEIGHT_UPLOADER: f64 = 0.05;
const WEIGHT_SOURCE: f64 = 0.05;

/// Contiguous-run floor for artist similarity (spec §4.B: "if the expected
/// artist appears as a contiguous run of tokens inside a candidate's artist
/// field, the similarity floors at 0.75 even if surrounding tokens differ").
const ARTIST_CONTIGUOUS_FLOOR: f64 = 0.75;

fn tokenize(s: &str) -> FxHashSet<String> {
    fold_to_ascii(s)
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

fn jaccard(a: &FxHashSet<String>, b: &FxHashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Longest common subsequence length over chars, as a ratio of the longer
/// string's length.
fn lcs_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 1.0 } else { 0.0 };
    }
    let mut prev = vec![0u32; b.len() + 1];
    let mut curr = vec![0u32; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs_len = prev[b.len()] as f64;
    lcs_len / a.len().max(b.len()) as f64
}

/// One field's similarity: the average of token-set Jaccard and LCS ratio,
/// both computed over the folded (ASCII, lowercased) form.
fn text_similarity(expected: &str, candidate: &str) -> f64 {
    let expected_folded = fold_to_ascii(expected);
    let candidate_folded = fold_to_ascii(candidate);
    let j = jaccard(&tokenize(expected), &tokenize(candidate));
    let l = lcs_ratio(&expected_folded, &candidate_folded);
    (j + l) / 2.0
}

/// `artist_similarity` (spec §4.B): token-set Jaccard over every artist
/// string the candidate offers, plus the contiguous-run floor.
pub fn artist_similarity(expected_artist: &str, candidate_artist_sources: &[&str]) -> f64 {
    let expected_tokens = tokenize(expected_artist);
    let expected_folded = fold_to_ascii(expected_artist);
    let mut best = 0.0f64;
    for source in candidate_artist_sources {
        if source.trim().is_empty() {
            continue;
        }
        let sim = jaccard(&expected_tokens, &tokenize(source));
        best = best.max(sim);
        let source_folded = fold_to_ascii(source);
        if !expected_folded.is_empty() && source_folded.contains(&expected_folded) {
            best = best.max(ARTIST_CONTIGUOUS_FLOOR);
        }
        // A near-miss on a single misspelled token (e.g. a transliteration
        // variant the catalog didn't normalize) still clears the floor.
        if !expected_folded.is_empty() && strsim::jaro_winkler(&expected_folded, &source_folded) > 0.92 {
            best = best.max(ARTIST_CONTIGUOUS_FLOOR);
        }
    }
    best
}

/// `track_similarity` (spec §4.B): scored against both `normalize(track)`
/// and `relax(track)`, combined by max; MB aliases (if any) are scored too
/// and can win outright.
pub fn track_similarity(
    expected_track: &str,
    candidate_title: &str,
    aliases: &[String],
) -> (f64, TrackVariantUsed) {
    let normalized_sim = text_similarity(&normalize(expected_track), &normalize(candidate_title));
    let relaxed_sim = text_similarity(&relax(expected_track), &relax(candidate_title));

    let (mut best, mut used) = if relaxed_sim > normalized_sim {
        (relaxed_sim, TrackVariantUsed::Relaxed)
    } else {
        (normalized_sim, TrackVariantUsed::Normalized)
    };

    for alias in aliases {
        let alias_sim = text_similarity(&normalize(alias), &normalize(candidate_title));
        if alias_sim > best {
            best = alias_sim;
            used = TrackVariantUsed::Alias;
        }
    }

    (best, used)
}

/// `album_similarity` (spec §4.B): Jaccard on normalized album tokens when
/// both sides are present; 0.5 when the candidate lacks album metadata at
/// all; 0 when both are present but disjoint (the natural Jaccard result).
pub fn album_similarity(expected_album: Option<&str>, candidate_album: Option<&str>) -> f64 {
    match (expected_album, candidate_album) {
        (Some(expected), Some(candidate)) => {
            jaccard(&tokenize(&normalize(expected)), &tokenize(&normalize(candidate)))
        }
        (_, None) => 0.5,
        (None, Some(_)) => 0.5,
    }
}

/// `duration_score` (spec §4.B) piecewise curve over `|delta|` in seconds.
/// Unknown duration on either side scores 0.5 (neither rewarded nor
/// penalized heavily).
pub fn duration_score(expected_ms: Option<u64>, candidate_sec: Option<u64>) -> f64 {
    let (expected_ms, candidate_sec) = match (expected_ms, candidate_sec) {
        (Some(e), Some(c)) => (e, c),
        _ => return 0.5,
    };
    let candidate_ms = candidate_sec.saturating_mul(1000);
    let delta_sec = expected_ms.abs_diff(candidate_ms) / 1000;
    match delta_sec {
        0..=2 => 1.00,
        3..=5 => 0.90,
        6..=10 => 0.75,
        11..=20 => 0.50,
        21..=30 => 0.20,
        _ => 0.0,
    }
}

/// `uploader_trust` (spec §4.B): 1.0 for an auto-generated "Artist - Topic"
/// channel or a member of the caller's curated uploader list, else 0.7.
pub fn uploader_trust(uploader: Option<&str>, expected_artist: &str, curated_uploaders: &[String]) -> f64 {
    let Some(uploader) = uploader else {
        return 0.7;
    };
    let uploader_folded = fold_to_ascii(uploader);
    let expected_folded = fold_to_ascii(expected_artist);
    let topic_suffix = format!("{} - topic", expected_folded);
    if uploader_folded == topic_suffix || uploader_folded == expected_folded {
        return 1.0;
    }
    if curated_uploaders
        .iter()
        .any(|c| fold_to_ascii(c) == uploader_folded)
    {
        return 1.0;
    }
    0.7
}

/// `title_noise_score` (spec §4.B): count of promotional tokens stripped
/// from the candidate's raw title. Purely informational — used for
/// tie-breaking, not weighted into `final_score`.
pub fn title_noise_score(raw_title: &str) -> u32 {
    noise_token_count(raw_title)
}

/// Penalty multipliers (spec §4.B), applied multiplicatively. Some also set
/// a hard `rejection_reason` so the candidate is excluded from selection
/// rather than merely down-weighted.
struct Penalty {
    multiplier: f64,
    rejection: Option<FailureReason>,
}

fn evaluate_penalties(
    intent: &Intent,
    candidate: &MediaCandidate,
    variant_tags: &crate::model::VariantSet,
) -> Vec<Penalty> {
    let mut penalties = Vec::new();

    let disallowed: Vec<VariantTag> = variant_tags
        .iter()
        .copied()
        .filter(|t| t.is_discriminating() && !intent.allow_variants.contains(t))
        .collect();

    if !disallowed.is_empty() {
        if disallowed == [VariantTag::Remaster] {
            // A stray remaster tag alone is treated gently: catalogs often
            // carry it on releases that are otherwise an exact match.
            penalties.push(Penalty {
                multiplier: 0.90,
                rejection: None,
            });
        } else {
            penalties.push(Penalty {
                multiplier: 0.10,
                rejection: Some(FailureReason::DisallowedVariant {
                    variant: disallowed[0],
                }),
            });
        }
    }

    if variant_tags.contains(&VariantTag::Cover) {
        let expected = fold_to_ascii(&intent.artist);
        let detected = candidate
            .artist_detected
            .as_deref()
            .map(fold_to_ascii)
            .unwrap_or_default();
        if !detected.is_empty() && !detected.contains(&expected) {
            penalties.push(Penalty {
                multiplier: 0.10,
                rejection: Some(FailureReason::CoverArtist),
            });
        }
    }

    let expects_full_length = intent.duration_hint_ms.map(|ms| ms > 60_000).unwrap_or(false);
    let looks_like_preview = variant_tags.contains(&VariantTag::Preview)
        || candidate.duration_sec.map(|d| d <= 45).unwrap_or(false);
    if expects_full_length && looks_like_preview {
        penalties.push(Penalty {
            multiplier: 0.10,
            rejection: Some(FailureReason::Preview),
        });
    }

    if let (Some(expected_album), Some(candidate_album)) = (&intent.album, &candidate.album_detected) {
        let sim = jaccard(
            &tokenize(&normalize(expected_album)),
            &tokenize(&normalize(candidate_album)),
        );
        if sim < 0.25 {
            penalties.push(Penalty {
                multiplier: 0.80,
                rejection: None,
            });
        }
    }

    penalties
}

/// Score one candidate against an intent (spec §4.B/§4.E). Pure function.
pub fn score_candidate(
    intent: &Intent,
    candidate: MediaCandidate,
    source_priority_rank: usize,
    source_modifier: f64,
    curated_uploaders: &[String],
) -> ScoredCandidate {
    let variant_tags = extract_variant_tags(&candidate.title);

    let mut artist_sources: Vec<&str> = vec![candidate.title.as_str()];
    if let Some(detected) = candidate.artist_detected.as_deref() {
        artist_sources.push(detected);
    }
    if let Some(uploader) = candidate.uploader.as_deref() {
        artist_sources.push(uploader);
    }

    let artist_sim = artist_similarity(&intent.artist, &artist_sources);

    let candidate_title_for_track = candidate
        .track_detected
        .as_deref()
        .unwrap_or(candidate.title.as_str());
    let (track_sim, variant_used) = track_similarity(&intent.track, candidate_title_for_track, &[]);

    let album_sim = album_similarity(intent.album.as_deref(), candidate.album_detected.as_deref());
    let duration = duration_score(intent.duration_hint_ms, candidate.duration_sec);
    let uploader = uploader_trust(candidate.uploader.as_deref(), &intent.artist, curated_uploaders);
    let noise = title_noise_score(&candidate.title);

    let subscores = Subscores {
        artist_similarity: artist_sim,
        track_similarity: track_sim,
        album_similarity: album_sim,
        duration_score: duration,
        uploader_trust: uploader,
        source_modifier,
    };

    let base_score = WEIGHT_ARTIST * subscores.artist_similarity
        + WEIGHT_TRACK * subscores.track_similarity
        + WEIGHT_ALBUM * subscores.album_similarity
        + WEIGHT_DURATION * subscores.duration_score
        + WEIGHT_UPLOADER * subscores.uploader_trust
        + WEIGHT_SOURCE * subscores.source_modifier;

    let penalties = evaluate_penalties(intent, &candidate, &variant_tags);
    let penalty_multiplier: f64 = penalties.iter().map(|p| p.multiplier).product();
    let rejection_reason = penalties.into_iter().find_map(|p| p.rejection);

    ScoredCandidate {
        candidate,
        subscores,
        variant_tags,
        title_noise_score: noise,
        final_score: base_score * penalty_multiplier,
        rejection_reason,
        source_priority_rank,
        score_track_variant_used: variant_used,
    }
}
