//! Core data model (spec §3): intents, the closed variant-tag vocabulary,
//! catalog (MB) entities, the media-candidate shape, and the records the
//! core emits (Bound Pair, Scored Candidate, Decision Edge).
//!
//! Dynamic dict blobs from the catalog/providers are parsed into these typed
//! records at the boundary (§9) — nothing downstream of this module touches
//! raw JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Closed variant-tag vocabulary (spec §3). Ordered so `BTreeSet<VariantTag>`
/// iterates deterministically, which matters for decision-log byte-stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantTag {
    Live,
    Acoustic,
    Remaster,
    Remix,
    RadioEdit,
    Extended,
    Edit,
    Cut,
    SpedUp,
    Slowed,
    Nightcore,
    EightD,
    LyricVideo,
    MusicVideo,
    Audio,
    OfficialVideo,
    Preview,
    Cover,
    Instrumental,
    Karaoke,
    Deluxe,
}

impl VariantTag {
    /// Neutral variants modify packaging/presentation, not the recording
    /// identity, and never cause rejection (spec §3, GLOSSARY).
    pub fn is_neutral(self) -> bool {
        matches!(
            self,
            VariantTag::Audio | VariantTag::OfficialVideo | VariantTag::Deluxe
        )
    }

    pub fn is_discriminating(self) -> bool {
        !self.is_neutral()
    }
}

/// The set of variant tags a caller will accept for a given intent. Derived
/// from the query itself (spec §4.A: "a query containing 'live' enables
/// `live`").
pub type VariantSet = BTreeSet<VariantTag>;

/// Per-call tunable knobs (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum `correctness_score / MAX_SCORE` to accept an MB binding.
    pub mb_binding_threshold: f64,
    /// Max allowed `|length_ms - duration_hint_ms|` during recording search.
    pub max_duration_delta_ms: u64,
    /// Minimum `final_score` to accept a media candidate.
    pub acceptance_threshold: f64,
    /// Tolerance between the bound duration and the probed file duration.
    pub duration_tolerance_seconds: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            mb_binding_threshold: 0.90,
            max_duration_delta_ms: 10_000,
            acceptance_threshold: 0.78,
            duration_tolerance_seconds: 5.0,
        }
    }
}

/// The kind of media the caller is asking to resolve. Non-music kinds are
/// ignored by the core (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaIntentKind {
    MusicTrack,
    MusicAlbum,
    Other,
}

/// A caller-supplied intent to resolve (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub artist: String,
    pub track: String,
    pub album: Option<String>,
    pub duration_hint_ms: Option<u64>,
    pub media_intent: MediaIntentKind,
    pub country_preference: Option<String>,
    pub allow_variants: VariantSet,
    #[serde(default)]
    pub thresholds: Thresholds,
    pub source_priority: Vec<String>,
    /// Core default is `false` (spec §4.C, stage 3): non-album fallback is
    /// only permitted for explicit single intents.
    #[serde(default)]
    pub allow_non_album_fallback: bool,
}

impl Intent {
    pub fn new(artist: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
            album: None,
            duration_hint_ms: None,
            media_intent: MediaIntentKind::MusicTrack,
            country_preference: None,
            allow_variants: VariantSet::new(),
            thresholds: Thresholds::default(),
            source_priority: Vec::new(),
            allow_non_album_fallback: false,
        }
    }
}

// ============================================================================
// Catalog (MB) entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    Official,
    Promotion,
    Bootleg,
    PseudoRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseGroupPrimaryType {
    Album,
    Ep,
    Single,
    Broadcast,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseGroupSecondaryType {
    Compilation,
    Soundtrack,
    Live,
    Remix,
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseGroup {
    pub id: String,
    pub primary_type: ReleaseGroupPrimaryType,
    pub secondary_types: Vec<ReleaseGroupSecondaryType>,
}

impl ReleaseGroup {
    pub fn is_compilation(&self) -> bool {
        self.secondary_types
            .iter()
            .any(|t| matches!(t, ReleaseGroupSecondaryType::Compilation))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediumTrack {
    pub position: u32,
    pub recording_id: String,
    pub length_ms: Option<u64>,
    /// The track's own title on this release, which can differ from the
    /// recording's canonical title (e.g. a live-album tracklist entry).
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medium {
    pub position: u32,
    pub tracks: Vec<MediumTrack>,
}

/// A release as returned by `get_release` (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub release_id: String,
    pub title: String,
    pub status: ReleaseStatus,
    pub country: Option<String>,
    /// `YYYY[-MM[-DD]]`, kept as the raw string; see [`crate::binding::release_date_year`].
    pub date: Option<String>,
    pub release_group: ReleaseGroup,
    pub medium_list: Vec<Medium>,
    pub has_isrc: bool,
    pub has_label: bool,
    pub has_barcode: bool,
}

impl Release {
    /// Locate the (disc, track#, length, track title) for a recording on
    /// this release, if present.
    pub fn find_track(&self, recording_id: &str) -> Option<(u32, u32, Option<u64>, String)> {
        for medium in &self.medium_list {
            for track in &medium.tracks {
                if track.recording_id == recording_id {
                    return Some((medium.position, track.position, track.length_ms, track.title.clone()));
                }
            }
        }
        None
    }
}

/// A recording as returned by `search_recordings`/`get_recording` (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub recording_id: String,
    pub title: String,
    pub artist_credit_name: String,
    pub length_ms: Option<u64>,
    pub isrcs: Vec<String>,
    pub ext_score: u8,
    pub release_refs: Vec<String>,
    pub aliases: Vec<String>,
    pub disambiguation: Option<String>,
}

// ============================================================================
// Binding output
// ============================================================================

/// The canonical identity tuple produced by the binding engine (GLOSSARY).
/// Every field is non-empty once a Bound Pair exists (spec §3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundPair {
    pub recording_id: String,
    pub release_id: String,
    pub release_group_id: String,
    pub album_title: String,
    pub release_date: String,
    pub track_number: u32,
    pub disc_number: u32,
    pub duration_ms: u64,
    /// The chosen release's tracklist title for this recording — the
    /// canonical title that flows into the path builder, not the raw query.
    pub track_title: String,
    pub isrc: Option<String>,
    pub track_aliases: BTreeSet<String>,
}

// ============================================================================
// Media candidates
// ============================================================================

/// A raw candidate from a provider adapter (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCandidate {
    pub candidate_id: String,
    pub source: String,
    pub url: String,
    pub title: String,
    pub uploader: Option<String>,
    pub duration_sec: Option<u64>,
    pub artist_detected: Option<String>,
    pub track_detected: Option<String>,
    pub album_detected: Option<String>,
    pub official: Option<bool>,
    pub isrc: Option<String>,
}

/// Per-field subscores attached to a candidate once scored (spec §3, §4.B).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscores {
    pub artist_similarity: f64,
    pub track_similarity: f64,
    pub album_similarity: f64,
    pub duration_score: f64,
    pub uploader_trust: f64,
    pub source_modifier: f64,
}

/// A candidate after scoring (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: MediaCandidate,
    pub subscores: Subscores,
    pub variant_tags: VariantSet,
    pub title_noise_score: u32,
    pub final_score: f64,
    pub rejection_reason: Option<crate::error::FailureReason>,
    pub source_priority_rank: usize,
    pub score_track_variant_used: TrackVariantUsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackVariantUsed {
    Normalized,
    Relaxed,
    Alias,
}

impl ScoredCandidate {
    pub fn duration_delta_ms(&self, expected_ms: Option<u64>) -> u64 {
        match (self.candidate.duration_sec, expected_ms) {
            (Some(cand), Some(expected)) => {
                let cand_ms = cand.saturating_mul(1000);
                cand_ms.abs_diff(expected)
            }
            _ => u64::MAX,
        }
    }
}

// ============================================================================
// Decision Edge (spec §3, §4.G)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub candidate_id: String,
    pub source: String,
    pub final_score: f64,
    pub reason: String,
    pub subscores: Subscores,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BindingOutcome {
    Bound(BoundPair),
    Failed { reasons: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RungOutcome {
    pub rung: u8,
    pub query: String,
    pub accepted: bool,
    pub best_score: Option<f64>,
}

/// The per-intent structured record of what happened (GLOSSARY). Always
/// exactly one of these is produced per intent (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEdge {
    pub intent_fingerprint: String,
    pub binding_outcome: BindingOutcome,
    pub rung_outcomes: Vec<RungOutcome>,
    pub accepted_candidate: Option<ScoredCandidate>,
    pub rejected_candidates: Vec<RejectedCandidate>,
    pub terminal_status: TerminalStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Completed,
    Failed,
    ValidationFailed,
    Cancelled,
}
