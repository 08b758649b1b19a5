//! Closed failure taxonomy (spec §4.G) and the transport-level error split
//! used by the retry layer (§5, §7).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every core function that can fail returns one of these. The variant name
/// is the string-stable reason surfaced in the decision log.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum FailureReason {
    #[error("no candidate scored above the acceptance threshold")]
    NoCandidateAboveThreshold,

    #[error("candidate filtered by duration gate")]
    DurationFiltered,

    #[error("duration delta {delta_ms}ms exceeds limit {limit_ms}ms")]
    DurationDeltaGtLimit { delta_ms: u64, limit_ms: u64 },

    #[error("candidate carries disallowed discriminating variant {variant:?}")]
    DisallowedVariant { variant: crate::model::VariantTag },

    #[error("cover version by a different artist")]
    CoverArtist,

    #[error("preview clip rejected: too short for the expected full-length track")]
    Preview,

    #[error("MB binding correctness score {score:.3} below threshold {threshold:.3}")]
    MbBindingBelowThreshold { score: f64, threshold: f64 },

    #[error("no valid release found for recording {recording_id}")]
    NoValidReleaseForRecording { recording_id: String },

    #[error("compilation release title does not match album hint")]
    CompilationAlbumMismatch,

    #[error("release enrichment could not fill required fields")]
    ReleaseEnrichmentIncomplete,

    #[error("music_track intent requires MB-bound metadata before path build")]
    MusicTrackRequiresMbBoundMetadata,

    #[error("release metadata incomplete before path build")]
    MusicReleaseMetadataIncompleteBeforePathBuild,

    #[error("external source unavailable: {detail}")]
    SourceUnavailable { detail: String },

    #[error("filename contract violation: {detail}")]
    MusicFilenameContractViolation { detail: String },
}

impl FailureReason {
    /// The stable string used in logs and the decision edge.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::NoCandidateAboveThreshold => "no_candidate_above_threshold",
            FailureReason::DurationFiltered => "duration_filtered",
            FailureReason::DurationDeltaGtLimit { .. } => "duration_delta_gt_limit",
            FailureReason::DisallowedVariant { .. } => "disallowed_variant",
            FailureReason::CoverArtist => "cover_artist",
            FailureReason::Preview => "preview",
            FailureReason::MbBindingBelowThreshold { .. } => "mb_binding_below_threshold",
            FailureReason::NoValidReleaseForRecording { .. } => "no_valid_release_for_recording",
            FailureReason::CompilationAlbumMismatch => "compilation_album_mismatch",
            FailureReason::ReleaseEnrichmentIncomplete => "release_enrichment_incomplete",
            FailureReason::MusicTrackRequiresMbBoundMetadata => {
                "music_track_requires_mb_bound_metadata"
            }
            FailureReason::MusicReleaseMetadataIncompleteBeforePathBuild => {
                "music_release_metadata_incomplete_before_path_build"
            }
            FailureReason::SourceUnavailable { .. } => "source_unavailable",
            FailureReason::MusicFilenameContractViolation { .. } => {
                "music_filename_contract_violation"
            }
        }
    }
}

/// Binding failure: an ordered list of reasons accumulated while walking
/// recordings/releases (§4.C `last_failure_reasons`), plus the final reason.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("MB binding failed: {final_reason}")]
pub struct BindingError {
    pub final_reason: FailureReason,
    pub reasons: Vec<FailureReason>,
}

impl BindingError {
    pub fn new(final_reason: FailureReason, reasons: Vec<FailureReason>) -> Self {
        Self {
            final_reason,
            reasons,
        }
    }

    pub fn single(reason: FailureReason) -> Self {
        Self {
            final_reason: reason.clone(),
            reasons: vec![reason],
        }
    }
}

/// Transport-level error from an external collaborator (MB client, provider
/// adapter, ledger I/O). Classified up front so the retry layer never has
/// to string-match at the call site (§5, §7).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transient error contacting {host}: {detail}")]
    Transient { host: String, detail: String },

    #[error("permanent error contacting {host}: {detail}")]
    Permanent { host: String, detail: String },

    #[error("request to {host} cancelled")]
    Cancelled { host: String },

    #[error("request to {host} timed out after {timeout_ms}ms")]
    Timeout { host: String, timeout_ms: u64 },
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Transient { .. } | TransportError::Timeout { .. })
    }
}
