//! trackbind — deterministic resolution of music-track intents to catalog
//! releases and media candidates.
//!
//! The pipeline is four pure stages (normalize → score → bind → enrich →
//! build path) wrapped around two I/O boundaries (the catalog client and the
//! provider adapters, both async). [`resolve_intent`] wires the whole thing
//! together for a single intent; everything it calls can also be used on
//! its own.

pub mod adapters;
pub mod binding;
pub mod config;
pub mod decision;
pub mod enrichment;
pub mod error;
pub mod ledger;
pub mod model;
pub mod normalize;
pub mod path_builder;
pub mod ratelimit;
pub mod resolver;
pub mod retry;
pub mod scoring;

use adapters::{CatalogClient, ProviderAdapter};
use model::{BindingOutcome, DecisionEdge, Intent, Recording, Release, TerminalStatus};

/// The end-to-end outcome of resolving one intent: the canonical path when
/// everything succeeds, plus the Decision Edge either way (spec §4.G, §7:
/// exactly one terminal outcome per intent).
pub struct ResolutionResult {
    pub path: Option<String>,
    pub decision: DecisionEdge,
}

/// Run the full pipeline for one `music_track` intent (spec §3, §4.A-§4.G).
/// `recordings`/`releases` are the catalog search results the caller already
/// fetched through its `CatalogClient`; `adapters` are the media provider
/// adapters to query in `intent.source_priority` order.
pub async fn resolve_intent(
    intent: &Intent,
    recordings: &[Recording],
    releases: &[Release],
    adapters: &[Box<dyn ProviderAdapter>],
    curated_uploaders: &[String],
    ext: &str,
) -> ResolutionResult {
    let fingerprint = decision::intent_fingerprint(intent);

    let bound = match binding::bind(intent, recordings, releases) {
        Ok(bound) => bound,
        Err(err) => {
            tracing::warn!(intent_fingerprint = %fingerprint, reason = err.final_reason.code(), "binding failed");
            return ResolutionResult {
                path: None,
                decision: DecisionEdge {
                    intent_fingerprint: fingerprint,
                    binding_outcome: BindingOutcome::Failed {
                        reasons: err.reasons.iter().map(|r| r.code().to_string()).collect(),
                    },
                    rung_outcomes: Vec::new(),
                    accepted_candidate: None,
                    rejected_candidates: Vec::new(),
                    terminal_status: TerminalStatus::Failed,
                },
            };
        }
    };

    let release = releases.iter().find(|r| r.release_id == bound.release_id);
    let bound = match release {
        Some(release) => match enrichment::enrich(bound.clone(), release) {
            Ok(bound) => bound,
            Err(reason) => {
                tracing::warn!(intent_fingerprint = %fingerprint, reason = reason.code(), "enrichment failed");
                return ResolutionResult {
                    path: None,
                    decision: DecisionEdge {
                        intent_fingerprint: fingerprint,
                        binding_outcome: BindingOutcome::Bound(bound),
                        rung_outcomes: Vec::new(),
                        accepted_candidate: None,
                        rejected_candidates: Vec::new(),
                        terminal_status: TerminalStatus::Failed,
                    },
                };
            }
        },
        None => bound,
    };

    let outcome = resolver::resolve(intent, adapters, curated_uploaders).await;
    let Some(accepted) = outcome.accepted else {
        return ResolutionResult {
            path: None,
            decision: DecisionEdge {
                intent_fingerprint: fingerprint,
                binding_outcome: BindingOutcome::Bound(bound),
                rung_outcomes: outcome.rung_outcomes,
                accepted_candidate: None,
                rejected_candidates: outcome.rejected_candidates,
                terminal_status: TerminalStatus::Failed,
            },
        };
    };

    let path_result = path_builder::build_path(&bound, &intent.artist, &bound.track_title, ext);

    let (path, terminal_status) = match &path_result {
        Ok(path) => (Some(path.clone()), TerminalStatus::Completed),
        Err(_) => (None, TerminalStatus::Failed),
    };

    ResolutionResult {
        path,
        decision: DecisionEdge {
            intent_fingerprint: fingerprint,
            binding_outcome: BindingOutcome::Bound(bound),
            rung_outcomes: outcome.rung_outcomes,
            accepted_candidate: Some(accepted),
            rejected_candidates: outcome.rejected_candidates,
            terminal_status,
        },
    }
}

/// Re-fetch a release through the catalog client if it's missing from the
/// caller-supplied `releases` slice, going through the rate limiter/retry
/// stack via `CatalogClient` (spec §4.C, §5).
pub async fn fetch_missing_release(
    client: &dyn CatalogClient,
    releases: &mut Vec<Release>,
    release_id: &str,
) -> Result<(), error::TransportError> {
    if releases.iter().any(|r| r.release_id == release_id) {
        return Ok(());
    }
    let release = client.get_release(release_id).await?;
    releases.push(release);
    Ok(())
}
