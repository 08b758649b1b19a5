//! Media Candidate Resolver (spec §4.E).
//!
//! Builds a deterministic query from the intent, walks configured provider
//! adapters in `source_priority` order, scores every candidate, and selects
//! the best one under a fixed total order. When nothing clears the
//! acceptance threshold, retries through six progressively looser query
//! "rungs" before giving up.

use crate::adapters::ProviderAdapter;
use crate::model::{Intent, MediaCandidate, RejectedCandidate, RungOutcome, ScoredCandidate};
use crate::normalize::{normalize, relax};
use crate::scoring::score_candidate;

/// Everything the resolver observed while walking the relaxation ladder,
/// handed to the caller to fold into a `DecisionEdge` alongside the binding
/// outcome (spec §4.G) — the resolver itself only knows about the media
/// stage, not MB binding.
pub struct ResolveOutcome {
    pub accepted: Option<ScoredCandidate>,
    pub rung_outcomes: Vec<RungOutcome>,
    pub rejected_candidates: Vec<RejectedCandidate>,
}

/// One step of the relaxation ladder: a human-readable label (kept in the
/// Decision Edge) and how to build the query string from the intent.
struct Rung {
    label: &'static str,
    build_query: fn(&Intent) -> String,
}

const RUNGS: &[Rung] = &[
    Rung {
        label: "artist+track+album",
        build_query: |intent| match &intent.album {
            Some(album) => format!("{} {} {}", intent.artist, intent.track, album),
            None => format!("{} {}", intent.artist, intent.track),
        },
    },
    Rung {
        label: "artist+track",
        build_query: |intent| format!("{} {}", intent.artist, intent.track),
    },
    Rung {
        label: "artist+normalized_track",
        build_query: |intent| format!("{} {}", intent.artist, normalize(&intent.track)),
    },
    Rung {
        label: "artist+relaxed_track",
        build_query: |intent| format!("{} {}", intent.artist, relax(&intent.track)),
    },
    Rung {
        label: "normalized_artist+normalized_track",
        build_query: |intent| format!("{} {}", normalize(&intent.artist), normalize(&intent.track)),
    },
    Rung {
        label: "track_only",
        build_query: |intent| normalize(&intent.track),
    },
];

/// Total order for selecting the winning candidate among those that are not
/// rejected (spec §4.E): `final_score` desc, duration delta asc, title
/// noise asc, `source_priority_rank` asc, `candidate_id` asc for a fully
/// deterministic tie break.
fn is_better(a: &ScoredCandidate, b: &ScoredCandidate, expected_ms: Option<u64>) -> bool {
    if (a.final_score - b.final_score).abs() > f64::EPSILON {
        return a.final_score > b.final_score;
    }
    let a_delta = a.duration_delta_ms(expected_ms);
    let b_delta = b.duration_delta_ms(expected_ms);
    if a_delta != b_delta {
        return a_delta < b_delta;
    }
    if a.title_noise_score != b.title_noise_score {
        return a.title_noise_score < b.title_noise_score;
    }
    if a.source_priority_rank != b.source_priority_rank {
        return a.source_priority_rank < b.source_priority_rank;
    }
    a.candidate.candidate_id < b.candidate.candidate_id
}

async fn query_all_adapters(
    adapters: &[Box<dyn ProviderAdapter>],
    intent: &Intent,
    query: &str,
    curated_uploaders: &[String],
) -> (Vec<ScoredCandidate>, Vec<RejectedCandidate>) {
    let mut scored = Vec::new();
    let mut rejected = Vec::new();

    for (rank, adapter) in adapters.iter().enumerate() {
        if !intent.source_priority.iter().any(|s| s == adapter.name()) {
            continue;
        }
        let candidates: Vec<MediaCandidate> = match adapter.search(query).await {
            Ok(c) => c,
            Err(_) => continue,
        };
        for candidate in candidates {
            let candidate_id = candidate.candidate_id.clone();
            let source = candidate.source.clone();
            let result = score_candidate(intent, candidate, rank, 1.0, curated_uploaders);
            if let Some(reason) = &result.rejection_reason {
                rejected.push(RejectedCandidate {
                    candidate_id,
                    source,
                    final_score: result.final_score,
                    reason: reason.code().to_string(),
                    subscores: result.subscores.clone(),
                });
            } else {
                scored.push(result);
            }
        }
    }

    (scored, rejected)
}

/// Resolve an intent against a set of provider adapters (spec §4.E).
/// `curated_uploaders` feeds `uploader_trust` (spec §4.B).
pub async fn resolve(
    intent: &Intent,
    adapters: &[Box<dyn ProviderAdapter>],
    curated_uploaders: &[String],
) -> ResolveOutcome {
    let mut rung_outcomes = Vec::new();
    let mut all_rejected = Vec::new();

    for (idx, rung) in RUNGS.iter().enumerate() {
        let query = (rung.build_query)(intent);
        tracing::debug!(rung = rung.label, %query, "querying provider adapters");
        let (mut scored, rejected) = query_all_adapters(adapters, intent, &query, curated_uploaders).await;
        all_rejected.extend(rejected);

        scored.sort_by(|a, b| {
            if is_better(a, b, intent.duration_hint_ms) {
                std::cmp::Ordering::Less
            } else if is_better(b, a, intent.duration_hint_ms) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });

        let best = scored.into_iter().next();
        let accepted = best
            .as_ref()
            .map(|b| b.final_score >= intent.thresholds.acceptance_threshold)
            .unwrap_or(false);

        rung_outcomes.push(RungOutcome {
            rung: idx as u8,
            query: query.clone(),
            accepted,
            best_score: best.as_ref().map(|b| b.final_score),
        });

        if accepted {
            return ResolveOutcome {
                accepted: best,
                rung_outcomes,
                rejected_candidates: all_rejected,
            };
        }
    }

    ResolveOutcome {
        accepted: None,
        rung_outcomes,
        rejected_candidates: all_rejected,
    }
}
