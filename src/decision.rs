//! Intent fingerprinting (spec §4.G; supplemented from the original
//! implementation's `engine/canonical_ids.py`, SPEC_FULL.md §11).

use crate::model::Intent;
use sha2::{Digest, Sha256};

/// Duration is bucketed to 5-second granularity before hashing so two
/// intents that differ only by probe-timing jitter fingerprint identically.
fn duration_bucket(duration_hint_ms: Option<u64>) -> String {
    match duration_hint_ms {
        Some(ms) => (ms / 5000).to_string(),
        None => "none".to_string(),
    }
}

/// Stable hash of the fields that identify *what* an intent is asking for,
/// independent of tuning knobs like thresholds or source priority. Used as
/// the Decision Edge's `intent_fingerprint` so repeated runs of the same
/// intent are trivially correlated in a log store.
pub fn intent_fingerprint(intent: &Intent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(crate::normalize::normalize(&intent.artist).as_bytes());
    hasher.update(b"\0");
    hasher.update(crate::normalize::normalize(&intent.track).as_bytes());
    hasher.update(b"\0");
    if let Some(album) = &intent.album {
        hasher.update(crate::normalize::normalize(album).as_bytes());
    }
    hasher.update(b"\0");
    hasher.update(duration_bucket(intent.duration_hint_ms).as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let intent = Intent::new("John Rich", "Shuttin' Detroit Down");
        assert_eq!(intent_fingerprint(&intent), intent_fingerprint(&intent));
    }

    #[test]
    fn fingerprint_ignores_duration_jitter_within_bucket() {
        let mut a = Intent::new("John Rich", "Shuttin' Detroit Down");
        a.duration_hint_ms = Some(222_000);
        let mut b = a.clone();
        b.duration_hint_ms = Some(222_999);
        assert_eq!(intent_fingerprint(&a), intent_fingerprint(&b));
    }

    #[test]
    fn fingerprint_differs_on_track_name() {
        let a = Intent::new("John Rich", "Shuttin' Detroit Down");
        let b = Intent::new("John Rich", "Something Else");
        assert_ne!(intent_fingerprint(&a), intent_fingerprint(&b));
    }
}
