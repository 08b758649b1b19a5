//! Idempotency Ledger (spec §4.H) plus the short-TTL release cache
//! described in SPEC_FULL.md §10.5.

use crate::error::TransportError;
use crate::model::Release;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Persists `(playlist_id, isrc)` pairs already resolved so a re-run of the
/// same playlist never redoes binding/resolution work for a track it has
/// already placed (spec §4.H).
pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    pub fn open(path: &str) -> Result<Self, TransportError> {
        let conn = Connection::open(path).map_err(|e| TransportError::Permanent {
            host: "ledger".into(),
            detail: e.to_string(),
        })?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS resolved_tracks (
                playlist_id TEXT NOT NULL,
                isrc        TEXT NOT NULL,
                path        TEXT NOT NULL,
                resolved_at TEXT NOT NULL,
                PRIMARY KEY (playlist_id, isrc)
            )",
            [],
        )
        .map_err(|e| TransportError::Permanent {
            host: "ledger".into(),
            detail: e.to_string(),
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, TransportError> {
        Self::open(":memory:")
    }

    /// Has this `(playlist_id, isrc)` pair already been resolved?
    pub fn has(&self, playlist_id: &str, isrc: &str) -> Result<bool, TransportError> {
        let conn = self.conn.lock().expect("ledger mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT 1 FROM resolved_tracks WHERE playlist_id = ?1 AND isrc = ?2")
            .map_err(|e| TransportError::Permanent {
                host: "ledger".into(),
                detail: e.to_string(),
            })?;
        let exists = stmt
            .exists(params![playlist_id, isrc])
            .map_err(|e| TransportError::Permanent {
                host: "ledger".into(),
                detail: e.to_string(),
            })?;
        Ok(exists)
    }

    /// Convenience wrapper around [`Ledger::record`] that stamps the current
    /// time.
    pub fn record_now(&self, playlist_id: &str, isrc: &str, path: &str) -> Result<(), TransportError> {
        self.record(playlist_id, isrc, path, &chrono::Utc::now().to_rfc3339())
    }

    /// Record a resolution. Uses `INSERT OR IGNORE` so a racing duplicate
    /// resolution is silently dropped rather than erroring (spec §4.H).
    pub fn record(&self, playlist_id: &str, isrc: &str, path: &str, resolved_at: &str) -> Result<(), TransportError> {
        let conn = self.conn.lock().expect("ledger mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO resolved_tracks (playlist_id, isrc, path, resolved_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![playlist_id, isrc, path, resolved_at],
        )
        .map_err(|e| TransportError::Permanent {
            host: "ledger".into(),
            detail: e.to_string(),
        })?;
        Ok(())
    }
}

/// Read-through cache for `get_release` lookups, bounded by a short TTL
/// (spec §5: repeated lookups of the same release within one run should not
/// re-hit the catalog). Not a store of record — just an internal cache.
pub struct ReleaseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Release, Instant)>>,
}

impl ReleaseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, release_id: &str) -> Option<Release> {
        let mut entries = self.entries.lock().expect("release cache mutex poisoned");
        match entries.get(release_id) {
            Some((release, stored_at)) if stored_at.elapsed() < self.ttl => Some(release.clone()),
            Some(_) => {
                entries.remove(release_id);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, release_id: String, release: Release) {
        let mut entries = self.entries.lock().expect("release cache mutex poisoned");
        entries.insert(release_id, (release, Instant::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Medium, ReleaseGroup, ReleaseGroupPrimaryType, ReleaseStatus};

    fn sample_release(id: &str) -> Release {
        Release {
            release_id: id.into(),
            title: "Title".into(),
            status: ReleaseStatus::Official,
            country: None,
            date: None,
            release_group: ReleaseGroup {
                id: "rg".into(),
                primary_type: ReleaseGroupPrimaryType::Album,
                secondary_types: vec![],
            },
            medium_list: vec![Medium {
                position: 1,
                tracks: vec![],
            }],
            has_isrc: false,
            has_label: false,
            has_barcode: false,
        }
    }

    #[test]
    fn has_is_false_until_recorded() {
        let ledger = Ledger::open_in_memory().unwrap();
        assert!(!ledger.has("pl-1", "ISRC1").unwrap());
        ledger
            .record_now("pl-1", "ISRC1", "Music/Artist/Album (2020)/Disc 1/01 - Song.flac")
            .unwrap();
        assert!(ledger.has("pl-1", "ISRC1").unwrap());
    }

    #[test]
    fn record_is_idempotent() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger.record("pl-1", "ISRC1", "path-a", "t1").unwrap();
        ledger.record("pl-1", "ISRC1", "path-b", "t2").unwrap();
        assert!(ledger.has("pl-1", "ISRC1").unwrap());
    }

    #[test]
    fn release_cache_round_trips_within_ttl() {
        let cache = ReleaseCache::new(Duration::from_secs(60));
        cache.put("rel-1".into(), sample_release("rel-1"));
        assert!(cache.get("rel-1").is_some());
        assert!(cache.get("rel-missing").is_none());
    }

    #[test]
    fn release_cache_expires_after_ttl() {
        let cache = ReleaseCache::new(Duration::from_millis(1));
        cache.put("rel-1".into(), sample_release("rel-1"));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("rel-1").is_none());
    }
}
