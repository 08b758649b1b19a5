//! External collaborator contracts (spec §6): the catalog (MB) client and
//! the media provider adapters, plus `reqwest`-backed implementations that
//! compose the rate limiter and retry layer around each outgoing call.

use crate::error::TransportError;
use crate::model::{MediaCandidate, Recording, Release};
use crate::ratelimit::HostRateLimiters;
use crate::retry::with_retry;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// The catalog contract the binding engine depends on (spec §4.C, §6).
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_recordings(&self, artist: &str, track: &str) -> Result<Vec<Recording>, TransportError>;
    async fn get_release(&self, release_id: &str) -> Result<Release, TransportError>;
}

/// A media provider adapter the resolver queries for candidates (spec §4.E,
/// §6). `name` must match an entry in `Intent::source_priority`.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;
    async fn search(&self, query: &str) -> Result<Vec<MediaCandidate>, TransportError>;
}

/// `reqwest`-backed MB client. Talks JSON over HTTP, rate-limited per host
/// and retried through the shared transient-error policy (spec §5).
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    limiters: Arc<HostRateLimiters>,
    timeout: Duration,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>, limiters: Arc<HostRateLimiters>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        let host = reqwest::Url::parse(&base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| base_url.clone());
        Self {
            http: reqwest::Client::new(),
            base_url,
            host,
            limiters,
            timeout,
        }
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let host = self.host.clone();
        with_retry(&host, || {
            let url = url.clone();
            let host = self.host.clone();
            async move {
                self.limiters.acquire(&host).await;
                let response = self
                    .http
                    .get(&url)
                    .timeout(self.timeout)
                    .send()
                    .await
                    .map_err(|e| classify_reqwest_error(&host, e))?;
                if !response.status().is_success() {
                    return Err(TransportError::Permanent {
                        host: host.clone(),
                        detail: format!("HTTP {}", response.status()),
                    });
                }
                response
                    .json::<serde_json::Value>()
                    .await
                    .map_err(|e| TransportError::Permanent {
                        host,
                        detail: e.to_string(),
                    })
            }
        })
        .await
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search_recordings(&self, artist: &str, track: &str) -> Result<Vec<Recording>, TransportError> {
        let path = format!(
            "/ws/2/recording?query=artist:{}%20AND%20recording:{}&fmt=json",
            urlencoding_lite(artist),
            urlencoding_lite(track)
        );
        let body = self.get_json(&path).await?;
        parse_recordings(&body)
    }

    async fn get_release(&self, release_id: &str) -> Result<Release, TransportError> {
        let path = format!("/ws/2/release/{}?inc=recordings+release-groups+labels&fmt=json", release_id);
        let body = self.get_json(&path).await?;
        parse_release(&body, release_id)
    }
}

/// `reqwest`-backed media provider adapter, generic over the search path so
/// a single struct backs every configured `source_priority` entry.
pub struct HttpProviderAdapter {
    name: String,
    http: reqwest::Client,
    search_url: String,
    limiters: Arc<HostRateLimiters>,
    timeout: Duration,
}

impl HttpProviderAdapter {
    pub fn new(name: impl Into<String>, search_url: impl Into<String>, limiters: Arc<HostRateLimiters>, timeout: Duration) -> Self {
        let search_url = search_url.into();
        Self {
            name: name.into(),
            http: reqwest::Client::new(),
            search_url,
            limiters,
            timeout,
        }
    }

    fn host(&self) -> String {
        reqwest::Url::parse(&self.search_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.search_url.clone())
    }
}

#[async_trait]
impl ProviderAdapter for HttpProviderAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaCandidate>, TransportError> {
        let host = self.host();
        let source = self.name.clone();
        with_retry(&host, || {
            let query = query.to_string();
            let host = host.clone();
            let source = source.clone();
            async move {
                self.limiters.acquire(&host).await;
                let response = self
                    .http
                    .get(&self.search_url)
                    .query(&[("q", query.as_str())])
                    .timeout(self.timeout)
                    .send()
                    .await
                    .map_err(|e| classify_reqwest_error(&host, e))?;
                if !response.status().is_success() {
                    return Err(TransportError::Permanent {
                        host: host.clone(),
                        detail: format!("HTTP {}", response.status()),
                    });
                }
                let body: serde_json::Value = response.json().await.map_err(|e| TransportError::Permanent {
                    host: host.clone(),
                    detail: e.to_string(),
                })?;
                parse_candidates(&body, &source)
            }
        })
        .await
    }
}

fn classify_reqwest_error(host: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            host: host.to_string(),
            timeout_ms: 10_000,
        }
    } else if err.is_connect() {
        TransportError::Transient {
            host: host.to_string(),
            detail: err.to_string(),
        }
    } else {
        TransportError::Permanent {
            host: host.to_string(),
            detail: err.to_string(),
        }
    }
}

fn urlencoding_lite(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_string() } else { format!("%{:02X}", c as u32) })
        .collect()
}

fn parse_recordings(body: &serde_json::Value) -> Result<Vec<Recording>, TransportError> {
    let entries = body
        .get("recordings")
        .and_then(|v| v.as_array())
        .ok_or_else(|| TransportError::Permanent {
            host: "musicbrainz".into(),
            detail: "missing recordings array in response".into(),
        })?;
    Ok(entries
        .iter()
        .filter_map(|entry| {
            Some(Recording {
                recording_id: entry.get("id")?.as_str()?.to_string(),
                title: entry.get("title")?.as_str()?.to_string(),
                artist_credit_name: entry
                    .get("artist-credit")
                    .and_then(|ac| ac.as_array())
                    .and_then(|ac| ac.first())
                    .and_then(|c| c.get("name"))
                    .and_then(|n| n.as_str())
                    .unwrap_or_default()
                    .to_string(),
                length_ms: entry.get("length").and_then(|v| v.as_u64()),
                isrcs: entry
                    .get("isrcs")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default(),
                ext_score: entry.get("score").and_then(|v| v.as_u64()).unwrap_or(0) as u8,
                release_refs: entry
                    .get("releases")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().filter_map(|r| r.get("id")?.as_str().map(str::to_string)).collect())
                    .unwrap_or_default(),
                aliases: Vec::new(),
                disambiguation: entry.get("disambiguation").and_then(|v| v.as_str()).map(str::to_string),
            })
        })
        .collect())
}

fn parse_release(body: &serde_json::Value, release_id: &str) -> Result<Release, TransportError> {
    use crate::model::{Medium, MediumTrack, ReleaseGroup, ReleaseGroupPrimaryType, ReleaseStatus};

    let status = match body.get("status").and_then(|v| v.as_str()) {
        Some("Promotion") => ReleaseStatus::Promotion,
        Some("Bootleg") => ReleaseStatus::Bootleg,
        Some("Pseudo-Release") => ReleaseStatus::PseudoRelease,
        _ => ReleaseStatus::Official,
    };
    let primary_type = match body
        .get("release-group")
        .and_then(|rg| rg.get("primary-type"))
        .and_then(|v| v.as_str())
    {
        Some("Single") => ReleaseGroupPrimaryType::Single,
        Some("EP") => ReleaseGroupPrimaryType::Ep,
        Some("Broadcast") => ReleaseGroupPrimaryType::Broadcast,
        Some("Album") => ReleaseGroupPrimaryType::Album,
        _ => ReleaseGroupPrimaryType::Other,
    };
    let release_group_id = body
        .get("release-group")
        .and_then(|rg| rg.get("id"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let medium_list = body
        .get("media")
        .and_then(|v| v.as_array())
        .map(|media| {
            media
                .iter()
                .enumerate()
                .map(|(idx, medium)| Medium {
                    position: medium.get("position").and_then(|v| v.as_u64()).unwrap_or(idx as u64 + 1) as u32,
                    tracks: medium
                        .get("tracks")
                        .and_then(|v| v.as_array())
                        .map(|tracks| {
                            tracks
                                .iter()
                                .filter_map(|t| {
                                    let recording = t.get("recording")?;
                                    let title = t
                                        .get("title")
                                        .and_then(|v| v.as_str())
                                        .or_else(|| recording.get("title").and_then(|v| v.as_str()))
                                        .unwrap_or_default()
                                        .to_string();
                                    Some(MediumTrack {
                                        position: t.get("position").and_then(|v| v.as_u64())? as u32,
                                        recording_id: recording.get("id")?.as_str()?.to_string(),
                                        length_ms: t.get("length").and_then(|v| v.as_u64()),
                                        title,
                                    })
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Release {
        release_id: release_id.to_string(),
        title: body.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        status,
        country: body.get("country").and_then(|v| v.as_str()).map(str::to_string),
        date: body.get("date").and_then(|v| v.as_str()).map(str::to_string),
        release_group: ReleaseGroup {
            id: release_group_id,
            primary_type,
            secondary_types: Vec::new(),
        },
        medium_list,
        has_isrc: body.get("label-info").is_some(),
        has_label: body.get("label-info").is_some(),
        has_barcode: body.get("barcode").and_then(|v| v.as_str()).map(|s| !s.is_empty()).unwrap_or(false),
    })
}

fn parse_candidates(body: &serde_json::Value, source: &str) -> Result<Vec<MediaCandidate>, TransportError> {
    let entries = body
        .get("results")
        .and_then(|v| v.as_array())
        .ok_or_else(|| TransportError::Permanent {
            host: source.to_string(),
            detail: "missing results array in response".into(),
        })?;
    Ok(entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            Some(MediaCandidate {
                candidate_id: entry
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{source}-{idx}")),
                source: source.to_string(),
                url: entry.get("url")?.as_str()?.to_string(),
                title: entry.get("title")?.as_str()?.to_string(),
                uploader: entry.get("uploader").and_then(|v| v.as_str()).map(str::to_string),
                duration_sec: entry.get("duration_sec").and_then(|v| v.as_u64()),
                artist_detected: entry.get("artist").and_then(|v| v.as_str()).map(str::to_string),
                track_detected: entry.get("track").and_then(|v| v.as_str()).map(str::to_string),
                album_detected: entry.get("album").and_then(|v| v.as_str()).map(str::to_string),
                official: entry.get("official").and_then(|v| v.as_bool()),
                isrc: entry.get("isrc").and_then(|v| v.as_str()).map(str::to_string),
            })
        })
        .collect())
}
