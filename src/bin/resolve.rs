//! CLI entry point: resolve a single music-track intent end to end.
//!
//! This is a thin demonstration harness over the library — it loads config,
//! wires up the HTTP-backed catalog client and provider adapters, and
//! prints the resulting Decision Edge as JSON. Real orchestration (batching,
//! playlist import, ledger-gated rework) is left to the caller embedding
//! the library.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use trackbind::adapters::{CatalogClient, HttpCatalogClient, HttpProviderAdapter, ProviderAdapter};
use trackbind::config::ResolverConfig;
use trackbind::model::Intent;
use trackbind::ratelimit::HostRateLimiters;

/// Resolve one music-track intent against the catalog and configured media
/// providers, printing the canonical path and Decision Edge.
#[derive(Parser, Debug)]
#[command(name = "trackbind", about = "Resolve a music-track intent to a canonical file path")]
struct Args {
    /// Expected artist name.
    #[arg(long)]
    artist: String,

    /// Expected track title.
    #[arg(long)]
    track: String,

    /// Expected album title, if known.
    #[arg(long)]
    album: Option<String>,

    /// Expected duration in milliseconds, if known.
    #[arg(long)]
    duration_ms: Option<u64>,

    /// ISO 3166-1 alpha-2 country preference for release selection.
    #[arg(long)]
    country: Option<String>,

    /// Container extension to use for the resolved path (without a dot).
    #[arg(long, default_value = "flac")]
    ext: String,

    /// Path to a TOML config file overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// MusicBrainz-compatible base URL.
    #[arg(long, default_value = "https://musicbrainz.org")]
    mb_base_url: String,

    /// Allow binding to a non-album release when no album/compilation match exists.
    #[arg(long)]
    allow_non_album_fallback: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ResolverConfig::load_from_path(path).with_context(|| format!("loading config from {}", path.display()))?,
        None => ResolverConfig::default(),
    };

    let mut intent = Intent::new(args.artist, args.track);
    intent.album = args.album;
    intent.duration_hint_ms = args.duration_ms;
    intent.country_preference = args.country;
    intent.thresholds = config.thresholds.clone();
    intent.source_priority = config.source_priority.clone();
    intent.allow_non_album_fallback = args.allow_non_album_fallback;
    intent.allow_variants = trackbind::normalize::allow_variants_from_query(&intent.track, intent.album.as_deref());

    let limiters = Arc::new(HostRateLimiters::new(config.requests_per_second));
    let timeout = Duration::from_millis(config.request_timeout_ms);

    let catalog = HttpCatalogClient::new(args.mb_base_url, limiters.clone(), timeout);
    let recordings = catalog
        .search_recordings(&intent.artist, &intent.track)
        .await
        .context("searching MusicBrainz recordings")?;

    let mut releases = Vec::new();
    for recording in &recordings {
        for release_id in &recording.release_refs {
            trackbind::fetch_missing_release(&catalog, &mut releases, release_id)
                .await
                .with_context(|| format!("fetching release {release_id}"))?;
        }
    }

    let adapters: Vec<Box<dyn ProviderAdapter>> = config
        .source_priority
        .iter()
        .map(|name| {
            Box::new(HttpProviderAdapter::new(
                name.clone(),
                format!("https://{name}.example.com/search"),
                limiters.clone(),
                timeout,
            )) as Box<dyn ProviderAdapter>
        })
        .collect();

    let result = trackbind::resolve_intent(
        &intent,
        &recordings,
        &releases,
        &adapters,
        &config.curated_uploaders,
        &args.ext,
    )
    .await;

    tracing::info!(
        intent_fingerprint = %result.decision.intent_fingerprint,
        terminal_status = ?result.decision.terminal_status,
        "intent resolved"
    );

    match &result.path {
        Some(path) => println!("{path}"),
        None => eprintln!("resolution failed: {:?}", result.decision.terminal_status),
    }

    println!("{}", serde_json::to_string_pretty(&result.decision)?);

    Ok(())
}
