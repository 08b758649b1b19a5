//! Integration tests for the literal scenarios the core must satisfy.

use async_trait::async_trait;
use trackbind::adapters::ProviderAdapter;
use trackbind::error::{FailureReason, TransportError};
use trackbind::model::{
    Intent, Medium, MediumTrack, Recording, Release, ReleaseGroup, ReleaseGroupPrimaryType,
    ReleaseGroupSecondaryType, ReleaseStatus, VariantTag,
};

// Scenario 1: John Rich binds to the named album, not a fallback bucket.
#[test]
fn scenario_1_binds_to_named_album() {
    let mut intent = Intent::new("John Rich", "John Rich - Shuttin'Detroit Down [Music Video]");
    intent.album = Some("Son of a Preacher Man".into());
    intent.duration_hint_ms = Some(211_000);
    intent.country_preference = Some("US".into());
    intent.thresholds.mb_binding_threshold = 0.5;

    let recording = Recording {
        recording_id: "rec-1".into(),
        title: "Shuttin' Detroit Down".into(),
        artist_credit_name: "John Rich".into(),
        length_ms: Some(211_000),
        isrcs: vec!["USEP40900001".into()],
        ext_score: 100,
        release_refs: vec!["rel-1".into()],
        aliases: vec![],
        disambiguation: None,
    };
    let release = Release {
        release_id: "rel-1".into(),
        title: "Son of a Preacher Man".into(),
        status: ReleaseStatus::Official,
        country: Some("US".into()),
        date: Some("2009-05-19".into()),
        release_group: ReleaseGroup {
            id: "rg-1".into(),
            primary_type: ReleaseGroupPrimaryType::Album,
            secondary_types: vec![],
        },
        medium_list: vec![Medium {
            position: 1,
            tracks: vec![MediumTrack {
                position: 1,
                recording_id: "rec-1".into(),
                length_ms: Some(211_000),
                title: "Shuttin' Detroit Down".into(),
            }],
        }],
        has_isrc: true,
        has_label: true,
        has_barcode: true,
    };

    let bound = trackbind::binding::bind(&intent, &[recording], &[release]).expect("should bind");
    assert_eq!(bound.album_title, "Son of a Preacher Man");
    assert_eq!(bound.track_title, "Shuttin' Detroit Down");
    assert!(bound.track_number >= 1);
    assert!(bound.disc_number >= 1);
}

// Scenario 2: a Live candidate and a Preview candidate are both rejected.
#[test]
fn scenario_2_live_and_preview_both_rejected() {
    let mut intent = Intent::new("Artist", "Song");
    intent.duration_hint_ms = Some(200_000);

    let live = trackbind::model::MediaCandidate {
        candidate_id: "live".into(),
        source: "ytm".into(),
        url: "https://example.com/live".into(),
        title: "Song (Live)".into(),
        uploader: None,
        duration_sec: Some(200),
        artist_detected: None,
        track_detected: None,
        album_detected: None,
        official: None,
        isrc: None,
    };
    let preview = trackbind::model::MediaCandidate {
        candidate_id: "preview".into(),
        source: "ytm".into(),
        url: "https://example.com/preview".into(),
        title: "Song (Preview)".into(),
        uploader: None,
        duration_sec: Some(30),
        artist_detected: None,
        track_detected: None,
        album_detected: None,
        official: None,
        isrc: None,
    };

    let live_scored = trackbind::scoring::score_candidate(&intent, live, 0, 1.0, &[]);
    let preview_scored = trackbind::scoring::score_candidate(&intent, preview, 0, 1.0, &[]);

    assert!(matches!(
        live_scored.rejection_reason,
        Some(FailureReason::DisallowedVariant { variant: VariantTag::Live })
    ));
    assert!(matches!(preview_scored.rejection_reason, Some(FailureReason::Preview)));
}

struct FakeAdapter {
    name: String,
    candidates: Vec<trackbind::model::MediaCandidate>,
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _query: &str) -> Result<Vec<trackbind::model::MediaCandidate>, TransportError> {
        Ok(self.candidates.clone())
    }
}

fn equal_score_candidate(id: &str, source: &str) -> trackbind::model::MediaCandidate {
    trackbind::model::MediaCandidate {
        candidate_id: id.into(),
        source: source.into(),
        url: format!("https://example.com/{id}"),
        title: "Song".into(),
        uploader: Some("Artist - Topic".into()),
        duration_sec: Some(200),
        artist_detected: Some("Artist".into()),
        track_detected: None,
        album_detected: None,
        official: Some(true),
        isrc: None,
    }
}

// Scenario 3: equal-scoring candidates break the tie by source priority.
#[tokio::test]
async fn scenario_3_tie_broken_by_source_priority() {
    let mut intent = Intent::new("Artist", "Song");
    intent.duration_hint_ms = Some(200_000);
    intent.source_priority = vec!["youtube_music".into(), "youtube".into()];
    intent.thresholds.acceptance_threshold = 0.5;

    let adapters: Vec<Box<dyn ProviderAdapter>> = vec![
        Box::new(FakeAdapter {
            name: "youtube_music".into(),
            candidates: vec![equal_score_candidate("c-ytm", "youtube_music")],
        }),
        Box::new(FakeAdapter {
            name: "youtube".into(),
            candidates: vec![equal_score_candidate("c-yt", "youtube")],
        }),
    ];

    let outcome = trackbind::resolver::resolve(&intent, &adapters, &[]).await;
    let winner = outcome.accepted.expect("should accept a candidate");
    assert_eq!(winner.candidate.source, "youtube_music");
}

// Scenario 4: MB releases tied on correctness/completeness break by country
// preference, then date, then release id.
#[test]
fn scenario_4_tie_broken_by_country_then_date_then_id() {
    let mut intent = Intent::new("Artist", "Song");
    intent.country_preference = Some("US".into());
    intent.thresholds.mb_binding_threshold = 0.1;

    let recording = Recording {
        recording_id: "rec-1".into(),
        title: "Song".into(),
        artist_credit_name: "Artist".into(),
        length_ms: None,
        isrcs: vec![],
        ext_score: 100,
        release_refs: vec!["rel-us".into(), "rel-gb".into()],
        aliases: vec![],
        disambiguation: None,
    };

    let base_release = |id: &str, country: &str, date: &str| Release {
        release_id: id.into(),
        title: "Song".into(),
        status: ReleaseStatus::Official,
        country: Some(country.into()),
        date: Some(date.into()),
        release_group: ReleaseGroup {
            id: "rg".into(),
            primary_type: ReleaseGroupPrimaryType::Single,
            secondary_types: vec![],
        },
        medium_list: vec![Medium {
            position: 1,
            tracks: vec![MediumTrack {
                position: 1,
                recording_id: "rec-1".into(),
                length_ms: None,
                title: "Song".into(),
            }],
        }],
        has_isrc: false,
        has_label: false,
        has_barcode: false,
    };

    let us_release = base_release("rel-us", "US", "2005-01-01");
    let gb_release = base_release("rel-gb", "GB", "2005-01-01");

    let bound = trackbind::binding::bind(&intent, &[recording], &[us_release, gb_release]).expect("should bind");
    assert_eq!(bound.release_id, "rel-us");
}

// Scenario 5: a compilation-only catalog rejects an album-hinted intent.
#[test]
fn scenario_5_compilation_only_rejects_album_hint() {
    let mut intent = Intent::new("Artist", "Song");
    intent.album = Some("Studio Album".into());
    intent.thresholds.mb_binding_threshold = 0.1;

    let recording = Recording {
        recording_id: "rec-1".into(),
        title: "Song".into(),
        artist_credit_name: "Artist".into(),
        length_ms: None,
        isrcs: vec![],
        ext_score: 100,
        release_refs: vec!["rel-comp".into()],
        aliases: vec![],
        disambiguation: None,
    };
    let compilation = Release {
        release_id: "rel-comp".into(),
        title: "Greatest Hits".into(),
        status: ReleaseStatus::Official,
        country: None,
        date: Some("2005-01-01".into()),
        release_group: ReleaseGroup {
            id: "rg".into(),
            primary_type: ReleaseGroupPrimaryType::Album,
            secondary_types: vec![ReleaseGroupSecondaryType::Compilation],
        },
        medium_list: vec![Medium {
            position: 1,
            tracks: vec![MediumTrack {
                position: 1,
                recording_id: "rec-1".into(),
                length_ms: None,
                title: "Song".into(),
            }],
        }],
        has_isrc: false,
        has_label: false,
        has_barcode: false,
    };

    let err = trackbind::binding::bind(&intent, &[recording], &[compilation]).unwrap_err();
    assert_eq!(err.final_reason, FailureReason::CompilationAlbumMismatch);
}

// Scenario 6: enrichment locates the recording's medium/track position and
// the path builder produces the expected filename.
#[test]
fn scenario_6_enrichment_fills_track_number_then_path_builds() {
    let bare_pair = trackbind::model::BoundPair {
        recording_id: "rec-1".into(),
        release_id: "rel-1".into(),
        release_group_id: String::new(),
        album_title: String::new(),
        release_date: String::new(),
        track_number: 0,
        disc_number: 0,
        duration_ms: 0,
        track_title: String::new(),
        isrc: None,
        track_aliases: Default::default(),
    };
    let release = Release {
        release_id: "rel-1".into(),
        title: "Greatest Hits".into(),
        status: ReleaseStatus::Official,
        country: None,
        date: Some("1999-01-01".into()),
        release_group: ReleaseGroup {
            id: "rg-1".into(),
            primary_type: ReleaseGroupPrimaryType::Album,
            secondary_types: vec![],
        },
        medium_list: vec![Medium {
            position: 1,
            tracks: vec![MediumTrack {
                position: 7,
                recording_id: "rec-1".into(),
                length_ms: Some(180_000),
                title: "Some Track".into(),
            }],
        }],
        has_isrc: true,
        has_label: true,
        has_barcode: true,
    };

    let enriched = trackbind::enrichment::enrich(bare_pair, &release).expect("should enrich");
    assert_eq!(enriched.track_number, 7);
    assert_eq!(enriched.disc_number, 1);

    let path = trackbind::path_builder::build_path(&enriched, "Some Artist", "Some Track", "mp3").unwrap();
    assert!(path.ends_with("/Disc 1/07 - Some Track.mp3"));
}

// Universal: enrichment never locating the recording fails closed.
#[test]
fn enrichment_fails_closed_when_recording_not_in_release() {
    let bare_pair = trackbind::model::BoundPair {
        recording_id: "rec-missing".into(),
        release_id: "rel-1".into(),
        release_group_id: String::new(),
        album_title: String::new(),
        release_date: String::new(),
        track_number: 0,
        disc_number: 0,
        duration_ms: 0,
        track_title: String::new(),
        isrc: None,
        track_aliases: Default::default(),
    };
    let release = Release {
        release_id: "rel-1".into(),
        title: "Greatest Hits".into(),
        status: ReleaseStatus::Official,
        country: None,
        date: Some("1999-01-01".into()),
        release_group: ReleaseGroup {
            id: "rg-1".into(),
            primary_type: ReleaseGroupPrimaryType::Album,
            secondary_types: vec![],
        },
        medium_list: vec![Medium {
            position: 1,
            tracks: vec![MediumTrack {
                position: 7,
                recording_id: "rec-1".into(),
                length_ms: Some(180_000),
                title: "Some Track".into(),
            }],
        }],
        has_isrc: true,
        has_label: true,
        has_barcode: true,
    };

    let err = trackbind::enrichment::enrich(bare_pair, &release).unwrap_err();
    assert_eq!(err, FailureReason::ReleaseEnrichmentIncomplete);
}

// Universal: duration curve boundaries map exactly to the spec's values.
#[test]
fn duration_curve_boundaries_are_exact() {
    assert_eq!(trackbind::scoring::duration_score(Some(0), Some(2)), 1.00);
    assert_eq!(trackbind::scoring::duration_score(Some(0), Some(5)), 0.90);
    assert_eq!(trackbind::scoring::duration_score(Some(0), Some(10)), 0.75);
    assert_eq!(trackbind::scoring::duration_score(Some(0), Some(20)), 0.50);
    assert_eq!(trackbind::scoring::duration_score(Some(0), Some(30)), 0.20);
}

// Universal: extended-mix-only candidates are rejected unless allowed.
#[test]
fn extended_mix_rejected_unless_allowed() {
    let intent = Intent::new("Artist", "Song");
    let candidate = trackbind::model::MediaCandidate {
        candidate_id: "c1".into(),
        source: "ytm".into(),
        url: "https://example.com/c1".into(),
        title: "Song (Extended Mix)".into(),
        uploader: None,
        duration_sec: Some(300),
        artist_detected: None,
        track_detected: None,
        album_detected: None,
        official: None,
        isrc: None,
    };
    let scored = trackbind::scoring::score_candidate(&intent, candidate, 0, 1.0, &[]);
    assert!(matches!(
        scored.rejection_reason,
        Some(FailureReason::DisallowedVariant { variant: VariantTag::Extended })
    ));

    let mut allowing_intent = Intent::new("Artist", "Song");
    allowing_intent.allow_variants.insert(VariantTag::Extended);
    let candidate2 = trackbind::model::MediaCandidate {
        candidate_id: "c2".into(),
        source: "ytm".into(),
        url: "https://example.com/c2".into(),
        title: "Song (Extended Mix)".into(),
        uploader: None,
        duration_sec: Some(300),
        artist_detected: None,
        track_detected: None,
        album_detected: None,
        official: None,
        isrc: None,
    };
    let scored2 = trackbind::scoring::score_candidate(&allowing_intent, candidate2, 0, 1.0, &[]);
    assert!(scored2.rejection_reason.is_none());
}

// Universal: no-Unknown-Album — path construction never substitutes a
// placeholder; it refuses instead.
#[test]
fn never_substitutes_unknown_album() {
    let mut pair = trackbind::model::BoundPair {
        recording_id: "rec-1".into(),
        release_id: "rel-1".into(),
        release_group_id: "rg-1".into(),
        album_title: String::new(),
        release_date: "2001-01-01".into(),
        track_number: 1,
        disc_number: 1,
        duration_ms: 200_000,
        track_title: "Track".into(),
        isrc: None,
        track_aliases: Default::default(),
    };
    let err = trackbind::path_builder::build_path(&pair, "Artist", "Track", "mp3").unwrap_err();
    assert_eq!(err, FailureReason::MusicReleaseMetadataIncompleteBeforePathBuild);

    pair.album_title = "Real Album".into();
    let path = trackbind::path_builder::build_path(&pair, "Artist", "Track", "mp3").unwrap();
    assert!(!path.contains("Unknown Album"));
}
