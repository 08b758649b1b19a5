//! Text Normalizer & Variant Classifier (spec §4.A).
//!
//! Maps any display string into a `lookup_form` (used to query the catalog
//! and providers), a `relaxed_form` (used only inside scoring to compute an
//! alternate track-similarity score) and a `variant_tags` set. Centralizes
//! every title-cleanup regex in one table-driven module per §9's redesign
//! guidance — nothing downstream touches an ad-hoc regex of its own.

use crate::model::{VariantSet, VariantTag};
use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Promotional noise tokens stripped from the lookup form (spec §4.A)
// ============================================================================

/// Trailing/bracketed promotional tokens. Order matters: longer, more
/// specific phrases are tried before their substrings.
static NOISE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\s*[\(\[]official\s+music\s+video[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]official\s+video[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]official\s+audio[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]music\s+video[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]lyric\s+video[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]lyrics[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]visualizer[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]hd[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]audio[\)\]]").unwrap(),
        // "Artist - Topic" auto-generated channel suffix.
        Regex::new(r"(?i)\s*-\s*topic\s*$").unwrap(),
        // Trailing dash runs: "Song - - " or "Song --"
        Regex::new(r"\s*[-–—]{2,}\s*$").unwrap(),
        Regex::new(r"\s*[-–—]\s*$").unwrap(),
    ]
});

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// relax() closed set (spec §4.A)
// ============================================================================

static RELAX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\s*[\(\[]\s*live\s*[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]\s*deluxe(\s+edition)?\s*[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[]\s*remaster(ed)?(\s+\d{2,4})?\s*[\)\]]").unwrap(),
    ]
});

/// Any remaining bracket pair after the closed-set removal above is
/// unwrapped rather than deleted (spec §4.A: "other parentheses are
/// preserved as inner text").
static BRACKET_UNWRAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\(\[\{]([^\)\]\}]*)[\)\]\}]").unwrap());

// ============================================================================
// Variant tag extraction (spec §4.A, §3)
// ============================================================================

/// A "modifier segment" is the content of a `()`/`[]`/`{}` group or a
/// trailing `" - ..."` suffix — the only places variant tags are recognized.
fn modifier_segments(text: &str) -> Vec<String> {
    static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\(\[\{]([^\)\]\}]*)[\)\]\}]").unwrap());
    static TRAILING: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-–—]\s*([^-–—\(\)\[\]]+)$").unwrap());

    let mut segments: Vec<String> = BRACKETED
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect();
    if let Some(c) = TRAILING.captures(text) {
        segments.push(c[1].trim().to_string());
    }
    segments
}

/// Ordered so that compound phrases are checked before the substrings they
/// contain (e.g. "music video" before a bare "video"-less fallback).
fn tag_for_segment(segment_lower: &str) -> Option<VariantTag> {
    static PATTERNS: Lazy<Vec<(Regex, VariantTag)>> = Lazy::new(|| {
        vec![
            (Regex::new(r"(?i)\bmusic\s+video\b").unwrap(), VariantTag::MusicVideo),
            (Regex::new(r"(?i)\bofficial\s+video\b").unwrap(), VariantTag::OfficialVideo),
            (Regex::new(r"(?i)\bofficial\s+audio\b").unwrap(), VariantTag::Audio),
            (Regex::new(r"(?i)\blyrics?\s+video\b").unwrap(), VariantTag::LyricVideo),
            (Regex::new(r"(?i)\bnightcore\b").unwrap(), VariantTag::Nightcore),
            (Regex::new(r"(?i)\bsped[- ]?up\b").unwrap(), VariantTag::SpedUp),
            (Regex::new(r"(?i)\bslowed\b").unwrap(), VariantTag::Slowed),
            (Regex::new(r"(?i)\b8d\b").unwrap(), VariantTag::EightD),
            (Regex::new(r"(?i)\bradio\s+edit\b").unwrap(), VariantTag::RadioEdit),
            (Regex::new(r"(?i)\bextended\b").unwrap(), VariantTag::Extended),
            (Regex::new(r"(?i)\bremaster(ed)?\b").unwrap(), VariantTag::Remaster),
            (Regex::new(r"(?i)\bremix(ed)?\b").unwrap(), VariantTag::Remix),
            (Regex::new(r"(?i)\bacoustic\b").unwrap(), VariantTag::Acoustic),
            (Regex::new(r"(?i)\blive\b").unwrap(), VariantTag::Live),
            (Regex::new(r"(?i)\bpreview\b").unwrap(), VariantTag::Preview),
            (Regex::new(r"(?i)\bcover\b").unwrap(), VariantTag::Cover),
            (Regex::new(r"(?i)\binstrumental\b").unwrap(), VariantTag::Instrumental),
            (Regex::new(r"(?i)\bkaraoke\b").unwrap(), VariantTag::Karaoke),
            (Regex::new(r"(?i)\bdeluxe\b").unwrap(), VariantTag::Deluxe),
            (Regex::new(r"(?i)\bedit\b").unwrap(), VariantTag::Edit),
            (Regex::new(r"(?i)\bcut\b").unwrap(), VariantTag::Cut),
            (Regex::new(r"(?i)\baudio\b").unwrap(), VariantTag::Audio),
        ]
    });

    PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(segment_lower))
        .map(|(_, tag)| *tag)
}

/// Extract variant tags from a display string (title, disambiguation, or
/// recording title — spec §4.A).
pub fn extract_variant_tags(text: &str) -> VariantSet {
    let mut tags = VariantSet::new();
    for segment in modifier_segments(text) {
        if let Some(tag) = tag_for_segment(&segment.to_lowercase()) {
            tags.insert(tag);
        }
    }
    tags
}

/// Variant tags a caller implicitly allows because their own query names
/// them (spec §4.A: "a query containing 'live' enables `live`").
pub fn allow_variants_from_query(track: &str, album: Option<&str>) -> VariantSet {
    let mut allow = extract_variant_tags(track);
    if let Some(album) = album {
        allow.extend(extract_variant_tags(album));
    }
    allow
}

// ============================================================================
// ASCII folding (used only inside scoring to compute cross-script similarity)
// ============================================================================

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to ASCII by stripping diacritics then transliterating
/// any remaining non-Latin script. Not part of the lookup form — the
/// catalog and providers are queried with native-script text.
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

// ============================================================================
// Punctuation normalization
// ============================================================================

fn normalize_punctuation(s: &str) -> String {
    let result = s
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{00B4}', '\u{0060}'], "'")
        .replace(" & ", " and ");
    MULTI_SPACE.replace_all(&result, " ").to_string()
}

// ============================================================================
// Public normalization entry points
// ============================================================================

/// `normalize(text) -> lookup_form` (spec §4.A).
///
/// NFKC-normalizes, casefolds, collapses whitespace, and strips the closed
/// list of promotional noise tokens. Parentheticals that don't match a
/// noise token (e.g. `(Live)`, `(From the Motion Picture)`) survive
/// verbatim.
pub fn normalize(text: &str) -> String {
    let nfkc: String = text.nfkc().collect();
    let mut result = normalize_punctuation(&nfkc);
    for pattern in NOISE_PATTERNS.iter() {
        result = pattern.replace_all(&result, "").to_string();
    }
    MULTI_SPACE
        .replace_all(result.trim(), " ")
        .to_string()
        .to_lowercase()
}

/// Count of promotional noise tokens stripped by [`normalize`] (used by
/// scoring's `title_noise_score`, spec §4.B).
pub fn noise_token_count(text: &str) -> u32 {
    let nfkc: String = text.nfkc().collect();
    let mut working = normalize_punctuation(&nfkc);
    let mut count = 0u32;
    for pattern in NOISE_PATTERNS.iter() {
        let before = pattern.find_iter(&working).count();
        count += before as u32;
        working = pattern.replace_all(&working, "").to_string();
    }
    count
}

/// `relax(text) -> relaxed_form` (spec §4.A). Built from the lookup form:
/// strips only `live`/`deluxe edition?`/`remaster(ed)?` bracketed segments,
/// then unwraps any remaining bracket pair instead of deleting it.
pub fn relax(text: &str) -> String {
    let mut result = normalize(text);
    for pattern in RELAX_PATTERNS.iter() {
        result = pattern.replace_all(&result, "").to_string();
    }
    // Unwrap remaining brackets: keep inner text, drop the punctuation.
    while let Some(caps) = BRACKET_UNWRAP.captures(&result) {
        let whole = caps.get(0).unwrap();
        let inner = caps.get(1).unwrap().as_str();
        result = format!(
            "{}{}{}",
            &result[..whole.start()],
            inner.trim(),
            &result[whole.end()..]
        );
    }
    MULTI_SPACE.replace_all(result.trim(), " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_official_video_noise() {
        assert_eq!(
            normalize("Shuttin' Detroit Down (Official Music Video)"),
            "shuttin' detroit down"
        );
    }

    #[test]
    fn normalize_preserves_unmatched_parenthetical() {
        assert_eq!(
            normalize("Beauty School Dropout (From Grease)"),
            "beauty school dropout (from grease)"
        );
    }

    #[test]
    fn normalize_strips_topic_suffix() {
        assert_eq!(normalize("Radiohead - Topic"), "radiohead");
    }

    #[test]
    fn relax_strips_live_and_remaster() {
        assert_eq!(relax("Yesterday (Live)"), "yesterday");
        assert_eq!(relax("Yesterday (2009 Remaster)"), "yesterday");
        assert_eq!(relax("Yesterday (Deluxe Edition)"), "yesterday");
    }

    #[test]
    fn relax_unwraps_unmatched_brackets() {
        assert_eq!(relax("Song (From the Motion Picture)"), "song from the motion picture");
    }

    #[test]
    fn extract_tags_discriminating_and_neutral() {
        let tags = extract_variant_tags("Song (Live) [Official Audio]");
        assert!(tags.contains(&VariantTag::Live));
        assert!(tags.contains(&VariantTag::Audio));
        assert!(VariantTag::Live.is_discriminating());
        assert!(VariantTag::Audio.is_neutral());
    }

    #[test]
    fn extract_tags_sped_up_and_nightcore() {
        let tags = extract_variant_tags("Song (Sped Up)");
        assert!(tags.contains(&VariantTag::SpedUp));
        let tags = extract_variant_tags("Song (Nightcore)");
        assert!(tags.contains(&VariantTag::Nightcore));
    }

    #[test]
    fn extract_tags_from_trailing_suffix() {
        let tags = extract_variant_tags("Song - Radio Edit");
        assert!(tags.contains(&VariantTag::RadioEdit));
    }

    #[test]
    fn allow_variants_from_query_picks_up_live() {
        let allow = allow_variants_from_query("Song (Live)", None);
        assert!(allow.contains(&VariantTag::Live));
    }

    #[test]
    fn fold_to_ascii_transliterates_diacritics() {
        assert_eq!(fold_to_ascii("Beyoncé"), "beyonce");
        assert_eq!(fold_to_ascii("naïve"), "naive");
    }
}
