//! Creative-to-media matching.
//!
//! Creative titles typed into ad platforms and file names in the media
//! library drift apart (separators, casing, extensions, extra words). Both
//! sides are cleaned the same way, then an ordered list of strategies is
//! tried until one finds an asset.

use campaign_core::types::{MediaAsset, MediaIndex};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static MEDIA_EXTENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpe?g|png|gif|webp|bmp|svg|heic|mp4|mov|avi|webm|mkv|m4v)$")
        .expect("valid media extension regex")
});

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid separator regex"));

/// Minimum similarity for the fuzzy strategy to accept a match.
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Lower-case, drop a trailing media extension, turn every run of
/// non-alphanumeric characters into one space, trim.
pub fn clean_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let without_extension = MEDIA_EXTENSION_RE.replace(&lowered, "");
    NON_ALNUM_RE
        .replace_all(&without_extension, " ")
        .trim()
        .to_string()
}

/// Tokens longer than two characters.
fn significant_tokens(cleaned: &str) -> Vec<&str> {
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .collect()
}

fn related(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// A strategy receives the already-cleaned creative name.
pub type MatchStrategy = for<'a> fn(&str, &'a MediaIndex) -> Option<&'a MediaAsset>;

pub fn exact_match<'a>(cleaned: &str, index: &'a MediaIndex) -> Option<&'a MediaAsset> {
    index.get(cleaned)
}

/// Every creative token relates to some media token.
pub fn token_subset_match<'a>(cleaned: &str, index: &'a MediaIndex) -> Option<&'a MediaAsset> {
    let creative_tokens = significant_tokens(cleaned);
    if creative_tokens.is_empty() {
        return None;
    }
    index.iter().find_map(|(name, asset)| {
        let media_tokens = significant_tokens(name);
        creative_tokens
            .iter()
            .all(|ct| media_tokens.iter().any(|mt| related(mt, ct)))
            .then_some(asset)
    })
}

/// Shared-token score over the larger token count; best score above the
/// threshold wins, first on ties.
pub fn similarity_match<'a>(cleaned: &str, index: &'a MediaIndex) -> Option<&'a MediaAsset> {
    let creative_tokens = significant_tokens(cleaned);
    if creative_tokens.is_empty() {
        return None;
    }

    let mut best: Option<(f64, &MediaAsset)> = None;
    for (name, asset) in index.iter() {
        let media_tokens = significant_tokens(name);
        if media_tokens.is_empty() {
            continue;
        }
        let matched = creative_tokens
            .iter()
            .filter(|ct| media_tokens.iter().any(|mt| related(mt, ct)))
            .count();
        let score = matched as f64 / creative_tokens.len().max(media_tokens.len()) as f64;
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, asset));
        }
    }

    best.filter(|(score, _)| *score > SIMILARITY_THRESHOLD)
        .map(|(_, asset)| asset)
}

/// One creative and the asset it resolved to, if any.
#[derive(Debug, Clone, Serialize)]
pub struct CreativeMedia {
    pub creative: String,
    pub media: Option<MediaAsset>,
}

/// Ordered strategies; the first that finds an asset wins.
#[derive(Clone)]
pub struct MediaMatcher {
    strategies: Vec<MatchStrategy>,
}

impl MediaMatcher {
    pub fn new(strategies: Vec<MatchStrategy>) -> Self {
        Self { strategies }
    }

    pub fn find<'a>(&self, creative_name: &str, index: &'a MediaIndex) -> Option<&'a MediaAsset> {
        if index.is_empty() {
            return None;
        }
        let cleaned = clean_name(creative_name);
        if cleaned.is_empty() {
            return None;
        }
        self.strategies
            .iter()
            .find_map(|strategy| strategy(&cleaned, index))
    }

    pub fn match_all<I, S>(&self, creative_names: I, index: &MediaIndex) -> Vec<CreativeMedia>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let results: Vec<CreativeMedia> = creative_names
            .into_iter()
            .map(|name| CreativeMedia {
                creative: name.as_ref().to_string(),
                media: self.find(name.as_ref(), index).cloned(),
            })
            .collect();
        let matched = results.iter().filter(|r| r.media.is_some()).count();
        tracing::debug!(creatives = results.len(), matched, "Creatives matched to media");
        results
    }
}

impl Default for MediaMatcher {
    fn default() -> Self {
        Self::new(vec![
            exact_match as MatchStrategy,
            token_subset_match,
            similarity_match,
        ])
    }
}

/// Match with the default strategy order.
pub fn find_media<'a>(creative_name: &str, index: &'a MediaIndex) -> Option<&'a MediaAsset> {
    MediaMatcher::default().find(creative_name, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::types::MediaKind;

    fn asset(file_name: &str) -> MediaAsset {
        MediaAsset {
            cleaned_name: clean_name(file_name),
            url: format!("https://media.example.com/{file_name}"),
            kind: MediaKind::Image,
        }
    }

    fn index(file_names: &[&str]) -> MediaIndex {
        file_names.iter().map(|name| asset(name)).collect()
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("Seguro Celular - BSE_SP"), "seguro celular bse sp");
        assert_eq!(clean_name("  Banner_Home.JPG "), "banner home");
        assert_eq!(clean_name("promo.final.mp4"), "promo final");
        assert_eq!(clean_name("Proteção Residencial (v2)"), "proteção residencial v2");
        assert_eq!(clean_name("___"), "");
    }

    #[test]
    fn test_exact_after_cleaning() {
        let index = index(&["seguro celular bse sp", "other"]);
        let found = find_media("Seguro Celular - BSE_SP", &index).unwrap();
        assert_eq!(found.cleaned_name, "seguro celular bse sp");
    }

    #[test]
    fn test_token_subset() {
        let index = index(&["Video 15s Seguro Auto Oferta.mp4", "Carrossel Seguro Vida.png"]);
        let found = find_media("Seguro Auto", &index).unwrap();
        assert_eq!(found.cleaned_name, "video 15s seguro auto oferta");
        assert_eq!(
            token_subset_match("seguro auto", &index).map(|a| a.cleaned_name.as_str()),
            Some("video 15s seguro auto oferta")
        );
    }

    #[test]
    fn test_similarity_fallback() {
        let index = index(&["campanha verao praia 2025.jpg", "institucional marca.png"]);
        let found = find_media("Verao Praia Story", &index).unwrap();
        assert_eq!(found.cleaned_name, "campanha verao praia 2025");
    }

    #[test]
    fn test_no_shared_tokens() {
        let index = index(&["banner home.png"]);
        assert!(find_media("Seguro Celular", &index).is_none());
        // Two-character tokens never count.
        assert!(find_media("SP RJ", &index).is_none());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(find_media("Anything", &MediaIndex::new()).is_none());
        assert!(find_media("  --  ", &index(&["banner"])).is_none());
    }

    #[test]
    fn test_custom_strategy_list() {
        let index = index(&["video 15s seguro auto oferta"]);
        let exact_only = MediaMatcher::new(vec![exact_match as MatchStrategy]);
        assert!(exact_only.find("Seguro Auto", &index).is_none());
        assert!(MediaMatcher::default().find("Seguro Auto", &index).is_some());
    }

    #[test]
    fn test_match_all_preserves_order() {
        let index = index(&["seguro celular bse sp.png"]);
        let results =
            MediaMatcher::default().match_all(["Unknown creative", "Seguro Celular - BSE_SP"], &index);
        assert_eq!(results.len(), 2);
        assert!(results[0].media.is_none());
        assert_eq!(results[1].creative, "Seguro Celular - BSE_SP");
        assert!(results[1].media.is_some());
    }
}
