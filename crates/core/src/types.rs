use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

/// Advertising platform a report row belongs to. Open-ended: unknown labels
/// are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Meta,
    TikTok,
    Pinterest,
    YouTube,
    LinkedIn,
    GoogleSearch,
    Other(String),
}

impl Platform {
    /// Parse a platform label as it appears in sheets, CLI flags or config keys.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "meta" | "meta ads" | "facebook" | "instagram" => Self::Meta,
            "tiktok" | "tik tok" | "tiktok ads" => Self::TikTok,
            "pinterest" | "pinterest ads" => Self::Pinterest,
            "youtube" | "you tube" | "youtube ads" => Self::YouTube,
            "linkedin" | "linked in" | "linkedin ads" => Self::LinkedIn,
            "google" | "google ads" | "google search" | "google-search" | "search" => {
                Self::GoogleSearch
            }
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Meta => "Meta",
            Self::TikTok => "TikTok",
            Self::Pinterest => "Pinterest",
            Self::YouTube => "YouTube",
            Self::LinkedIn => "LinkedIn",
            Self::GoogleSearch => "Google Search",
            Self::Other(label) => label,
        }
    }

    /// URL/config-key form, e.g. `google-search`.
    pub fn slug(&self) -> String {
        match self {
            Self::Other(label) => label
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
                .to_lowercase(),
            known => known.label().replace(' ', "-").to_lowercase(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl From<String> for Platform {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.label().to_string()
    }
}

/// Report flavours served by the spreadsheet endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Creative,
    Regional,
    Keyword,
    MonthlyPacing,
}

impl ReportKind {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Creative => "creatives",
            Self::Regional => "regions",
            Self::Keyword => "keywords",
            Self::MonthlyPacing => "pacing",
        }
    }
}

/// Additive delivery counters. Everything here may be summed across rows;
/// integer sums saturate at `u64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricCounters {
    pub impressions: u64,
    pub clicks: u64,
    pub reach: u64,
    pub cost: f64,
    pub video_views: u64,
    pub video_views_25: u64,
    pub video_views_50: u64,
    pub video_views_75: u64,
    pub video_completions: u64,
    pub engagements: u64,
}

impl AddAssign<&MetricCounters> for MetricCounters {
    fn add_assign(&mut self, other: &MetricCounters) {
        self.impressions = self.impressions.saturating_add(other.impressions);
        self.clicks = self.clicks.saturating_add(other.clicks);
        self.reach = self.reach.saturating_add(other.reach);
        self.cost += other.cost;
        self.video_views = self.video_views.saturating_add(other.video_views);
        self.video_views_25 = self.video_views_25.saturating_add(other.video_views_25);
        self.video_views_50 = self.video_views_50.saturating_add(other.video_views_50);
        self.video_views_75 = self.video_views_75.saturating_add(other.video_views_75);
        self.video_completions = self.video_completions.saturating_add(other.video_completions);
        self.engagements = self.engagements.saturating_add(other.engagements);
    }
}

/// Ratios derived from [`MetricCounters`]. Never summed or averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioMetrics {
    pub cpm: f64,
    pub cpc: f64,
    /// Percentage.
    pub ctr: f64,
    /// Percentage of impressions watched to completion.
    pub vtr: f64,
    pub frequency: f64,
    pub view_rate_25: f64,
    pub view_rate_50: f64,
    pub view_rate_75: f64,
}

/// One row of creative-level platform activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub date: NaiveDate,
    pub platform: Platform,
    pub campaign_name: String,
    pub creative_title: String,
    pub counters: MetricCounters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalRecord {
    pub date: NaiveDate,
    pub platform: Platform,
    pub region: String,
    pub counters: MetricCounters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub date: NaiveDate,
    pub platform: Platform,
    pub campaign_name: String,
    pub keyword: String,
    pub counters: MetricCounters,
    pub conversions: u64,
}

/// Planned vs. actual delivery for one campaign in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingRecord {
    /// First day of the reported month.
    pub month: NaiveDate,
    pub platform: Platform,
    pub campaign_name: String,
    pub planned_cost: f64,
    pub actual_cost: f64,
    pub planned_impressions: u64,
    pub actual_impressions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let mime = mime_type.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// A previewable file from the media library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub cleaned_name: String,
    pub url: String,
    pub kind: MediaKind,
}

/// Media assets keyed by cleaned file name. Ordered so that matching is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaIndex {
    assets: BTreeMap<String, MediaAsset>,
}

impl MediaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset under its cleaned name, replacing any earlier asset
    /// with the same name.
    pub fn insert(&mut self, asset: MediaAsset) -> Option<MediaAsset> {
        self.assets.insert(asset.cleaned_name.clone(), asset)
    }

    pub fn get(&self, cleaned_name: &str) -> Option<&MediaAsset> {
        self.assets.get(cleaned_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MediaAsset)> {
        self.assets.iter().map(|(name, asset)| (name.as_str(), asset))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl FromIterator<MediaAsset> for MediaIndex {
    fn from_iter<I: IntoIterator<Item = MediaAsset>>(iter: I) -> Self {
        let mut index = Self::new();
        for asset in iter {
            index.insert(asset);
        }
        index
    }
}
