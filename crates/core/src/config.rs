use serde::Deserialize;
use std::collections::HashMap;

/// Root application configuration. Loaded from an optional
/// `campaign-insights.toml` and environment variables with the prefix
/// `CAMPAIGN_INSIGHTS__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reports: ReportSourceConfig,
    #[serde(default)]
    pub media: MediaLibraryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSourceConfig {
    #[serde(default = "default_reports_base_url")]
    pub base_url: String,
    /// Per-report overrides keyed `<platform-slug>.<report-slug>`,
    /// e.g. `meta.creatives`.
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaLibraryConfig {
    #[serde(default = "default_media_base_url")]
    pub base_url: String,
    /// Media-library folder id per platform slug.
    #[serde(default)]
    pub folders: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Expire media indices after this many seconds. Unset keeps them until
    /// explicitly invalidated.
    #[serde(default)]
    pub media_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
}

// Default functions
fn default_reports_base_url() -> String {
    "http://localhost:3001/api/reports".to_string()
}
fn default_media_base_url() -> String {
    "http://localhost:3001/api/drive".to_string()
}
fn default_timeout_ms() -> u64 {
    15_000
}
fn default_user_agent() -> String {
    concat!("campaign-insights/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_top_n() -> usize {
    10
}
fn default_window_days() -> u32 {
    7
}

impl Default for ReportSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_reports_base_url(),
            endpoints: HashMap::new(),
        }
    }
}

impl Default for MediaLibraryConfig {
    fn default() -> Self {
        Self {
            base_url: default_media_base_url(),
            folders: HashMap::new(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            default_window_days: default_window_days(),
        }
    }
}

impl ReportSourceConfig {
    /// Endpoint URL for one platform report: the configured override, or
    /// `<base_url>/<platform-slug>/<report-slug>`.
    pub fn endpoint_for(&self, platform_slug: &str, report_slug: &str) -> String {
        let key = format!("{platform_slug}.{report_slug}");
        self.endpoints.get(&key).cloned().unwrap_or_else(|| {
            format!(
                "{}/{}/{}",
                self.base_url.trim_end_matches('/'),
                platform_slug,
                report_slug
            )
        })
    }
}

impl MediaLibraryConfig {
    pub fn folder_for(&self, platform_slug: &str) -> Option<&str> {
        self.folders.get(platform_slug).map(String::as_str)
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("campaign-insights")
    }

    /// Load with an explicit config file name (extension optional).
    pub fn load_from(file_name: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(file_name).required(false))
            .add_source(
                config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
