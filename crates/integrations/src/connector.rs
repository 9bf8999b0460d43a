//! Report connectors: fetch one platform report as a [`SheetTable`].

use async_trait::async_trait;
use campaign_core::config::{AppConfig, ReportSourceConfig};
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::sheet::{ReportPayload, SheetTable};
use campaign_core::types::{Platform, ReportKind};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Anything that can serve spreadsheet-shaped platform reports.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_report(&self, platform: &Platform, kind: ReportKind)
        -> CampaignResult<SheetTable>;
}

/// Build the shared HTTP client with the configured timeout and user agent.
pub fn http_client(config: &AppConfig) -> CampaignResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.http.timeout_ms))
        .user_agent(config.http.user_agent.clone())
        .build()
        .map_err(|e| CampaignError::Config(format!("http client: {e}")))
}

/// Report endpoints served over HTTP as `{success, data: {values}}`.
pub struct HttpReportSource {
    client: reqwest::Client,
    config: ReportSourceConfig,
}

impl HttpReportSource {
    pub fn new(client: reqwest::Client, config: ReportSourceConfig) -> Self {
        Self { client, config }
    }

    pub fn from_config(config: &AppConfig) -> CampaignResult<Self> {
        Ok(Self::new(http_client(config)?, config.reports.clone()))
    }

    pub fn endpoint(&self, platform: &Platform, kind: ReportKind) -> String {
        self.config.endpoint_for(&platform.slug(), kind.slug())
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn fetch_report(
        &self,
        platform: &Platform,
        kind: ReportKind,
    ) -> CampaignResult<SheetTable> {
        let endpoint = self.endpoint(platform, kind);
        debug!(platform = %platform, report = kind.slug(), endpoint = %endpoint, "Fetching report");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| CampaignError::fetch(&endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CampaignError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let payload: ReportPayload = response
            .json()
            .await
            .map_err(|e| CampaignError::fetch(&endpoint, e))?;
        let table = payload.into_table()?;

        info!(
            platform = %platform,
            report = kind.slug(),
            rows = table.len(),
            "Report fetched"
        );
        Ok(table)
    }
}

/// Fixed tables per platform and report, for offline runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryReportSource {
    tables: HashMap<(Platform, ReportKind), Result<SheetTable, String>>,
}

impl InMemoryReportSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, platform: Platform, kind: ReportKind, table: SheetTable) -> Self {
        self.tables.insert((platform, kind), Ok(table));
        self
    }

    pub fn with_failure(mut self, platform: Platform, kind: ReportKind, message: &str) -> Self {
        self.tables.insert((platform, kind), Err(message.to_string()));
        self
    }
}

#[async_trait]
impl ReportSource for InMemoryReportSource {
    async fn fetch_report(
        &self,
        platform: &Platform,
        kind: ReportKind,
    ) -> CampaignResult<SheetTable> {
        match self.tables.get(&(platform.clone(), kind)) {
            Some(Ok(table)) => Ok(table.clone()),
            Some(Err(message)) => Err(CampaignError::Upstream(message.clone())),
            None => Ok(SheetTable::default()),
        }
    }
}

/// Fetch a report, degrading any failure to an empty table so that one
/// broken sheet never takes down the rest of a dashboard.
pub async fn fetch_or_empty<S>(source: &S, platform: &Platform, kind: ReportKind) -> SheetTable
where
    S: ReportSource + ?Sized,
{
    match source.fetch_report(platform, kind).await {
        Ok(table) => table,
        Err(e) => {
            warn!(
                platform = %platform,
                report = kind.slug(),
                error = %e,
                "Report fetch failed; continuing with no rows"
            );
            SheetTable::default()
        }
    }
}
