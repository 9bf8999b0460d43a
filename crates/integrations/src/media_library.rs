//! Media-library adaptor: lists a platform's creative folder and builds the
//! name-keyed [`MediaIndex`] the matcher works against.

use crate::connector::http_client;
use crate::matcher::clean_name;
use async_trait::async_trait;
use campaign_cache::MediaIndexCache;
use campaign_core::config::{AppConfig, MediaLibraryConfig};
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::types::{MediaAsset, MediaIndex, MediaKind, Platform};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One file in a media-library folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub web_view_link: String,
}

/// Listings arrive either bare or wrapped as `{files: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FolderListing {
    Files(Vec<DriveFile>),
    Wrapped { files: Vec<DriveFile> },
}

impl From<FolderListing> for Vec<DriveFile> {
    fn from(listing: FolderListing) -> Self {
        match listing {
            FolderListing::Files(files) | FolderListing::Wrapped { files } => files,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewLink {
    url: Option<String>,
    web_content_link: Option<String>,
    thumbnail_link: Option<String>,
}

impl PreviewLink {
    fn into_url(self) -> Option<String> {
        self.url
            .or(self.web_content_link)
            .or(self.thumbnail_link)
            .filter(|url| !url.trim().is_empty())
    }
}

#[async_trait]
pub trait MediaLibrarySource: Send + Sync {
    async fn list_folder(&self, folder_id: &str) -> CampaignResult<Vec<DriveFile>>;

    /// Directly renderable URL for a file, as opposed to its viewer page.
    async fn resolve_preview_url(&self, file: &DriveFile) -> CampaignResult<String>;
}

/// HTTP media-library proxy: `GET <base>/folders/<id>/files` and
/// `GET <base>/files/<id>/preview`.
pub struct HttpMediaLibrary {
    client: reqwest::Client,
    config: MediaLibraryConfig,
}

impl HttpMediaLibrary {
    pub fn new(client: reqwest::Client, config: MediaLibraryConfig) -> Self {
        Self { client, config }
    }

    pub fn from_config(config: &AppConfig) -> CampaignResult<Self> {
        Ok(Self::new(http_client(config)?, config.media.clone()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: String) -> CampaignResult<T> {
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
        response
            .json()
            .await
            .map_err(|e| CampaignError::fetch(&endpoint, e))
    }
}

#[async_trait]
impl MediaLibrarySource for HttpMediaLibrary {
    async fn list_folder(&self, folder_id: &str) -> CampaignResult<Vec<DriveFile>> {
        let listing: FolderListing = self
            .get_json(self.url(&format!("folders/{folder_id}/files")))
            .await?;
        Ok(listing.into())
    }

    async fn resolve_preview_url(&self, file: &DriveFile) -> CampaignResult<String> {
        let endpoint = self.url(&format!("files/{}/preview", file.id));
        let link: PreviewLink = self.get_json(endpoint.clone()).await?;
        link.into_url().ok_or_else(|| {
            CampaignError::fetch(endpoint, "preview response carried no usable link")
        })
    }
}

/// List `folder_id`, keep images and videos, and resolve their preview URLs
/// concurrently. A failed resolve falls back to the file's viewer link.
pub async fn build_media_index<S>(source: &S, folder_id: &str) -> CampaignResult<MediaIndex>
where
    S: MediaLibrarySource + ?Sized,
{
    let files = source.list_folder(folder_id).await?;
    let listed = files.len();
    let media: Vec<(DriveFile, MediaKind)> = files
        .into_iter()
        .filter_map(|file| MediaKind::from_mime(&file.mime_type).map(|kind| (file, kind)))
        .collect();

    let resolved = join_all(media.iter().map(|(file, _)| source.resolve_preview_url(file))).await;

    let index: MediaIndex = media
        .into_iter()
        .zip(resolved)
        .map(|((file, kind), preview)| {
            let url = preview.unwrap_or_else(|e| {
                warn!(file = %file.name, error = %e, "Preview link unavailable; using viewer link");
                file.web_view_link.clone()
            });
            MediaAsset {
                cleaned_name: clean_name(&file.name),
                url,
                kind,
            }
        })
        .filter(|asset| !asset.cleaned_name.is_empty())
        .collect();

    info!(folder = folder_id, listed, indexed = index.len(), "Media index built");
    Ok(index)
}

/// Per-platform media indices with memoized loading.
pub struct MediaLibrary {
    source: Arc<dyn MediaLibrarySource>,
    config: MediaLibraryConfig,
    cache: Arc<MediaIndexCache>,
}

impl MediaLibrary {
    pub fn new(
        source: Arc<dyn MediaLibrarySource>,
        config: MediaLibraryConfig,
        cache: Arc<MediaIndexCache>,
    ) -> Self {
        Self {
            source,
            config,
            cache,
        }
    }

    pub fn cache(&self) -> &MediaIndexCache {
        &self.cache
    }

    /// The platform's media index, built on first use. A platform with no
    /// configured folder has an empty index.
    pub async fn index_for(&self, platform: &Platform) -> CampaignResult<Arc<MediaIndex>> {
        let Some(folder_id) = self.config.folder_for(&platform.slug()) else {
            debug!(platform = %platform, "No media folder configured");
            return Ok(Arc::new(MediaIndex::new()));
        };
        self.cache
            .get_or_load(platform, || build_media_index(self.source.as_ref(), folder_id))
            .await
    }

    /// Drop a platform's index so the next request rebuilds it.
    pub fn refresh(&self, platform: &Platform) -> bool {
        self.cache.invalidate(platform)
    }
}
