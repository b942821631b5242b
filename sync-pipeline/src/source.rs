use async_trait::async_trait;
use common::error::AppError;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Rich-text fields arrive wrapped as `{"rendered": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderedField {
    #[serde(default)]
    pub rendered: String,
}

/// A taxonomy term attached to an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTerm {
    pub name: String,
}

/// One content record as listed by the remote publishing API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteContentEntry {
    pub id: i64,
    #[serde(default)]
    pub title: RenderedField,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: RenderedField,
    #[serde(default)]
    pub categories: Vec<RemoteTerm>,
    #[serde(default)]
    pub tags: Vec<RemoteTerm>,
}

/// A paginated listing of published content.
///
/// Pages are 1-based. An empty page marks the end of the corpus; callers
/// must not second-guess that with counts or page-size arithmetic.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<RemoteContentEntry>, AppError>;
}

/// HTTP-backed source for publishing APIs that list content as JSON.
pub struct HttpContentSource {
    client: Client,
    base_url: Url,
}

impl HttpContentSource {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::Validation(format!("Invalid content source url: {err}")))?;

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<RemoteContentEntry>, AppError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &page_size.to_string());

        debug!(%url, "fetching content page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| AppError::Source(format!("Content source request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::Source(format!(
                "Content source returned status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<RemoteContentEntry>>()
            .await
            .map_err(|err| AppError::Source(format!("Content source sent invalid payload: {err}")))
    }
}
