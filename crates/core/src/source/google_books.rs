//! Google Books volumes API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{self, force_https, HttpSettings};
use super::{BookSource, SourceError};
use crate::book::BookFragment;
use crate::config::GoogleBooksConfig;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1";
const SOURCE_NAME: &str = "Google Books";

/// Looks up volumes with an `isbn:` query. The API key is optional.
pub struct GoogleBooksSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksSource {
    pub fn new(settings: &HttpSettings, config: &GoogleBooksConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.client(false)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
        })
    }
}

#[async_trait]
impl BookSource for GoogleBooksSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, isbn: &str) -> Result<BookFragment, SourceError> {
        let url = format!("{}/volumes", self.base_url.trim_end_matches('/'));
        let q = format!("isbn:{}", isbn);

        let mut query = vec![("q", q.as_str())];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }

        let response: GbVolumesResponse = http::get_json(&self.client, &url, &query, isbn).await?;
        debug!(
            "Google Books returned {} items for {}",
            response.total_items, isbn
        );

        if response.total_items == 0 {
            return Err(SourceError::NotFound(isbn.to_string()));
        }
        let volume = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(isbn.to_string()))?;

        Ok(map_volume(isbn, volume.volume_info))
    }
}

// Google Books API response types (internal)

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolumesResponse {
    #[serde(default)]
    total_items: u32,
    #[serde(default)]
    items: Vec<GbVolume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolume {
    #[serde(default)]
    volume_info: GbVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    description: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    page_count: Option<u32>,
    language: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<GbIdentifier>,
    image_links: Option<GbImageLinks>,
    preview_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GbIdentifier {
    #[serde(rename = "type")]
    id_type: String,
    identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

fn map_volume(isbn: &str, info: GbVolumeInfo) -> BookFragment {
    let isbn13 = info
        .industry_identifiers
        .iter()
        .find(|id| id.id_type == "ISBN_13")
        .map(|id| id.identifier.clone());

    let (thumbnail, small_thumbnail) = match info.image_links {
        Some(links) => (links.thumbnail, links.small_thumbnail),
        None => (None, None),
    };

    let mut fragment = BookFragment::new(SOURCE_NAME);
    fragment.isbn = Some(isbn.to_string());
    fragment.isbn13 = isbn13;
    fragment.title = info.title;
    fragment.subtitle = info.subtitle;
    fragment.description = info.description;
    fragment.publisher = info.publisher;
    fragment.published_date = info.published_date;
    fragment.page_count = info.page_count;
    fragment.language = info.language;
    fragment.cover_url = thumbnail
        .map(|url| force_https(&url))
        .or_else(|| info.preview_link.clone());
    fragment.thumbnail_url = small_thumbnail
        .map(|url| force_https(&url))
        .or(info.preview_link);
    for author in &info.authors {
        fragment.push_author(author);
    }
    for category in &info.categories {
        fragment.push_category(category);
    }
    fragment
}
