//! HTTP and HTML helpers shared by the sources.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Selector};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::SourceError;
use crate::config::LookupConfig;

/// Client settings common to every source.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
}

impl From<&LookupConfig> for HttpSettings {
    fn from(config: &LookupConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl HttpSettings {
    /// Build a client that sends the configured User-Agent, and
    /// Accept-Language when `localized` is set.
    pub(crate) fn client(&self, localized: bool) -> Result<Client, SourceError> {
        let mut headers = HeaderMap::new();
        if localized {
            let value = HeaderValue::from_str(&self.accept_language).map_err(|e| {
                SourceError::ParseError(format!("Invalid Accept-Language header: {}", e))
            })?;
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let client = Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;
        Ok(client)
    }
}

/// GET a URL and return the body as text.
///
/// 404 maps to `NotFound`, other failures to upstream errors.
pub(crate) async fn get_text(client: &Client, url: &str, isbn: &str) -> Result<String, SourceError> {
    debug!("Fetching {}", url);
    let response = client.get(url).send().await.map_err(map_request_error)?;
    let response = check_status(response, isbn).await?;
    response.text().await.map_err(map_request_error)
}

/// GET a URL with query parameters and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    isbn: &str,
) -> Result<T, SourceError> {
    debug!("Fetching {} {:?}", url, query);
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(map_request_error)?;
    let response = check_status(response, isbn).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| SourceError::ParseError(format!("Failed to decode JSON from {}: {}", url, e)))
}

async fn check_status(
    response: reqwest::Response,
    isbn: &str,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound(isbn.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::ApiError {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }
    Ok(response)
}

fn map_request_error(e: reqwest::Error) -> SourceError {
    SourceError::HttpError(e)
}

/// Turn a site-relative image path into an absolute URL.
pub fn absolutize(base_url: &str, src: &str) -> String {
    let src = src.trim();
    if src.starts_with("http://") || src.starts_with("https://") {
        src.to_string()
    } else if let Some(rest) = src.strip_prefix("//") {
        format!("https://{}", rest)
    } else if src.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), src)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), src)
    }
}

/// Upgrade an `http:` URL to `https:`.
pub fn force_https(url: &str) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{}", rest),
        None => url.to_string(),
    }
}

/// Parse a CSS selector, reporting a bad one as a parse error.
pub(crate) fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css)
        .map_err(|e| SourceError::ParseError(format!("Invalid selector '{}': {}", css, e)))
}

/// All text under an element with whitespace runs collapsed.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Only the element's own text nodes, skipping text inside child elements.
pub(crate) fn own_text(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
        .flat_map(|t| {
            t.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Some(text)` unless the text is blank.
pub(crate) fn non_empty(text: impl AsRef<str>) -> Option<String> {
    let text = text.as_ref().trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// The number at the start of a label such as "256 blz.".
pub(crate) fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
