//! BooksInBelgium book pages.

use async_trait::async_trait;
use regex_lite::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html};

use super::http::{self, absolutize, element_text, non_empty, own_text, selector, HttpSettings};
use super::{BookSource, SourceError};
use crate::book::BookFragment;
use crate::config::ScraperSourceConfig;

const DEFAULT_BASE_URL: &str = "https://www.booksinbelgium.be";
const SOURCE_NAME: &str = "BooksInBelgium.be";

/// Scrapes `/nl/b/{isbn}` pages on booksinbelgium.be.
pub struct BooksInBelgiumSource {
    client: Client,
    base_url: String,
}

impl BooksInBelgiumSource {
    pub fn new(settings: &HttpSettings, config: &ScraperSourceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.client(true)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

#[async_trait]
impl BookSource for BooksInBelgiumSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, isbn: &str) -> Result<BookFragment, SourceError> {
        let url = format!(
            "{}/nl/b/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(isbn)
        );
        let body = http::get_text(&self.client, &url, isbn).await?;
        parse_book_page(&body, isbn, &self.base_url)
    }
}

fn regex(pattern: &str) -> Result<Regex, SourceError> {
    Regex::new(pattern)
        .map_err(|e| SourceError::ParseError(format!("Invalid pattern '{}': {}", pattern, e)))
}

fn first_link_text(element: &ElementRef) -> Result<Option<String>, SourceError> {
    let link_sel = selector("a")?;
    Ok(element
        .select(&link_sel)
        .next()
        .and_then(|a| non_empty(element_text(&a))))
}

pub(crate) fn parse_book_page(
    html: &str,
    isbn: &str,
    base_url: &str,
) -> Result<BookFragment, SourceError> {
    let document = Html::parse_document(html);
    let mut fragment = BookFragment::new(SOURCE_NAME);
    fragment.isbn = Some(isbn.to_string());

    // The author link sits inside the title heading.
    let title_sel = selector("h1.book-title")?;
    if let Some(heading) = document.select(&title_sel).next() {
        fragment.title = non_empty(own_text(&heading));
        let author_sel = selector(r#"a[href*="/s/a/"]"#)?;
        if let Some(author) = heading.select(&author_sel).next() {
            fragment.push_author(&element_text(&author));
        }
    }

    let cover_sel = selector(".image-carousel .card-img img")?;
    fragment.cover_url = document
        .select(&cover_sel)
        .next()
        .and_then(|img| {
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-source"))
        })
        .map(|src| absolutize(base_url, src));
    fragment.thumbnail_url = fragment.cover_url.clone();

    let desc_sel = selector(".book-desc")?;
    fragment.description = document
        .select(&desc_sel)
        .next()
        .and_then(|el| non_empty(element_text(&el)));

    // Breadcrumb links, deeper levels prefixed with '>'.
    let cat_sel = selector(".cat-wrap a")?;
    for link in document.select(&cat_sel) {
        let text = element_text(&link);
        fragment.push_category(text.trim_start_matches('>'));
    }

    let number_re = regex(r"Nummer:\s*(\d+)")?;
    let pages_re = regex(r"(\d+)\s*pagina")?;
    let isbn10_re = regex(r"ISBN-10:\s*(\S+)")?;
    let isbn13_re = regex(r"ISBN-13:\s*(\S+)")?;
    let year_re = regex(r"^\d{4}$")?;

    let detail_sel = selector(".book-info .info-item span, .book-info-mobile .info-item span")?;
    for item in document.select(&detail_sel) {
        let text = element_text(&item);

        if year_re.is_match(&text) && fragment.published_date.is_none() {
            fragment.published_date = Some(text.clone());
        }
        if text.contains("Uitgever:") {
            if let Some(publisher) = first_link_text(&item)? {
                fragment.publisher = Some(publisher);
            }
        }
        if text.contains("Reeks:") {
            if let Some(series) = first_link_text(&item)? {
                fragment.series_name = Some(series);
            }
        }
        if let Some(caps) = number_re.captures(&text) {
            fragment.series_number = Some(caps[1].to_string());
        }
        if let Some(caps) = pages_re.captures(&text) {
            fragment.page_count = caps[1].parse().ok();
        }
        if text.contains("Taal:") {
            if let Some(language) = first_link_text(&item)? {
                fragment.language = Some(language);
            }
        }
        if let Some(caps) = isbn10_re.captures(&text) {
            fragment.isbn = Some(caps[1].to_string());
        }
        if let Some(caps) = isbn13_re.captures(&text) {
            fragment.isbn13 = Some(caps[1].to_string());
        }
    }

    Ok(fragment)
}
