//! Standaard Boekhandel product pages.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{self, absolutize, element_text, leading_number, non_empty, selector, HttpSettings};
use super::{BookSource, SourceError};
use crate::book::BookFragment;
use crate::config::ScraperSourceConfig;

const DEFAULT_BASE_URL: &str = "https://www.standaardboekhandel.be";
const SOURCE_NAME: &str = "Standaard Boekhandel";

/// Scrapes `/p/{isbn}` product pages on standaardboekhandel.be.
pub struct StandaardSource {
    client: Client,
    base_url: String,
}

impl StandaardSource {
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
impl BookSource for StandaardSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, isbn: &str) -> Result<BookFragment, SourceError> {
        let url = format!(
            "{}/p/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(isbn)
        );
        let body = http::get_text(&self.client, &url, isbn).await?;
        parse_product_page(&body, isbn, &self.base_url)
    }
}

/// Product tracking data embedded as JSON in `data-component-parm`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentParm {
    product_data: Option<ProductData>,
}

#[derive(Debug, Deserialize)]
struct ProductData {
    category: Option<String>,
    category2: Option<String>,
}

/// Map a product page into a fragment.
pub(crate) fn parse_product_page(
    html: &str,
    isbn: &str,
    base_url: &str,
) -> Result<BookFragment, SourceError> {
    let document = Html::parse_document(html);
    let mut fragment = BookFragment::new(SOURCE_NAME);
    fragment.isbn = Some(isbn.to_string());

    let product_sel = selector(r#"[data-component-class="SB.Ecom.Product"]"#)?;
    if let Some(parm) = document
        .select(&product_sel)
        .next()
        .and_then(|el| el.value().attr("data-component-parm"))
    {
        match serde_json::from_str::<ComponentParm>(parm) {
            Ok(ComponentParm {
                product_data: Some(data),
            }) => {
                for category in [data.category, data.category2].into_iter().flatten() {
                    fragment.push_category(&category);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Could not parse Standaard product data for {}: {}", isbn, e),
        }
    }

    let title_sel = selector(".c-product-detail__title")?;
    fragment.title = document
        .select(&title_sel)
        .next()
        .and_then(|el| non_empty(element_text(&el)));

    let author_sel = selector(".c-product-detail__author")?;
    for author in document.select(&author_sel) {
        fragment.push_author(&element_text(&author));
    }

    let discriminator_sel = selector(".c-product__discriminator.c-product-detail__discriminator")?;
    if let Some(discriminator) = document.select(&discriminator_sel).next() {
        let span_sel = selector("span")?;
        fragment.language = discriminator
            .select(&span_sel)
            .nth(1)
            .and_then(|el| non_empty(element_text(&el)));

        let series_sel = selector(r#"a[href*="/c/reeks/"]"#)?;
        fragment.series_name = discriminator
            .select(&series_sel)
            .next()
            .and_then(|el| non_empty(element_text(&el)));

        let list_sel = selector(".c-product__discriminator-list")?;
        for item in discriminator.select(&list_sel) {
            let text = element_text(&item);
            if text.contains("nr.") {
                fragment.series_number = Some(text);
            }
        }
    }

    let description_sel = selector(".yotpo.bottomLine")?;
    fragment.description = document
        .select(&description_sel)
        .next()
        .and_then(|el| el.value().attr("data-description"))
        .and_then(non_empty);

    fragment.cover_url = find_cover(&document, isbn)?.map(|src| absolutize(base_url, &src));
    fragment.thumbnail_url = fragment.cover_url.clone();

    let row_sel = selector(".c-product-spec__row")?;
    let label_sel = selector(".c-product-spec__label")?;
    let value_sel = selector(".c-product-spec__value")?;
    for row in document.select(&row_sel) {
        let label = row
            .select(&label_sel)
            .next()
            .map(|el| element_text(&el).replace(':', ""))
            .unwrap_or_default();
        let Some(value) = row
            .select(&value_sel)
            .next()
            .and_then(|el| non_empty(element_text(&el)))
        else {
            continue;
        };

        match label.trim() {
            "Auteur(s)" if fragment.authors.is_empty() => fragment.push_author(&value),
            "Uitgeverij" => fragment.publisher = Some(value),
            "Aantal bladzijden" => fragment.page_count = leading_number(&value),
            "Taal" if fragment.language.is_none() => fragment.language = Some(value),
            "Reeks" if fragment.series_name.is_none() => fragment.series_name = Some(value),
            "Reeksnummer" if fragment.series_number.is_none() => {
                fragment.series_number = Some(value)
            }
            "Verschijningsdatum" => fragment.published_date = Some(value),
            _ => {}
        }
    }

    debug!(
        "Parsed Standaard page for {}: title={:?}, {} categories",
        isbn,
        fragment.title,
        fragment.categories.len()
    );
    Ok(fragment)
}

/// The cover is the first image whose URL mentions the ISBN.
fn find_cover(document: &Html, isbn: &str) -> Result<Option<String>, SourceError> {
    let img_sel = selector("img")?;
    if let Some(src) = document
        .select(&img_sel)
        .filter_map(|el| el.value().attr("src"))
        .find(|src| src.contains(isbn))
    {
        return Ok(Some(src.to_string()));
    }

    let slider_sel = selector(r#".c-products-slider a[data-lightbox="products"]"#)?;
    Ok(document
        .select(&slider_sel)
        .next()
        .and_then(|el| el.value().attr("href"))
        .filter(|href| href.contains(isbn))
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
  <div data-component-class="SB.Ecom.Product"
       data-component-parm='{"productData":{"price":24.99,"category":"Strips","category2":"Graphic novel","isDigital":false}}'></div>
  <h1 class="c-product-detail__title"><span>De Rode Ridder</span></h1>
  <a class="c-product-detail__author">Willy Vandersteen</a>
  <div class="c-product__discriminator c-product-detail__discriminator">
    <span>Paperback</span>
    <span>Nederlands</span>
    <a href="/c/reeks/de-rode-ridder">De Rode Ridder</a>
    <span class="c-product__discriminator-list">nr. 12</span>
  </div>
  <div class="yotpo bottomLine" data-description="Een ridderverhaal."></div>
  <img src="/img/logo.png">
  <img src="/images/9789002123456/cover.jpg">
  <dl>
    <div class="c-product-spec__row"><dt class="c-product-spec__label">Uitgeverij:</dt><dd class="c-product-spec__value">Standaard Uitgeverij</dd></div>
    <div class="c-product-spec__row"><dt class="c-product-spec__label">Aantal bladzijden:</dt><dd class="c-product-spec__value">48</dd></div>
    <div class="c-product-spec__row"><dt class="c-product-spec__label">Verschijningsdatum:</dt><dd class="c-product-spec__value">12/03/2021</dd></div>
    <div class="c-product-spec__row"><dt class="c-product-spec__label">Reeksnummer:</dt><dd class="c-product-spec__value">99</dd></div>
  </dl>
</body></html>
"#;

    #[test]
    fn test_parse_product_page() {
        let fragment =
            parse_product_page(PAGE, "9789002123456", "https://www.standaardboekhandel.be")
                .unwrap();

        assert_eq!(fragment.source, "Standaard Boekhandel");
        assert_eq!(fragment.title.as_deref(), Some("De Rode Ridder"));
        assert_eq!(fragment.authors, vec!["Willy Vandersteen"]);
        assert_eq!(fragment.categories, vec!["Strips", "Graphic novel"]);
        assert_eq!(fragment.language.as_deref(), Some("Nederlands"));
        assert_eq!(fragment.series_name.as_deref(), Some("De Rode Ridder"));
        // The discriminator wins over the specification rows.
        assert_eq!(fragment.series_number.as_deref(), Some("nr. 12"));
        assert_eq!(fragment.publisher.as_deref(), Some("Standaard Uitgeverij"));
        assert_eq!(fragment.page_count, Some(48));
        assert_eq!(fragment.published_date.as_deref(), Some("12/03/2021"));
        assert_eq!(fragment.description.as_deref(), Some("Een ridderverhaal."));
        assert_eq!(
            fragment.cover_url.as_deref(),
            Some("https://www.standaardboekhandel.be/images/9789002123456/cover.jpg")
        );
        assert_eq!(fragment.thumbnail_url, fragment.cover_url);
    }

    #[test]
    fn test_page_without_product_has_no_title() {
        let fragment =
            parse_product_page("<html><body><p>Niet gevonden</p></body></html>", "1", "https://x")
                .unwrap();
        assert!(!fragment.has_title());
        assert!(fragment.categories.is_empty());
        assert!(fragment.cover_url.is_none());
    }

    #[test]
    fn test_malformed_product_data_is_ignored() {
        let page = r#"<div data-component-class="SB.Ecom.Product" data-component-parm="{not json"></div>
<h1 class="c-product-detail__title">Titel</h1>"#;
        let fragment = parse_product_page(page, "1", "https://x").unwrap();
        assert_eq!(fragment.title.as_deref(), Some("Titel"));
        assert!(fragment.categories.is_empty());
    }
}
