//! boekenplatform.nl ISBN pages. Not in the default priority list.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;

use super::http::{self, absolutize, element_text, leading_number, non_empty, selector, HttpSettings};
use super::{BookSource, SourceError};
use crate::book::BookFragment;
use crate::config::ScraperSourceConfig;

const DEFAULT_BASE_URL: &str = "https://www.boekenplatform.nl";
const SOURCE_NAME: &str = "boekenplatform.nl";

pub struct BoekenplatformSource {
    client: Client,
    base_url: String,
}

impl BoekenplatformSource {
    pub fn new(settings: &HttpSettings, config: &ScraperSourceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.client(false)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

#[async_trait]
impl BookSource for BoekenplatformSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, isbn: &str) -> Result<BookFragment, SourceError> {
        let url = format!(
            "{}/isbn/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(isbn)
        );
        let body = http::get_text(&self.client, &url, isbn).await?;
        parse_isbn_page(&body, isbn, &self.base_url)
    }
}

pub(crate) fn parse_isbn_page(
    html: &str,
    isbn: &str,
    base_url: &str,
) -> Result<BookFragment, SourceError> {
    let document = Html::parse_document(html);
    let mut fragment = BookFragment::new(SOURCE_NAME);
    fragment.isbn = Some(isbn.to_string());

    let header_title_sel = selector(".view-header h4")?;
    let page_title_sel = selector("h1.title#page-title")?;
    fragment.title = document
        .select(&header_title_sel)
        .next()
        .or_else(|| document.select(&page_title_sel).next())
        .and_then(|el| non_empty(element_text(&el)));

    let row_sel = selector(".view-header table tr")?;
    let label_sel = selector("td:first-child strong")?;
    let value_sel = selector("td:last-child")?;
    for row in document.select(&row_sel) {
        let label = row
            .select(&label_sel)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default();
        let Some(value) = row
            .select(&value_sel)
            .next()
            .and_then(|el| non_empty(element_text(&el)))
        else {
            continue;
        };

        match label.as_str() {
            "Hoofdtitel" if fragment.title.is_none() => fragment.title = Some(value),
            "Ondertitel" => fragment.subtitle = Some(value),
            "Reeks" => fragment.series_name = Some(value),
            "Uitgever" => fragment.publisher = Some(value),
            // One free-text field, possibly several names.
            "Auteur(s)" => fragment.push_author(&value),
            "Taal" => fragment.language = Some(value),
            "Pagina's" => fragment.page_count = leading_number(&value),
            "Publicatiedatum" => fragment.published_date = Some(value),
            _ => {}
        }
    }

    let cover_sel = selector(".productafbeeldingen img")?;
    fragment.cover_url = document
        .select(&cover_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| absolutize(base_url, src));
    fragment.thumbnail_url = fragment.cover_url.clone();

    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_isbn_page() {
        let page = r#"
<div class="view-header">
  <h4> De Avonden </h4>
  <table>
    <tr><td><strong>Ondertitel</strong></td><td>Een winterverhaal</td></tr>
    <tr><td><strong>Auteur(s)</strong></td><td>Gerard Reve</td></tr>
    <tr><td><strong>Uitgever</strong></td><td>De Bezige Bij</td></tr>
    <tr><td><strong>Pagina's</strong></td><td>288</td></tr>
    <tr><td><strong>Taal</strong></td><td>Nederlands</td></tr>
    <tr><td><strong>Publicatiedatum</strong></td><td>1947</td></tr>
  </table>
</div>
<div class="productafbeeldingen"><img src="/sites/default/files/voor.jpg"><img src="/sites/default/files/achter.jpg"></div>
"#;
        let fragment = parse_isbn_page(page, "9789023466349", "https://www.boekenplatform.nl")
            .unwrap();

        assert_eq!(fragment.source, "boekenplatform.nl");
        assert_eq!(fragment.title.as_deref(), Some("De Avonden"));
        assert_eq!(fragment.subtitle.as_deref(), Some("Een winterverhaal"));
        assert_eq!(fragment.authors, vec!["Gerard Reve"]);
        assert_eq!(fragment.publisher.as_deref(), Some("De Bezige Bij"));
        assert_eq!(fragment.page_count, Some(288));
        assert_eq!(fragment.published_date.as_deref(), Some("1947"));
        assert_eq!(
            fragment.cover_url.as_deref(),
            Some("https://www.boekenplatform.nl/sites/default/files/voor.jpg")
        );
    }

    #[test]
    fn test_falls_back_to_page_title() {
        let page = r#"<h1 class="title" id="page-title">Max Havelaar</h1>"#;
        let fragment = parse_isbn_page(page, "1", "https://x").unwrap();
        assert_eq!(fragment.title.as_deref(), Some("Max Havelaar"));
    }
}
