//! Field-level merge of a fetched fragment with the local record.
//!
//! The fragment wins wherever it has a value. The local record only fills
//! gaps, except for the content type, which the local record pins once set.

use crate::book::{BookFragment, ResolvedBook, SeriesRef};
use crate::classifier::{classify, ContentType};
use crate::library::LocalBook;

/// Source identifier for results built from the local record alone.
pub const LOCAL_SOURCE: &str = "local";

/// Ordered union: local labels first, then new fetched labels. Exact
/// duplicates are dropped; blank labels are skipped.
pub fn union_categories(local: &[String], fetched: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(local.len() + fetched.len());
    for category in local.iter().chain(fetched) {
        let category = category.trim();
        if !category.is_empty() && !merged.iter().any(|c| c == category) {
            merged.push(category.to_string());
        }
    }
    merged
}

fn pinned_or_classified(pinned: Option<ContentType>, categories: &[String]) -> ContentType {
    pinned.unwrap_or_else(|| classify(categories))
}

/// Merge the winning fragment over the local record.
///
/// `series` is the identity already resolved for the fragment's series name,
/// if it named one.
pub fn merge(fragment: BookFragment, local: Option<&LocalBook>, series: Option<SeriesRef>) -> ResolvedBook {
    let local_categories = local.map(LocalBook::category_names).unwrap_or_default();
    let categories = union_categories(&local_categories, &fragment.categories);
    let book_type = pinned_or_classified(local.and_then(|l| l.book_type), &categories);

    let authors = if fragment.authors.is_empty() {
        local.map(LocalBook::author_names).unwrap_or_default()
    } else {
        fragment.authors
    };

    let title = fragment
        .title
        .filter(|t| !t.trim().is_empty())
        .or_else(|| local.map(|l| l.title.clone()))
        .unwrap_or_default();

    ResolvedBook {
        id: local.map(|l| l.id.clone()),
        isbn: fragment.isbn.or_else(|| local.and_then(|l| l.isbn.clone())),
        isbn13: fragment.isbn13.or_else(|| local.and_then(|l| l.isbn13.clone())),
        title,
        subtitle: fragment
            .subtitle
            .or_else(|| local.and_then(|l| l.subtitle.clone())),
        description: fragment
            .description
            .or_else(|| local.and_then(|l| l.description.clone())),
        authors,
        categories,
        publisher: fragment
            .publisher
            .or_else(|| local.and_then(|l| l.publisher.clone())),
        published_date: fragment
            .published_date
            .or_else(|| local.and_then(|l| l.published_date.clone())),
        page_count: fragment.page_count.or_else(|| local.and_then(|l| l.page_count)),
        language: fragment
            .language
            .or_else(|| local.and_then(|l| l.language.clone())),
        cover_url: fragment
            .cover_url
            .or_else(|| local.and_then(|l| l.cover_url.clone())),
        thumbnail_url: fragment
            .thumbnail_url
            .or_else(|| local.and_then(|l| l.thumbnail_url.clone())),
        series: series.or_else(|| local.and_then(|l| l.series.clone())),
        series_number: fragment
            .series_number
            .or_else(|| local.and_then(|l| l.series_number.clone())),
        book_type,
        source: fragment.source,
    }
}

/// The local record on its own, with authors and categories flattened to names.
pub fn from_local(local: &LocalBook) -> ResolvedBook {
    let categories = local.category_names();
    let book_type = pinned_or_classified(local.book_type, &categories);

    ResolvedBook {
        id: Some(local.id.clone()),
        isbn: local.isbn.clone(),
        isbn13: local.isbn13.clone(),
        title: local.title.clone(),
        subtitle: local.subtitle.clone(),
        description: local.description.clone(),
        authors: local.author_names(),
        categories,
        publisher: local.publisher.clone(),
        published_date: local.published_date.clone(),
        page_count: local.page_count,
        language: local.language.clone(),
        cover_url: local.cover_url.clone(),
        thumbnail_url: local.thumbnail_url.clone(),
        series: local.series.clone(),
        series_number: local.series_number.clone(),
        book_type,
        source: LOCAL_SOURCE.to_string(),
    }
}
