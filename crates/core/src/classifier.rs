//! Content-type classification from free-text category labels.
//!
//! Categories come straight from the sources, in Dutch, French, German or
//! English, so classification is plain substring matching against a keyword
//! table. The table is checked in order and the first hit wins, which is why
//! graphic novels sit above the broader comic keywords.

use serde::{Deserialize, Serialize};

/// What kind of publication a book is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    #[default]
    Book,
    Comic,
    Manga,
    GraphicNovel,
    Magazine,
    Audiobook,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Book => "BOOK",
            ContentType::Comic => "COMIC",
            ContentType::Manga => "MANGA",
            ContentType::GraphicNovel => "GRAPHIC_NOVEL",
            ContentType::Magazine => "MAGAZINE",
            ContentType::Audiobook => "AUDIOBOOK",
        }
    }

    /// Parse the stored form written by [`ContentType::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BOOK" => Some(ContentType::Book),
            "COMIC" => Some(ContentType::Comic),
            "MANGA" => Some(ContentType::Manga),
            "GRAPHIC_NOVEL" => Some(ContentType::GraphicNovel),
            "MAGAZINE" => Some(ContentType::Magazine),
            "AUDIOBOOK" => Some(ContentType::Audiobook),
            _ => None,
        }
    }
}

/// Keyword table in priority order. `Book` has no keywords; it is the fallback.
const CONTENT_TYPE_KEYWORDS: &[(ContentType, &[&str])] = &[
    (
        ContentType::Audiobook,
        &[
            "audiobook",
            "luisterboek",
            "audio book",
            "audioboek",
            "luister boek",
            "hörbuch",
        ],
    ),
    (
        ContentType::Magazine,
        &["magazine", "tijdschrift", "periodiek", "journal", "revue"],
    ),
    (ContentType::Manga, &["manga", "mangá"]),
    (
        ContentType::GraphicNovel,
        &[
            "graphic novel",
            "grafische roman",
            "roman graphique",
            "graphic novels",
        ],
    ),
    (
        ContentType::Comic,
        &[
            "strip",
            "strips",
            "comic",
            "comics",
            "stripboek",
            "stripverhaal",
            "bande dessinée",
            "bd",
        ],
    ),
];

/// Classify a book from its category labels.
///
/// Blank labels are ignored. Returns [`ContentType::Book`] when nothing
/// matches or no labels are given.
pub fn classify<I, S>(categories: I) -> ContentType
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let search_text = categories
        .into_iter()
        .filter_map(|c| {
            let c = c.as_ref().trim();
            (!c.is_empty()).then(|| c.to_lowercase())
        })
        .collect::<Vec<_>>()
        .join(" ");

    if search_text.is_empty() {
        return ContentType::Book;
    }

    CONTENT_TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| search_text.contains(k)))
        .map(|(content_type, _)| *content_type)
        .unwrap_or(ContentType::Book)
}
