use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bookshelf.db")
}

/// External book sources, in the order they can be listed in `lookup.priority`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// standaardboekhandel.be product pages
    Standaard,
    /// booksinbelgium.be book pages
    BooksInBelgium,
    /// boekenplatform.nl ISBN pages
    Boekenplatform,
    /// Google Books volumes API
    GoogleBooks,
    /// Open Library ISBN API
    OpenLibrary,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Standaard => "standaard",
            SourceKind::BooksInBelgium => "books_in_belgium",
            SourceKind::Boekenplatform => "boekenplatform",
            SourceKind::GoogleBooks => "google_books",
            SourceKind::OpenLibrary => "open_library",
        }
    }
}

/// ISBN lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    /// Per-source request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User-Agent sent to scraped sites
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Accept-Language sent to scraped sites
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// Sources to query, most reliable first
    #[serde(default = "default_priority")]
    pub priority: Vec<SourceKind>,
    #[serde(default)]
    pub standaard: ScraperSourceConfig,
    #[serde(default)]
    pub books_in_belgium: ScraperSourceConfig,
    #[serde(default)]
    pub boekenplatform: ScraperSourceConfig,
    #[serde(default)]
    pub google_books: GoogleBooksConfig,
    #[serde(default)]
    pub open_library: OpenLibraryConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            priority: default_priority(),
            standaard: ScraperSourceConfig::default(),
            books_in_belgium: ScraperSourceConfig::default(),
            boekenplatform: ScraperSourceConfig::default(),
            google_books: GoogleBooksConfig::default(),
            open_library: OpenLibraryConfig::default(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "nl-BE,nl;q=0.9,en;q=0.8".to_string()
}

fn default_priority() -> Vec<SourceKind> {
    vec![
        SourceKind::Standaard,
        SourceKind::BooksInBelgium,
        SourceKind::GoogleBooks,
        SourceKind::OpenLibrary,
    ]
}

/// Settings shared by the HTML scrapers
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScraperSourceConfig {
    /// Override the site root (mostly for tests against a local server)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Google Books API configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GoogleBooksConfig {
    /// Optional API key; the volumes endpoint works without one at a lower quota
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Open Library API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenLibraryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Follow author references to get display names (one request per author)
    #[serde(default = "default_resolve_authors")]
    pub resolve_authors: bool,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            resolve_authors: default_resolve_authors(),
        }
    }
}

fn default_resolve_authors() -> bool {
    true
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub lookup: SanitizedLookupConfig,
}

/// Sanitized lookup config (Google API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLookupConfig {
    pub timeout_secs: u64,
    pub priority: Vec<String>,
    pub google_books_api_key_configured: bool,
    pub open_library_resolve_authors: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            lookup: SanitizedLookupConfig {
                timeout_secs: config.lookup.timeout_secs,
                priority: config
                    .lookup
                    .priority
                    .iter()
                    .map(|kind| kind.as_str().to_string())
                    .collect(),
                google_books_api_key_configured: config
                    .lookup
                    .google_books
                    .api_key
                    .as_ref()
                    .is_some_and(|key| !key.is_empty()),
                open_library_resolve_authors: config.lookup.open_library.resolve_authors,
            },
        }
    }
}
