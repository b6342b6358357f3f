pub mod book;
pub mod classifier;
pub mod config;
pub mod library;
pub mod metrics;
pub mod resolver;
pub mod series;
pub mod source;
pub mod testing;

pub use book::{normalize_isbn, BookFragment, ResolvedBook, SeriesRef};
pub use classifier::{classify, ContentType};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    LookupConfig, SanitizedConfig, ServerConfig, SourceKind,
};
pub use library::{
    BookLibrary, LibraryError, LocalBook, LocalBookLookup, NewBook, SqliteLibrary,
};
pub use resolver::{BookResolver, ResolveError};
pub use series::{Series, SeriesError, SeriesResolver, SeriesStore, SqliteSeriesStore};
pub use source::{build_sources, BookSource, SourceError};
