use std::sync::Arc;

use bookshelf_core::{BookLibrary, BookResolver, Config, SanitizedConfig, SeriesResolver};

/// Shared application state
pub struct AppState {
    config: Config,
    resolver: Arc<BookResolver>,
    library: Arc<dyn BookLibrary>,
    series: Arc<SeriesResolver>,
}

impl AppState {
    pub fn new(
        config: Config,
        resolver: Arc<BookResolver>,
        library: Arc<dyn BookLibrary>,
        series: Arc<SeriesResolver>,
    ) -> Self {
        Self {
            config,
            resolver,
            library,
            series,
        }
    }

    pub fn resolver(&self) -> &BookResolver {
        &self.resolver
    }

    pub fn library(&self) -> &Arc<dyn BookLibrary> {
        &self.library
    }

    pub fn series(&self) -> &SeriesResolver {
        &self.series
    }

    /// Config with secrets removed, safe to return from the API.
    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }
}
