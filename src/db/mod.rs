//! Database module - AppState and the Postgres report store
//!
//! - `report` - report, customer, template and inspection queries

mod report;

pub use self::report::PgStore;

use std::sync::Arc;
use std::time::Duration;

use crate::config::ReportConfig;
use crate::report::orchestrator::GeneratorSettings;
use crate::report::{InspectionDataProvider, ReportGenerator, ReportSink, TemplateStore};

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn InspectionDataProvider>,
    pub generator: ReportGenerator,
}

impl AppState {
    pub async fn new_with_config(config: &ReportConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.database_url)
            .await?;

        let settings = GeneratorSettings::new(&config.reports_root, &config.font_path)
            .with_timeout(config.generation_timeout);

        Ok(Self::with_store(
            Arc::new(PgStore::new(pool)),
            TemplateStore::new(&config.templates_root),
            settings,
        ))
    }

    /// Build the state around any store that is both provider and sink.
    pub fn with_store<S>(store: Arc<S>, templates: TemplateStore, settings: GeneratorSettings) -> Self
    where
        S: InspectionDataProvider + ReportSink + 'static,
    {
        let provider: Arc<dyn InspectionDataProvider> = store.clone();
        let sink: Arc<dyn ReportSink> = store;
        Self {
            generator: ReportGenerator::new(provider.clone(), sink, templates, settings),
            provider,
        }
    }
}
