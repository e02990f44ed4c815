//! Report generation engine.
//!
//! Turns inspection records for a customer into a paginated PDF report:
//! - `template` - template documents, validation and default lookup
//! - `period` - report period window resolution
//! - `sections` - one aggregation function per section type
//! - `merge` - template + aggregated content into a render model
//! - `canvas`, `layout`, `fonts`, `metrics`, `render`, `pdf` - the paginated compositor
//! - `orchestrator` - the end-to-end generation pipeline
//! - `provider` - data provider and persistence sink contracts
//! - `handlers` - HTTP endpoints

pub mod canvas;
pub mod common;
pub mod fonts;
pub mod handlers;
pub mod layout;
pub mod merge;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod pdf;
pub mod period;
pub mod provider;
pub mod render;
pub mod sections;
pub mod template;


pub use merge::{merge_template_with_data, MergeInput, RenderModel, RenderedSection};
pub use orchestrator::{GenerationResult, ReportGenerator};
pub use period::{resolve_period, PeriodWindow, ReportType};
pub use provider::{InspectionDataProvider, ReportSink, StoreError};
pub use template::{validate_template, SectionType, Template, TemplateStore};

use thiserror::Error;

/// Errors that abort a whole report generation.
///
/// Section-level problems never show up here; they are carried as
/// [`sections::SectionDiagnostic`] values on the render model.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("template file not found: {0}")]
    TemplateNotFound(String),
    #[error("failed to parse template {path}: {source}")]
    TemplateParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
    #[error("invalid report period format: {0}")]
    InvalidPeriodFormat(String),
    #[error("invalid report type: {0}")]
    InvalidReportType(String),
    #[error("report output I/O failed: {0}")]
    Io(#[source] std::io::Error),
    #[error("failed to render report document: {0}")]
    Render(String),
    #[error("data store failure: {0}")]
    Store(#[from] StoreError),
    #[error("report generation exceeded {0} seconds")]
    Timeout(u64),
}

impl ReportError {
    /// Stable classification string exposed to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::TemplateNotFound(_) => "NotFound",
            Self::TemplateParse { .. } | Self::InvalidTemplate(_) => "InvalidTemplate",
            Self::InvalidPeriodFormat(_) => "InvalidPeriodFormat",
            Self::InvalidReportType(_) => "InvalidReportType",
            Self::Io(_) => "IoError",
            Self::Render(_) => "RenderError",
            Self::Store(_) => "StoreError",
            Self::Timeout(_) => "Timeout",
        }
    }

    /// Message safe to show to API callers: no paths, no source chains.
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound { entity, id } => format!("{} {} not found", entity, id),
            Self::TemplateNotFound(_) => "report template not found".to_string(),
            Self::TemplateParse { .. } => "report template is malformed".to_string(),
            Self::InvalidTemplate(reason) => format!("invalid template: {}", reason),
            Self::InvalidPeriodFormat(label) => {
                format!("invalid report period format: {}", label)
            }
            Self::InvalidReportType(kind) => format!("invalid report type: {}", kind),
            Self::Io(_) | Self::Render(_) => "failed to write report document".to_string(),
            Self::Store(_) => "report data is temporarily unavailable".to_string(),
            Self::Timeout(secs) => format!("report generation exceeded {} seconds", secs),
        }
    }
}
