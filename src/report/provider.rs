//! Contracts between the generation pipeline and the data layer.
//!
//! [`InspectionDataProvider`] reads the report, customer, template and
//! inspection data; [`ReportSink`] records the outcome. The Postgres
//! implementation lives in [`crate::db`].

use async_trait::async_trait;
use thiserror::Error;

use super::model::{Customer, GeneratedReport, InspectionRecord, TemplateRecord};
use super::period::PeriodWindow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("report {0} no longer exists")]
    MissingReport(i64),
}

#[async_trait]
pub trait InspectionDataProvider: Send + Sync {
    async fn find_report(&self, report_id: i64) -> Result<Option<GeneratedReport>, StoreError>;

    async fn find_customer(&self, customer_id: i64) -> Result<Option<Customer>, StoreError>;

    async fn find_template(&self, template_id: i64) -> Result<Option<TemplateRecord>, StoreError>;

    /// Inspections of `customer_id` whose date lies inside `window`, newest
    /// first, with their results and the referenced device and item rows.
    async fn inspections_in_window(
        &self,
        customer_id: i64,
        window: &PeriodWindow,
    ) -> Result<Vec<InspectionRecord>, StoreError>;
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Store the artifact path on the report and mark it completed.
    async fn mark_completed(&self, report_id: i64, file_path: &str) -> Result<(), StoreError>;
}
