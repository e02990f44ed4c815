//! Report database operations

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::report::model::{
    Customer, Device, GeneratedReport, InspectionItem, InspectionRecord, ReportStatus,
    ResultRecord, TemplateRecord,
};
use crate::report::{InspectionDataProvider, PeriodWindow, ReportSink, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: i64,
    customer_id: i64,
    report_date: NaiveDate,
    report_period: String,
    report_type: String,
    template_id: Option<i64>,
    file_path: Option<String>,
    status: String,
    notes: Option<String>,
}

impl From<ReportRow> for GeneratedReport {
    fn from(row: ReportRow) -> Self {
        let status = if row.status == ReportStatus::Completed.as_str() {
            ReportStatus::Completed
        } else {
            ReportStatus::Draft
        };
        Self {
            id: row.id,
            customer_id: row.customer_id,
            report_date: row.report_date,
            report_period: row.report_period,
            report_type: row.report_type,
            template_id: row.template_id,
            file_path: row.file_path,
            status,
            notes: row.notes,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InspectionRow {
    id: i64,
    inspection_date: NaiveDateTime,
    inspector_name: String,
}

#[derive(sqlx::FromRow)]
struct ResultRow {
    inspection_id: i64,
    device_id: Option<i64>,
    device_name: Option<String>,
    inspection_item_id: Option<i64>,
    item_name: Option<String>,
    check_result: bool,
    note: Option<String>,
}

impl From<ResultRow> for ResultRecord {
    fn from(row: ResultRow) -> Self {
        let device = match (row.device_id, row.device_name) {
            (Some(id), Some(device_name)) => Some(Device { id, device_name }),
            _ => None,
        };
        let inspection_item = match (row.inspection_item_id, row.item_name) {
            (Some(id), Some(item_name)) => Some(InspectionItem { id, item_name }),
            _ => None,
        };
        Self {
            device,
            inspection_item,
            check_result: row.check_result,
            note: row.note,
        }
    }
}

#[async_trait]
impl InspectionDataProvider for PgStore {
    async fn find_report(&self, report_id: i64) -> Result<Option<GeneratedReport>, StoreError> {
        let row = sqlx::query_as::<_, ReportRow>(
            "SELECT id, customer_id, report_date, report_period, report_type, template_id, file_path, status, notes FROM generated_reports WHERE id = $1",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(GeneratedReport::from))
    }

    async fn find_customer(&self, customer_id: i64) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, customer_name FROM customers WHERE id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, customer_name)| Customer { id, customer_name }))
    }

    async fn find_template(&self, template_id: i64) -> Result<Option<TemplateRecord>, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String, String)>(
            "SELECT id, template_name, report_type, file_path FROM report_templates WHERE id = $1",
        )
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, template_name, report_type, file_path)| TemplateRecord {
            id,
            template_name,
            report_type,
            file_path,
        }))
    }

    async fn inspections_in_window(
        &self,
        customer_id: i64,
        window: &PeriodWindow,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        let inspections = sqlx::query_as::<_, InspectionRow>(
            r#"
            SELECT id, inspection_date, inspector_name
            FROM inspections
            WHERE customer_id = $1 AND inspection_date BETWEEN $2 AND $3
            ORDER BY inspection_date DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        if inspections.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = inspections.iter().map(|i| i.id).collect();
        let results = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT r.inspection_id, r.device_id, d.device_name,
                   r.inspection_item_id, it.item_name, r.check_result, r.note
            FROM inspection_results r
            LEFT JOIN devices d ON d.id = r.device_id
            LEFT JOIN inspection_items it ON it.id = r.inspection_item_id
            WHERE r.inspection_id = ANY($1)
            ORDER BY r.inspection_id, r.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_inspection: HashMap<i64, Vec<ResultRecord>> = HashMap::new();
        for row in results {
            by_inspection
                .entry(row.inspection_id)
                .or_default()
                .push(row.into());
        }

        Ok(inspections
            .into_iter()
            .map(|row| InspectionRecord {
                results: by_inspection.remove(&row.id).unwrap_or_default(),
                id: row.id,
                inspection_date: row.inspection_date,
                inspector_name: row.inspector_name,
            })
            .collect())
    }
}

#[async_trait]
impl ReportSink for PgStore {
    async fn mark_completed(&self, report_id: i64, file_path: &str) -> Result<(), StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE generated_reports
            SET file_path = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(report_id)
        .bind(file_path)
        .bind(ReportStatus::Completed.as_str())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::MissingReport(report_id));
        }
        Ok(())
    }
}
