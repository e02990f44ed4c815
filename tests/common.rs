#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::RwLock;

use inspection_report_server::report::model::{
    Customer, Device, GeneratedReport, InspectionItem, InspectionRecord, ReportStatus,
    ResultRecord, TemplateRecord,
};
use inspection_report_server::report::orchestrator::GeneratorSettings;
use inspection_report_server::report::{
    InspectionDataProvider, PeriodWindow, ReportGenerator, ReportSink, StoreError, TemplateStore,
};

pub const CUSTOMER_ID: i64 = 1;
pub const DAILY_REPORT_ID: i64 = 10;
pub const MONTHLY_REPORT_ID: i64 = 11;

#[derive(Debug, Default)]
struct StoreData {
    customers: HashMap<i64, Customer>,
    reports: HashMap<i64, GeneratedReport>,
    templates: HashMap<i64, TemplateRecord>,
    inspections: HashMap<i64, Vec<InspectionRecord>>,
}

/// Mock implementation of both data contracts for testing
#[derive(Debug, Default)]
pub struct MockReportStore {
    data: RwLock<StoreData>,
    sink_writes: AtomicUsize,
}

impl MockReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.data.get_mut().customers.insert(customer.id, customer);
        self
    }

    pub fn with_report(mut self, report: GeneratedReport) -> Self {
        self.data.get_mut().reports.insert(report.id, report);
        self
    }

    pub fn with_template(mut self, template: TemplateRecord) -> Self {
        self.data.get_mut().templates.insert(template.id, template);
        self
    }

    pub fn with_inspection(mut self, customer_id: i64, inspection: InspectionRecord) -> Self {
        self.data
            .get_mut()
            .inspections
            .entry(customer_id)
            .or_default()
            .push(inspection);
        self
    }

    pub async fn report(&self, report_id: i64) -> Option<GeneratedReport> {
        self.data.read().await.reports.get(&report_id).cloned()
    }

    /// Number of successful `mark_completed` calls.
    pub fn sink_writes(&self) -> usize {
        self.sink_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InspectionDataProvider for MockReportStore {
    async fn find_report(&self, report_id: i64) -> Result<Option<GeneratedReport>, StoreError> {
        Ok(self.data.read().await.reports.get(&report_id).cloned())
    }

    async fn find_customer(&self, customer_id: i64) -> Result<Option<Customer>, StoreError> {
        Ok(self.data.read().await.customers.get(&customer_id).cloned())
    }

    async fn find_template(&self, template_id: i64) -> Result<Option<TemplateRecord>, StoreError> {
        Ok(self.data.read().await.templates.get(&template_id).cloned())
    }

    async fn inspections_in_window(
        &self,
        customer_id: i64,
        window: &PeriodWindow,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        let data = self.data.read().await;
        let mut found: Vec<InspectionRecord> = data
            .inspections
            .get(&customer_id)
            .map(|all| {
                all.iter()
                    .filter(|i| window.contains(i.inspection_date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by(|a, b| b.inspection_date.cmp(&a.inspection_date));
        Ok(found)
    }
}

#[async_trait]
impl ReportSink for MockReportStore {
    async fn mark_completed(&self, report_id: i64, file_path: &str) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        let report = data
            .reports
            .get_mut(&report_id)
            .ok_or(StoreError::MissingReport(report_id))?;
        report.file_path = Some(file_path.to_string());
        report.status = ReportStatus::Completed;
        self.sink_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Temporary templates root and reports root for one test.
pub struct Workspace {
    pub templates: TempDir,
    pub reports: TempDir,
}

impl Workspace {
    /// Fresh directories with the shipped default templates copied in.
    pub fn new() -> Self {
        let templates = tempfile::tempdir().unwrap();
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/reports");
        let target = templates.path().join("reports");
        std::fs::create_dir_all(&target).unwrap();
        for name in ["daily_template.json", "monthly_template.json"] {
            std::fs::copy(shipped.join(name), target.join(name)).unwrap();
        }

        Self {
            templates,
            reports: tempfile::tempdir().unwrap(),
        }
    }

    /// Write a template document below the templates root.
    pub fn write_template(&self, relative: &str, json: &str) {
        let path = self.templates.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    pub fn settings(&self) -> GeneratorSettings {
        GeneratorSettings::new(self.reports.path(), self.missing_font())
    }

    pub fn missing_font(&self) -> PathBuf {
        self.templates.path().join("fonts/NotoSansJP-Regular.ttf")
    }

    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::new(self.templates.path())
    }

    pub fn generator(&self, store: Arc<MockReportStore>) -> ReportGenerator {
        ReportGenerator::new(store.clone(), store, self.template_store(), self.settings())
    }

    /// All PDF files written below the reports root.
    pub fn written_reports(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let Ok(customers) = std::fs::read_dir(self.reports.path()) else {
            return found;
        };
        for dir in customers.flatten() {
            if let Ok(files) = std::fs::read_dir(dir.path()) {
                found.extend(files.flatten().map(|f| f.path()));
            }
        }
        found
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

pub fn result(device: &str, item: &str, ok: bool, note: Option<&str>) -> ResultRecord {
    ResultRecord {
        device: Some(Device {
            id: device.len() as i64,
            device_name: device.to_string(),
        }),
        inspection_item: Some(InspectionItem {
            id: item.len() as i64,
            item_name: item.to_string(),
        }),
        check_result: ok,
        note: note.map(str::to_string),
    }
}

pub fn inspection(id: i64, when: NaiveDateTime, results: Vec<ResultRecord>) -> InspectionRecord {
    InspectionRecord {
        id,
        inspection_date: when,
        inspector_name: "山田太郎".to_string(),
        results,
    }
}

pub fn report(id: i64, report_type: &str, date: NaiveDate, period: &str) -> GeneratedReport {
    GeneratedReport {
        id,
        customer_id: CUSTOMER_ID,
        report_date: date,
        report_period: period.to_string(),
        report_type: report_type.to_string(),
        template_id: None,
        file_path: None,
        status: ReportStatus::Draft,
        notes: None,
    }
}

pub fn template_record(id: i64, report_type: &str, file_path: &str) -> TemplateRecord {
    TemplateRecord {
        id,
        template_name: format!("template {}", id),
        report_type: report_type.to_string(),
        file_path: file_path.to_string(),
    }
}

/// One customer, a daily report for 2025-03-14 and a monthly report for
/// March 2025. Two inspections on the 14th each with one OK and one NG
/// result, one more on the 3rd, and one in February.
pub fn seeded_store() -> MockReportStore {
    let march_14 = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let march_31 = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

    MockReportStore::new()
        .with_customer(Customer {
            id: CUSTOMER_ID,
            customer_name: "株式会社サンプル".to_string(),
        })
        .with_report(report(DAILY_REPORT_ID, "daily", march_14, "2025年03月14日"))
        .with_report(report(MONTHLY_REPORT_ID, "monthly", march_31, "2025年03月"))
        .with_inspection(
            CUSTOMER_ID,
            inspection(
                1,
                at(2025, 3, 14, 9),
                vec![
                    result("core-switch-01", "電源ランプ", true, None),
                    result("core-switch-01", "ファン動作", false, Some("異音あり")),
                ],
            ),
        )
        .with_inspection(
            CUSTOMER_ID,
            inspection(
                2,
                at(2025, 3, 14, 15),
                vec![
                    result("router-01", "電源ランプ", true, None),
                    result("router-01", "ファン動作", false, None),
                ],
            ),
        )
        .with_inspection(
            CUSTOMER_ID,
            inspection(3, at(2025, 3, 3, 10), vec![result("router-01", "ログ確認", true, None)]),
        )
        .with_inspection(
            CUSTOMER_ID,
            inspection(4, at(2025, 2, 27, 10), vec![result("router-01", "ログ確認", false, None)]),
        )
}
