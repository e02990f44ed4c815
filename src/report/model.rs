use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Customer {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "株式会社サンプル")]
    pub customer_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Device {
    pub id: i64,
    #[schema(example = "core-switch-01")]
    pub device_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct InspectionItem {
    pub id: i64,
    #[schema(example = "ファン動作確認")]
    pub item_name: String,
}

/// One checked item of one device within an inspection.
///
/// `device` and `inspection_item` are optional because the rows are joined
/// from master tables that may have been edited after the inspection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ResultRecord {
    pub device: Option<Device>,
    pub inspection_item: Option<InspectionItem>,
    pub check_result: bool,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct InspectionRecord {
    pub id: i64,
    #[schema(value_type = String, example = "2025-03-14T10:30:00")]
    pub inspection_date: NaiveDateTime,
    #[schema(example = "山田太郎")]
    pub inspector_name: String,
    pub results: Vec<ResultRecord>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Draft,
    Completed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Completed => "completed",
        }
    }
}

/// A report row owned by the CRUD layer. Generation only fills in
/// `file_path` and flips `status`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReport {
    #[schema(example = 42)]
    pub id: i64,
    pub customer_id: i64,
    #[schema(value_type = String, example = "2025-03-31")]
    pub report_date: NaiveDate,
    #[schema(example = "2025年03月")]
    pub report_period: String,
    #[schema(example = "monthly")]
    pub report_type: String,
    pub template_id: Option<i64>,
    pub file_path: Option<String>,
    pub status: ReportStatus,
    pub notes: Option<String>,
}

/// Registered template document; `file_path` is relative to the template root.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct TemplateRecord {
    pub id: i64,
    pub template_name: String,
    pub report_type: String,
    #[schema(example = "custom/monthly_detailed.json")]
    pub file_path: String,
}
