//! Report templates: loading, validation and default lookup.
//!
//! A template is a JSON document:
//!
//! ```json
//! {
//!   "name": "日次点検報告書",
//!   "type": "daily",
//!   "sections": [{ "title": "概要", "type": "summary" }],
//!   "footer": { "text": "点検報告書" }
//! }
//! ```

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::model::TemplateRecord;
use super::period::ReportType;
use super::ReportError;

const DEFAULT_TEMPLATE_DIR: &str = "reports";

/// Closed set of section kinds a template may declare.
///
/// Tags outside the set load as [`SectionType::Unknown`] so a template written
/// for a newer server still renders (with a diagnostic line in place of the
/// section).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionType {
    Summary,
    ResultsTable,
    Issues,
    MonthlySummary,
    DailyCounts,
    IssueDevices,
    IssueTrends,
    Recommendations,
    Notes,
    Unknown(String),
}

impl SectionType {
    pub const KNOWN: [SectionType; 9] = [
        SectionType::Summary,
        SectionType::ResultsTable,
        SectionType::Issues,
        SectionType::MonthlySummary,
        SectionType::DailyCounts,
        SectionType::IssueDevices,
        SectionType::IssueTrends,
        SectionType::Recommendations,
        SectionType::Notes,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Summary => "summary",
            Self::ResultsTable => "results_table",
            Self::Issues => "issues",
            Self::MonthlySummary => "monthly_summary",
            Self::DailyCounts => "daily_counts",
            Self::IssueDevices => "issue_devices",
            Self::IssueTrends => "issue_trends",
            Self::Recommendations => "recommendations",
            Self::Notes => "notes",
            Self::Unknown(tag) => tag,
        }
    }
}

impl From<String> for SectionType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "summary" => Self::Summary,
            "results_table" => Self::ResultsTable,
            "issues" => Self::Issues,
            "monthly_summary" => Self::MonthlySummary,
            "daily_counts" => Self::DailyCounts,
            "issue_devices" => Self::IssueDevices,
            "issue_trends" => Self::IssueTrends,
            "recommendations" => Self::Recommendations,
            "notes" => Self::Notes,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<SectionType> for String {
    fn from(section_type: SectionType) -> Self {
        match section_type {
            SectionType::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub section_type: Option<SectionType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateFooter {
    #[serde(default)]
    pub text: String,
}

/// A parsed template. Fields default to empty so that a structurally
/// incomplete document still parses and is rejected by
/// [`validate_template`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub report_type: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub footer: Option<TemplateFooter>,
}

impl Template {
    pub fn from_json(source: &str, origin: &str) -> Result<Self, ReportError> {
        serde_json::from_str(source).map_err(|source| ReportError::TemplateParse {
            path: origin.to_string(),
            source,
        })
    }
}

/// A single template shape problem.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateIssue {
    pub field: String,
    pub message: String,
}

impl TemplateIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for TemplateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

/// Collect every shape problem of a template.
pub fn template_issues(template: &Template) -> Vec<TemplateIssue> {
    let mut issues = Vec::new();

    if template.name.trim().is_empty() {
        issues.push(TemplateIssue::new("name", "must not be empty"));
    }

    if template.report_type.trim().is_empty() {
        issues.push(TemplateIssue::new("type", "must not be empty"));
    } else if ReportType::from_str(&template.report_type).is_err() {
        issues.push(TemplateIssue::new(
            "type",
            format!("'{}' is not one of daily, monthly", template.report_type),
        ));
    }

    if template.sections.is_empty() {
        issues.push(TemplateIssue::new("sections", "at least one section is required"));
    }

    for (i, section) in template.sections.iter().enumerate() {
        if section.title.trim().is_empty() {
            issues.push(TemplateIssue::new(
                format!("sections[{}].title", i),
                "must not be empty",
            ));
        }
        match &section.section_type {
            None => issues.push(TemplateIssue::new(
                format!("sections[{}].type", i),
                "is required",
            )),
            Some(SectionType::Unknown(tag)) if tag.trim().is_empty() => issues.push(
                TemplateIssue::new(format!("sections[{}].type", i), "must not be empty"),
            ),
            Some(_) => {}
        }
    }

    issues
}

/// True when the template has the minimum shape needed for rendering.
pub fn validate_template(template: &Template) -> bool {
    template_issues(template).is_empty()
}

/// Like [`validate_template`] but returns the reason as an error.
pub fn ensure_valid(template: &Template) -> Result<(), ReportError> {
    let issues = template_issues(template);
    if issues.is_empty() {
        return Ok(());
    }
    let reason = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(ReportError::InvalidTemplate(reason))
}

/// Template repository rooted at a directory, with a read cache of parsed
/// documents.
#[derive(Clone)]
pub struct TemplateStore {
    root: PathBuf,
    cache: Cache<PathBuf, Arc<Template>>,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(10 * 60))
            .max_capacity(64)
            .build();
        Self {
            root: root.into(),
            cache,
        }
    }

    /// `<root>/reports/{type}_template.json`.
    pub fn default_template_path(&self, report_type: &str) -> Result<PathBuf, ReportError> {
        let report_type = ReportType::from_str(report_type)?;
        Ok(self
            .root
            .join(DEFAULT_TEMPLATE_DIR)
            .join(format!("{}_template.json", report_type.as_str())))
    }

    /// Resolve a registered template's relative path inside the root.
    pub fn record_path(&self, record: &TemplateRecord) -> Result<PathBuf, ReportError> {
        let relative = Path::new(&record.file_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || record.file_path.trim().is_empty() {
            return Err(ReportError::TemplateNotFound(record.file_path.clone()));
        }
        Ok(self.root.join(relative))
    }

    /// Read and parse a template document from disk, bypassing the cache.
    pub fn load(path: &Path) -> Result<Template, ReportError> {
        let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ReportError::TemplateNotFound(path.display().to_string())
            }
            _ => ReportError::Io(e),
        })?;
        Template::from_json(&source, &path.display().to_string())
    }

    pub async fn load_cached(&self, path: &Path) -> Result<Arc<Template>, ReportError> {
        if let Some(template) = self.cache.get(path).await {
            log::debug!("template cache hit: {}", path.display());
            return Ok(template);
        }

        let template = Arc::new(Self::load(path)?);
        self.cache
            .insert(path.to_path_buf(), template.clone())
            .await;
        Ok(template)
    }

    /// Explicit template when one is registered, else the default for the
    /// report type.
    pub async fn resolve(
        &self,
        record: Option<&TemplateRecord>,
        report_type: &str,
    ) -> Result<Arc<Template>, ReportError> {
        let path = match record {
            Some(record) => self.record_path(record)?,
            None => self.default_template_path(report_type)?,
        };
        self.load_cached(&path).await
    }
}
