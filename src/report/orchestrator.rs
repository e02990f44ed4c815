//! End-to-end report generation: lookups, template, period, data, merge,
//! render and persistence, in that order.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::canvas::{CanvasError, DocumentCanvas};
use super::common::report_output_path;
use super::fonts::{FontDiagnostic, FontSet};
use super::layout::PageLayout;
use super::merge::{merge_template_with_data, MergeInput, RenderModel};
use super::model::ReportStatus;
use super::pdf::PdfCanvas;
use super::period::{resolve_period, ReportType};
use super::provider::{InspectionDataProvider, ReportSink};
use super::render::render_document;
use super::sections::SectionDiagnostic;
use super::template::{ensure_valid, TemplateStore};
use super::ReportError;

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub reports_root: PathBuf,
    pub font_path: PathBuf,
    pub timeout: Duration,
}

impl GeneratorSettings {
    pub fn new(reports_root: impl Into<PathBuf>, font_path: impl Into<PathBuf>) -> Self {
        Self {
            reports_root: reports_root.into(),
            font_path: font_path.into(),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub report_id: i64,
    pub file_path: String,
    pub status: ReportStatus,
    pub pages: usize,
    pub font_diagnostic: Option<FontDiagnostic>,
    pub section_diagnostics: Vec<SectionDiagnostic>,
}

struct RenderOutcome {
    pages: usize,
    font_diagnostic: Option<FontDiagnostic>,
}

#[derive(Clone)]
pub struct ReportGenerator {
    provider: Arc<dyn InspectionDataProvider>,
    sink: Arc<dyn ReportSink>,
    templates: TemplateStore,
    settings: GeneratorSettings,
}

impl ReportGenerator {
    pub fn new(
        provider: Arc<dyn InspectionDataProvider>,
        sink: Arc<dyn ReportSink>,
        templates: TemplateStore,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            provider,
            sink,
            templates,
            settings,
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Generate the PDF for `report_id` and record it as completed.
    ///
    /// Nothing is written to the sink unless the document was written.
    pub async fn generate(&self, report_id: i64) -> Result<GenerationResult, ReportError> {
        let limit = self.settings.timeout;
        match tokio::time::timeout(limit, self.run_pipeline(report_id)).await {
            Ok(result) => result,
            Err(_) => {
                log::error!("report {} generation timed out after {:?}", report_id, limit);
                Err(ReportError::Timeout(limit.as_secs()))
            }
        }
    }

    async fn run_pipeline(&self, report_id: i64) -> Result<GenerationResult, ReportError> {
        let report = self
            .provider
            .find_report(report_id)
            .await?
            .ok_or(ReportError::NotFound {
                entity: "report",
                id: report_id,
            })?;
        let customer = self
            .provider
            .find_customer(report.customer_id)
            .await?
            .ok_or(ReportError::NotFound {
                entity: "customer",
                id: report.customer_id,
            })?;
        let template_record = match report.template_id {
            Some(template_id) => Some(self.provider.find_template(template_id).await?.ok_or(
                ReportError::NotFound {
                    entity: "template",
                    id: template_id,
                },
            )?),
            None => None,
        };

        let template = self
            .templates
            .resolve(template_record.as_ref(), &report.report_type)
            .await?;
        ensure_valid(&template)?;

        let report_type: ReportType = report.report_type.parse()?;
        let window = resolve_period(&report.report_type, report.report_date, &report.report_period)?;
        let inspections = self
            .provider
            .inspections_in_window(customer.id, &window)
            .await?;
        log::info!(
            "report {}: {} inspections between {} and {}",
            report_id,
            inspections.len(),
            window.start,
            window.end
        );

        let model = merge_template_with_data(
            &template,
            &MergeInput {
                customer_name: &customer.customer_name,
                report_date: report.report_date,
                report_period: &report.report_period,
                inspections: &inspections,
                notes: report.notes.as_deref(),
            },
        );
        let section_diagnostics = model.diagnostics.clone();

        let generated_at = Local::now().naive_local();
        let output_path = report_output_path(
            &self.settings.reports_root,
            customer.id,
            report_type,
            report.id,
            generated_at,
        );

        let outcome = self.render_to_file(model, output_path.clone(), generated_at).await?;
        let file_path = output_path.display().to_string();

        self.sink.mark_completed(report.id, &file_path).await?;
        log::info!(
            "report {} completed: {} ({} pages)",
            report_id,
            file_path,
            outcome.pages
        );

        Ok(GenerationResult {
            report_id: report.id,
            file_path,
            status: ReportStatus::Completed,
            pages: outcome.pages,
            font_diagnostic: outcome.font_diagnostic,
            section_diagnostics,
        })
    }

    async fn render_to_file(
        &self,
        model: RenderModel,
        output_path: PathBuf,
        generated_at: NaiveDateTime,
    ) -> Result<RenderOutcome, ReportError> {
        let font_path = self.settings.font_path.clone();
        tokio::task::spawn_blocking(move || {
            write_document(&model, &font_path, &output_path, generated_at.date())
        })
        .await
        .map_err(|e| ReportError::Render(format!("render task failed: {}", e)))?
    }
}

fn write_document(
    model: &RenderModel,
    font_path: &Path,
    output_path: &Path,
    generated_on: NaiveDate,
) -> Result<RenderOutcome, ReportError> {
    ensure_parent_dir(output_path)?;

    let mut canvas = PdfCanvas::a4(&model.title);
    let (fonts, font_diagnostic) =
        FontSet::resolve(&mut canvas, font_path).map_err(canvas_error)?;
    let (width, height) = canvas.page_size();
    let layout = PageLayout::for_page(width, height);

    let pages = render_document(&mut canvas, &fonts, &layout, model, generated_on);
    canvas.save(output_path).map_err(canvas_error)?;

    Ok(RenderOutcome {
        pages,
        font_diagnostic,
    })
}

fn canvas_error(error: CanvasError) -> ReportError {
    match error {
        CanvasError::Output(io) => ReportError::Io(io),
        other => ReportError::Render(other.to_string()),
    }
}

/// Create the artifact directory, tolerating one that already exists.
/// A failed attempt is retried once.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ReportError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if let Err(first) = std::fs::create_dir_all(parent) {
        log::warn!(
            "creating report directory {} failed ({}), retrying",
            parent.display(),
            first
        );
        std::fs::create_dir_all(parent).map_err(ReportError::Io)?;
    }
    Ok(())
}
