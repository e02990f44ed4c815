//! Merges a template with aggregated section content into a render model.

use chrono::NaiveDate;
use serde::Serialize;

use super::model::InspectionRecord;
use super::sections::{empty_content, process_section, SectionContent, SectionDiagnostic, SectionInput};
use super::template::{SectionType, Template};

pub const DEFAULT_FOOTER: &str = "点検報告書";

/// Report instance data the template is merged with.
#[derive(Debug, Clone)]
pub struct MergeInput<'a> {
    pub customer_name: &'a str,
    pub report_date: NaiveDate,
    pub report_period: &'a str,
    pub inspections: &'a [InspectionRecord],
    pub notes: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    pub title: String,
    pub section_type: SectionType,
    pub content: SectionContent,
}

/// Renderer-ready view of one report. Built per generation, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    pub title: String,
    pub customer_name: String,
    pub report_type: String,
    pub report_period: String,
    pub report_date: NaiveDate,
    pub sections: Vec<RenderedSection>,
    pub footer: String,
    pub diagnostics: Vec<SectionDiagnostic>,
}

/// Build the render model. Section order follows the template exactly; a
/// section whose processor fails is replaced with its empty content and the
/// failure is kept in `diagnostics`.
pub fn merge_template_with_data(template: &Template, data: &MergeInput<'_>) -> RenderModel {
    let input = SectionInput {
        inspections: data.inspections,
        report_period: data.report_period,
        report_date: data.report_date,
        notes: data.notes,
    };

    let mut diagnostics = Vec::new();
    let sections = template
        .sections
        .iter()
        .map(|section| {
            let section_type = section
                .section_type
                .clone()
                .unwrap_or_else(|| SectionType::Unknown(String::new()));

            let content = match process_section(&section_type, &input) {
                Ok(content) => content,
                Err(mut diagnostic) => {
                    diagnostic.section_title = section.title.clone();
                    diagnostic.section_type = section_type.to_string();
                    log::warn!("degrading report section: {}", diagnostic);
                    diagnostics.push(diagnostic);
                    empty_content(&section_type, &input)
                }
            };

            RenderedSection {
                title: section.title.clone(),
                section_type,
                content,
            }
        })
        .collect();

    let footer = template
        .footer
        .as_ref()
        .map(|f| f.text.trim())
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_FOOTER)
        .to_string();

    RenderModel {
        title: template.name.clone(),
        customer_name: data.customer_name.to_string(),
        report_type: template.report_type.clone(),
        report_period: data.report_period.to_string(),
        report_date: data.report_date,
        sections,
        footer,
        diagnostics,
    }
}
