//! Paginated report compositor.
//!
//! Walks a [`RenderModel`] top to bottom: header once, each section through
//! its draw routine, footer on the last page. All position state lives in a
//! [`Cursor`] passed explicitly to every routine.

use chrono::NaiveDate;

use super::canvas::{DocumentCanvas, FontHandle};
use super::common::format_japanese_date;
use super::fonts::FontSet;
use super::layout::{line_height, wrap_text, Cursor, PageLayout, PT_TO_MM};
use super::merge::{RenderModel, RenderedSection};
use super::sections::{
    DailyCountsContent, IssueDevicesContent, IssueTrendsContent, IssuesContent,
    MonthlySummaryContent, NotesContent, RecommendationTarget, RecommendationsContent,
    ResultsTableContent, SectionContent, SummaryContent,
};
use super::template::SectionType;

pub const TITLE_SIZE: f32 = 18.0;
pub const HEADING_SIZE: f32 = 13.0;
pub const BODY_SIZE: f32 = 10.0;
pub const TABLE_SIZE: f32 = 9.0;
pub const FOOTER_SIZE: f32 = 8.0;

pub const CELL_PADDING: f32 = 1.5;
const SECTION_GAP: f32 = 6.0;
const INDENT: f32 = 5.0;

pub const EMPTY_SECTION_TEXT: &str = "該当データなし";
pub const UNRENDERABLE_SECTION_TEXT: &str = "このセクションは表示できません";

/// Immutable drawing context shared by all routines of one document.
#[derive(Debug, Clone, Copy)]
pub struct Pen<'a> {
    pub fonts: &'a FontSet,
    pub layout: &'a PageLayout,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    /// Fraction of the content width.
    pub share: f32,
}

const fn col(title: &'static str, share: f32) -> Column {
    Column { title, share }
}

const RESULT_COLUMNS: [Column; 4] = [
    col("機器", 0.28),
    col("点検項目", 0.30),
    col("結果", 0.10),
    col("備考", 0.32),
];
const ISSUE_COLUMNS: [Column; 5] = [
    col("機器", 0.22),
    col("点検項目", 0.22),
    col("日付", 0.16),
    col("点検者", 0.14),
    col("備考", 0.26),
];
const DEVICE_SUMMARY_COLUMNS: [Column; 2] = [col("機器", 0.7), col("点検結果数", 0.3)];
const DAILY_COUNT_COLUMNS: [Column; 2] = [col("日付", 0.5), col("点検件数", 0.5)];
const ISSUE_DEVICE_COLUMNS: [Column; 3] = [
    col("機器", 0.3),
    col("異常件数", 0.15),
    col("異常項目", 0.55),
];
const ISSUE_TREND_COLUMNS: [Column; 2] = [col("点検項目", 0.7), col("異常件数", 0.3)];

/// Draw the whole document and return the number of pages used.
pub fn render_document(
    canvas: &mut dyn DocumentCanvas,
    fonts: &FontSet,
    layout: &PageLayout,
    model: &RenderModel,
    generated_on: NaiveDate,
) -> usize {
    let pen = Pen { fonts, layout };
    let mut cursor = Cursor::start(layout);

    draw_header(canvas, pen, &mut cursor, model);
    for section in &model.sections {
        draw_section(canvas, pen, &mut cursor, section);
    }
    draw_footer(canvas, pen, &cursor, &model.footer, generated_on);

    cursor.page + 1
}

fn draw_line(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    font: FontHandle,
    text: &str,
    size: f32,
    indent: f32,
) {
    let height = line_height(size);
    cursor.ensure_space(canvas, pen.layout, height);
    canvas.draw_text(
        cursor.page,
        font,
        text,
        size,
        pen.layout.content_left() + indent,
        cursor.y + size * PT_TO_MM,
    );
    cursor.advance(height);
}

fn draw_paragraph(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    text: &str,
    size: f32,
    indent: f32,
) {
    let width = pen.layout.content_width() - indent;
    let lines = wrap_text(canvas, pen.fonts.regular, text, size, width)
        .unwrap_or_else(|| vec![text.to_string()]);
    for line in lines {
        draw_line(canvas, pen, cursor, pen.fonts.regular, &line, size, indent);
    }
}

fn draw_rule(canvas: &mut dyn DocumentCanvas, pen: Pen<'_>, cursor: &Cursor) {
    canvas.draw_rule(
        cursor.page,
        pen.layout.content_left(),
        pen.layout.content_right(),
        cursor.y,
    );
}

fn draw_header(canvas: &mut dyn DocumentCanvas, pen: Pen<'_>, cursor: &mut Cursor, model: &RenderModel) {
    draw_line(canvas, pen, cursor, pen.fonts.bold, &model.title, TITLE_SIZE, 0.0);
    cursor.advance(2.0);
    for line in [
        format!("顧客名: {}", model.customer_name),
        format!("対象期間: {}", model.report_period),
        format!("報告日: {}", format_japanese_date(model.report_date)),
    ] {
        draw_line(canvas, pen, cursor, pen.fonts.regular, &line, BODY_SIZE, 0.0);
    }
    cursor.advance(2.0);
    draw_rule(canvas, pen, cursor);
    cursor.advance(SECTION_GAP);
}

fn content_matches(section_type: &SectionType, content: &SectionContent) -> bool {
    matches!(
        (section_type, content),
        (SectionType::Summary, SectionContent::Summary(_))
            | (SectionType::ResultsTable, SectionContent::ResultsTable(_))
            | (SectionType::Issues, SectionContent::Issues(_))
            | (SectionType::MonthlySummary, SectionContent::MonthlySummary(_))
            | (SectionType::DailyCounts, SectionContent::DailyCounts(_))
            | (SectionType::IssueDevices, SectionContent::IssueDevices(_))
            | (SectionType::IssueTrends, SectionContent::IssueTrends(_))
            | (SectionType::Recommendations, SectionContent::Recommendations(_))
            | (SectionType::Notes, SectionContent::Notes(_))
            | (_, SectionContent::Unknown { .. })
    )
}

fn draw_section(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    section: &RenderedSection,
) {
    if cursor.near_bottom(pen.layout) {
        cursor.break_page(canvas, pen.layout);
    }
    draw_line(canvas, pen, cursor, pen.fonts.bold, &section.title, HEADING_SIZE, 0.0);
    cursor.advance(1.5);

    if !content_matches(&section.section_type, &section.content) {
        log::warn!(
            "section '{}' declared as {} carries mismatched content, drawing placeholder",
            section.title,
            section.section_type
        );
        draw_line(canvas, pen, cursor, pen.fonts.regular, UNRENDERABLE_SECTION_TEXT, BODY_SIZE, INDENT);
        cursor.advance(SECTION_GAP);
        return;
    }

    match &section.content {
        SectionContent::Summary(c) => draw_summary(canvas, pen, cursor, c),
        SectionContent::ResultsTable(c) => draw_results_table(canvas, pen, cursor, c),
        SectionContent::Issues(c) => draw_issues(canvas, pen, cursor, c),
        SectionContent::MonthlySummary(c) => draw_monthly_summary(canvas, pen, cursor, c),
        SectionContent::DailyCounts(c) => draw_daily_counts(canvas, pen, cursor, c),
        SectionContent::IssueDevices(c) => draw_issue_devices(canvas, pen, cursor, c),
        SectionContent::IssueTrends(c) => draw_issue_trends(canvas, pen, cursor, c),
        SectionContent::Recommendations(c) => draw_recommendations(canvas, pen, cursor, c),
        SectionContent::Notes(c) => draw_notes(canvas, pen, cursor, c),
        SectionContent::Unknown { message } => {
            draw_line(canvas, pen, cursor, pen.fonts.regular, &format!("[{}]", message), BODY_SIZE, INDENT)
        }
    }
    cursor.advance(SECTION_GAP);
}

fn draw_summary(canvas: &mut dyn DocumentCanvas, pen: Pen<'_>, cursor: &mut Cursor, c: &SummaryContent) {
    let inspectors = if c.inspector_names.is_empty() {
        "---"
    } else {
        c.inspector_names.as_str()
    };
    for line in [
        format!("点検件数: {}件", c.inspection_count),
        format!("点検日: {}", c.date),
        format!("点検者: {}", inspectors),
    ] {
        draw_paragraph(canvas, pen, cursor, &line, BODY_SIZE, INDENT);
    }
}

fn draw_results_table(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    c: &ResultsTableContent,
) {
    let rows: Vec<Vec<String>> = c
        .rows
        .iter()
        .map(|r| vec![r.device.clone(), r.item.clone(), r.status.clone(), r.remarks.clone()])
        .collect();
    draw_rows(canvas, pen, cursor, &RESULT_COLUMNS, &rows);
}

fn draw_issues(canvas: &mut dyn DocumentCanvas, pen: Pen<'_>, cursor: &mut Cursor, c: &IssuesContent) {
    let rows: Vec<Vec<String>> = c
        .issues
        .iter()
        .map(|i| {
            vec![
                i.device.clone(),
                i.item.clone(),
                i.date.clone(),
                i.inspector.clone(),
                i.note.clone(),
            ]
        })
        .collect();
    draw_rows(canvas, pen, cursor, &ISSUE_COLUMNS, &rows);
}

fn draw_monthly_summary(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    c: &MonthlySummaryContent,
) {
    for line in [
        format!("対象期間: {}", c.period),
        format!("点検件数: {}件", c.total_inspections),
        format!("異常件数: {}件", c.total_issues),
    ] {
        draw_paragraph(canvas, pen, cursor, &line, BODY_SIZE, INDENT);
    }
    cursor.advance(2.0);
    let rows: Vec<Vec<String>> = c
        .device_summary
        .iter()
        .map(|d| vec![d.device.clone(), d.count.to_string()])
        .collect();
    draw_rows(canvas, pen, cursor, &DEVICE_SUMMARY_COLUMNS, &rows);
}

fn draw_daily_counts(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    c: &DailyCountsContent,
) {
    let rows: Vec<Vec<String>> = c
        .daily_counts
        .iter()
        .map(|d| vec![d.date.format("%Y-%m-%d").to_string(), format!("{}件", d.count)])
        .collect();
    draw_rows(canvas, pen, cursor, &DAILY_COUNT_COLUMNS, &rows);
}

fn draw_issue_devices(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    c: &IssueDevicesContent,
) {
    let rows: Vec<Vec<String>> = c
        .issue_devices
        .iter()
        .map(|d| vec![d.device.clone(), d.count.to_string(), d.items.clone()])
        .collect();
    draw_rows(canvas, pen, cursor, &ISSUE_DEVICE_COLUMNS, &rows);
}

fn draw_issue_trends(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    c: &IssueTrendsContent,
) {
    let rows: Vec<Vec<String>> = c
        .issue_trends
        .iter()
        .map(|t| vec![t.item.clone(), t.count.to_string()])
        .collect();
    draw_rows(canvas, pen, cursor, &ISSUE_TREND_COLUMNS, &rows);
}

fn draw_recommendations(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    c: &RecommendationsContent,
) {
    if c.recommendations.is_empty() {
        draw_line(canvas, pen, cursor, pen.fonts.regular, EMPTY_SECTION_TEXT, BODY_SIZE, INDENT);
        return;
    }
    for (i, rec) in c.recommendations.iter().enumerate() {
        let label = match rec.kind {
            RecommendationTarget::Item => "点検項目",
            RecommendationTarget::Device => "機器",
        };
        let heading = format!("{}. [{}] {}", i + 1, label, rec.target);
        draw_line(canvas, pen, cursor, pen.fonts.bold, &heading, BODY_SIZE, INDENT);
        draw_paragraph(canvas, pen, cursor, &rec.reason, BODY_SIZE, INDENT * 2.0);
        draw_paragraph(canvas, pen, cursor, &format!("→ {}", rec.recommendation), BODY_SIZE, INDENT * 2.0);
        cursor.advance(1.5);
    }
}

fn draw_notes(canvas: &mut dyn DocumentCanvas, pen: Pen<'_>, cursor: &mut Cursor, c: &NotesContent) {
    draw_paragraph(canvas, pen, cursor, &c.notes, BODY_SIZE, INDENT);
}

struct RowLayout {
    cells: Vec<Vec<String>>,
    height: f32,
}

fn layout_row(canvas: &dyn DocumentCanvas, pen: Pen<'_>, widths: &[f32], row: &[String]) -> RowLayout {
    let line_h = line_height(TABLE_SIZE);
    let mut measured = true;
    let cells: Vec<Vec<String>> = widths
        .iter()
        .zip(row)
        .map(|(width, text)| {
            match wrap_text(canvas, pen.fonts.regular, text, TABLE_SIZE, width - 2.0 * CELL_PADDING) {
                Some(lines) => lines,
                None => {
                    measured = false;
                    vec![text.clone()]
                }
            }
        })
        .collect();

    let height = if measured {
        let tallest = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        tallest as f32 * line_h + 2.0 * CELL_PADDING
    } else {
        pen.layout.row_fallback_height
    };
    RowLayout { cells, height }
}

fn draw_cells(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &Cursor,
    font: FontHandle,
    widths: &[f32],
    cells: &[Vec<String>],
) {
    let line_h = line_height(TABLE_SIZE);
    let mut x = pen.layout.content_left();
    for (width, lines) in widths.iter().zip(cells) {
        for (j, line) in lines.iter().enumerate() {
            let baseline = cursor.y + CELL_PADDING + TABLE_SIZE * PT_TO_MM + j as f32 * line_h;
            canvas.draw_text(cursor.page, font, line, TABLE_SIZE, x + CELL_PADDING, baseline);
        }
        x += width;
    }
}

/// Height of the column header row.
pub fn header_row_height() -> f32 {
    line_height(TABLE_SIZE) + 2.0 * CELL_PADDING
}

/// Draw table rows, breaking the page whenever the next row would cross the
/// bottom margin. The column header is drawn above the first row on every
/// page the table touches.
pub fn draw_rows(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &mut Cursor,
    columns: &[Column],
    rows: &[Vec<String>],
) {
    if rows.is_empty() {
        draw_line(canvas, pen, cursor, pen.fonts.regular, EMPTY_SECTION_TEXT, BODY_SIZE, INDENT);
        return;
    }

    let widths: Vec<f32> = columns
        .iter()
        .map(|c| c.share * pen.layout.content_width())
        .collect();
    let header_cells: Vec<Vec<String>> = columns.iter().map(|c| vec![c.title.to_string()]).collect();
    let header_height = header_row_height();
    let mut header_page: Option<usize> = None;

    for row in rows {
        let row_layout = layout_row(canvas, pen, &widths, row);
        let needs_header = |page: usize| header_page != Some(page);

        let needed = if needs_header(cursor.page) {
            header_height + row_layout.height
        } else {
            row_layout.height
        };
        cursor.ensure_space(canvas, pen.layout, needed);

        if needs_header(cursor.page) {
            draw_cells(canvas, pen, cursor, pen.fonts.bold, &widths, &header_cells);
            cursor.advance(header_height);
            draw_rule(canvas, pen, cursor);
            header_page = Some(cursor.page);
        }

        draw_cells(canvas, pen, cursor, pen.fonts.regular, &widths, &row_layout.cells);
        cursor.advance(row_layout.height);
    }
    draw_rule(canvas, pen, cursor);
}

fn draw_footer(
    canvas: &mut dyn DocumentCanvas,
    pen: Pen<'_>,
    cursor: &Cursor,
    label: &str,
    generated_on: NaiveDate,
) {
    let layout = pen.layout;
    let y = layout.page_height - layout.footer_offset;
    let font = pen.fonts.regular;

    canvas.draw_rule(cursor.page, layout.content_left(), layout.content_right(), y - 5.0);
    canvas.draw_text(cursor.page, font, label, FOOTER_SIZE, layout.content_left(), y);

    let generated = format!("作成日: {}", format_japanese_date(generated_on));
    let generated_width = canvas.measure_text(font, &generated, FOOTER_SIZE).unwrap_or(30.0);
    canvas.draw_text(
        cursor.page,
        font,
        &generated,
        FOOTER_SIZE,
        (layout.page_width - generated_width) / 2.0,
        y,
    );

    let page_label = format!("{} ページ", cursor.page + 1);
    let page_width = canvas.measure_text(font, &page_label, FOOTER_SIZE).unwrap_or(15.0);
    canvas.draw_text(
        cursor.page,
        font,
        &page_label,
        FOOTER_SIZE,
        layout.content_right() - page_width,
        y,
    );
}
