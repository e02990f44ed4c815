//! Section processors.
//!
//! One pure aggregation function per [`SectionType`]. Every processor returns
//! its zeroed content shape on empty input. A processor only fails when a
//! record it needs is incomplete (a result row whose device or inspection item
//! is gone); the caller degrades that section instead of aborting.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::common::format_japanese_date;
use super::model::{InspectionRecord, ResultRecord};
use super::template::SectionType;

pub const STATUS_OK: &str = "OK";
pub const STATUS_NG: &str = "NG";
pub const NO_NOTE: &str = "---";
pub const NO_NOTES_PLACEHOLDER: &str = "特記事項なし";

const RECOMMENDATION_LIMIT: usize = 3;
const ITEM_ISSUE_THRESHOLD: usize = 2;
const DEVICE_ISSUE_THRESHOLD: usize = 3;

/// Everything a processor may look at.
#[derive(Debug, Clone, Copy)]
pub struct SectionInput<'a> {
    pub inspections: &'a [InspectionRecord],
    pub report_period: &'a str,
    pub report_date: NaiveDate,
    pub notes: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryContent {
    pub inspection_count: usize,
    pub date: String,
    pub inspector_names: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub device: String,
    pub item: String,
    pub status: String,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsTableContent {
    pub rows: Vec<ResultRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub device: String,
    pub item: String,
    pub date: String,
    pub inspector: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuesContent {
    pub issues: Vec<IssueRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceCount {
    pub device: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummaryContent {
    pub total_inspections: usize,
    pub total_issues: usize,
    pub period: String,
    pub device_summary: Vec<DeviceCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCountsContent {
    pub daily_counts: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDevice {
    pub device: String,
    pub count: usize,
    pub items: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDevicesContent {
    pub issue_devices: Vec<IssueDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueTrend {
    pub item: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueTrendsContent {
    pub issue_trends: Vec<IssueTrend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationTarget {
    Item,
    Device,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationTarget,
    pub target: String,
    pub reason: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationsContent {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotesContent {
    pub notes: String,
}

/// Typed content of one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum SectionContent {
    Summary(SummaryContent),
    ResultsTable(ResultsTableContent),
    Issues(IssuesContent),
    MonthlySummary(MonthlySummaryContent),
    DailyCounts(DailyCountsContent),
    IssueDevices(IssueDevicesContent),
    IssueTrends(IssueTrendsContent),
    Recommendations(RecommendationsContent),
    Notes(NotesContent),
    Unknown { message: String },
}

impl SectionContent {
    /// Number of rows a row-oriented section draws; `None` for the others.
    pub fn row_count(&self) -> Option<usize> {
        match self {
            Self::ResultsTable(c) => Some(c.rows.len()),
            Self::Issues(c) => Some(c.issues.len()),
            Self::DailyCounts(c) => Some(c.daily_counts.len()),
            Self::IssueDevices(c) => Some(c.issue_devices.len()),
            Self::IssueTrends(c) => Some(c.issue_trends.len()),
            _ => None,
        }
    }
}

/// Non-fatal problem found while building one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionDiagnostic {
    pub section_title: String,
    pub section_type: String,
    pub message: String,
}

impl SectionDiagnostic {
    fn missing(field: &str, inspection_id: i64) -> Self {
        Self {
            section_title: String::new(),
            section_type: String::new(),
            message: format!(
                "inspection {} has a result without {} data",
                inspection_id, field
            ),
        }
    }
}

impl fmt::Display for SectionDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "section '{}' ({}): {}",
            self.section_title, self.section_type, self.message
        )
    }
}

pub type Processor = fn(&SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic>;

/// Processor lookup for the known section types.
pub fn processor_for(section_type: &SectionType) -> Option<Processor> {
    let processor: Processor = match section_type {
        SectionType::Summary => summary,
        SectionType::ResultsTable => results_table,
        SectionType::Issues => issues,
        SectionType::MonthlySummary => monthly_summary,
        SectionType::DailyCounts => daily_counts,
        SectionType::IssueDevices => issue_devices,
        SectionType::IssueTrends => issue_trends,
        SectionType::Recommendations => recommendations,
        SectionType::Notes => notes,
        SectionType::Unknown(_) => return None,
    };
    Some(processor)
}

/// Run the processor for `section_type`. Unknown types yield a diagnostic
/// content value rather than an error.
pub fn process_section(
    section_type: &SectionType,
    input: &SectionInput<'_>,
) -> Result<SectionContent, SectionDiagnostic> {
    match processor_for(section_type) {
        Some(processor) => processor(input),
        None => Ok(unknown_content(section_type)),
    }
}

/// Zeroed content for a section type, used when a section degrades.
pub fn empty_content(section_type: &SectionType, input: &SectionInput<'_>) -> SectionContent {
    let empty = SectionInput {
        inspections: &[],
        ..*input
    };
    process_section(section_type, &empty).unwrap_or_else(|_| unknown_content(section_type))
}

fn unknown_content(section_type: &SectionType) -> SectionContent {
    SectionContent::Unknown {
        message: format!("unknown section type: {}", section_type),
    }
}

fn device_name(result: &ResultRecord, inspection_id: i64) -> Result<&str, SectionDiagnostic> {
    result
        .device
        .as_ref()
        .map(|d| d.device_name.as_str())
        .ok_or_else(|| SectionDiagnostic::missing("device", inspection_id))
}

fn item_name(result: &ResultRecord, inspection_id: i64) -> Result<&str, SectionDiagnostic> {
    result
        .inspection_item
        .as_ref()
        .map(|i| i.item_name.as_str())
        .ok_or_else(|| SectionDiagnostic::missing("inspection item", inspection_id))
}

/// Counts in first-seen key order.
type Tally = IndexMap<String, usize>;

fn bump(tally: &mut Tally, key: &str) {
    *tally.entry(key.to_string()).or_default() += 1;
}

/// Entries by count, descending; ties keep first-seen order.
fn ranked(mut tally: Tally) -> Vec<(String, usize)> {
    tally.sort_by(|_, a, _, b| b.cmp(a));
    tally.into_iter().collect()
}

fn failed_results(
    inspections: &[InspectionRecord],
) -> impl Iterator<Item = (&InspectionRecord, &ResultRecord)> {
    inspections.iter().flat_map(|inspection| {
        inspection
            .results
            .iter()
            .filter(|r| !r.check_result)
            .map(move |r| (inspection, r))
    })
}

pub fn summary(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let mut seen = HashSet::new();
    let names: Vec<&str> = input
        .inspections
        .iter()
        .map(|i| i.inspector_name.as_str())
        .filter(|name| seen.insert(*name))
        .collect();

    Ok(SectionContent::Summary(SummaryContent {
        inspection_count: input.inspections.len(),
        date: format_japanese_date(input.report_date),
        inspector_names: names.join(", "),
    }))
}

pub fn results_table(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let mut rows = Vec::new();
    for inspection in input.inspections {
        for result in &inspection.results {
            rows.push(ResultRow {
                device: device_name(result, inspection.id)?.to_string(),
                item: item_name(result, inspection.id)?.to_string(),
                status: if result.check_result { STATUS_OK } else { STATUS_NG }.to_string(),
                remarks: result.note.clone().unwrap_or_default(),
            });
        }
    }
    Ok(SectionContent::ResultsTable(ResultsTableContent { rows }))
}

pub fn issues(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let mut issues = Vec::new();
    for (inspection, result) in failed_results(input.inspections) {
        issues.push(IssueRow {
            device: device_name(result, inspection.id)?.to_string(),
            item: item_name(result, inspection.id)?.to_string(),
            date: format_japanese_date(inspection.inspection_date.date()),
            inspector: inspection.inspector_name.clone(),
            note: result
                .note
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(NO_NOTE)
                .to_string(),
        });
    }
    Ok(SectionContent::Issues(IssuesContent { issues }))
}

pub fn monthly_summary(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let mut per_device = Tally::new();
    let mut total_issues = 0;
    for inspection in input.inspections {
        for result in &inspection.results {
            bump(&mut per_device, device_name(result, inspection.id)?);
            if !result.check_result {
                total_issues += 1;
            }
        }
    }

    Ok(SectionContent::MonthlySummary(MonthlySummaryContent {
        total_inspections: input.inspections.len(),
        total_issues,
        period: input.report_period.to_string(),
        device_summary: per_device
            .into_iter()
            .map(|(device, count)| DeviceCount { device, count })
            .collect(),
    }))
}

pub fn daily_counts(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for inspection in input.inspections {
        *per_day.entry(inspection.inspection_date.date()).or_default() += 1;
    }

    let mut daily_counts: Vec<DailyCount> = per_day
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect();
    daily_counts.sort_by_key(|d| d.date);

    Ok(SectionContent::DailyCounts(DailyCountsContent { daily_counts }))
}

pub fn issue_devices(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let mut per_device: IndexMap<String, (usize, Vec<String>)> = IndexMap::new();

    for (inspection, result) in failed_results(input.inspections) {
        let device = device_name(result, inspection.id)?;
        let item = item_name(result, inspection.id)?;
        let (count, items) = per_device.entry(device.to_string()).or_default();
        *count += 1;
        if !items.iter().any(|known| known == item) {
            items.push(item.to_string());
        }
    }

    let mut issue_devices: Vec<IssueDevice> = per_device
        .into_iter()
        .map(|(device, (count, items))| IssueDevice {
            device,
            count,
            items: items.join(", "),
        })
        .collect();
    issue_devices.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(SectionContent::IssueDevices(IssueDevicesContent { issue_devices }))
}

pub fn issue_trends(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let mut per_item = Tally::new();
    for (inspection, result) in failed_results(input.inspections) {
        bump(&mut per_item, item_name(result, inspection.id)?);
    }

    Ok(SectionContent::IssueTrends(IssueTrendsContent {
        issue_trends: ranked(per_item)
            .into_iter()
            .map(|(item, count)| IssueTrend { item, count })
            .collect(),
    }))
}

pub fn recommendations(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let mut per_item = Tally::new();
    let mut per_device = Tally::new();
    for (inspection, result) in failed_results(input.inspections) {
        bump(&mut per_item, item_name(result, inspection.id)?);
        bump(&mut per_device, device_name(result, inspection.id)?);
    }

    let item_recommendations = ranked(per_item)
        .into_iter()
        .filter(|(_, count)| *count >= ITEM_ISSUE_THRESHOLD)
        .take(RECOMMENDATION_LIMIT)
        .map(|(item, count)| Recommendation {
            kind: RecommendationTarget::Item,
            reason: format!("「{}」で{}件の異常が検出されています。", item, count),
            recommendation: format!(
                "「{}」の点検手順と対象設備の状態を見直してください。",
                item
            ),
            target: item,
        });

    let device_recommendations = ranked(per_device)
        .into_iter()
        .filter(|(_, count)| *count >= DEVICE_ISSUE_THRESHOLD)
        .take(RECOMMENDATION_LIMIT)
        .map(|(device, count)| Recommendation {
            kind: RecommendationTarget::Device,
            reason: format!("{}で{}件の異常が検出されています。", device, count),
            recommendation: format!(
                "{}の詳細点検、または部品交換・機器更新を検討してください。",
                device
            ),
            target: device,
        });

    Ok(SectionContent::Recommendations(RecommendationsContent {
        recommendations: item_recommendations.chain(device_recommendations).collect(),
    }))
}

pub fn notes(input: &SectionInput<'_>) -> Result<SectionContent, SectionDiagnostic> {
    let notes = input
        .notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(NO_NOTES_PLACEHOLDER);
    Ok(SectionContent::Notes(NotesContent {
        notes: notes.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::{Device, InspectionItem};

    fn result(device: &str, item: &str, ok: bool, note: Option<&str>) -> ResultRecord {
        ResultRecord {
            device: Some(Device {
                id: 0,
                device_name: device.to_string(),
            }),
            inspection_item: Some(InspectionItem {
                id: 0,
                item_name: item.to_string(),
            }),
            check_result: ok,
            note: note.map(str::to_string),
        }
    }

    fn inspection(id: i64, day: u32, inspector: &str, results: Vec<ResultRecord>) -> InspectionRecord {
        InspectionRecord {
            id,
            inspection_date: NaiveDate::from_ymd_opt(2025, 3, day)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            inspector_name: inspector.to_string(),
            results,
        }
    }

    fn input(inspections: &[InspectionRecord]) -> SectionInput<'_> {
        SectionInput {
            inspections,
            report_period: "2025年03月",
            report_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            notes: None,
        }
    }

    fn sample() -> Vec<InspectionRecord> {
        vec![
            inspection(
                1,
                12,
                "山田",
                vec![
                    result("sw-01", "ファン", false, Some("異音")),
                    result("sw-01", "温度", false, None),
                    result("srv-01", "ファン", true, None),
                ],
            ),
            inspection(
                2,
                3,
                "佐藤",
                vec![
                    result("sw-01", "ファン", false, None),
                    result("srv-01", "電源", false, Some("  ")),
                ],
            ),
            inspection(3, 12, "山田", vec![result("srv-01", "電源", true, None)]),
        ]
    }

    #[test]
    fn test_every_processor_handles_empty_input() {
        let empty = input(&[]);
        for section_type in SectionType::KNOWN.iter() {
            let content = process_section(section_type, &empty).unwrap();
            assert_eq!(content.row_count().unwrap_or(0), 0, "{}", section_type);
            assert!(!matches!(content, SectionContent::Unknown { .. }));
        }
        match summary(&empty).unwrap() {
            SectionContent::Summary(s) => {
                assert_eq!(s.inspection_count, 0);
                assert_eq!(s.inspector_names, "");
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_summary_joins_distinct_inspectors() {
        let records = sample();
        let SectionContent::Summary(s) = summary(&input(&records)).unwrap() else {
            panic!("expected summary");
        };
        assert_eq!(s.inspection_count, 3);
        assert_eq!(s.inspector_names, "山田, 佐藤");
        assert_eq!(s.date, "2025年3月31日");
    }

    #[test]
    fn test_results_table_flattens_all_results() {
        let records = sample();
        let SectionContent::ResultsTable(t) = results_table(&input(&records)).unwrap() else {
            panic!("expected results table");
        };
        assert_eq!(t.rows.len(), 6);
        assert_eq!(t.rows.iter().filter(|r| r.status == STATUS_NG).count(), 4);
        assert_eq!(t.rows[0].remarks, "異音");
    }

    #[test]
    fn test_issues_default_note() {
        let records = sample();
        let SectionContent::Issues(c) = issues(&input(&records)).unwrap() else {
            panic!("expected issues");
        };
        assert_eq!(c.issues.len(), 4);
        assert_eq!(c.issues[0].note, "異音");
        assert_eq!(c.issues[1].note, NO_NOTE);
        assert_eq!(c.issues[3].note, NO_NOTE);
        assert_eq!(c.issues[2].inspector, "佐藤");
    }

    #[test]
    fn test_monthly_summary_counts() {
        let records = sample();
        let SectionContent::MonthlySummary(m) = monthly_summary(&input(&records)).unwrap() else {
            panic!("expected monthly summary");
        };
        assert_eq!(m.total_inspections, 3);
        assert_eq!(m.total_issues, 4);
        assert_eq!(m.period, "2025年03月");
        assert_eq!(
            m.device_summary,
            vec![
                DeviceCount { device: "sw-01".into(), count: 3 },
                DeviceCount { device: "srv-01".into(), count: 3 },
            ]
        );
    }

    #[test]
    fn test_daily_counts_sorted_ascending() {
        let records = sample();
        let SectionContent::DailyCounts(d) = daily_counts(&input(&records)).unwrap() else {
            panic!("expected daily counts");
        };
        let days: Vec<(String, usize)> = d
            .daily_counts
            .iter()
            .map(|c| (c.date.to_string(), c.count))
            .collect();
        assert_eq!(
            days,
            vec![("2025-03-03".to_string(), 1), ("2025-03-12".to_string(), 2)]
        );
    }

    #[test]
    fn test_issue_devices_sorted_with_distinct_items() {
        let records = sample();
        let SectionContent::IssueDevices(d) = issue_devices(&input(&records)).unwrap() else {
            panic!("expected issue devices");
        };
        assert_eq!(d.issue_devices[0].device, "sw-01");
        assert_eq!(d.issue_devices[0].count, 3);
        assert_eq!(d.issue_devices[0].items, "ファン, 温度");
        assert_eq!(d.issue_devices[1].device, "srv-01");
        assert!(d
            .issue_devices
            .windows(2)
            .all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_issue_trends_sorted_by_count() {
        let mut records = sample();
        records.push(inspection(
            4,
            20,
            "鈴木",
            vec![
                result("fw-01", "電源", false, None),
                result("fw-01", "電源", false, None),
            ],
        ));
        let SectionContent::IssueTrends(t) = issue_trends(&input(&records)).unwrap() else {
            panic!("expected issue trends");
        };
        assert_eq!(t.issue_trends[0], IssueTrend { item: "電源".into(), count: 3 });
        assert!(t.issue_trends.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_ranked_ties_keep_first_seen_order() {
        let mut tally = Tally::new();
        for key in ["b", "a", "c", "a"] {
            bump(&mut tally, key);
        }
        assert_eq!(
            ranked(tally),
            vec![("a".to_string(), 2), ("b".to_string(), 1), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_recommendations_single_item() {
        let records = vec![
            inspection(1, 1, "a", vec![result("sw-01", "ファン", false, None)]),
            inspection(2, 2, "a", vec![result("sw-02", "ファン", false, None)]),
        ];
        let SectionContent::Recommendations(r) = recommendations(&input(&records)).unwrap() else {
            panic!("expected recommendations");
        };
        assert_eq!(r.recommendations.len(), 1);
        assert_eq!(r.recommendations[0].kind, RecommendationTarget::Item);
        assert_eq!(r.recommendations[0].target, "ファン");
        assert!(r.recommendations[0].reason.contains("2件"));
    }

    #[test]
    fn test_recommendations_limits_and_device_threshold() {
        let mut results = Vec::new();
        for item in ["a", "b", "c", "d"] {
            results.push(result("sw-01", item, false, None));
            results.push(result("sw-02", item, false, None));
        }
        let records = vec![inspection(1, 1, "x", results)];
        let SectionContent::Recommendations(r) = recommendations(&input(&records)).unwrap() else {
            panic!("expected recommendations");
        };
        let kinds: Vec<RecommendationTarget> = r.recommendations.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationTarget::Item,
                RecommendationTarget::Item,
                RecommendationTarget::Item,
                RecommendationTarget::Device,
                RecommendationTarget::Device,
            ]
        );
    }

    #[test]
    fn test_notes_placeholder() {
        let mut i = input(&[]);
        let SectionContent::Notes(n) = notes(&i).unwrap() else {
            panic!("expected notes");
        };
        assert_eq!(n.notes, NO_NOTES_PLACEHOLDER);

        i.notes = Some(" 電源工事予定あり ");
        let SectionContent::Notes(n) = notes(&i).unwrap() else {
            panic!("expected notes");
        };
        assert_eq!(n.notes, "電源工事予定あり");
    }

    #[test]
    fn test_unknown_type_yields_message() {
        let content = process_section(&SectionType::Unknown("gantt".into()), &input(&[])).unwrap();
        assert_eq!(
            content,
            SectionContent::Unknown {
                message: "unknown section type: gantt".to_string()
            }
        );
    }

    #[test]
    fn test_missing_device_reports_diagnostic() {
        let mut broken = result("sw-01", "ファン", false, None);
        broken.device = None;
        let records = vec![inspection(9, 1, "a", vec![broken])];

        let err = results_table(&input(&records)).unwrap_err();
        assert!(err.message.contains("inspection 9"));
        assert!(issue_trends(&input(&records)).is_ok());

        let degraded = empty_content(&SectionType::ResultsTable, &input(&records));
        assert_eq!(degraded.row_count(), Some(0));
    }
}
