//! Sales visit reports and their operation log
//!
//! Each visit sheet is named `<person>_<kind>` and holds one row per proposed
//! product. Filtering is request-scoped: every call takes the full record set
//! plus a filter and returns a fresh summary.

use super::round_half_even;
use crate::config::VisitSchema;
use crate::types::{CellValue, LabeledTable};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitRecord {
    pub sheet: String,
    pub person: String,
    pub kind: String,
    pub uuid: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub region: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub product: Option<String>,
    pub result: Option<String>,
    /// Categories from the first `【...】` group of the adoption/rejection reason
    pub reasons: Vec<String>,
}

/// Split `person_kind`; names without `_` map both parts to `unknown`
pub fn split_sheet_name(name: &str, unknown: &str) -> (String, String) {
    match name.split_once('_') {
        Some((person, kind)) => (person.to_string(), kind.to_string()),
        None => (unknown.to_string(), unknown.to_string()),
    }
}

/// Collapse free-form regions into the configured list, `other` or `unclassified`
pub fn normalize_region(cell: &CellValue, schema: &VisitSchema) -> String {
    if cell.is_empty() {
        return schema.unclassified.clone();
    }
    let text = cell.to_text();
    if text.starts_with(&schema.other_region_prefix) {
        return schema.unclassified.clone();
    }
    if schema.regions.iter().any(|r| *r == text) {
        text
    } else {
        schema.other_region.clone()
    }
}

/// Categories listed inside the first `【...】` of `text`
pub fn extract_reason_categories(text: &str, delimiter: char) -> Vec<String> {
    let Some(start) = text.find('【') else {
        return Vec::new();
    };
    let body = &text[start + '【'.len_utf8()..];
    match body.find('】') {
        Some(end) => body[..end].split(delimiter).map(str::to_string).collect(),
        None => Vec::new(),
    }
}

fn optional_text(cell: &CellValue) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_text())
    }
}

/// Parse one visit sheet (header in the first row)
pub fn visit_records(sheet_name: &str, table: &LabeledTable, schema: &VisitSchema) -> Vec<VisitRecord> {
    let (person, kind) = split_sheet_name(sheet_name, &schema.unknown);
    let cols = &schema.columns;

    table
        .rows
        .iter()
        .map(|row| {
            let reason = table.value(row, &cols.reason);
            VisitRecord {
                sheet: sheet_name.to_string(),
                person: person.clone(),
                kind: kind.clone(),
                uuid: optional_text(table.value(row, &cols.uuid)),
                date: table.value(row, &cols.date).as_datetime(),
                region: normalize_region(table.value(row, &cols.region), schema),
                category: optional_text(table.value(row, &cols.category)),
                status: optional_text(table.value(row, &cols.status)),
                product: optional_text(table.value(row, &cols.product)),
                result: optional_text(table.value(row, &cols.result)),
                reasons: if reason.is_empty() {
                    Vec::new()
                } else {
                    extract_reason_categories(&reason.to_text(), schema.reason_delimiter)
                },
            }
        })
        .collect()
}

//==============================================================================
// Filtering
//==============================================================================

/// Inclusive calendar-day range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, dt: &NaiveDateTime) -> bool {
        let day = dt.date();
        self.from <= day && day <= self.to
    }

    fn spanning<'a>(dates: impl Iterator<Item = &'a NaiveDateTime>) -> Option<Self> {
        let days: BTreeSet<NaiveDate> = dates.map(|d| d.date()).collect();
        Some(Self {
            from: *days.first()?,
            to: *days.last()?,
        })
    }
}

/// Choices a visit filter can select from, derived from the data
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisitFilterOptions {
    pub persons: Vec<String>,
    pub kinds: Vec<String>,
    pub regions: Vec<String>,
    pub categories: Vec<String>,
    /// `None` when no record has a usable date; date filtering is then off
    pub dates: Option<DateRange>,
}

impl VisitFilterOptions {
    pub fn from_records(records: &[VisitRecord], schema: &VisitSchema) -> Self {
        let sorted = |values: BTreeSet<String>| values.into_iter().collect::<Vec<_>>();

        let persons = records
            .iter()
            .map(|r| r.person.clone())
            .filter(|p| *p != schema.unknown)
            .collect();
        let kinds = records
            .iter()
            .map(|r| r.kind.clone())
            .filter(|k| *k != schema.unknown)
            .collect();
        let mut regions: BTreeSet<String> = records.iter().map(|r| r.region.clone()).collect();
        regions.insert(schema.unclassified.clone());
        let categories = records
            .iter()
            .filter_map(|r| r.category.clone())
            .filter(|c| schema.valid_categories.contains(c))
            .collect();

        Self {
            persons: sorted(persons),
            kinds: sorted(kinds),
            regions: sorted(regions),
            categories: sorted(categories),
            dates: DateRange::spanning(records.iter().filter_map(|r| r.date.as_ref())),
        }
    }
}

/// Visit selection; `None` fields select every available option
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitFilter {
    pub persons: Option<Vec<String>>,
    pub kinds: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn selection<'a>(chosen: &'a Option<Vec<String>>, available: &'a [String]) -> HashSet<&'a str> {
    chosen
        .as_deref()
        .unwrap_or(available)
        .iter()
        .map(String::as_str)
        .collect()
}

fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    available: Option<DateRange>,
) -> Option<DateRange> {
    let bounds = available?;
    Some(DateRange {
        from: from.unwrap_or(bounds.from),
        to: to.unwrap_or(bounds.to),
    })
}

impl VisitFilter {
    pub fn apply<'a>(&self, records: &'a [VisitRecord], options: &VisitFilterOptions) -> Vec<&'a VisitRecord> {
        let persons = selection(&self.persons, &options.persons);
        let kinds = selection(&self.kinds, &options.kinds);
        let regions = selection(&self.regions, &options.regions);
        let categories = selection(&self.categories, &options.categories);
        let range = resolve_range(self.date_from, self.date_to, options.dates);

        records
            .iter()
            .filter(|r| persons.contains(r.person.as_str()))
            .filter(|r| kinds.contains(r.kind.as_str()))
            .filter(|r| regions.contains(r.region.as_str()))
            .filter(|r| {
                r.category
                    .as_deref()
                    .is_some_and(|c| categories.contains(c))
            })
            .filter(|r| match &range {
                Some(range) => r.date.as_ref().is_some_and(|d| range.contains(d)),
                None => true,
            })
            .collect()
    }
}

//==============================================================================
// Visit summary
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultCount {
    pub label: String,
    pub count: usize,
    /// Share of rows with a product, 0..=1
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonCount {
    pub category: String,
    pub count: usize,
    /// Percent of all reasons in the same group, one decimal
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitSummary {
    pub rows: usize,
    pub unique_visits: usize,
    pub statuses: Vec<LabelCount>,
    pub product_count: usize,
    pub results: Vec<ResultCount>,
    pub adopted_reasons: Vec<ReasonCount>,
    pub rejected_reasons: Vec<ReasonCount>,
}

/// First record per UUID; records without a UUID share one slot
fn first_per_key<'a, T, K: Eq + std::hash::Hash>(
    items: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> K,
) -> Vec<&'a T>
where
    T: 'a,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

fn count_labels<'a>(labels: &[String], values: impl Iterator<Item = Option<&'a str>> + Clone) -> Vec<LabelCount> {
    labels
        .iter()
        .map(|label| LabelCount {
            label: label.clone(),
            count: values.clone().filter(|v| *v == Some(label.as_str())).count(),
        })
        .collect()
}

fn reason_counts<'a>(records: impl Iterator<Item = &'a VisitRecord>) -> Vec<ReasonCount> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for reason in records.flat_map(|r| r.reasons.iter()) {
        match counts.iter_mut().find(|(c, _)| c == reason) {
            Some((_, n)) => *n += 1,
            None => counts.push((reason.clone(), 1)),
        }
    }

    let total: usize = counts.iter().map(|(_, n)| n).sum();
    let mut result: Vec<ReasonCount> = counts
        .into_iter()
        .map(|(category, count)| ReasonCount {
            category,
            count,
            percent: round_half_even(count as f64 / total as f64 * 100.0, 1),
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

fn reasons_for_result(records: &[&VisitRecord], result: &str) -> Vec<ReasonCount> {
    reason_counts(
        records
            .iter()
            .copied()
            .filter(|r| r.result.as_deref() == Some(result)),
    )
}

pub fn summarize_visits(records: &[&VisitRecord], schema: &VisitSchema) -> VisitSummary {
    let unique = first_per_key(records.iter().copied(), |r| r.uuid.clone());
    let statuses = count_labels(&schema.statuses, unique.iter().map(|r| r.status.as_deref()));

    let product_count = records.iter().filter(|r| r.product.is_some()).count();
    let results = count_labels(&schema.results, records.iter().map(|r| r.result.as_deref()))
        .into_iter()
        .map(|lc| ResultCount {
            rate: if product_count == 0 {
                0.0
            } else {
                lc.count as f64 / product_count as f64
            },
            label: lc.label,
            count: lc.count,
        })
        .collect();

    VisitSummary {
        rows: records.len(),
        unique_visits: unique.len(),
        statuses,
        product_count,
        results,
        adopted_reasons: reasons_for_result(records, &schema.adopted_result),
        rejected_reasons: reasons_for_result(records, &schema.rejected_result),
    }
}

//==============================================================================
// Operation log
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationLogEntry {
    pub timestamp: Option<NaiveDateTime>,
    pub sheet: Option<String>,
    pub operation: Option<String>,
    pub target_uuid: Option<String>,
    pub status_change: Option<String>,
    pub product_status_change: Option<String>,
}

/// New value of an `old→new` change, or `None` when unchanged or not a change
pub fn extract_changed(text: Option<&str>, arrow: &str) -> Option<String> {
    let (from, to) = text?.split_once(arrow)?;
    let (from, to) = (from.trim(), to.trim());
    (from != to).then(|| to.to_string())
}

pub fn log_entries(table: &LabeledTable, schema: &VisitSchema) -> Vec<OperationLogEntry> {
    let cols = &schema.log_columns;
    table
        .rows
        .iter()
        .map(|row| OperationLogEntry {
            timestamp: table.value(row, &cols.timestamp).as_datetime(),
            sheet: optional_text(table.value(row, &cols.sheet)),
            operation: optional_text(table.value(row, &cols.operation)),
            target_uuid: optional_text(table.value(row, &cols.target_uuid)),
            status_change: optional_text(table.value(row, &cols.status_change)),
            product_status_change: optional_text(table.value(row, &cols.product_status_change)),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogFilterOptions {
    pub sheets: Vec<String>,
    pub dates: Option<DateRange>,
}

impl LogFilterOptions {
    pub fn from_entries(entries: &[OperationLogEntry]) -> Self {
        let sheets: BTreeSet<String> = entries.iter().filter_map(|e| e.sheet.clone()).collect();
        Self {
            sheets: sheets.into_iter().collect(),
            dates: DateRange::spanning(entries.iter().filter_map(|e| e.timestamp.as_ref())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFilter {
    pub sheets: Option<Vec<String>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl LogFilter {
    pub fn apply<'a>(
        &self,
        entries: &'a [OperationLogEntry],
        options: &LogFilterOptions,
    ) -> Vec<&'a OperationLogEntry> {
        let sheets = selection(&self.sheets, &options.sheets);
        let range = resolve_range(self.date_from, self.date_to, options.dates);

        entries
            .iter()
            .filter(|e| e.sheet.as_deref().is_some_and(|s| sheets.contains(s)))
            .filter(|e| match &range {
                Some(range) => e.timestamp.as_ref().is_some_and(|t| range.contains(t)),
                None => true,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSummary {
    pub entries: usize,
    pub unique_targets: usize,
    pub operations: Vec<LabelCount>,
    pub statuses: Vec<LabelCount>,
    pub product_statuses: Vec<LabelCount>,
}

pub fn summarize_log(entries: &[&OperationLogEntry], schema: &VisitSchema) -> LogSummary {
    let unique = first_per_key(entries.iter().copied(), |e| e.target_uuid.clone());
    let arrow = schema.status_change_arrow.as_str();

    let status_changes: Vec<Option<String>> = unique
        .iter()
        .map(|e| extract_changed(e.status_change.as_deref(), arrow))
        .collect();
    let product_changes: Vec<Option<String>> = unique
        .iter()
        .map(|e| extract_changed(e.product_status_change.as_deref(), arrow))
        .collect();

    LogSummary {
        entries: entries.len(),
        unique_targets: unique.len(),
        operations: count_labels(&schema.operations, unique.iter().map(|e| e.operation.as_deref())),
        statuses: count_labels(&schema.statuses, status_changes.iter().map(|s| s.as_deref())),
        product_statuses: count_labels(&schema.results, product_changes.iter().map(|s| s.as_deref())),
    }
}
