//! Multi-year quantity/amount series and the per-category pivot
//!
//! Item exports carry one column pair per month, e.g. `2023年4月_個数` and
//! `2023年4月_金額`. Pairs are stacked, tagged with their year and summed per
//! (category, year); the result is pivoted to one row per category with a
//! quantity, amount and year-over-year ratio column for every year.

use super::ratio_percent;
use crate::config::ItemSchema;
use crate::error::TallyResult;
use crate::types::LabeledTable;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Ratio label used for cells with no data
pub const DEFAULT_RATIO: &str = "100.0%";

/// A quantity column and its amount counterpart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesColumns {
    pub year: i32,
    pub quantity: usize,
    pub amount: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyMetric {
    pub category: String,
    pub year: i32,
    pub quantity: f64,
    pub amount: f64,
    /// Amount relative to the category's previous year present, e.g. `"150.0%"`
    pub ratio: String,
}

/// Locate every `<year>..quantity` column that has an amount counterpart
pub fn find_series_columns(table: &LabeledTable, schema: &ItemSchema) -> TallyResult<Vec<SeriesColumns>> {
    let pattern = schema.series_regex()?;
    let mut found = Vec::new();

    for (idx, label) in table.columns.iter().enumerate() {
        let Some(year) = pattern
            .captures(label)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
        else {
            continue;
        };

        let amount_label = label.replace(&schema.quantity_marker, &schema.amount_marker);
        match table.column_index(&amount_label) {
            Some(amount) => found.push(SeriesColumns {
                year,
                quantity: idx,
                amount,
            }),
            None => debug!(column = %label, "quantity column without amount counterpart"),
        }
    }

    Ok(found)
}

/// Sum quantity and amount per (category, year).
///
/// `categories[i]` is the category of `table.rows[i]`; rows whose category is
/// `None` are left out. Returns `None` when the table has no usable column
/// pair at all.
pub fn extract_yearly_metrics(
    table: &LabeledTable,
    categories: &[Option<String>],
    schema: &ItemSchema,
) -> TallyResult<Option<Vec<YearlyMetric>>> {
    let columns = find_series_columns(table, schema)?;
    if columns.is_empty() {
        return Ok(None);
    }

    let mut totals: BTreeMap<(String, i32), (f64, f64)> = BTreeMap::new();
    for pair in &columns {
        for (row, category) in table.rows.iter().zip(categories) {
            let Some(category) = category else {
                continue;
            };
            let entry = totals.entry((category.clone(), pair.year)).or_default();
            entry.0 += table.get(row, pair.quantity).number_or_zero();
            entry.1 += table.get(row, pair.amount).number_or_zero();
        }
    }

    debug!(pairs = columns.len(), groups = totals.len(), "yearly series aggregated");
    Ok(Some(with_ratios(totals)))
}

/// Attach ratios; `totals` iterates per category with years ascending
fn with_ratios(totals: BTreeMap<(String, i32), (f64, f64)>) -> Vec<YearlyMetric> {
    let mut metrics = Vec::with_capacity(totals.len());
    let mut previous: Option<(String, f64)> = None;

    for ((category, year), (quantity, amount)) in totals {
        let prior = previous
            .as_ref()
            .filter(|(prev_category, _)| *prev_category == category)
            .map(|(_, prev_amount)| *prev_amount);

        previous = Some((category.clone(), amount));
        metrics.push(YearlyMetric {
            category,
            year,
            quantity,
            amount,
            ratio: ratio_label(amount, prior),
        });
    }

    metrics
}

/// Format the year-over-year ratio; a missing or zero prior year counts as zero
pub fn ratio_label(amount: f64, prior: Option<f64>) -> String {
    format!("{:.1}%", ratio_percent(amount, prior.unwrap_or(0.0)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotCell {
    pub year: i32,
    pub quantity: f64,
    pub amount: f64,
    pub ratio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub category: String,
    /// One cell per year, in the table's year order
    pub cells: Vec<PivotCell>,
}

/// One row per category, years descending
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    pub years: Vec<i32>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    /// Header labels: category, then quantity, amount and ratio for each year
    pub fn column_labels(&self, schema: &ItemSchema) -> Vec<String> {
        let mut labels = vec![schema.category_label.clone()];
        for year in &self.years {
            let prefix = format!("{}{}", year, schema.year_suffix);
            labels.push(format!("{}_{}", prefix, schema.quantity_marker));
            labels.push(format!("{}_{}", prefix, schema.amount_marker));
            labels.push(format!("{}_{}_{}", prefix, schema.amount_marker, schema.ratio_suffix));
        }
        labels
    }

    pub fn row(&self, category: &str) -> Option<&PivotRow> {
        self.rows.iter().find(|r| r.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl PivotRow {
    pub fn cell(&self, year: i32) -> Option<&PivotCell> {
        self.cells.iter().find(|c| c.year == year)
    }
}

pub fn pivot_yearly_metrics(metrics: &[YearlyMetric]) -> PivotTable {
    let years: Vec<i32> = metrics
        .iter()
        .map(|m| m.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect();

    let mut by_category: BTreeMap<&str, BTreeMap<i32, &YearlyMetric>> = BTreeMap::new();
    for m in metrics {
        by_category
            .entry(m.category.as_str())
            .or_default()
            .insert(m.year, m);
    }

    let rows = by_category
        .into_iter()
        .map(|(category, per_year)| PivotRow {
            category: category.to_string(),
            cells: years
                .iter()
                .map(|&year| match per_year.get(&year) {
                    Some(m) => PivotCell {
                        year,
                        quantity: m.quantity,
                        amount: m.amount,
                        ratio: m.ratio.clone(),
                    },
                    None => PivotCell {
                        year,
                        quantity: 0.0,
                        amount: 0.0,
                        ratio: DEFAULT_RATIO.to_string(),
                    },
                })
                .collect(),
        })
        .collect();

    PivotTable { years, rows }
}
