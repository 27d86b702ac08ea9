//! Two-period comparison of cleaned ledgers

use super::cleaner::CleanedRecord;
use super::codes::CustomerCode;
use super::{ratio_percent, round_half_even};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One customer across both periods; amounts are in thousands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    pub code: CustomerCode,
    pub name: String,
    pub category: String,
    pub current_amount: i64,
    pub current_composition: f64,
    pub prior_amount: i64,
    pub prior_composition: f64,
    /// Current as a percentage of prior, one decimal
    pub ratio: f64,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub prior_amount: i64,
    pub current_amount: i64,
    pub delta: i64,
    pub ratio: f64,
}

/// Convert a raw amount to whole thousands, ties to even (2500 → 2, 3500 → 4)
pub fn to_thousands(amount: f64) -> i64 {
    round_half_even(amount / 1000.0, 0) as i64
}

/// Year-over-year ratio in percent rounded to one decimal, with the zero-prior policy
pub fn comparison_ratio(current: i64, prior: i64) -> f64 {
    if prior == 0 {
        ratio_percent(current as f64, 0.0)
    } else {
        round_half_even(ratio_percent(current as f64, prior as f64), 1)
    }
}

type RecordKey = (CustomerCode, String, String);

/// Full outer join on (code, name, category); absent sides count as zero
pub fn compare_years(prior: &[CleanedRecord], current: &[CleanedRecord]) -> Vec<ComparisonRecord> {
    let mut joined: BTreeMap<RecordKey, (Option<&CleanedRecord>, Option<&CleanedRecord>)> =
        BTreeMap::new();

    for record in prior {
        joined.entry(key(record)).or_default().0 = Some(record);
    }
    for record in current {
        joined.entry(key(record)).or_default().1 = Some(record);
    }

    joined
        .into_iter()
        .map(|((code, name, category), (prev, curr))| {
            let prior_amount = to_thousands(prev.map_or(0.0, |r| r.amount));
            let current_amount = to_thousands(curr.map_or(0.0, |r| r.amount));
            ComparisonRecord {
                code,
                name,
                category,
                current_amount,
                current_composition: curr.map_or(0.0, |r| r.composition),
                prior_amount,
                prior_composition: prev.map_or(0.0, |r| r.composition),
                ratio: comparison_ratio(current_amount, prior_amount),
                delta: current_amount - prior_amount,
            }
        })
        .collect()
}

fn key(record: &CleanedRecord) -> RecordKey {
    (
        record.code.clone(),
        record.name.clone(),
        record.category.clone(),
    )
}

/// Re-aggregate a comparison table by category
pub fn summarize_by_category(records: &[ComparisonRecord]) -> Vec<CategorySummary> {
    let mut totals: BTreeMap<&str, (i64, i64, i64)> = BTreeMap::new();
    for r in records {
        let entry = totals.entry(r.category.as_str()).or_default();
        entry.0 += r.prior_amount;
        entry.1 += r.current_amount;
        entry.2 += r.delta;
    }

    totals
        .into_iter()
        .map(|(category, (prior_amount, current_amount, delta))| CategorySummary {
            category: category.to_string(),
            prior_amount,
            current_amount,
            delta,
            ratio: comparison_ratio(current_amount, prior_amount),
        })
        .collect()
}

/// Ordering choices offered for comparison tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Current-period amount, largest first
    #[default]
    Current,
    /// Delta, largest gain first
    Best,
    /// Delta, largest loss first
    Worst,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "current" => Ok(SortOrder::Current),
            "best" => Ok(SortOrder::Best),
            "worst" => Ok(SortOrder::Worst),
            other => Err(format!(
                "Unknown sort order: '{other}' (expected current, best or worst)"
            )),
        }
    }
}

pub fn sort_comparisons(records: &mut [ComparisonRecord], order: SortOrder) {
    match order {
        SortOrder::Current => records.sort_by(|a, b| b.current_amount.cmp(&a.current_amount)),
        SortOrder::Best => records.sort_by(|a, b| b.delta.cmp(&a.delta)),
        SortOrder::Worst => records.sort_by(|a, b| a.delta.cmp(&b.delta)),
    }
}

pub fn sort_categories(summaries: &mut [CategorySummary], order: SortOrder) {
    match order {
        SortOrder::Current => summaries.sort_by(|a, b| b.current_amount.cmp(&a.current_amount)),
        SortOrder::Best => summaries.sort_by(|a, b| b.delta.cmp(&a.delta)),
        SortOrder::Worst => summaries.sort_by(|a, b| a.delta.cmp(&b.delta)),
    }
}
