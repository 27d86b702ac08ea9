//! Classification and aggregation pipeline

pub mod cleaner;
pub mod codes;
pub mod compare;
pub mod rules;
pub mod series;
pub mod visits;

pub use cleaner::{clean_sheet, CleanOutcome, CleanedRecord, UnusableReason};
pub use codes::{normalize_code, CodeMaps, CustomerCode, MappingWarning};
pub use compare::{
    compare_years, sort_categories, sort_comparisons, summarize_by_category, CategorySummary,
    ComparisonRecord, SortOrder,
};
pub use rules::{classify, ClassificationRule, RuleTable};
pub use series::{extract_yearly_metrics, pivot_yearly_metrics, PivotTable, YearlyMetric};
pub use visits::{
    summarize_log, summarize_visits, LogFilter, LogSummary, OperationLogEntry, VisitFilter,
    VisitRecord, VisitSummary,
};

/// Round to `decimals` places, ties to even
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// `current` as a percentage of `prior`.
///
/// A zero `prior` yields 100 when `current` is nonzero and 0 otherwise.
pub fn ratio_percent(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        if current != 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        current / prior * 100.0
    }
}
