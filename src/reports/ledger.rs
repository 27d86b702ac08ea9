//! Two-period customer ledger comparison report

use super::first_sheet;
use crate::config::ReportConfig;
use crate::core::{
    clean_sheet, compare_years, sort_categories, sort_comparisons, summarize_by_category, CategorySummary,
    CleanedRecord, CodeMaps, ComparisonRecord, MappingWarning, SortOrder,
};
use crate::error::{TallyError, TallyResult};
use crate::excel::{read_workbook, ExportSheet};
use crate::types::{CellValue, Workbook};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct LedgerReport {
    pub prior_label: String,
    pub current_label: String,
    pub order: SortOrder,
    pub warnings: Vec<MappingWarning>,
    pub customers: Vec<ComparisonRecord>,
    pub categories: Vec<CategorySummary>,
}

fn cleaned_records(book: &Workbook, maps: &CodeMaps, config: &ReportConfig) -> TallyResult<Vec<CleanedRecord>> {
    let sheet = first_sheet(book)?;
    clean_sheet(sheet, maps, &config.ledger)
        .into_records()
        .map_err(|reason| TallyError::UnusableSheet {
            label: book.name.clone(),
            reason: reason.to_string(),
        })
}

pub fn build_ledger_report(
    prior: &Workbook,
    current: &Workbook,
    helper: &Workbook,
    order: SortOrder,
    config: &ReportConfig,
) -> TallyResult<LedgerReport> {
    let maps = CodeMaps::from_workbook(helper, &config.ledger);

    let prior_records = cleaned_records(prior, &maps, config)?;
    let current_records = cleaned_records(current, &maps, config)?;

    let mut customers = compare_years(&prior_records, &current_records);
    let mut categories = summarize_by_category(&customers);
    sort_comparisons(&mut customers, order);
    sort_categories(&mut categories, order);

    info!(
        customers = customers.len(),
        categories = categories.len(),
        warnings = maps.warnings.len(),
        "ledger report built"
    );

    Ok(LedgerReport {
        prior_label: prior.name.clone(),
        current_label: current.name.clone(),
        order,
        warnings: maps.warnings,
        customers,
        categories,
    })
}

pub fn run_ledger_report(
    prior_path: &Path,
    current_path: &Path,
    helper_path: &Path,
    order: SortOrder,
    config: &ReportConfig,
) -> TallyResult<LedgerReport> {
    let prior = read_workbook(prior_path)?;
    let current = read_workbook(current_path)?;
    let helper = read_workbook(helper_path)?;
    build_ledger_report(&prior, &current, &helper, order, config)
}

impl LedgerReport {
    pub fn totals(&self) -> (i64, i64) {
        self.categories
            .iter()
            .fold((0, 0), |(p, c), s| (p + s.prior_amount, c + s.current_amount))
    }

    pub fn export_sheets(&self, config: &ReportConfig) -> Vec<ExportSheet> {
        let schema = &config.ledger;
        let headers = |first: &[&str]| -> Vec<String> {
            first
                .iter()
                .map(|s| s.to_string())
                .chain(
                    ["前年(千円)", "今年(千円)", "差額(千円)", "前年比(%)"]
                        .iter()
                        .map(|s| s.to_string()),
                )
                .collect()
        };

        let mut by_category = ExportSheet::new(schema.category_label.as_str(), headers(&[schema.category_label.as_str()]));
        for s in &self.categories {
            by_category.push_row(vec![
                CellValue::text(s.category.as_str()),
                (s.prior_amount as f64).into(),
                (s.current_amount as f64).into(),
                (s.delta as f64).into(),
                s.ratio.into(),
            ]);
        }

        let mut by_customer = ExportSheet::new(
            "得意先",
            headers(&[
                schema.code_column.as_str(),
                schema.name_column.as_str(),
                schema.category_label.as_str(),
            ]),
        );
        for r in &self.customers {
            by_customer.push_row(vec![
                CellValue::text(r.code.as_str()),
                CellValue::text(r.name.as_str()),
                CellValue::text(r.category.as_str()),
                (r.prior_amount as f64).into(),
                (r.current_amount as f64).into(),
                (r.delta as f64).into(),
                r.ratio.into(),
            ]);
        }

        vec![by_category, by_customer]
    }
}
