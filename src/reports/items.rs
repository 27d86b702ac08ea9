//! Item classification and yearly pivot report

use super::first_sheet;
use crate::config::{ItemSchema, ReportConfig};
use crate::core::series::{extract_yearly_metrics, pivot_yearly_metrics};
use crate::core::{PivotTable, RuleTable, YearlyMetric};
use crate::error::{TallyError, TallyResult};
use crate::excel::{read_workbook, ExportSheet};
use crate::types::{CellValue, LabeledTable, Workbook};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Product name, category and every quantity/amount column of the data sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifiedPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemsReport {
    pub rules: RuleTable,
    pub product_column: String,
    pub preview: ClassifiedPreview,
    pub metrics: Vec<YearlyMetric>,
    pub pivot: PivotTable,
}

/// First column containing the first pattern that matches any label
pub fn find_product_column(table: &LabeledTable, patterns: &[String]) -> TallyResult<usize> {
    patterns
        .iter()
        .find_map(|pattern| table.columns.iter().position(|c| c.contains(pattern.as_str())))
        .ok_or_else(|| {
            TallyError::MissingColumn(format!("product column matching {:?}", patterns))
        })
}

pub fn build_items_report(
    rules_book: &Workbook,
    data_book: &Workbook,
    config: &ReportConfig,
) -> TallyResult<ItemsReport> {
    let schema = &config.items;
    let rules = RuleTable::from_table(&first_sheet(rules_book)?.with_header(0), &config.rules);
    let data = first_sheet(data_book)?.with_header(0);

    let product_idx = find_product_column(&data, &schema.product_column_patterns)?;
    let categories: Vec<Option<String>> = data
        .rows
        .iter()
        .map(|row| {
            let cell = data.get(row, product_idx);
            let name = (!cell.is_empty()).then(|| cell.to_text());
            rules.classify(name.as_deref())
        })
        .collect();

    let preview = classified_preview(&data, product_idx, &categories, schema);
    let metrics = extract_yearly_metrics(&data, &categories, schema)?
        .filter(|metrics| !metrics.is_empty())
        .ok_or(TallyError::NoTimeSeriesData)?;
    let pivot = pivot_yearly_metrics(&metrics);

    info!(
        rules = rules.len(),
        products = data.len(),
        categories = pivot.rows.len(),
        years = pivot.years.len(),
        "items report built"
    );

    Ok(ItemsReport {
        rules,
        product_column: data.columns[product_idx].clone(),
        preview,
        metrics,
        pivot,
    })
}

/// Read both workbooks and build the report
pub fn run_items_report(rules_path: &Path, data_path: &Path, config: &ReportConfig) -> TallyResult<ItemsReport> {
    let rules_book = read_workbook(rules_path)?;
    let data_book = read_workbook(data_path)?;
    build_items_report(&rules_book, &data_book, config)
}

fn classified_preview(
    data: &LabeledTable,
    product_idx: usize,
    categories: &[Option<String>],
    schema: &ItemSchema,
) -> ClassifiedPreview {
    let metric_columns: Vec<usize> = data
        .columns
        .iter()
        .enumerate()
        .filter(|(_, label)| label.contains(&schema.quantity_marker) || label.contains(&schema.amount_marker))
        .map(|(idx, _)| idx)
        .collect();

    let mut columns = vec![schema.product_label.clone(), schema.category_label.clone()];
    columns.extend(metric_columns.iter().map(|&idx| data.columns[idx].clone()));

    let rows = data
        .rows
        .iter()
        .zip(categories)
        .map(|(row, category)| {
            let category = category.as_deref().map_or(CellValue::Empty, CellValue::text);
            let mut cells = vec![data.get(row, product_idx).clone(), category];
            cells.extend(metric_columns.iter().map(|&idx| data.get(row, idx).clone()));
            cells
        })
        .collect();

    ClassifiedPreview { columns, rows }
}

impl ItemsReport {
    /// Pivot and classified preview as export worksheets
    pub fn export_sheets(&self, schema: &ItemSchema) -> Vec<ExportSheet> {
        let mut pivot = ExportSheet::new("pivot", self.pivot.column_labels(schema));
        for row in &self.pivot.rows {
            let mut cells = vec![CellValue::text(row.category.as_str())];
            for cell in &row.cells {
                cells.push(cell.quantity.into());
                cells.push(cell.amount.into());
                cells.push(CellValue::text(cell.ratio.as_str()));
            }
            pivot.push_row(cells);
        }

        let mut preview = ExportSheet::new("classified", self.preview.columns.clone());
        for row in &self.preview.rows {
            preview.push_row(row.clone());
        }

        vec![pivot, preview]
    }
}
