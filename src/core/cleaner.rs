//! Customer sales ledger cleaning
//!
//! Ledger exports carry a free-form preamble above the real header, so the
//! cleaner runs as a small state machine:
//!
//! 1. header search: first row with a cell containing the header marker
//! 2. header adoption: that row becomes the labels, rows above it are dropped
//! 3. validate: the required columns must be present
//! 4. transform: normalize codes, drop excluded customers, apply correction
//!    factors, assign categories
//! 5. aggregate: composition percent per row, group by (code, name, category)
//!
//! Rows without a name are dropped in step 4, before the grand total. Their
//! amounts would otherwise count toward the total and then vanish at grouping,
//! so the compositions of the remaining groups still sum to 100.
//!
//! The cleaner never fails. A sheet it cannot use comes back as
//! [`CleanOutcome::Unusable`] and the caller decides what that means.

use super::codes::{CodeMaps, CustomerCode};
use super::round_half_even;
use crate::config::LedgerSchema;
use crate::types::{LabeledTable, Sheet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedRecord {
    pub code: CustomerCode,
    pub name: String,
    pub category: String,
    pub amount: f64,
    /// Share of the sheet's grand total, in percent
    pub composition: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnusableReason {
    HeaderNotFound { marker: String },
    MissingColumns(Vec<String>),
}

impl fmt::Display for UnusableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnusableReason::HeaderNotFound { marker } => {
                write!(f, "no header row containing '{}'", marker)
            }
            UnusableReason::MissingColumns(cols) => {
                write!(f, "missing required columns: {}", cols.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CleanOutcome {
    Usable(Vec<CleanedRecord>),
    Unusable(UnusableReason),
}

impl CleanOutcome {
    /// Cleaned rows; empty when the sheet was unusable
    pub fn records(&self) -> &[CleanedRecord] {
        match self {
            CleanOutcome::Usable(records) => records,
            CleanOutcome::Unusable(_) => &[],
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, CleanOutcome::Usable(_))
    }

    pub fn into_records(self) -> Result<Vec<CleanedRecord>, UnusableReason> {
        match self {
            CleanOutcome::Usable(records) => Ok(records),
            CleanOutcome::Unusable(reason) => Err(reason),
        }
    }
}

/// Index of the first row with any cell containing `marker`
pub fn find_header_row(sheet: &Sheet, marker: &str) -> Option<usize> {
    sheet
        .rows
        .iter()
        .position(|row| row.iter().any(|cell| cell.to_text().contains(marker)))
}

pub fn clean_sheet(sheet: &Sheet, maps: &CodeMaps, schema: &LedgerSchema) -> CleanOutcome {
    let Some(header_row) = find_header_row(sheet, &schema.header_marker) else {
        debug!(sheet = %sheet.name, "ledger header not found");
        return CleanOutcome::Unusable(UnusableReason::HeaderNotFound {
            marker: schema.header_marker.clone(),
        });
    };

    let table = sheet.with_header(header_row);

    let missing: Vec<String> = schema
        .required_columns()
        .iter()
        .filter(|col| !table.has_column(col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        debug!(sheet = %sheet.name, ?missing, "ledger columns missing");
        return CleanOutcome::Unusable(UnusableReason::MissingColumns(missing));
    }

    let rows = transform(&table, maps, schema);
    let records = aggregate(rows);
    debug!(sheet = %sheet.name, records = records.len(), "ledger cleaned");
    CleanOutcome::Usable(records)
}

struct LedgerRow {
    code: CustomerCode,
    name: String,
    category: String,
    amount: f64,
}

fn transform(table: &LabeledTable, maps: &CodeMaps, schema: &LedgerSchema) -> Vec<LedgerRow> {
    let mut rows = Vec::with_capacity(table.len());

    for row in &table.rows {
        let name_cell = table.value(row, &schema.name_column);
        // Rows without a name cannot form a group key
        if name_cell.is_empty() {
            continue;
        }

        let code = CustomerCode::from_cell(table.value(row, &schema.code_column), schema.code_width);
        if maps.is_excluded(&code) {
            continue;
        }

        let amount = table.value(row, &schema.amount_column).number_or_zero() * maps.correction(&code);
        let category = maps.category(&code);

        rows.push(LedgerRow {
            code,
            name: name_cell.to_text(),
            category,
            amount,
        });
    }

    rows
}

fn aggregate(rows: Vec<LedgerRow>) -> Vec<CleanedRecord> {
    let total: f64 = rows.iter().map(|r| r.amount).sum();

    let mut groups: BTreeMap<(CustomerCode, String, String), (f64, f64)> = BTreeMap::new();
    for row in rows {
        let composition = if total == 0.0 {
            0.0
        } else {
            round_half_even(row.amount / total * 100.0, 2)
        };
        let entry = groups
            .entry((row.code, row.name, row.category))
            .or_insert((0.0, 0.0));
        entry.0 += row.amount;
        entry.1 += composition;
    }

    let mut records: Vec<CleanedRecord> = groups
        .into_iter()
        .map(|((code, name, category), (amount, composition))| CleanedRecord {
            code,
            name,
            category,
            amount,
            composition,
        })
        .collect();

    records.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    records
}
