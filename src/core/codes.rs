//! Customer-code lookups from the helper workbook
//!
//! Three optional sheets, read without a header row:
//! - exclusion list: column A holds codes to drop
//! - correction list: code in A, multiplicative sales factor in B
//! - category list: code in A, top-level category in B
//!
//! Malformed rows are skipped with a warning; they never abort the build.

use crate::config::LedgerSchema;
use crate::types::{CellValue, Sheet, Workbook};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// Canonical customer code: zero-padded to a fixed width
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CustomerCode(String);

impl CustomerCode {
    /// Normalize any cell representation (`7`, `7.0`, `"7"`, `"7.0"`) to the canonical form
    pub fn from_cell(cell: &CellValue, width: usize) -> Self {
        Self(normalize_code(&cell.to_text(), width))
    }

    pub fn from_str_code(code: &str, width: usize) -> Self {
        Self(normalize_code(code, width))
    }

    /// Strict integer parse used by the correction and category sheets
    pub fn parse_integer(cell: &CellValue, width: usize) -> Option<Self> {
        let n = match cell {
            CellValue::Number(n) if n.is_finite() => n.trunc() as i64,
            CellValue::Text(s) => s.trim().parse::<i64>().ok()?,
            CellValue::Bool(b) => i64::from(*b),
            _ => return None,
        };
        Some(Self(zero_fill(&n.to_string(), width)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip trailing `.0` suffixes and zero-fill to `width`.
///
/// Idempotent: `normalize_code(normalize_code(x)) == normalize_code(x)`.
pub fn normalize_code(raw: &str, width: usize) -> String {
    let mut stripped = raw;
    while let Some(rest) = stripped.strip_suffix(".0") {
        stripped = rest;
    }
    zero_fill(stripped, width)
}

/// Left-pad with zeros, keeping a leading sign in front of the padding
fn zero_fill(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let padding = "0".repeat(width - len);
    match s.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{}{}{}", sign, padding, &s[sign.len_utf8()..]),
        _ => format!("{}{}", padding, s),
    }
}

/// A helper-sheet row that could not be used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingWarning {
    pub sheet: String,
    /// 1-based spreadsheet row
    pub row: usize,
    pub cells: Vec<String>,
    pub reason: String,
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row {}: {} {:?}",
            self.sheet, self.row, self.reason, self.cells
        )
    }
}

/// Exclusion set, correction factors and category map keyed by customer code
#[derive(Debug, Clone, Default)]
pub struct CodeMaps {
    pub exclusions: HashSet<CustomerCode>,
    pub corrections: HashMap<CustomerCode, f64>,
    pub categories: HashMap<CustomerCode, String>,
    pub warnings: Vec<MappingWarning>,
    pub unclassified: String,
}

impl CodeMaps {
    pub fn new(unclassified: impl Into<String>) -> Self {
        Self {
            unclassified: unclassified.into(),
            ..Self::default()
        }
    }

    /// Parse the lookup sheets present in `helper`; missing sheets yield empty maps
    pub fn from_workbook(helper: &Workbook, schema: &LedgerSchema) -> Self {
        let mut maps = Self::new(schema.unclassified.clone());

        if let Some(sheet) = helper.sheet(&schema.exclusion_sheet) {
            maps.load_exclusions(sheet, schema.code_width);
        }
        if let Some(sheet) = helper.sheet(&schema.correction_sheet) {
            maps.load_corrections(sheet, schema.code_width);
        }
        if let Some(sheet) = helper.sheet(&schema.category_sheet) {
            maps.load_categories(sheet, schema.code_width);
        }

        debug!(
            exclusions = maps.exclusions.len(),
            corrections = maps.corrections.len(),
            categories = maps.categories.len(),
            warnings = maps.warnings.len(),
            "code maps built"
        );
        maps
    }

    pub fn load_exclusions(&mut self, sheet: &Sheet, width: usize) {
        for row in 0..sheet.height() {
            let cell = sheet.cell(row, 0);
            if cell.is_empty() {
                continue;
            }
            self.exclusions.insert(CustomerCode::from_cell(cell, width));
        }
    }

    pub fn load_corrections(&mut self, sheet: &Sheet, width: usize) {
        for row in 0..sheet.height() {
            let Some((code, value)) = self.code_pair(sheet, row, width) else {
                continue;
            };
            match value.as_number() {
                Some(factor) => {
                    self.corrections.insert(code, factor);
                }
                None => self.warn(sheet, row, "correction factor is not numeric"),
            }
        }
    }

    pub fn load_categories(&mut self, sheet: &Sheet, width: usize) {
        for row in 0..sheet.height() {
            let Some((code, value)) = self.code_pair(sheet, row, width) else {
                continue;
            };
            self.categories
                .insert(code, value.to_text().trim().to_string());
        }
    }

    /// Code and second cell of a two-column row, or `None` (with a warning when the row is not blank)
    fn code_pair<'a>(
        &mut self,
        sheet: &'a Sheet,
        row: usize,
        width: usize,
    ) -> Option<(CustomerCode, &'a CellValue)> {
        let first = sheet.cell(row, 0);
        let second = sheet.cell(row, 1);

        match (first.is_empty(), second.is_empty()) {
            (true, true) => return None,
            (false, false) => {}
            _ => {
                self.warn(sheet, row, "incomplete code/value pair");
                return None;
            }
        }

        match CustomerCode::parse_integer(first, width) {
            Some(code) => Some((code, second)),
            None => {
                self.warn(sheet, row, "customer code is not an integer");
                None
            }
        }
    }

    fn warn(&mut self, sheet: &Sheet, row: usize, reason: &str) {
        let cells = (0..2).map(|c| sheet.cell(row, c).to_text()).collect();
        let warning = MappingWarning {
            sheet: sheet.name.clone(),
            row: sheet.spreadsheet_row(row),
            cells,
            reason: reason.to_string(),
        };
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn is_excluded(&self, code: &CustomerCode) -> bool {
        self.exclusions.contains(code)
    }

    pub fn correction(&self, code: &CustomerCode) -> f64 {
        self.corrections.get(code).copied().unwrap_or(1.0)
    }

    pub fn category(&self, code: &CustomerCode) -> String {
        self.categories
            .get(code)
            .cloned()
            .unwrap_or_else(|| self.unclassified.clone())
    }
}
