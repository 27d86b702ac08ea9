//! Report exporter: tabular results → .xlsx

use crate::error::{TallyError, TallyResult};
use crate::types::CellValue;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

/// One output worksheet: a header row followed by data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ExportSheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }
}

/// Writes report tables to an Excel workbook, one worksheet per table
#[derive(Debug, Default)]
pub struct ReportExporter {
    sheets: Vec<ExportSheet>,
}

impl ReportExporter {
    pub fn new(sheets: Vec<ExportSheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[ExportSheet] {
        &self.sheets
    }

    pub fn export(&self, output_path: &Path) -> TallyResult<()> {
        if self.sheets.is_empty() {
            return Err(TallyError::Export("Nothing to export".to_string()));
        }

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            Self::write_sheet(worksheet, sheet, &header_format)?;
        }

        workbook
            .save(output_path)
            .map_err(|e| TallyError::Export(format!("Failed to save Excel file: {}", e)))?;

        Ok(())
    }

    fn write_sheet(worksheet: &mut Worksheet, sheet: &ExportSheet, header_format: &Format) -> TallyResult<()> {
        worksheet
            .set_name(&sheet.name)
            .map_err(|e| TallyError::Export(format!("Failed to set worksheet name '{}': {}", sheet.name, e)))?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, header, header_format)
                .map_err(|e| TallyError::Export(format!("Failed to write header: {}", e)))?;
        }

        for (idx, row) in sheet.rows.iter().enumerate() {
            let excel_row = idx as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                Self::write_cell_value(worksheet, excel_row, col as u16, value)?;
            }
        }

        worksheet.autofit();
        Ok(())
    }

    fn write_cell_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> TallyResult<()> {
        let written = match value {
            CellValue::Empty => return Ok(()),
            CellValue::Number(n) => worksheet.write_number(row, col, *n),
            CellValue::Text(s) => worksheet.write_string(row, col, s),
            CellValue::Bool(b) => worksheet.write_boolean(row, col, *b),
            CellValue::DateTime(_) => worksheet.write_string(row, col, value.to_text()),
        };
        written
            .map(|_| ())
            .map_err(|e| TallyError::Export(format!("Failed to write cell ({}, {}): {}", row, col, e)))
    }
}
