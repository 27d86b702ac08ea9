//! Spreadsheet input and output
//!
//! - Read: .xlsx/.xls/.ods → [`crate::types::Workbook`] via calamine
//! - Export: report tables → .xlsx via rust_xlsxwriter

mod exporter;
mod reader;

pub use exporter::{ExportSheet, ReportExporter};
pub use reader::{read_workbook, WorkbookReader};
