//! Tally - spreadsheet classification and sales aggregation
//!
//! This library reads sales spreadsheets, cleans and reclassifies them
//! against lookup tables and builds aggregated report tables.
//!
//! # Features
//!
//! - Keyword rule classification of product names
//! - Customer ledger cleaning and two-period comparison
//! - Multi-year quantity/amount pivot with year-over-year ratios
//! - Sales visit and operation log summaries
//! - Excel import (calamine) and export (rust_xlsxwriter)
//!
//! # Example
//!
//! ```no_run
//! use royalbit_tally::config::ReportConfig;
//! use royalbit_tally::core::SortOrder;
//! use royalbit_tally::reports::run_ledger_report;
//! use std::path::Path;
//!
//! let config = ReportConfig::default();
//! let report = run_ledger_report(
//!     Path::new("2023.xlsx"),
//!     Path::new("2024.xlsx"),
//!     Path::new("helper.xlsx"),
//!     SortOrder::Worst,
//!     &config,
//! )?;
//!
//! for summary in &report.categories {
//!     println!("{}: {} → {}", summary.category, summary.prior_amount, summary.current_amount);
//! }
//! # Ok::<(), royalbit_tally::error::TallyError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod reports;
pub mod types;

// Re-export commonly used types
pub use config::ReportConfig;
pub use error::{TallyError, TallyResult};
pub use types::{CellValue, LabeledTable, Sheet, Workbook};
