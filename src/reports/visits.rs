//! Sales visit report: visit summary plus operation log analysis

use crate::config::VisitSchema;
use crate::core::visits::{
    log_entries, summarize_log, summarize_visits, visit_records, LogFilter, LogFilterOptions, LogSummary,
    VisitFilter, VisitFilterOptions, VisitRecord, VisitSummary,
};
use crate::error::{TallyError, TallyResult};
use crate::excel::read_workbook;
use crate::types::Workbook;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Filters for one visit report run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitRequest {
    pub visits: VisitFilter,
    pub log: LogFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogReport {
    pub options: LogFilterOptions,
    pub summary: LogSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitReport {
    /// Visible visit sheets that were read
    pub sheets: Vec<String>,
    pub options: VisitFilterOptions,
    pub summary: VisitSummary,
    /// Records passing the filter
    pub records: Vec<VisitRecord>,
    /// `None` when the workbook has no visible log sheet
    pub log: Option<LogReport>,
}

pub fn build_visit_report(workbook: &Workbook, request: &VisitRequest, schema: &VisitSchema) -> TallyResult<VisitReport> {
    let mut sheets = Vec::new();
    let mut records = Vec::new();
    let mut log = None;

    for sheet in workbook.visible_sheets() {
        let table = sheet.with_header(0);
        if sheet.name == schema.log_sheet {
            let entries = log_entries(&table, schema);
            let options = LogFilterOptions::from_entries(&entries);
            let selected = request.log.apply(&entries, &options);
            debug!(entries = entries.len(), selected = selected.len(), "operation log filtered");
            log = Some(LogReport {
                summary: summarize_log(&selected, schema),
                options,
            });
        } else {
            records.extend(visit_records(&sheet.name, &table, schema));
            sheets.push(sheet.name.clone());
        }
    }

    if sheets.is_empty() {
        return Err(TallyError::Workbook(format!(
            "{}: no visible visit sheets",
            workbook.name
        )));
    }

    let options = VisitFilterOptions::from_records(&records, schema);
    let selected = request.visits.apply(&records, &options);
    let summary = summarize_visits(&selected, schema);
    let records: Vec<VisitRecord> = selected.into_iter().cloned().collect();

    info!(
        sheets = sheets.len(),
        records = records.len(),
        unique_visits = summary.unique_visits,
        has_log = log.is_some(),
        "visit report built"
    );

    Ok(VisitReport {
        sheets,
        options,
        summary,
        records,
        log,
    })
}

pub fn run_visit_report(path: &Path, request: &VisitRequest, schema: &VisitSchema) -> TallyResult<VisitReport> {
    let workbook = read_workbook(path)?;
    build_visit_report(&workbook, request, schema)
}
