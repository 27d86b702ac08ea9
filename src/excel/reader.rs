//! Workbook reader: .xlsx/.xls/.ods → detached [`Workbook`]

use crate::error::{TallyError, TallyResult};
use crate::types::{CellValue, Sheet, Workbook};
use calamine::{open_workbook_auto, Data, Range, Reader, SheetVisible};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads every worksheet of a spreadsheet file into memory
pub struct WorkbookReader {
    path: PathBuf,
}

impl WorkbookReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read all worksheets in workbook order, keeping their visibility
    pub fn read(&self) -> TallyResult<Workbook> {
        let mut source = open_workbook_auto(&self.path).map_err(|e| {
            TallyError::Workbook(format!("Failed to open {}: {}", self.path.display(), e))
        })?;

        let metadata: Vec<(String, bool)> = source
            .sheets_metadata()
            .iter()
            .map(|s| (s.name.clone(), s.visible == SheetVisible::Visible))
            .collect();

        let mut sheets = Vec::with_capacity(metadata.len());
        for (name, visible) in metadata {
            let (first_row, rows) = match source.worksheet_range(&name) {
                Ok(range) => (range.start().map_or(0, |(row, _)| row as usize), range_rows(&range)),
                Err(e) => {
                    // Chart sheets and similar have no cell range
                    warn!(sheet = %name, error = %e, "skipping sheet without cells");
                    continue;
                }
            };
            let sheet = Sheet::new(name, rows).starting_at(first_row);
            sheets.push(if visible { sheet } else { sheet.hidden() });
        }

        debug!(path = %self.path.display(), sheets = sheets.len(), "workbook loaded");
        Ok(Workbook::new(self.display_name(), sheets))
    }

    fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Shorthand for `WorkbookReader::new(path).read()`
pub fn read_workbook<P: AsRef<Path>>(path: P) -> TallyResult<Workbook> {
    WorkbookReader::new(path).read()
}

/// Rows of a range, left-padded so index 0 is spreadsheet column A
fn range_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((_, first_col)) = range.start() else {
        return Vec::new();
    };

    range
        .rows()
        .map(|row| {
            let mut cells = vec![CellValue::Empty; first_col as usize];
            cells.extend(row.iter().map(convert_cell));
            cells
        })
        .collect()
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match CellValue::text(s.as_str()).as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}
