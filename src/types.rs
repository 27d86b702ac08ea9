use chrono::NaiveDateTime;
use serde::Serialize;

//==============================================================================
// Cells
//==============================================================================

/// A single spreadsheet cell, detached from the reader that produced it
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Empty cells and whitespace-only text count as missing
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Render the cell the way a spreadsheet user reads it.
    ///
    /// Integral numbers print without a fractional part (`12.0` → `"12"`).
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Coerce to a number; text is parsed after trimming, anything else is `None`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Coerce to a number, treating missing or non-numeric values as zero
    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// Interpret the cell as a timestamp; unparseable values are `None`
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Text(s) => parse_datetime(s.trim()),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                chrono::NaiveDate::parse_from_str(s, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

//==============================================================================
// Sheets and workbooks
//==============================================================================

/// One worksheet as a ragged grid; column 0 is spreadsheet column A
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub visible: bool,
    pub rows: Vec<Vec<CellValue>>,
    /// 0-based spreadsheet row of `rows[0]`; leading blank rows are not stored
    pub first_row: usize,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            rows,
            first_row: 0,
        }
    }

    pub fn starting_at(mut self, first_row: usize) -> Self {
        self.first_row = first_row;
        self
    }

    /// 1-based spreadsheet row number of grid row `row`
    pub fn spreadsheet_row(&self, row: usize) -> usize {
        self.first_row + row + 1
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Promote row `header_row` to column labels and keep every row below it
    pub fn with_header(&self, header_row: usize) -> LabeledTable {
        let columns = self
            .rows
            .get(header_row)
            .map(|row| row.iter().map(CellValue::to_text).collect())
            .unwrap_or_default();
        let rows = self.rows.iter().skip(header_row + 1).cloned().collect();
        LabeledTable { columns, rows }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub name: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(name: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            name: name.into(),
            sheets,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn visible_sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter().filter(|s| s.visible)
    }
}

//==============================================================================
// Labeled tables
//==============================================================================

/// A sheet body addressed by header labels
#[derive(Debug, Clone, Default)]
pub struct LabeledTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl LabeledTable {
    /// Index of the first column whose label is exactly `label`
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.column_index(label).is_some()
    }

    pub fn get<'a>(&'a self, row: &'a [CellValue], col: usize) -> &'a CellValue {
        row.get(col).unwrap_or(&EMPTY_CELL)
    }

    /// Cell of `row` under `label`, `Empty` when the column does not exist
    pub fn value<'a>(&'a self, row: &'a [CellValue], label: &str) -> &'a CellValue {
        match self.column_index(label) {
            Some(idx) => self.get(row, idx),
            None => &EMPTY_CELL,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text_integral_numbers_drop_fraction() {
        assert_eq!(CellValue::Number(12.0).to_text(), "12");
        assert_eq!(CellValue::Number(12.5).to_text(), "12.5");
        assert_eq!(CellValue::Number(-3.0).to_text(), "-3");
        assert_eq!(CellValue::Empty.to_text(), "");
    }

    #[test]
    fn test_as_number_coercion() {
        assert_eq!(CellValue::text(" 42 ").as_number(), Some(42.0));
        assert_eq!(CellValue::text("n/a").as_number(), None);
        assert_eq!(CellValue::Empty.number_or_zero(), 0.0);
        assert_eq!(CellValue::Bool(true).as_number(), Some(1.0));
    }

    #[test]
    fn test_as_datetime_from_text() {
        let dt = CellValue::text("2024-05-01").as_datetime().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-05-01 00:00");
        assert!(CellValue::text("soon").as_datetime().is_none());
    }

    #[test]
    fn test_with_header_promotes_row() {
        let sheet = Sheet::new(
            "s",
            vec![
                vec!["title".into()],
                vec!["a".into(), "b".into()],
                vec![1.0.into(), 2.0.into()],
            ],
        );
        let table = sheet.with_header(1);
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(&table.rows[0], "b"), &CellValue::Number(2.0));
        assert_eq!(table.value(&table.rows[0], "zzz"), &CellValue::Empty);
    }

    #[test]
    fn test_sheet_cell_out_of_bounds_is_empty() {
        let sheet = Sheet::new("s", vec![vec!["x".into()]]);
        assert_eq!(sheet.cell(5, 5), &CellValue::Empty);
    }
}
