//! Report orchestration
//!
//! Each report is a request-scoped pass: read the input workbooks, run the
//! pipeline stages from [`crate::core`] and return a serializable result.
//! Nothing is cached between runs.

pub mod items;
pub mod ledger;
pub mod visits;

pub use items::{build_items_report, run_items_report, ClassifiedPreview, ItemsReport};
pub use ledger::{build_ledger_report, run_ledger_report, LedgerReport};
pub use visits::{build_visit_report, run_visit_report, LogReport, VisitReport, VisitRequest};

use crate::error::{TallyError, TallyResult};
use crate::types::{Sheet, Workbook};

/// The data sheet of an input workbook
pub(crate) fn first_sheet(workbook: &Workbook) -> TallyResult<&Sheet> {
    workbook
        .first_sheet()
        .ok_or_else(|| TallyError::EmptyWorkbook(workbook.name.clone()))
}
