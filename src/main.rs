use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use royalbit_tally::cli::{self, LedgerView, OutputOptions};
use royalbit_tally::core::visits::{LogFilter, VisitFilter};
use royalbit_tally::core::SortOrder;
use royalbit_tally::error::TallyResult;
use royalbit_tally::reports::VisitRequest;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Spreadsheet classification and sales aggregation reports")]
#[command(long_about = "Tally - spreadsheet classification and sales aggregation

REPORTS:
  items   - Classify products by keyword rules and pivot yearly totals
  ledger  - Compare two periods of customer sales ledgers
  visits  - Summarize sales visit sheets and their operation log

Inputs are .xlsx, .xls, .xlsb or .ods workbooks. Column labels, sheet
names and vocabularies default to the sales team's layout and can be
overridden with --config <file.yaml>.

EXAMPLES:
  tally items class.xlsx items.xlsx -o pivot.xlsx
  tally ledger 2023.xlsx 2024.xlsx helper.xlsx --sort worst --by customer
  tally visits report.xlsx --person 田中 --from 2024-04-01 --json

Logging: set TALLY_LOG (or RUST_LOG), e.g. TALLY_LOG=debug")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// YAML file overriding column labels, sheet names and vocabularies
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl CommonArgs {
    fn into_options(self, output: Option<PathBuf>) -> OutputOptions {
        OutputOptions {
            config: self.config,
            json: self.json,
            output,
            verbose: self.verbose,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Classify products and pivot their yearly series.

The rule workbook's first sheet lists 優先度 / キーワード / 分類. Rules
marked 〇 come first, then rules with longer keyword text. Each product
gets the category of the first rule whose keyword appears in its name.

The data workbook's first sheet needs a product column and monthly
column pairs such as 2024年4月_個数 / 2024年4月_金額.")]
    /// Classify products and pivot yearly quantity/amount per category
    Items {
        /// Workbook holding the classification rules
        rules: PathBuf,

        /// Workbook holding the item data
        data: PathBuf,

        /// Export the pivot and classified rows to .xlsx
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    #[command(long_about = "Compare two periods of customer sales ledgers.

The helper workbook may hold 削除依頼 (excluded customer codes),
計算修正 (code → correction factor) and 大分類わけ (code → category).
Amounts are reported in thousands.

SORT ORDERS:
  current - current-period amount, largest first
  best    - largest gain first
  worst   - largest loss first")]
    /// Compare prior and current customer ledgers
    Ledger {
        /// Prior-period ledger
        prior: PathBuf,

        /// Current-period ledger
        current: PathBuf,

        /// Helper workbook with exclusion, correction and category sheets
        helper: PathBuf,

        /// Sort order: current, best or worst
        #[arg(short, long, default_value = "current")]
        sort: SortOrder,

        /// Table to print
        #[arg(long, value_enum, default_value_t = LedgerView::Category)]
        by: LedgerView,

        /// Export both comparison tables to .xlsx
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Summarize sales visit sheets and the operation log
    Visits {
        /// Visit report workbook (one sheet per person_kind plus 操作履歴)
        report: PathBuf,

        /// Only these persons (repeatable; default all)
        #[arg(long)]
        person: Vec<String>,

        /// Only these visit kinds (repeatable; default all)
        #[arg(long)]
        kind: Vec<String>,

        /// Only these regions (repeatable; default all)
        #[arg(long)]
        region: Vec<String>,

        /// Only these categories (repeatable; default all)
        #[arg(long)]
        category: Vec<String>,

        /// First visit date, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last visit date, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Only log entries for these sheets (repeatable; default all)
        #[arg(long)]
        log_sheet: Vec<String>,

        /// First log date, YYYY-MM-DD
        #[arg(long)]
        log_from: Option<NaiveDate>,

        /// Last log date, YYYY-MM-DD
        #[arg(long)]
        log_to: Option<NaiveDate>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Empty selections mean "everything"
fn selection(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TALLY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> TallyResult<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Items {
            rules,
            data,
            output,
            common,
        } => cli::items(rules, data, common.into_options(output)),

        Commands::Ledger {
            prior,
            current,
            helper,
            sort,
            by,
            output,
            common,
        } => cli::ledger(prior, current, helper, sort, by, common.into_options(output)),

        Commands::Visits {
            report,
            person,
            kind,
            region,
            category,
            from,
            to,
            log_sheet,
            log_from,
            log_to,
            common,
        } => {
            let request = VisitRequest {
                visits: VisitFilter {
                    persons: selection(person),
                    kinds: selection(kind),
                    regions: selection(region),
                    categories: selection(category),
                    date_from: from,
                    date_to: to,
                },
                log: LogFilter {
                    sheets: selection(log_sheet),
                    date_from: log_from,
                    date_to: log_to,
                },
            };
            cli::visits(report, request, common.into_options(None))
        }
    }
}
