use crate::config::ReportConfig;
use crate::core::visits::{LabelCount, ReasonCount};
use crate::core::{CategorySummary, ComparisonRecord, SortOrder};
use crate::error::{TallyError, TallyResult};
use crate::excel::{ExportSheet, ReportExporter};
use crate::reports::{self, ItemsReport, LedgerReport, VisitReport, VisitRequest};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Flags shared by every report command
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub config: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

impl OutputOptions {
    fn load_config(&self) -> TallyResult<ReportConfig> {
        let config = ReportConfig::load_or_default(self.config.as_deref())?;
        if self.verbose && !self.json {
            match &self.config {
                Some(path) => println!("{}", format!("⚙️  Config: {}", path.display()).cyan()),
                None => println!("{}", "⚙️  Config: built-in defaults".cyan()),
            }
        }
        Ok(config)
    }
}

/// Which comparison table the ledger command prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LedgerView {
    #[default]
    Category,
    Customer,
}

/// Integral values print without decimals, others with at most two
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{:.2}", n)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn print_json<T: Serialize>(value: &T) -> TallyResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn export_xlsx(output: &Path, sheets: Vec<ExportSheet>) -> TallyResult<()> {
    let extension = output.extension().and_then(|e| e.to_str()).unwrap_or("");
    if extension != "xlsx" {
        return Err(TallyError::Export(format!(
            "Unsupported output format: {}. Use .xlsx",
            extension
        )));
    }
    ReportExporter::new(sheets).export(output)
}

fn report_exported(output: &Path, json: bool) {
    // Keep stdout parseable in JSON mode
    let message = format!("✅ Report exported to {}", output.display());
    if json {
        eprintln!("{}", message.bold().green());
    } else {
        println!("{}", message.bold().green());
    }
}

//==============================================================================
// items
//==============================================================================

/// Execute the items command: classify products and pivot their yearly series
pub fn items(rules: PathBuf, data: PathBuf, opts: OutputOptions) -> TallyResult<()> {
    if !opts.json {
        println!("{}", "📦 Tally - Item Report".bold().green());
        println!("   Rules: {}", rules.display());
        println!("   Data:  {}\n", data.display());
    }

    let config = opts.load_config()?;
    let report = reports::run_items_report(&rules, &data, &config)?;

    if let Some(output) = &opts.output {
        export_xlsx(output, report.export_sheets(&config.items))?;
        report_exported(output, opts.json);
    }

    if opts.json {
        return print_json(&report);
    }

    if opts.verbose {
        println!(
            "   {} rules, product column '{}', {} products",
            report.rules.len(),
            report.product_column.bright_blue(),
            report.preview.rows.len()
        );
        print_rules(&report);
        println!();
    }

    print_pivot(&report);
    Ok(())
}

fn print_rules(report: &ItemsReport) {
    println!("{}", "📋 Rule order:".bold().cyan());
    for (idx, rule) in report.rules.rules().iter().enumerate() {
        let marker = if rule.priority { "★" } else { " " };
        println!(
            "   {:>3} {} {:<12} {}",
            idx + 1,
            marker.yellow(),
            rule.category.as_deref().unwrap_or("(除外)").bright_blue(),
            rule.keywords.join(" / ")
        );
    }
}

fn print_pivot(report: &ItemsReport) {
    println!("{}", "📊 Yearly totals by category:".bold().cyan());
    let width = 16 + report.pivot.years.len() * 34;
    println!("{}", "─".repeat(width));

    let mut header = format!("{:<16}", "Category");
    for year in &report.pivot.years {
        header.push_str(&format!("{:>10} {:>14} {:>8} ", format!("{year} qty"), "amount", "ratio"));
    }
    println!("{}", header.bold());
    println!("{}", "─".repeat(width));

    for row in &report.pivot.rows {
        let mut line = format!("{:<16}", row.category);
        for cell in &row.cells {
            line.push_str(&format!(
                "{:>10} {:>14} {:>8} ",
                format_number(cell.quantity),
                format_number(cell.amount),
                cell.ratio
            ));
        }
        println!("{}", line);
    }
    println!("{}", "─".repeat(width));
}

//==============================================================================
// ledger
//==============================================================================

/// Execute the ledger command: compare two periods of customer sales
pub fn ledger(
    prior: PathBuf,
    current: PathBuf,
    helper: PathBuf,
    order: SortOrder,
    view: LedgerView,
    opts: OutputOptions,
) -> TallyResult<()> {
    if !opts.json {
        println!("{}", "📒 Tally - Ledger Comparison".bold().green());
        println!("   Prior:   {}", prior.display());
        println!("   Current: {}", current.display());
        println!("   Helper:  {}\n", helper.display());
    }

    let config = opts.load_config()?;
    let report = reports::run_ledger_report(&prior, &current, &helper, order, &config)?;

    if let Some(output) = &opts.output {
        export_xlsx(output, report.export_sheets(&config))?;
        report_exported(output, opts.json);
    }

    if opts.json {
        return print_json(&report);
    }

    print_warnings(&report, opts.verbose);
    match view {
        LedgerView::Category => print_category_table(&report.categories),
        LedgerView::Customer => print_customer_table(&report.customers),
    }

    let (prior_total, current_total) = report.totals();
    println!(
        "\n   Total (千円): {} → {}  ({})",
        prior_total,
        current_total.to_string().bold(),
        colored_delta(current_total - prior_total)
    );

    print_category_bars(&report.categories);
    Ok(())
}

fn print_warnings(report: &LedgerReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }
    println!(
        "{}",
        format!("⚠️  {} helper rows skipped", report.warnings.len()).yellow()
    );
    if verbose {
        for warning in &report.warnings {
            println!("   {}", warning.to_string().yellow());
        }
    }
    println!();
}

fn colored_delta(delta: i64) -> colored::ColoredString {
    if delta >= 0 {
        format!("+{}", delta).green()
    } else {
        delta.to_string().red()
    }
}

fn print_category_table(categories: &[CategorySummary]) {
    println!("{}", "📊 By category (千円):".bold().cyan());
    println!("{}", "─".repeat(70));
    println!(
        "{:<16} {:>12} {:>12} {:>12} {:>10}",
        "Category".bold(),
        "Prior".bold(),
        "Current".bold(),
        "Delta".bold(),
        "Ratio".bold()
    );
    println!("{}", "─".repeat(70));
    for s in categories {
        println!(
            "{:<16} {:>12} {:>12} {:>12} {:>9.1}%",
            s.category.bright_blue(),
            s.prior_amount,
            s.current_amount,
            colored_delta(s.delta),
            s.ratio
        );
    }
    println!("{}", "─".repeat(70));
}

fn print_customer_table(customers: &[ComparisonRecord]) {
    println!("{}", "📊 By customer (千円):".bold().cyan());
    println!("{}", "─".repeat(100));
    println!(
        "{:<6} {:<24} {:<10} {:>10} {:>7} {:>10} {:>7} {:>10} {:>8}",
        "Code".bold(),
        "Name".bold(),
        "Category".bold(),
        "Prior".bold(),
        "%".bold(),
        "Current".bold(),
        "%".bold(),
        "Delta".bold(),
        "Ratio".bold()
    );
    println!("{}", "─".repeat(100));
    for r in customers {
        println!(
            "{:<6} {:<24} {:<10} {:>10} {:>7.2} {:>10} {:>7.2} {:>10} {:>7.1}%",
            r.code.as_str(),
            r.name,
            r.category,
            r.prior_amount,
            r.prior_composition,
            r.current_amount,
            r.current_composition,
            colored_delta(r.delta),
            r.ratio
        );
    }
    println!("{}", "─".repeat(100));
}

const BAR_WIDTH: usize = 40;

/// Bar length for `value` relative to `max`; negative values get no bar
fn bar_length(value: i64, max: i64) -> usize {
    if max <= 0 || value <= 0 {
        return 0;
    }
    ((value as f64 / max as f64) * BAR_WIDTH as f64).round() as usize
}

fn print_category_bars(categories: &[CategorySummary]) {
    let max = categories.iter().map(|c| c.current_amount).max().unwrap_or(0);
    if max <= 0 {
        return;
    }
    println!("\n{}", "📈 Current period by category:".bold().cyan());
    for c in categories {
        println!(
            "   {:<16} {} {}",
            c.category,
            "█".repeat(bar_length(c.current_amount, max)).green(),
            c.current_amount
        );
    }
}

//==============================================================================
// visits
//==============================================================================

/// Execute the visits command: summarize visit sheets and the operation log
pub fn visits(report_path: PathBuf, request: VisitRequest, opts: OutputOptions) -> TallyResult<()> {
    if !opts.json {
        println!("{}", "🚶 Tally - Visit Report".bold().green());
        println!("   File: {}\n", report_path.display());
    }

    let config = opts.load_config()?;
    let report = reports::run_visit_report(&report_path, &request, &config.visits)?;

    if opts.json {
        return print_json(&report);
    }

    if opts.verbose {
        println!("   Sheets: {}", report.sheets.join(", "));
        println!("   Persons: {}", report.options.persons.join(", "));
        println!("   Kinds: {}", report.options.kinds.join(", "));
        if let Some(range) = report.options.dates {
            println!("   Dates: {} .. {}", range.from, range.to);
        }
        println!();
    }

    print_visit_summary(&report);
    Ok(())
}

fn print_counts(title: &str, counts: &[LabelCount]) {
    println!("{}", title.bold().cyan());
    for c in counts {
        println!("   {:<12} {:>6}", c.label, c.count);
    }
}

fn print_reasons(title: &str, reasons: &[ReasonCount]) {
    if reasons.is_empty() {
        return;
    }
    println!("{}", title.bold().cyan());
    for r in reasons {
        println!("   {:<16} {:>6} {:>7.1}%", r.category, r.count, r.percent);
    }
}

fn print_visit_summary(report: &VisitReport) {
    let summary = &report.summary;
    println!(
        "   Rows: {}  Unique visits: {}  Products: {}\n",
        summary.rows.to_string().bold(),
        summary.unique_visits.to_string().bold(),
        summary.product_count.to_string().bold()
    );

    print_counts("📌 Status (per visit):", &summary.statuses);

    println!("{}", "🎯 Results:".bold().cyan());
    for r in &summary.results {
        println!("   {:<12} {:>6} {:>7.1}%", r.label, r.count, r.rate * 100.0);
    }

    print_reasons("👍 Adoption reasons:", &summary.adopted_reasons);
    print_reasons("👎 Rejection reasons:", &summary.rejected_reasons);

    match &report.log {
        Some(log) => {
            println!(
                "\n{} {} entries, {} targets",
                "📘 Operation log:".bold().cyan(),
                log.summary.entries,
                log.summary.unique_targets
            );
            if log.summary.entries == 0 {
                println!("{}", "   No log entries match the filter".yellow());
                return;
            }
            print_counts("   Operations:", &log.summary.operations);
            print_counts("   Status changes:", &log.summary.statuses);
            print_counts("   Product status changes:", &log.summary.product_statuses);
        }
        None => println!("\n{}", "ℹ️  No operation log sheet".dimmed()),
    }
}
