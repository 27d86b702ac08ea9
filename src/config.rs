//! Report configuration and schema descriptors
//!
//! Every label, marker, sheet name and vocabulary the reports rely on lives
//! here instead of being hard-coded in the pipeline. All fields default to the
//! layout of the sales team's spreadsheets, so an empty YAML file is a valid
//! configuration.

use crate::error::{TallyError, TallyResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fallback category when no rule or map matches
pub const UNCLASSIFIED: &str = "未分類";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub rules: RuleSchema,
    pub items: ItemSchema,
    pub ledger: LedgerSchema,
    pub visits: VisitSchema,
}

impl ReportConfig {
    /// Load a YAML configuration file
    pub fn load(path: &Path) -> TallyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReportConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> TallyResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> TallyResult<()> {
        if self.rules.keyword_delimiters.is_empty() {
            return Err(TallyError::Config(
                "rules.keyword_delimiters must not be empty".to_string(),
            ));
        }
        if self.items.product_column_patterns.is_empty() {
            return Err(TallyError::Config(
                "items.product_column_patterns must not be empty".to_string(),
            ));
        }
        self.items.series_regex()?;
        if self.ledger.code_width == 0 {
            return Err(TallyError::Config(
                "ledger.code_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Layout of the classification rule sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSchema {
    pub priority_column: String,
    pub keyword_column: String,
    pub category_column: String,
    /// Cell text (trimmed) that flags a rule as preferred
    pub priority_marker: String,
    pub keyword_delimiters: Vec<char>,
    pub unclassified: String,
}

impl Default for RuleSchema {
    fn default() -> Self {
        Self {
            priority_column: "優先度".to_string(),
            keyword_column: "キーワード".to_string(),
            category_column: "分類".to_string(),
            priority_marker: "〇".to_string(),
            keyword_delimiters: vec!['・'],
            unclassified: UNCLASSIFIED.to_string(),
        }
    }
}

/// Layout of the item data sheet used by the time-series pivot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSchema {
    /// Ordered substrings; the first pattern found in any column label wins
    pub product_column_patterns: Vec<String>,
    /// Regex over column labels; capture group 1 is the 4-digit year
    pub series_pattern: String,
    pub quantity_marker: String,
    pub amount_marker: String,
    /// Suffix appended to the year in pivot column labels
    pub year_suffix: String,
    pub ratio_suffix: String,
    pub category_label: String,
    pub product_label: String,
}

impl Default for ItemSchema {
    fn default() -> Self {
        Self {
            product_column_patterns: vec!["商品".to_string()],
            series_pattern: r"^(\d{4})年\d+月_個数".to_string(),
            quantity_marker: "個数".to_string(),
            amount_marker: "金額".to_string(),
            year_suffix: "年".to_string(),
            ratio_suffix: "前年比".to_string(),
            category_label: "分類".to_string(),
            product_label: "商品名".to_string(),
        }
    }
}

impl ItemSchema {
    pub fn series_regex(&self) -> TallyResult<Regex> {
        let re = Regex::new(&self.series_pattern)?;
        if re.captures_len() < 2 {
            return Err(TallyError::Config(format!(
                "items.series_pattern '{}' needs a capture group for the year",
                self.series_pattern
            )));
        }
        Ok(re)
    }
}

/// Layout of the customer sales ledgers and the helper workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSchema {
    /// Text whose presence in a cell identifies the header row
    pub header_marker: String,
    pub code_column: String,
    pub name_column: String,
    pub amount_column: String,
    pub category_label: String,
    pub code_width: usize,
    pub exclusion_sheet: String,
    pub correction_sheet: String,
    pub category_sheet: String,
    pub unclassified: String,
}

impl Default for LedgerSchema {
    fn default() -> Self {
        Self {
            header_marker: "得意先コード".to_string(),
            code_column: "得意先コード".to_string(),
            name_column: "得意先名".to_string(),
            amount_column: "純売上額".to_string(),
            category_label: "大分類".to_string(),
            code_width: 4,
            exclusion_sheet: "削除依頼".to_string(),
            correction_sheet: "計算修正".to_string(),
            category_sheet: "大分類わけ".to_string(),
            unclassified: UNCLASSIFIED.to_string(),
        }
    }
}

impl LedgerSchema {
    pub fn required_columns(&self) -> [&str; 3] {
        [&self.code_column, &self.name_column, &self.amount_column]
    }
}

/// Layout and vocabularies of the visit report workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitSchema {
    pub log_sheet: String,
    pub unknown: String,
    pub unclassified: String,
    pub other_region: String,
    pub other_region_prefix: String,
    pub regions: Vec<String>,
    pub valid_categories: Vec<String>,
    pub statuses: Vec<String>,
    pub results: Vec<String>,
    pub operations: Vec<String>,
    pub adopted_result: String,
    pub rejected_result: String,
    pub reason_delimiter: char,
    pub status_change_arrow: String,
    pub columns: VisitColumns,
    pub log_columns: LogColumns,
}

impl Default for VisitSchema {
    fn default() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            log_sheet: "操作履歴".to_string(),
            unknown: "不明".to_string(),
            unclassified: UNCLASSIFIED.to_string(),
            other_region: "その他".to_string(),
            other_region_prefix: "その他：".to_string(),
            regions: strings(&["大阪", "奈良", "京都", "滋賀", "兵庫", "三重", "和歌山"]),
            valid_categories: strings(&["駅", "高速", "空港", "一般店", "量販店", "商社"]),
            statuses: strings(&["アポ", "訪問予定", "検討中", "完了"]),
            results: strings(&["採用", "不採用", "返答待ち"]),
            operations: strings(&["新規提案", "編集", "削除"]),
            adopted_result: "採用".to_string(),
            rejected_result: "不採用".to_string(),
            reason_delimiter: '・',
            status_change_arrow: "→".to_string(),
            columns: VisitColumns::default(),
            log_columns: LogColumns::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitColumns {
    pub uuid: String,
    pub date: String,
    pub region: String,
    pub category: String,
    pub status: String,
    pub product: String,
    pub result: String,
    pub reason: String,
}

impl Default for VisitColumns {
    fn default() -> Self {
        Self {
            uuid: "UUID".to_string(),
            date: "記入日".to_string(),
            region: "地域".to_string(),
            category: "大分類".to_string(),
            status: "ステータス".to_string(),
            product: "商品名".to_string(),
            result: "結果".to_string(),
            reason: "採用・不採用理由".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogColumns {
    pub timestamp: String,
    pub sheet: String,
    pub operation: String,
    pub target_uuid: String,
    pub status_change: String,
    pub product_status_change: String,
}

impl Default for LogColumns {
    fn default() -> Self {
        Self {
            timestamp: "日時".to_string(),
            sheet: "シート名".to_string(),
            operation: "操作タイプ".to_string(),
            target_uuid: "対象UUID".to_string(),
            status_change: "ステータスの変更".to_string(),
            product_status_change: "商品ステータス".to_string(),
        }
    }
}
