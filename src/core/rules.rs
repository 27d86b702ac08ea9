//! Keyword classification rules
//!
//! A rule sheet lists keyword sets, a target category and an optional
//! priority marker. Rules are ranked once (priority first, then the combined
//! keyword length, longest first) and names are classified by the first rule
//! in that order whose keywords appear in the name.
//!
//! The ranking approximates "most specific rule wins" but is only a
//! heuristic: a short priority rule still beats a longer plain rule when both
//! match.
//!
//! Keyword cells are split verbatim, so a stray delimiter (`羊羹・`) leaves an
//! empty token that matches every name. A rule with keywords but no category
//! still takes part in the ranking; names it matches classify to `None` and
//! are left out of aggregation.

use crate::config::RuleSchema;
use crate::types::{CellValue, LabeledTable};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRule {
    pub keywords: Vec<String>,
    /// `None` for a rule row with an empty category cell
    pub category: Option<String>,
    pub priority: bool,
}

impl ClassificationRule {
    /// An empty `category` yields a rule whose matches are dropped
    pub fn new(keywords: &[&str], category: &str, priority: bool) -> Self {
        let category = category.trim();
        Self {
            keywords: keywords.iter().map(|k| k.trim().to_string()).collect(),
            category: (!category.is_empty()).then(|| category.to_string()),
            priority,
        }
    }

    /// Sum of the trimmed keyword lengths in characters
    pub fn keyword_length(&self) -> usize {
        self.keywords.iter().map(|k| k.chars().count()).sum()
    }

    /// True when any keyword is a literal, case-sensitive substring of `name`
    pub fn matches(&self, name: &str) -> bool {
        self.keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

/// Rules in evaluation order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleTable {
    rules: Vec<ClassificationRule>,
    #[serde(skip)]
    unclassified: String,
}

impl RuleTable {
    /// Rank `rules` by (priority desc, keyword length desc).
    ///
    /// The sort is stable: rules that tie on both keys keep their sheet order.
    pub fn new(mut rules: Vec<ClassificationRule>, unclassified: impl Into<String>) -> Self {
        rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.keyword_length().cmp(&a.keyword_length()))
        });
        Self {
            rules,
            unclassified: unclassified.into(),
        }
    }

    /// Build a rule table from a sheet whose first row holds the labels
    pub fn from_table(table: &LabeledTable, schema: &RuleSchema) -> Self {
        let mut rules = Vec::with_capacity(table.len());

        for (idx, row) in table.rows.iter().enumerate() {
            let keyword_cell = table.value(row, &schema.keyword_column);
            let category_cell = table.value(row, &schema.category_column);
            if keyword_cell.is_empty() && category_cell.is_empty() {
                continue;
            }

            let category = category_cell.to_text().trim().to_string();
            if category.is_empty() {
                debug!(row = idx + 2, "rule without a category; its matches are excluded");
            }

            let priority =
                table.value(row, &schema.priority_column).to_text().trim() == schema.priority_marker;

            rules.push(ClassificationRule {
                keywords: split_keywords(keyword_cell, &schema.keyword_delimiters),
                category: (!category.is_empty()).then_some(category),
                priority,
            });
        }

        debug!(rules = rules.len(), "classification rules loaded");
        Self::new(rules, schema.unclassified.clone())
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn classify(&self, name: Option<&str>) -> Option<String> {
        classify(name, &self.rules, &self.unclassified)
    }
}

/// Category of the first rule matching `name`, or `unclassified` when none does.
///
/// `None` means the first matching rule has no category.
pub fn classify(name: Option<&str>, rules: &[ClassificationRule], unclassified: &str) -> Option<String> {
    let name = match name {
        Some(n) if !n.is_empty() => n,
        _ => return Some(unclassified.to_string()),
    };

    match rules.iter().find(|rule| rule.matches(name)) {
        Some(rule) => rule.category.clone(),
        None => Some(unclassified.to_string()),
    }
}

fn split_keywords(cell: &CellValue, delimiters: &[char]) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }
    cell.to_text()
        .split(|c: char| delimiters.contains(&c))
        .map(|k| k.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UNCLASSIFIED;

    fn rule_sheet(rows: &[(&str, &str, &str)]) -> LabeledTable {
        LabeledTable {
            columns: vec!["優先度".into(), "キーワード".into(), "分類".into()],
            rows: rows
                .iter()
                .map(|(p, k, c)| {
                    let cell = |s: &str| {
                        if s.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::text(s)
                        }
                    };
                    vec![cell(p), cell(k), cell(c)]
                })
                .collect(),
        }
    }

    fn category(table: &RuleTable, name: &str) -> Option<String> {
        table.classify(Some(name))
    }

    #[test]
    fn test_keyword_length_counts_characters() {
        let rule = ClassificationRule::new(&["抹茶", " 大福 "], "和菓子", false);
        assert_eq!(rule.keyword_length(), 4);
    }

    #[test]
    fn test_from_table_parses_priority_and_tokens() {
        let table = rule_sheet(&[("", "クッキー・サブレ", "焼菓子"), (" 〇 ", "限定", "限定品")]);
        let rules = RuleTable::from_table(&table, &RuleSchema::default());

        assert_eq!(rules.len(), 2);
        assert!(rules.rules()[0].priority);
        assert_eq!(rules.rules()[0].category.as_deref(), Some("限定品"));
        assert_eq!(rules.rules()[1].keywords, vec!["クッキー", "サブレ"]);
    }

    #[test]
    fn test_slash_is_not_a_default_delimiter() {
        let table = rule_sheet(&[("", "1/2カット", "カット")]);
        let rules = RuleTable::from_table(&table, &RuleSchema::default());
        assert_eq!(rules.rules()[0].keywords, vec!["1/2カット"]);
        assert_eq!(category(&rules, "チョコ1個").as_deref(), Some(UNCLASSIFIED));
    }

    #[test]
    fn test_extra_delimiter_from_schema() {
        let schema = RuleSchema {
            keyword_delimiters: vec!['・', '/'],
            ..RuleSchema::default()
        };
        let rules = RuleTable::from_table(&rule_sheet(&[("", "飴/グミ", "キャンディ")]), &schema);
        assert_eq!(rules.rules()[0].keywords, vec!["飴", "グミ"]);
        assert_eq!(category(&rules, "ソフトグミ").as_deref(), Some("キャンディ"));
    }

    #[test]
    fn test_rule_without_category_still_ranks_and_drops_match() {
        let table = rule_sheet(&[("", "抹茶チョコ", ""), ("", "チョコ", "菓子")]);
        let rules = RuleTable::from_table(&table, &RuleSchema::default());

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules()[0].category, None);
        assert_eq!(category(&rules, "抹茶チョコ"), None);
        assert_eq!(category(&rules, "ミルクチョコ").as_deref(), Some("菓子"));
    }

    #[test]
    fn test_blank_rule_rows_are_ignored() {
        let table = rule_sheet(&[("", "", ""), ("〇", "", ""), ("", "羊羹", "和菓子")]);
        let rules = RuleTable::from_table(&table, &RuleSchema::default());
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_trailing_delimiter_matches_every_name() {
        let table = rule_sheet(&[("", "羊羹・", "和菓子")]);
        let rules = RuleTable::from_table(&table, &RuleSchema::default());

        assert_eq!(rules.rules()[0].keywords, vec!["羊羹", ""]);
        assert_eq!(rules.rules()[0].keyword_length(), 2);
        assert_eq!(category(&rules, "チョコ").as_deref(), Some("和菓子"));
    }

    #[test]
    fn test_classify_null_and_empty_names() {
        let rules = vec![ClassificationRule::new(&["a"], "A", false)];
        assert_eq!(classify(None, &rules, UNCLASSIFIED).as_deref(), Some(UNCLASSIFIED));
        assert_eq!(classify(Some(""), &rules, UNCLASSIFIED).as_deref(), Some(UNCLASSIFIED));
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        let rules = vec![ClassificationRule::new(&["Tea"], "Drinks", false)];
        assert_eq!(classify(Some("Green Tea"), &rules, UNCLASSIFIED).as_deref(), Some("Drinks"));
        assert_eq!(classify(Some("green tea"), &rules, UNCLASSIFIED).as_deref(), Some(UNCLASSIFIED));
    }

    #[test]
    fn test_longer_keyword_set_ranks_first() {
        let table = RuleTable::new(
            vec![
                ClassificationRule::new(&["茶"], "飲料", false),
                ClassificationRule::new(&["抹茶ラテ"], "ラテ", false),
            ],
            UNCLASSIFIED,
        );
        assert_eq!(category(&table, "抹茶ラテ 500ml").as_deref(), Some("ラテ"));
        assert_eq!(category(&table, "緑茶").as_deref(), Some("飲料"));
    }

    #[test]
    fn test_ties_keep_sheet_order() {
        let table = RuleTable::new(
            vec![
                ClassificationRule::new(&["ab"], "first", false),
                ClassificationRule::new(&["cd"], "second", false),
                ClassificationRule::new(&["ef"], "third", false),
            ],
            UNCLASSIFIED,
        );
        let order: Vec<&str> = table
            .rules()
            .iter()
            .filter_map(|r| r.category.as_deref())
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
        assert_eq!(category(&table, "abcd").as_deref(), Some("first"));
    }

    #[test]
    fn test_short_priority_rule_beats_longer_plain_rule() {
        // Both rules match; the flagged one wins even though it is less specific.
        let table = RuleTable::new(
            vec![
                ClassificationRule::new(&["チョコレートケーキ"], "ケーキ", false),
                ClassificationRule::new(&["チョコ"], "チョコ菓子", true),
            ],
            UNCLASSIFIED,
        );
        assert_eq!(category(&table, "濃厚チョコレートケーキ").as_deref(), Some("チョコ菓子"));
    }
}
