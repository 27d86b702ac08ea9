//! Workbook fixtures shared by the integration tests
//!
//! Fixtures are written with rust_xlsxwriter into a TempDir and read back
//! through the crate's calamine reader, so every test covers real files.

#![allow(dead_code)]

use royalbit_tally::CellValue;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::path::{Path, PathBuf};

pub struct FixtureSheet<'a> {
    pub name: &'a str,
    pub hidden: bool,
    pub rows: Vec<Vec<CellValue>>,
}

pub fn sheet(name: &str, rows: Vec<Vec<CellValue>>) -> FixtureSheet<'_> {
    FixtureSheet {
        name,
        hidden: false,
        rows,
    }
}

pub fn hidden_sheet(name: &str, rows: Vec<Vec<CellValue>>) -> FixtureSheet<'_> {
    FixtureSheet {
        name,
        hidden: true,
        rows,
    }
}

pub fn text_row(cells: &[&str]) -> Vec<CellValue> {
    cells
        .iter()
        .map(|s| {
            if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::text(*s)
            }
        })
        .collect()
}

pub fn write_workbook(path: &Path, sheets: &[FixtureSheet]) {
    let mut book = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for fixture in sheets {
        let ws = book.add_worksheet();
        ws.set_name(fixture.name).unwrap();
        for (r, row) in fixture.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match value {
                    CellValue::Empty => {}
                    CellValue::Number(n) => {
                        ws.write_number(r, c, *n).unwrap();
                    }
                    CellValue::Text(s) => {
                        ws.write_string(r, c, s).unwrap();
                    }
                    CellValue::Bool(b) => {
                        ws.write_boolean(r, c, *b).unwrap();
                    }
                    CellValue::DateTime(dt) => {
                        let stamp = dt.format("%Y-%m-%d %H:%M:%S").to_string();
                        let excel = ExcelDateTime::parse_from_str(&stamp).unwrap();
                        ws.write_datetime_with_format(r, c, &excel, &date_format)
                            .unwrap();
                    }
                }
            }
        }
        if fixture.hidden {
            ws.set_hidden(true);
        }
    }

    book.save(path).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// ITEMS
// ═══════════════════════════════════════════════════════════════════════════

pub fn write_rules(dir: &Path) -> PathBuf {
    let path = dir.join("class.xlsx");
    write_workbook(
        &path,
        &[sheet(
            "分類表",
            vec![
                text_row(&["優先度", "キーワード", "分類"]),
                text_row(&["", "チョコ", "菓子"]),
                text_row(&["", "ミルクチョコ", "乳製品"]),
                text_row(&["〇", "茶", "飲料"]),
            ],
        )],
    );
    path
}

pub fn write_items(dir: &Path) -> PathBuf {
    let path = dir.join("items.xlsx");
    let mut header = text_row(&["JAN", "商品名"]);
    header.extend(text_row(&[
        "2023年4月_個数",
        "2023年4月_金額",
        "2024年4月_個数",
        "2024年4月_金額",
        "2024年5月_個数",
        "2024年5月_金額",
    ]));
    let row = |jan: f64, name: &str, values: [f64; 6]| {
        let mut cells = vec![CellValue::Number(jan), CellValue::text(name)];
        cells.extend(values.iter().map(|v| CellValue::Number(*v)));
        cells
    };
    write_workbook(
        &path,
        &[sheet(
            "data",
            vec![
                header,
                row(1.0, "ミルクチョコ", [1.0, 100.0, 1.0, 100.0, 1.0, 100.0]),
                row(2.0, "ビターチョコ", [2.0, 200.0, 1.0, 100.0, 0.0, 0.0]),
                row(3.0, "抹茶チョコ", [1.0, 50.0, 2.0, 100.0, 0.0, 0.0]),
                row(4.0, "せんべい", [3.0, 300.0, 0.0, 0.0, 0.0, 0.0]),
            ],
        )],
    );
    path
}

// ═══════════════════════════════════════════════════════════════════════════
// LEDGER
// ═══════════════════════════════════════════════════════════════════════════

pub fn write_ledger(dir: &Path, file: &str, rows: &[(f64, &str, f64)]) -> PathBuf {
    let path = dir.join(file);
    let mut grid = vec![
        text_row(&["得意先別売上一覧"]),
        text_row(&["期間: 4月〜3月"]),
        text_row(&["得意先コード", "得意先名", "純売上額"]),
    ];
    for (code, name, amount) in rows {
        grid.push(vec![
            CellValue::Number(*code),
            CellValue::text(*name),
            CellValue::Number(*amount),
        ]);
    }
    write_workbook(&path, &[sheet("Sheet1", grid)]);
    path
}

pub fn write_helper(dir: &Path) -> PathBuf {
    let path = dir.join("helper.xlsx");
    write_workbook(
        &path,
        &[
            sheet("削除依頼", vec![vec![CellValue::Number(99.0)]]),
            sheet(
                "計算修正",
                vec![
                    vec![CellValue::Number(2.0), CellValue::Number(0.5)],
                    vec![CellValue::text("abc"), CellValue::Number(2.0)],
                ],
            ),
            sheet(
                "大分類わけ",
                vec![
                    vec![CellValue::Number(1.0), CellValue::text("駅")],
                    vec![CellValue::text("2"), CellValue::text("空港")],
                    vec![CellValue::Number(3.0), CellValue::text("駅")],
                ],
            ),
        ],
    );
    path
}

/// Prior and current ledgers: A grows, B shrinks (after a 0.5 correction),
/// C is new, D disappears and Z is excluded
pub fn write_ledger_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let prior = write_ledger(
        dir,
        "2023.xlsx",
        &[
            (1.0, "A商店", 1_000_000.0),
            (2.0, "B空港売店", 4_000_000.0),
            (4.0, "D物産", 500_000.0),
            (99.0, "Z社内", 9_999_999.0),
        ],
    );
    let current = write_ledger(
        dir,
        "2024.xlsx",
        &[
            (1.0, "A商店", 1_500_000.0),
            (2.0, "B空港売店", 3_000_000.0),
            (3.0, "C駅店", 2_500.0),
            (99.0, "Z社内", 1.0),
        ],
    );
    (prior, current)
}

// ═══════════════════════════════════════════════════════════════════════════
// VISITS
// ═══════════════════════════════════════════════════════════════════════════

const VISIT_HEADER: [&str; 8] = [
    "UUID",
    "記入日",
    "地域",
    "大分類",
    "ステータス",
    "商品名",
    "結果",
    "採用・不採用理由",
];

pub fn write_visits(dir: &Path) -> PathBuf {
    let path = dir.join("visits.xlsx");
    write_workbook(
        &path,
        &[
            sheet(
                "田中_駅",
                vec![
                    text_row(&VISIT_HEADER),
                    text_row(&["u1", "2024-05-01", "大阪", "駅", "アポ", "チョコ", "採用", "【価格・味】"]),
                    text_row(&["u1", "2024-05-01", "大阪", "駅", "アポ", "せんべい", "不採用", "【価格】高い"]),
                    text_row(&["u2", "2024-05-10", "その他：岡山", "駅", "完了", "緑茶", "採用", "【味】"]),
                ],
            ),
            sheet(
                "佐藤_高速",
                vec![
                    text_row(&VISIT_HEADER),
                    text_row(&["u3", "2024-06-01", "東京", "高速", "検討中", "チョコ", "返答待ち", ""]),
                ],
            ),
            hidden_sheet(
                "鈴木_空港",
                vec![
                    text_row(&VISIT_HEADER),
                    text_row(&["u9", "2024-06-02", "京都", "空港", "完了", "チョコ", "採用", "【価格】"]),
                ],
            ),
            sheet(
                "操作履歴",
                vec![
                    text_row(&["日時", "シート名", "操作タイプ", "対象UUID", "ステータスの変更", "商品ステータス"]),
                    text_row(&["2024-05-01 09:00:00", "田中_駅", "新規提案", "u1", "→アポ", "→返答待ち"]),
                    text_row(&["2024-05-02 09:00:00", "田中_駅", "編集", "u1", "アポ→アポ", "返答待ち→採用"]),
                    text_row(&["2024-05-10 09:00:00", "田中_駅", "編集", "u2", "アポ→完了", ""]),
                    text_row(&["2024-06-01 09:00:00", "佐藤_高速", "削除", "u3", "", ""]),
                ],
            ),
        ],
    );
    path
}
