use std::path::Path;

use rsvp_selection::{Cell, Table};

pub const DEFAULT_LABEL_PREFIX: &str = "Guest list ";

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// The label of a draw: the name of the RSVP file up to its first dot, without the prefix.
pub fn output_label(path: &Path, prefix: &str) -> String {
    let file_name = simplify_file_name(path);
    let stem = file_name.split('.').next().unwrap_or_default();
    stem.strip_prefix(prefix).unwrap_or(stem).to_string()
}

pub fn output_file_name(label: &str, timestamp: &str) -> String {
    format!("{}_selected_{}.xlsx", label, timestamp)
}

pub fn is_excel_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false)
}

/// Reads a raw text field the way a dataframe reader infers types: integers, then decimals,
/// then text. Empty fields are missing values.
pub fn parse_cell(s: &str) -> Cell {
    if s.is_empty() {
        return Cell::Empty;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Cell::Int(i);
    }
    // f64 parsing also accepts words like "inf" or "NaN", which are names here.
    let numeric_chars = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if numeric_chars && s.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = s.parse::<f64>() {
            return Cell::Float(f);
        }
    }
    Cell::Text(s.to_string())
}

/// Gives each column of a text table a single type. A column becomes numeric only when
/// every non-empty value in it parses as a number, otherwise all of it stays text.
/// Integers are widened to decimals in a column that holds both.
pub fn infer_column_types(mut table: Table) -> Table {
    for idx in 0..table.columns.len() {
        let parsed: Vec<Cell> = table
            .rows
            .iter()
            .map(|r| match r.cells.get(idx) {
                Some(Cell::Text(s)) => parse_cell(s),
                Some(other) => other.clone(),
                None => Cell::Empty,
            })
            .collect();
        if parsed.iter().any(|c| matches!(c, Cell::Text(_))) {
            continue;
        }
        let has_float = parsed.iter().any(|c| matches!(c, Cell::Float(_)));
        for (row, cell) in table.rows.iter_mut().zip(parsed) {
            if let Some(slot) = row.cells.get_mut(idx) {
                *slot = match cell {
                    Cell::Int(i) if has_float => Cell::Float(i as f64),
                    c => c,
                };
            }
        }
    }
    table
}
