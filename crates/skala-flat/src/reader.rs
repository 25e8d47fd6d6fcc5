//! Delimiter detection and column inference over raw source files.
//!
//! The inputs here are whatever a researcher happens to have: a TSV dump, a
//! semicolon CSV from a spreadsheet in an Indonesian locale, or a bare list
//! of statements one per line. Nothing about the layout is declared, so both
//! the delimiter and the column roles are guessed from the data itself.

use std::sync::OnceLock;

use regex::Regex;
use skala_core::FlatRecord;

use crate::{Error, Result};

/// Candidates in preference order for equal field counts.
const DELIMITER_CANDIDATES: [char; 4] = ['\t', ';', ',', '|'];

const HEADER_TOKENS: &[&str] = &[
    "id",
    "no",
    "kode",
    "item",
    "item_id",
    "text",
    "teks",
    "statement",
    "pernyataan",
    "dimension",
    "dimension_name",
    "dimensi",
    "aspek",
];

fn id_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{0,8}[-_]?\d{1,5}$").unwrap())
}

/// Picks the delimiter that splits every non-empty line into the same field
/// count (at least two). When several qualify, the one yielding the most
/// fields wins. `None` means single-column input.
pub fn detect_delimiter(text: &str) -> Option<char> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(char, usize)> = None;
    for candidate in DELIMITER_CANDIDATES {
        let mut counts = lines.iter().map(|l| l.split(candidate).count());
        let Some(first) = counts.next() else {
            continue;
        };
        if first < 2 || !counts.all(|c| c == first) {
            continue;
        }
        if best.is_none_or(|(_, fields)| first > fields) {
            best = Some((candidate, first));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

/// Guessed role of each column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub id: Option<usize>,
    pub dimension: Option<usize>,
    pub text: usize,
}

fn mean_len(rows: &[Vec<String>], col: usize) -> f64 {
    let total: usize = rows.iter().map(|r| r.get(col).map_or(0, String::len)).sum();
    total as f64 / rows.len() as f64
}

fn distinct_count(rows: &[Vec<String>], col: usize) -> usize {
    let mut values: Vec<&str> = rows
        .iter()
        .filter_map(|r| r.get(col).map(String::as_str))
        .collect();
    values.sort_unstable();
    values.dedup();
    values.len()
}

fn id_like_fraction(rows: &[Vec<String>], col: usize) -> f64 {
    let hits = rows
        .iter()
        .filter(|r| r.get(col).is_some_and(|c| id_like().is_match(c)))
        .count();
    hits as f64 / rows.len() as f64
}

/// Infers column roles from cell statistics.
///
/// The text column is the one with the longest cells on average. An id
/// column must be unique across rows and short; a dimension column must
/// repeat (fewer distinct values than rows). Either may be absent.
pub fn infer_columns(rows: &[Vec<String>]) -> Result<ColumnMap> {
    if rows.is_empty() {
        return Err(Error::Empty);
    }
    let width = rows.iter().map(Vec::len).min().unwrap_or(0);
    if width == 0 {
        return Err(Error::NoTextColumn { columns: 0 });
    }
    if width == 1 {
        return Ok(ColumnMap {
            id: None,
            dimension: None,
            text: 0,
        });
    }

    let Some(text) = (0..width).max_by(|a, b| mean_len(rows, *a).total_cmp(&mean_len(rows, *b)))
    else {
        return Err(Error::NoTextColumn { columns: width });
    };

    let id = (0..width)
        .filter(|col| *col != text)
        .filter(|col| distinct_count(rows, *col) == rows.len())
        .filter(|col| mean_len(rows, *col) <= 24.0)
        .max_by(|a, b| {
            id_like_fraction(rows, *a)
                .total_cmp(&id_like_fraction(rows, *b))
                .then(mean_len(rows, *b).total_cmp(&mean_len(rows, *a)))
                .then(b.cmp(a))
        });

    let dimension = (0..width)
        .filter(|col| *col != text && Some(*col) != id)
        .filter(|col| {
            let distinct = distinct_count(rows, *col);
            distinct >= 1 && distinct < rows.len() && mean_len(rows, *col) <= 40.0
        })
        .min_by(|a, b| distinct_count(rows, *a).cmp(&distinct_count(rows, *b)).then(a.cmp(b)));

    Ok(ColumnMap { id, dimension, text })
}

fn is_header_row(cells: &[String]) -> bool {
    cells
        .iter()
        .any(|c| HEADER_TOKENS.contains(&c.trim().to_ascii_lowercase().as_str()))
}

/// Parses raw delimited text into normalized records.
///
/// Rows with an empty text cell are skipped; records without an id column
/// get synthesized ids `item-{n}`.
pub fn parse_records(text: &str) -> Result<Vec<FlatRecord>> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return Err(Error::Empty);
    }

    let delimiter = detect_delimiter(text);
    let mut rows: Vec<Vec<String>> = lines
        .iter()
        .map(|line| match delimiter {
            Some(d) => line.split(d).map(|c| c.trim().to_string()).collect(),
            None => vec![line.trim().to_string()],
        })
        .collect();

    if is_header_row(&rows[0]) {
        rows.remove(0);
    }
    if rows.is_empty() {
        return Err(Error::Empty);
    }

    let columns = infer_columns(&rows)?;

    let mut records = Vec::with_capacity(rows.len());
    for (n, row) in rows.iter().enumerate() {
        let Some(text) = row.get(columns.text).filter(|t| !t.is_empty()) else {
            tracing::debug!(row = n + 1, "skipped a row without item text");
            continue;
        };
        let id = columns
            .id
            .and_then(|col| row.get(col))
            .filter(|c| !c.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("item-{}", n + 1));
        let dimension = columns
            .dimension
            .and_then(|col| row.get(col))
            .filter(|c| !c.is_empty())
            .cloned();
        records.push(FlatRecord {
            id,
            dimension,
            text: text.clone(),
        });
    }

    if records.is_empty() {
        return Err(Error::Empty);
    }
    Ok(records)
}
