//! Delimited writing of export rows.

use skala_core::ExportRow;

/// Column order of the export format.
pub const EXPORT_HEADER: [&str; 9] = [
    "scale_id",
    "scale_name",
    "parent_scale_id",
    "dimension_name",
    "item_id",
    "origin_item_id",
    "item_text",
    "baseline_rubric",
    "current_rubric",
];

fn clean(cell: &str, delimiter: char) -> String {
    cell.chars()
        .map(|c| {
            if c == delimiter || c == '\n' || c == '\r' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Renders rows as delimited text with a header line. Cells never contain
/// the delimiter afterwards; embedded occurrences become spaces, which is
/// acceptable because the export is one-way display data.
pub fn write_rows(rows: &[ExportRow], delimiter: char) -> String {
    let mut out = String::new();
    let mut push_line = |cells: &[&str]| {
        let line: Vec<String> = cells.iter().map(|c| clean(c, delimiter)).collect();
        out.push_str(&line.join(&delimiter.to_string()));
        out.push('\n');
    };

    push_line(&EXPORT_HEADER);
    for row in rows {
        push_line(&[
            &row.scale_id,
            &row.scale_name,
            &row.parent_scale_id,
            &row.dimension_name,
            &row.item_id,
            &row.origin_item_id,
            &row.item_text,
            &row.baseline_rubric,
            &row.current_rubric,
        ]);
    }
    out
}
