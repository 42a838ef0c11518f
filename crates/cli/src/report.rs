//! Report rendering for `tally run` / `tally compare`.
//!
//! JSON mirrors the engine result (`meta`, `summary`, `duplicates`, `rows`)
//! with rows optionally filtered by kind. CSV flattens every row into one
//! line per mapped column.

use serde::Serialize;
use tally_recon::config::ColumnMapping;
use tally_recon::model::{
    ComparisonRow, DuplicateKey, ReconMeta, ReconResult, ReconSummary, RowKind,
};

pub const CSV_HEADER: [&str; 7] = [
    "status",
    "key",
    "source_column",
    "compare_column",
    "source_value",
    "compare_value",
    "is_different",
];

#[derive(Serialize)]
struct Report<'a> {
    meta: &'a ReconMeta,
    summary: &'a ReconSummary,
    duplicates: &'a [DuplicateKey],
    rows: Vec<&'a ComparisonRow>,
}

/// Pretty JSON report. The summary always covers every row, even when
/// `only` narrows the row list.
pub fn format_json(result: &ReconResult, only: &[RowKind]) -> Result<String, String> {
    let report = Report {
        meta: &result.meta,
        summary: &result.summary,
        duplicates: &result.duplicates,
        rows: result.rows_of(only).collect(),
    };
    serde_json::to_string_pretty(&report).map_err(|e| format!("JSON serialization error: {e}"))
}

/// Flat CSV report, one line per (row, mapped column).
pub fn format_csv(result: &ReconResult, only: &[RowKind]) -> Result<String, String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER).map_err(csv_err)?;

    for row in result.rows_of(only) {
        for line in row_lines(row, &result.meta.mapping) {
            wtr.write_record(&line).map_err(csv_err)?;
        }
    }

    let bytes = wtr.into_inner().map_err(|e| format!("CSV write error: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("CSV encoding error: {e}"))
}

fn csv_err(e: csv::Error) -> String {
    format!("CSV write error: {e}")
}

fn row_lines(row: &ComparisonRow, mapping: &ColumnMapping) -> Vec<[String; 7]> {
    let status = row.kind().as_str().to_string();
    let key = row.key().to_string();

    match row {
        ComparisonRow::Match { columns, .. } | ComparisonRow::Different { columns, .. } => columns
            .iter()
            .map(|c| {
                [
                    status.clone(),
                    key.clone(),
                    c.source_column.clone(),
                    c.compare_column.clone(),
                    c.source_value.clone(),
                    c.compare_value.clone(),
                    c.is_different.to_string(),
                ]
            })
            .collect(),
        // One side absent: its values stay blank and there is no verdict.
        ComparisonRow::MissingInCompare { source, .. } => mapping
            .iter()
            .map(|pair| {
                [
                    status.clone(),
                    key.clone(),
                    pair.source_column.clone(),
                    pair.compare_column.clone(),
                    source.value(&pair.source_column).to_string(),
                    String::new(),
                    String::new(),
                ]
            })
            .collect(),
        ComparisonRow::MissingInSource { compare, .. } => mapping
            .iter()
            .map(|pair| {
                [
                    status.clone(),
                    key.clone(),
                    pair.source_column.clone(),
                    pair.compare_column.clone(),
                    String::new(),
                    compare.value(&pair.compare_column).to_string(),
                    String::new(),
                ]
            })
            .collect(),
    }
}

/// One-line human summary for stderr.
pub fn human_summary(result: &ReconResult) -> String {
    let s = &result.summary;
    format!(
        "{}: {} source rows, {} compare rows, {} matched, {} different, \
         {} missing in compare, {} missing in source",
        result.meta.name,
        s.source_rows,
        s.compare_rows,
        s.matches,
        s.differences,
        s.missing_in_compare,
        s.missing_in_source,
    )
}
