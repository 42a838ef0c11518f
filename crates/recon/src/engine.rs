use crate::config::{ColumnMapping, ComparisonSettings};
use crate::error::ReconError;
use crate::model::{ReconMeta, ReconResult, Side, Table};
use crate::reconcile::{index_table, reconcile_indexed};
use crate::summary::compute_summary;

/// Pre-loaded tables for one run.
#[derive(Debug, Clone)]
pub struct ReconInput {
    pub name: String,
    pub source: Table,
    pub compare: Table,
}

/// Reconcile `input` with one fixed mapping and settings snapshot.
/// Returns classified rows + summary + run metadata.
pub fn run(
    input: &ReconInput,
    mapping: &ColumnMapping,
    settings: &ComparisonSettings,
) -> ReconResult {
    let source_index = index_table(&input.source, mapping, Side::Source, settings);
    let compare_index = index_table(&input.compare, mapping, Side::Compare, settings);

    let rows = reconcile_indexed(&source_index, &compare_index, mapping, settings);
    let summary = compute_summary(&rows, mapping, &source_index, &compare_index);

    let mut duplicates = source_index.duplicates();
    duplicates.extend(compare_index.duplicates());

    log::info!(
        "{}: {} matched, {} different, {} missing in compare, {} missing in source",
        input.name,
        summary.matches,
        summary.differences,
        summary.missing_in_compare,
        summary.missing_in_source,
    );

    ReconResult {
        meta: ReconMeta {
            name: input.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            settings: *settings,
            mapping: mapping.clone(),
        },
        summary,
        duplicates,
        rows,
    }
}

/// Parse CSV text into a [`Table`]. The first record is the header row;
/// data rows may be shorter or longer than it.
pub fn load_csv_table(csv_data: &str, delimiter: u8) -> Result<Table, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(ReconError::Csv("no header row".into()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    log::debug!("loaded table: {} columns, {} rows", headers.len(), rows.len());
    Ok(Table::new(headers, rows))
}
