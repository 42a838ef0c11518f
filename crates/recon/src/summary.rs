use crate::config::ColumnMapping;
use crate::model::{ColumnDifferenceCount, ComparisonRow, ReconSummary};
use crate::reconcile::KeyIndex;

/// Compute summary statistics from classified rows and the indexes they came from.
pub fn compute_summary(
    rows: &[ComparisonRow],
    mapping: &ColumnMapping,
    source: &KeyIndex,
    compare: &KeyIndex,
) -> ReconSummary {
    let mut summary = ReconSummary {
        source_rows: source.row_count(),
        compare_rows: compare.row_count(),
        source_keys: source.len(),
        compare_keys: compare.len(),
        column_differences: mapping
            .iter()
            .map(|pair| ColumnDifferenceCount {
                column: pair.source_column.clone(),
                count: 0,
            })
            .collect(),
        ..ReconSummary::default()
    };

    for row in rows {
        match row {
            ComparisonRow::Match { .. } => summary.matches += 1,
            ComparisonRow::Different { differing_columns, .. } => {
                summary.differences += 1;
                for column in differing_columns {
                    if let Some(entry) = summary
                        .column_differences
                        .iter_mut()
                        .find(|c| &c.column == column)
                    {
                        entry.count += 1;
                    }
                }
            }
            ComparisonRow::MissingInCompare { .. } => summary.missing_in_compare += 1,
            ComparisonRow::MissingInSource { .. } => summary.missing_in_source += 1,
        }
    }

    summary
}
