use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::{ColumnMapping, ComparisonSettings};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A parsed rectangular table of string cells.
///
/// Rows may be shorter than `headers` (missing trailing cells read as empty)
/// or longer (excess cells are ignored).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from string literals. Handy for fixtures and tests.
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Materialize row `index` into a [`Record`]. Returns `None` past the end.
    pub fn record(&self, index: usize) -> Option<Record> {
        self.rows.get(index).map(|row| Record::from_row(&self.headers, row))
    }

    /// Materialize every row, in table order.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.iter().map(|row| Record::from_row(&self.headers, row))
    }
}

/// One row keyed by column name, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Pair each header with the cell at the same position.
    pub fn from_row(headers: &[String], row: &[String]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { fields }
    }

    /// Cell value for `column`. With duplicate header names the last one wins.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Like [`Record::get`] but absent columns read as the empty string.
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Which of the two tables a column, key or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Compare,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Compare => write!(f, "compare"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

/// Side-by-side view of one mapped column for a matched key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnView {
    pub source_column: String,
    pub compare_column: String,
    pub source_value: String,
    pub compare_value: String,
    pub is_different: bool,
}

/// One classified logical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonRow {
    Match {
        key: String,
        source: Record,
        compare: Record,
        columns: Vec<ColumnView>,
    },
    Different {
        key: String,
        source: Record,
        compare: Record,
        columns: Vec<ColumnView>,
        /// Source-side names of the columns flagged different, in mapping order.
        differing_columns: Vec<String>,
    },
    MissingInCompare {
        key: String,
        source: Record,
    },
    MissingInSource {
        key: String,
        compare: Record,
    },
}

impl ComparisonRow {
    pub fn kind(&self) -> RowKind {
        match self {
            Self::Match { .. } => RowKind::Match,
            Self::Different { .. } => RowKind::Different,
            Self::MissingInCompare { .. } => RowKind::MissingInCompare,
            Self::MissingInSource { .. } => RowKind::MissingInSource,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Match { key, .. }
            | Self::Different { key, .. }
            | Self::MissingInCompare { key, .. }
            | Self::MissingInSource { key, .. } => key,
        }
    }

    pub fn source(&self) -> Option<&Record> {
        match self {
            Self::Match { source, .. }
            | Self::Different { source, .. }
            | Self::MissingInCompare { source, .. } => Some(source),
            Self::MissingInSource { .. } => None,
        }
    }

    pub fn compare(&self) -> Option<&Record> {
        match self {
            Self::Match { compare, .. }
            | Self::Different { compare, .. }
            | Self::MissingInSource { compare, .. } => Some(compare),
            Self::MissingInCompare { .. } => None,
        }
    }

    /// Unified per-column view; empty for rows missing on one side.
    pub fn columns(&self) -> &[ColumnView] {
        match self {
            Self::Match { columns, .. } | Self::Different { columns, .. } => columns,
            Self::MissingInCompare { .. } | Self::MissingInSource { .. } => &[],
        }
    }

    pub fn differing_columns(&self) -> &[String] {
        match self {
            Self::Different { differing_columns, .. } => differing_columns,
            _ => &[],
        }
    }
}

/// Variant tag of a [`ComparisonRow`], for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Match,
    Different,
    MissingInCompare,
    MissingInSource,
}

impl RowKind {
    pub const ALL: [RowKind; 4] = [
        RowKind::Match,
        RowKind::Different,
        RowKind::MissingInCompare,
        RowKind::MissingInSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Different => "different",
            Self::MissingInCompare => "missing_in_compare",
            Self::MissingInSource => "missing_in_source",
        }
    }
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let expected: Vec<&str> = RowKind::ALL.iter().map(RowKind::as_str).collect();
                format!("unknown row kind '{s}' (expected one of: {})", expected.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Index diagnostics
// ---------------------------------------------------------------------------

/// A join key shared by several rows of one table. Only the last row survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub side: Side,
    pub key: String,
    pub rows: usize,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDifferenceCount {
    pub column: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub source_rows: usize,
    pub compare_rows: usize,
    pub source_keys: usize,
    pub compare_keys: usize,
    pub matches: usize,
    pub differences: usize,
    pub missing_in_compare: usize,
    pub missing_in_source: usize,
    pub column_differences: Vec<ColumnDifferenceCount>,
}

impl ReconSummary {
    /// True when every key matched on both sides.
    pub fn is_clean(&self) -> bool {
        self.differences == 0 && self.missing_in_compare == 0 && self.missing_in_source == 0
    }

    pub fn count(&self, kind: RowKind) -> usize {
        match kind {
            RowKind::Match => self.matches,
            RowKind::Different => self.differences,
            RowKind::MissingInCompare => self.missing_in_compare,
            RowKind::MissingInSource => self.missing_in_source,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
    pub settings: ComparisonSettings,
    pub mapping: ColumnMapping,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub duplicates: Vec<DuplicateKey>,
    pub rows: Vec<ComparisonRow>,
}

impl ReconResult {
    /// Rows of the given kinds, in result order. An empty filter keeps everything.
    pub fn rows_of<'a>(&'a self, kinds: &'a [RowKind]) -> impl Iterator<Item = &'a ComparisonRow> {
        self.rows
            .iter()
            .filter(move |row| kinds.is_empty() || kinds.contains(&row.kind()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_pad_with_empty_cells() {
        let table = Table::from_strs(&["id", "name", "amount"], &[&["1"]]);
        let record = table.record(0).unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("name"), Some(""));
        assert_eq!(record.value("amount"), "");
    }

    #[test]
    fn long_rows_drop_excess_cells() {
        let table = Table::from_strs(&["id"], &[&["1", "extra", "more"]]);
        let record = table.record(0).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.value("id"), "1");
    }

    #[test]
    fn absent_column_reads_empty() {
        let table = Table::from_strs(&["id"], &[&["1"]]);
        let record = table.record(0).unwrap();
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.value("missing"), "");
    }

    #[test]
    fn duplicate_header_last_wins() {
        let table = Table::from_strs(&["id", "id"], &[&["first", "second"]]);
        assert_eq!(table.record(0).unwrap().value("id"), "second");
    }

    #[test]
    fn record_serializes_in_header_order() {
        let table = Table::from_strs(&["zeta", "alpha"], &[&["z", "a"]]);
        let json = serde_json::to_string(&table.record(0).unwrap()).unwrap();
        assert_eq!(json, r#"{"zeta":"z","alpha":"a"}"#);
    }

    #[test]
    fn row_kind_round_trips_through_str() {
        for kind in RowKind::ALL {
            assert_eq!(kind.as_str().parse::<RowKind>().unwrap(), kind);
        }
        assert!("matched".parse::<RowKind>().is_err());
    }

    #[test]
    fn comparison_row_tags_status() {
        let row = ComparisonRow::MissingInSource {
            key: "2".into(),
            compare: Table::from_strs(&["id"], &[&["2"]]).record(0).unwrap(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["status"], "missing_in_source");
        assert_eq!(json["compare"]["id"], "2");
        assert_eq!(row.kind(), RowKind::MissingInSource);
        assert!(row.source().is_none());
        assert!(row.columns().is_empty());
    }
}
