//! Set reconciliation of two tables by join key.
//!
//! Both tables are indexed by key (last row wins on a duplicate key, keeping
//! the key's first position). Source keys are then walked in order and
//! classified against the compare index; compare keys never seen on the
//! source side follow at the end.

use std::collections::HashMap;

use crate::compare::compare_column;
use crate::config::{ColumnMapping, ComparisonSettings};
use crate::key::build_key;
use crate::model::{ComparisonRow, DuplicateKey, Record, Side, Table};

// ---------------------------------------------------------------------------
// Key index
// ---------------------------------------------------------------------------

/// Records of one table keyed by join key, in first-insertion order.
#[derive(Debug, Clone)]
pub struct KeyIndex {
    side: Side,
    entries: Vec<(String, Record)>,
    positions: HashMap<String, usize>,
    rows_per_key: Vec<usize>,
    row_count: usize,
}

impl KeyIndex {
    fn new(side: Side) -> Self {
        Self {
            side,
            entries: Vec::new(),
            positions: HashMap::new(),
            rows_per_key: Vec::new(),
            row_count: 0,
        }
    }

    /// Insert a record. A repeated key replaces the earlier record in place.
    fn insert(&mut self, key: String, record: Record) {
        self.row_count += 1;
        match self.positions.get(&key) {
            Some(&pos) => {
                self.entries[pos].1 = record;
                self.rows_per_key[pos] += 1;
            }
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, record));
                self.rows_per_key.push(1);
            }
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.positions.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// (key, surviving record) pairs in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    /// Distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows fed into the index, before collapsing duplicate keys.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Keys shared by more than one row, in first-insertion order.
    pub fn duplicates(&self) -> Vec<DuplicateKey> {
        self.entries
            .iter()
            .zip(&self.rows_per_key)
            .filter(|(_, rows)| **rows > 1)
            .map(|((key, _), &rows)| DuplicateKey {
                side: self.side,
                key: key.clone(),
                rows,
            })
            .collect()
    }
}

/// Index every row of `table` by its join key on `side`.
pub fn index_table(
    table: &Table,
    mapping: &ColumnMapping,
    side: Side,
    settings: &ComparisonSettings,
) -> KeyIndex {
    let mut index = KeyIndex::new(side);
    for record in table.records() {
        let key = build_key(&record, mapping, side, settings);
        index.insert(key, record);
    }

    let dropped = index.row_count() - index.len();
    if dropped > 0 {
        log::warn!(
            "{side} table: {dropped} row(s) dropped, \
             {} key(s) shared by several rows (last row wins)",
            index.duplicates().len()
        );
    }
    log::debug!("{side} index: {} rows, {} keys", index.row_count(), index.len());

    index
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Classify every logical record of `source` and `compare`.
///
/// Output: one row per source key in source order (match, different or
/// missing in compare), then one row per compare-only key in compare order.
/// The mapping is not validated; an empty mapping puts every row under the
/// key `""`.
pub fn reconcile(
    source: &Table,
    compare: &Table,
    mapping: &ColumnMapping,
    settings: &ComparisonSettings,
) -> Vec<ComparisonRow> {
    let source_index = index_table(source, mapping, Side::Source, settings);
    let compare_index = index_table(compare, mapping, Side::Compare, settings);
    reconcile_indexed(&source_index, &compare_index, mapping, settings)
}

/// [`reconcile`] over indexes that were already built with `mapping` and `settings`.
pub fn reconcile_indexed(
    source: &KeyIndex,
    compare: &KeyIndex,
    mapping: &ColumnMapping,
    settings: &ComparisonSettings,
) -> Vec<ComparisonRow> {
    if mapping.is_empty() {
        log::warn!("reconciling with an empty column mapping: all rows share one key");
    }

    let mut rows = Vec::with_capacity(source.len() + compare.len());

    for (key, source_record) in source.iter() {
        let row = match compare.get(key) {
            Some(compare_record) => {
                classify_pair(key, source_record, compare_record, mapping, settings)
            }
            None => ComparisonRow::MissingInCompare {
                key: key.to_string(),
                source: source_record.clone(),
            },
        };
        rows.push(row);
    }

    for (key, compare_record) in compare.iter() {
        if !source.contains_key(key) {
            rows.push(ComparisonRow::MissingInSource {
                key: key.to_string(),
                compare: compare_record.clone(),
            });
        }
    }

    rows
}

fn classify_pair(
    key: &str,
    source: &Record,
    compare: &Record,
    mapping: &ColumnMapping,
    settings: &ComparisonSettings,
) -> ComparisonRow {
    let columns: Vec<_> = mapping
        .iter()
        .map(|pair| compare_column(pair, source, compare, settings))
        .collect();

    let differing_columns: Vec<String> = columns
        .iter()
        .filter(|c| c.is_different)
        .map(|c| c.source_column.clone())
        .collect();

    if differing_columns.is_empty() {
        ComparisonRow::Match {
            key: key.to_string(),
            source: source.clone(),
            compare: compare.clone(),
            columns,
        }
    } else {
        ComparisonRow::Different {
            key: key.to_string(),
            source: source.clone(),
            compare: compare.clone(),
            columns,
            differing_columns,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
