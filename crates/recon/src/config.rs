use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::{Side, Table};

/// Largest number of decimal places the exact-decimal path can represent.
/// Higher precisions behave as this value.
pub const MAX_PRECISION: u32 = 28;

// ---------------------------------------------------------------------------
// Comparison settings
// ---------------------------------------------------------------------------

/// Normalization knobs, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonSettings {
    /// Decimal places numbers are rounded to; also sets the tolerance `10^-p`.
    #[serde(default = "default_precision")]
    pub numeric_precision: u32,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default = "default_trim")]
    pub trim_whitespace: bool,
}

fn default_precision() -> u32 {
    2
}

fn default_trim() -> bool {
    true
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            numeric_precision: default_precision(),
            ignore_case: false,
            trim_whitespace: default_trim(),
        }
    }
}

impl ComparisonSettings {
    /// Precision clamped to what the decimal representation supports.
    pub fn effective_precision(&self) -> u32 {
        self.numeric_precision.min(MAX_PRECISION)
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingPair {
    #[serde(rename = "source")]
    pub source_column: String,
    #[serde(rename = "compare")]
    pub compare_column: String,
    /// Part of the join key. When no pair is flagged, every pair is.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub key: bool,
}

impl MappingPair {
    pub fn new(source_column: impl Into<String>, compare_column: impl Into<String>) -> Self {
        Self {
            source_column: source_column.into(),
            compare_column: compare_column.into(),
            key: false,
        }
    }

    /// A pair explicitly designated as (part of) the join key.
    pub fn keyed(source_column: impl Into<String>, compare_column: impl Into<String>) -> Self {
        Self {
            key: true,
            ..Self::new(source_column, compare_column)
        }
    }

    pub fn column(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source_column,
            Side::Compare => &self.compare_column,
        }
    }
}

/// Ordered source→compare column pairs. Order defines join-key layout.
///
/// Each source column appears at most once: re-inserting one replaces the
/// earlier pair in place. Compare columns may repeat. Pairs flagged `key`
/// form the join key; with none flagged, all pairs do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<MappingPair>", into = "Vec<MappingPair>")]
pub struct ColumnMapping {
    pairs: Vec<MappingPair>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_column: impl Into<String>, compare_column: impl Into<String>) {
        self.upsert(MappingPair::new(source_column, compare_column));
    }

    /// Insert a pair that is part of the join key.
    pub fn insert_key(
        &mut self,
        source_column: impl Into<String>,
        compare_column: impl Into<String>,
    ) {
        self.upsert(MappingPair::keyed(source_column, compare_column));
    }

    /// Add `pair`, or overwrite the pair with the same source column in place.
    pub fn upsert(&mut self, pair: MappingPair) {
        match self
            .pairs
            .iter_mut()
            .find(|p| p.source_column == pair.source_column)
        {
            Some(existing) => *existing = pair,
            None => self.pairs.push(pair),
        }
    }

    /// Builder-style [`ColumnMapping::insert`].
    pub fn with(
        mut self,
        source_column: impl Into<String>,
        compare_column: impl Into<String>,
    ) -> Self {
        self.insert(source_column, compare_column);
        self
    }

    /// Builder-style [`ColumnMapping::insert_key`].
    pub fn with_key(
        mut self,
        source_column: impl Into<String>,
        compare_column: impl Into<String>,
    ) -> Self {
        self.insert_key(source_column, compare_column);
        self
    }

    /// Pairs that make up the join key: the flagged ones, or all of them when
    /// none is flagged.
    pub fn key_pairs(&self) -> impl Iterator<Item = &MappingPair> {
        let any_flagged = self.pairs.iter().any(|p| p.key);
        self.pairs.iter().filter(move |p| p.key || !any_flagged)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappingPair> {
        self.pairs.iter()
    }

    pub fn pairs(&self) -> &[MappingPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Check every mapped column exists in the corresponding table.
    pub fn validate_against(&self, source: &Table, compare: &Table) -> Result<(), ReconError> {
        if self.is_empty() {
            return Err(ReconError::EmptyMapping);
        }
        for pair in &self.pairs {
            if !source.has_column(&pair.source_column) {
                return Err(ReconError::UnknownColumn {
                    side: Side::Source,
                    column: pair.source_column.clone(),
                });
            }
            if !compare.has_column(&pair.compare_column) {
                return Err(ReconError::UnknownColumn {
                    side: Side::Compare,
                    column: pair.compare_column.clone(),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<MappingPair>> for ColumnMapping {
    fn from(pairs: Vec<MappingPair>) -> Self {
        let mut mapping = ColumnMapping::new();
        for pair in pairs {
            mapping.upsert(pair);
        }
        mapping
    }
}

impl From<ColumnMapping> for Vec<MappingPair> {
    fn from(mapping: ColumnMapping) -> Self {
        mapping.pairs
    }
}

impl<'a> IntoIterator for &'a ColumnMapping {
    type Item = &'a MappingPair;
    type IntoIter = std::slice::Iter<'a, MappingPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

// ---------------------------------------------------------------------------
// Run config file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub source: TableSource,
    pub compare: TableSource,
    #[serde(default)]
    pub settings: ComparisonSettings,
    #[serde(default)]
    pub mapping: ColumnMapping,
}

/// Where one side's CSV lives. `file` is relative to the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSource {
    pub file: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl TableSource {
    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ReconError> {
        delimiter_byte(self.delimiter)
    }
}

fn default_name() -> String {
    "reconciliation".into()
}

fn default_delimiter() -> char {
    ','
}

pub fn delimiter_byte(delimiter: char) -> Result<u8, ReconError> {
    if delimiter.is_ascii() && delimiter != '"' && delimiter != '\n' && delimiter != '\r' {
        Ok(delimiter as u8)
    } else {
        Err(ReconError::ConfigValidation(format!(
            "delimiter must be a single ASCII character other than quote or newline, \
             got {delimiter:?}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (side, source) in [(Side::Source, &self.source), (Side::Compare, &self.compare)] {
            if source.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{side}: file must not be empty")));
            }
            source.delimiter_byte()?;
        }

        if self.mapping.is_empty() {
            return Err(ReconError::EmptyMapping);
        }

        for (i, pair) in self.mapping.iter().enumerate() {
            if pair.source_column.is_empty() || pair.compare_column.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "mapping entry {}: column names must not be empty",
                    i + 1
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
