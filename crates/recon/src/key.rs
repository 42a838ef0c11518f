use crate::config::{ColumnMapping, ComparisonSettings};
use crate::model::{Record, Side};
use crate::normalize::normalize;

/// Joins normalized key parts. Not expected inside normalized values.
pub const KEY_SEPARATOR: &str = "|";

/// Build the join key for `record`: every key column on `side` (see
/// [`ColumnMapping::key_pairs`]), normalized, in mapping order, joined with
/// [`KEY_SEPARATOR`].
///
/// Keys are only comparable when built from the same mapping and settings.
/// An empty mapping yields `""` for every record.
pub fn build_key(
    record: &Record,
    mapping: &ColumnMapping,
    side: Side,
    settings: &ComparisonSettings,
) -> String {
    mapping
        .key_pairs()
        .map(|pair| normalize(record.value(pair.column(side)), settings))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}
