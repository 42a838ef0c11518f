use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::{ComparisonSettings, MappingPair, MAX_PRECISION};
use crate::model::{ColumnView, Record};
use crate::normalize::{normalize_value, NormalizedValue};

/// Numeric tolerance for `precision`: `10^-precision`, with precision
/// clamped to [`MAX_PRECISION`].
///
/// Values must be strictly closer than this to compare equal.
pub fn tolerance(precision: u32) -> Decimal {
    Decimal::new(1, precision.min(MAX_PRECISION))
}

/// Whether two raw cells are equal under `settings`.
///
/// Numbers compare by distance (`|a - b| < tolerance`); anything else compares
/// by normalized string. Not the same relation as join-key equality, which is
/// string equality of the normalized form.
pub fn values_equal(a: &str, b: &str, settings: &ComparisonSettings) -> bool {
    normalized_equal(
        &normalize_value(a, settings),
        &normalize_value(b, settings),
        settings,
    )
}

pub fn normalized_equal(
    a: &NormalizedValue,
    b: &NormalizedValue,
    settings: &ComparisonSettings,
) -> bool {
    let tolerance = tolerance(settings.effective_precision());
    match (a, b) {
        (NormalizedValue::Numeric(x), NormalizedValue::Numeric(y)) => x
            .checked_sub(*y)
            .is_some_and(|delta| delta.abs() < tolerance),
        (NormalizedValue::Text(x), NormalizedValue::Text(y)) => x == y,
        (NormalizedValue::Text(_), _) | (_, NormalizedValue::Text(_)) => false,
        // At least one side is beyond the Decimal range.
        _ => match (a.as_f64(), b.as_f64(), tolerance.to_f64()) {
            (Some(x), Some(y), Some(tolerance)) => (x - y).abs() < tolerance,
            _ => false,
        },
    }
}

/// Side-by-side view of one mapped column. Two empty cells never differ.
pub fn compare_column(
    pair: &MappingPair,
    source: &Record,
    compare: &Record,
    settings: &ComparisonSettings,
) -> ColumnView {
    let source_value = source.value(&pair.source_column);
    let compare_value = compare.value(&pair.compare_column);
    let both_empty = source_value.is_empty() && compare_value.is_empty();

    ColumnView {
        source_column: pair.source_column.clone(),
        compare_column: pair.compare_column.clone(),
        source_value: source_value.to_string(),
        compare_value: compare_value.to_string(),
        is_different: !both_empty && !values_equal(source_value, compare_value, settings),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
