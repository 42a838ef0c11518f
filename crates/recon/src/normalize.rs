//! Cell normalization: turns a raw cell string into a comparison-ready value.
//!
//! Numbers are recognised after stripping currency symbols, thousands
//! separators and internal whitespace, then rounded half away from zero to
//! the configured precision. Finite numbers beyond the exact-decimal range
//! are kept as `f64`. Anything else is text, optionally case-folded.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::ComparisonSettings;

const CURRENCY_SYMBOLS: [char; 5] = ['$', '€', '£', '¥', '₹'];

/// A normalized cell.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    /// Rounded to the run's precision, trailing zeros stripped, never `-0`.
    Numeric(Decimal),
    /// Finite number too large for [`Decimal`]. Always integral, so rounding
    /// to any precision leaves it unchanged.
    Wide(f64),
    /// Non-numeric cell as it will be compared. Blank cells are `Text("")`.
    Text(String),
}

impl NormalizedValue {
    /// The exact value; `None` for text and for [`NormalizedValue::Wide`].
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Wide(_) | Self::Text(_) => None,
        }
    }

    /// Any numeric value as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(n) => n.to_f64(),
            Self::Wide(x) => Some(*x),
            Self::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            // f64 Display never uses exponent notation.
            Self::Wide(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Normalize `raw` to its canonical string form.
pub fn normalize(raw: &str, settings: &ComparisonSettings) -> String {
    normalize_value(raw, settings).to_string()
}

/// Normalize `raw` into a numeric or textual value.
pub fn normalize_value(raw: &str, settings: &ComparisonSettings) -> NormalizedValue {
    if raw.trim().is_empty() {
        return NormalizedValue::Text(String::new());
    }

    let value = if settings.trim_whitespace { raw.trim() } else { raw };

    // "12.0" style exports are integers; drop the suffix before numeric parsing.
    let candidate = value.strip_suffix(".0").unwrap_or(value);
    let cleaned: String = candidate
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();

    let Some(literal) = Literal::parse(&cleaned) else {
        return text(value, settings);
    };

    let exact = literal
        .to_decimal()
        .or_else(|| literal.to_f64().and_then(|x| Decimal::try_from(x).ok()));
    match (exact, literal.to_f64()) {
        (Some(number), _) => {
            NormalizedValue::Numeric(round_to_precision(number, settings.effective_precision()))
        }
        (None, Some(wide)) => NormalizedValue::Wide(wide),
        // Syntactically a number but infinite as f64, e.g. "1e999".
        (None, None) => text(value, settings),
    }
}

fn text(value: &str, settings: &ComparisonSettings) -> NormalizedValue {
    if settings.ignore_case {
        NormalizedValue::Text(value.to_lowercase())
    } else {
        NormalizedValue::Text(value.to_string())
    }
}

/// Round half away from zero to `precision` places, in canonical form.
pub fn round_to_precision(number: Decimal, precision: u32) -> Decimal {
    let rounded = number
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Exponents beyond this magnitude skip the exact-decimal path.
const MAX_EXPONENT: u32 = 64;

/// A syntactically valid number: optional sign, digits with at most one
/// decimal point, optional exponent.
struct Literal {
    negative: bool,
    /// Canonical unsigned mantissa, e.g. `"0.3"` for `".3"`.
    mantissa: String,
    exponent: i64,
}

impl Literal {
    fn parse(s: &str) -> Option<Self> {
        let (mantissa, exponent) = match s.find(['e', 'E']) {
            Some(i) => (&s[..i], Some(&s[i + 1..])),
            None => (s, None),
        };

        let (negative, unsigned) = split_sign(mantissa);
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if int_part.len() + frac_part.len() == 0 || !all_digits(int_part) || !all_digits(frac_part)
        {
            return None;
        }

        let mantissa = match (int_part.is_empty(), frac_part.is_empty()) {
            (true, _) => format!("0.{frac_part}"),
            (false, true) => int_part.to_string(),
            (false, false) => format!("{int_part}.{frac_part}"),
        };
        let exponent = match exponent {
            Some(exp) => parse_exponent(exp)?,
            None => 0,
        };

        Some(Self { negative, mantissa, exponent })
    }

    /// Exact value, or `None` when it does not fit a [`Decimal`].
    fn to_decimal(&self) -> Option<Decimal> {
        if self.exponent.unsigned_abs() > u64::from(MAX_EXPONENT) {
            return None;
        }
        let number = apply_exponent(Decimal::from_str(&self.mantissa).ok()?, self.exponent)?;
        Some(if self.negative { -number } else { number })
    }

    /// Nearest finite `f64`, or `None` when the value overflows it.
    fn to_f64(&self) -> Option<f64> {
        let sign = if self.negative { "-" } else { "" };
        let x: f64 = format!("{sign}{}e{}", self.mantissa, self.exponent).parse().ok()?;
        x.is_finite().then_some(x)
    }
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    }
}

fn all_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

/// Parse a plain decimal literal exactly. Values that are not numbers, or
/// do not fit a [`Decimal`], give `None`.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    Literal::parse(s)?.to_decimal()
}

fn parse_exponent(exp: &str) -> Option<i64> {
    let (negative, digits) = split_sign(exp);
    if digits.is_empty() || !all_digits(digits) {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn apply_exponent(number: Decimal, exponent: i64) -> Option<Decimal> {
    (0..exponent.unsigned_abs()).try_fold(number, |n, _| {
        if exponent > 0 {
            n.checked_mul(Decimal::TEN)
        } else {
            n.checked_div(Decimal::TEN)
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
