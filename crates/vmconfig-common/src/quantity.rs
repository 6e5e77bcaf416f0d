//! Resource quantity parsing and conversion to platform units
//!
//! Quantities use the Kubernetes grammar (`"100Mi"`, `"500m"`, `"1.5"`, `"2e3"`).
//! They are parsed exactly into nano-units so that the desired and live sides of
//! a comparison go through identical integer arithmetic. Any floating point
//! rounding here would show up as a false delta on every reconciliation pass.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::{Error, Result};

const NANOS_PER_UNIT: i128 = 1_000_000_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const BYTES_PER_MB: i128 = 1024 * 1024;

/// Largest power of ten that fits in an i128 with headroom for a mantissa
const MAX_POW10: u32 = 38;

/// A non-negative quantity held in nano-units
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedQuantity {
    nanos: i128,
}

enum Scale {
    Binary(u32),
    Decimal(i32),
}

impl ParsedQuantity {
    /// Parse a quantity string
    ///
    /// Fractional nano-units round up, matching how Kubernetes canonicalizes.
    /// Negative quantities are rejected: every quantity the engine sees sizes a
    /// resource.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let s = raw.trim();
        if s.is_empty() {
            return Err("quantity is empty".to_string());
        }

        let (negative, s) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let number_end = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(number_end);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if frac_part.contains('.') {
            return Err("quantity has more than one decimal point".to_string());
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err("quantity has no digits".to_string());
        }

        let digits = format!("{int_part}{frac_part}");
        let digits = digits.trim_start_matches('0');
        let mantissa: i128 = if digits.is_empty() {
            0
        } else {
            digits
                .parse()
                .map_err(|_| "quantity mantissa is too large".to_string())?
        };
        let frac_len =
            i32::try_from(frac_part.len()).map_err(|_| "quantity is too long".to_string())?;

        if mantissa != 0 && negative {
            return Err("quantity must not be negative".to_string());
        }

        let nanos = match parse_suffix(suffix)? {
            Scale::Binary(shift) => {
                let scaled = mantissa
                    .checked_mul(1i128 << shift)
                    .and_then(|m| m.checked_mul(NANOS_PER_UNIT))
                    .ok_or_else(|| "quantity is too large".to_string())?;
                ceil_div(scaled, pow10(frac_len)?)
            }
            Scale::Decimal(exp) => {
                let shift = exp + 9 - frac_len;
                if shift >= 0 {
                    mantissa
                        .checked_mul(pow10(shift)?)
                        .ok_or_else(|| "quantity is too large".to_string())?
                } else if -shift > MAX_POW10 as i32 {
                    i128::from(mantissa > 0)
                } else {
                    ceil_div(mantissa, pow10(-shift)?)
                }
            }
        };

        Ok(Self { nanos })
    }

    /// Returns true if the quantity is zero
    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    /// Value in thousandths of a unit, rounded up
    pub fn milli_value(&self) -> i128 {
        ceil_div(self.nanos, NANOS_PER_MILLI)
    }

    /// Value in whole units, rounded up
    pub fn value(&self) -> i128 {
        ceil_div(self.nanos, NANOS_PER_UNIT)
    }
}

fn parse_suffix(suffix: &str) -> std::result::Result<Scale, String> {
    let scale = match suffix {
        "" => Scale::Decimal(0),
        "Ki" => Scale::Binary(10),
        "Mi" => Scale::Binary(20),
        "Gi" => Scale::Binary(30),
        "Ti" => Scale::Binary(40),
        "Pi" => Scale::Binary(50),
        "Ei" => Scale::Binary(60),
        "n" => Scale::Decimal(-9),
        "u" => Scale::Decimal(-6),
        "m" => Scale::Decimal(-3),
        "k" => Scale::Decimal(3),
        "M" => Scale::Decimal(6),
        "G" => Scale::Decimal(9),
        "T" => Scale::Decimal(12),
        "P" => Scale::Decimal(15),
        "E" => Scale::Decimal(18),
        other => {
            let exp = other
                .strip_prefix('e')
                .or_else(|| other.strip_prefix('E'))
                .and_then(|e| e.parse::<i32>().ok())
                .ok_or_else(|| format!("unknown suffix '{other}'"))?;
            if exp.unsigned_abs() > MAX_POW10 {
                return Err(format!("exponent {exp} is out of range"));
            }
            Scale::Decimal(exp)
        }
    };
    Ok(scale)
}

fn pow10(exp: i32) -> std::result::Result<i128, String> {
    u32::try_from(exp)
        .ok()
        .filter(|e| *e <= MAX_POW10)
        .map(|e| 10i128.pow(e))
        .ok_or_else(|| "quantity is too large".to_string())
}

/// Integer division rounding toward positive infinity (divisor must be positive)
fn ceil_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    if n % d > 0 {
        q + 1
    } else {
        q
    }
}

/// Parse a quantity, attributing failures to `field`
pub fn parse_quantity(field: &str, quantity: &Quantity) -> Result<ParsedQuantity> {
    ParsedQuantity::parse(&quantity.0)
        .map_err(|message| Error::invalid_quantity(field, &quantity.0, message))
}

/// Parse an optional quantity, treating absent and zero quantities as "not requested"
pub fn requested_quantity(
    field: &str,
    quantity: Option<&Quantity>,
) -> Result<Option<ParsedQuantity>> {
    match quantity {
        None => Ok(None),
        Some(q) => {
            let parsed = parse_quantity(field, q)?;
            Ok((!parsed.is_zero()).then_some(parsed))
        }
    }
}

/// Convert a CPU quantity into MHz relative to the slowest host frequency
///
/// One full CPU is worth `min_freq_mhz`; the result is rounded up.
pub fn cpu_quantity_to_mhz(
    field: &str,
    quantity: &ParsedQuantity,
    min_freq_mhz: u64,
) -> Result<i64> {
    let mhz = quantity
        .milli_value()
        .checked_mul(i128::from(min_freq_mhz))
        .map(|m| ceil_div(m, 1000))
        .and_then(|m| i64::try_from(m).ok());
    mhz.ok_or_else(|| {
        Error::invalid_quantity(
            field,
            format!("{}m", quantity.milli_value()),
            "CPU quantity overflows MHz",
        )
    })
}

/// Convert a memory quantity into megabytes (MiB), rounded up
pub fn memory_quantity_to_mb(field: &str, quantity: &ParsedQuantity) -> Result<i64> {
    i64::try_from(ceil_div(quantity.value(), BYTES_PER_MB)).map_err(|_| {
        Error::invalid_quantity(
            field,
            quantity.value().to_string(),
            "memory quantity overflows MB",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn q(s: &str) -> ParsedQuantity {
        ParsedQuantity::parse(s).unwrap()
    }

    #[rstest]
    #[case("1", 1)]
    #[case("1500Mi", 1500 * 1024 * 1024)]
    #[case("1Gi", 1 << 30)]
    #[case("1.5Gi", 3 << 29)]
    #[case("2k", 2000)]
    #[case("500m", 1)]
    #[case("1e3", 1000)]
    #[case("1E3", 1000)]
    #[case("+4", 4)]
    #[case("0.5", 1)]
    #[case(".5", 1)]
    #[case("0", 0)]
    fn parses_whole_units(#[case] input: &str, #[case] expected: i128) {
        assert_eq!(q(input).value(), expected);
    }

    #[rstest]
    #[case("100m", 100)]
    #[case("1", 1000)]
    #[case("0.25", 250)]
    #[case("100Mi", 100 * 1024 * 1024 * 1000)]
    #[case("1u", 1)]
    #[case("1n", 1)]
    fn parses_milli_units(#[case] input: &str, #[case] expected: i128) {
        assert_eq!(q(input).milli_value(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("100x")]
    #[case("Mi")]
    #[case("1.2.3")]
    #[case("-1")]
    #[case("-100Mi")]
    #[case("1e99")]
    #[case("99999999999999999999999999999999999999999Ei")]
    fn rejects_malformed(#[case] input: &str) {
        assert!(ParsedQuantity::parse(input).is_err(), "{input} should fail");
    }

    #[test]
    fn negative_zero_is_zero() {
        assert!(q("-0").is_zero());
    }

    #[test]
    fn cpu_conversion_uses_frequency_reference() {
        // 100Mi of CPU at 1 MHz per CPU is 100 * 2^20 MHz
        assert_eq!(
            cpu_quantity_to_mhz("cpu", &q("100Mi"), 1).unwrap(),
            100 * 1024 * 1024
        );
        assert_eq!(cpu_quantity_to_mhz("cpu", &q("500m"), 2000).unwrap(), 1000);
        assert_eq!(cpu_quantity_to_mhz("cpu", &q("2"), 2100).unwrap(), 4200);
        // rounds up
        assert_eq!(cpu_quantity_to_mhz("cpu", &q("1m"), 1).unwrap(), 1);
    }

    #[test]
    fn memory_conversion_rounds_up_to_mb() {
        assert_eq!(memory_quantity_to_mb("mem", &q("100Mi")).unwrap(), 100);
        assert_eq!(memory_quantity_to_mb("mem", &q("2000Mi")).unwrap(), 2000);
        assert_eq!(memory_quantity_to_mb("mem", &q("1Gi")).unwrap(), 1024);
        assert_eq!(memory_quantity_to_mb("mem", &q("500M")).unwrap(), 477);
        assert_eq!(memory_quantity_to_mb("mem", &q("1")).unwrap(), 1);
    }

    #[test]
    fn identical_quantities_convert_identically() {
        let a = memory_quantity_to_mb("a", &q("1536Mi")).unwrap();
        let b = memory_quantity_to_mb("b", &q("1.5Gi")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn requested_quantity_treats_zero_as_absent() {
        assert_eq!(requested_quantity("f", None).unwrap(), None);
        let zero = Quantity("0".to_string());
        assert_eq!(requested_quantity("f", Some(&zero)).unwrap(), None);
        let one = Quantity("1Mi".to_string());
        assert!(requested_quantity("f", Some(&one)).unwrap().is_some());
    }

    #[test]
    fn parse_quantity_reports_field() {
        let bad = Quantity("lots".to_string());
        let err = parse_quantity("policies.limits.memory", &bad).unwrap_err();
        match err {
            Error::InvalidQuantity { field, value, .. } => {
                assert_eq!(field, "policies.limits.memory");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
