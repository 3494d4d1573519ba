//! Parsing of the human readable quantities printed by `docker stats`.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// A whole token: a number, optional whitespace, then a unit.
static QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d*)?)\s*([A-Za-z%]*)$").unwrap());

/// The leading quantity of a token, anything after the unit is an annotation.
static LEADING_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d*)?)\s*([A-Za-z%]*)").unwrap());

const MIB: f64 = (1 << 20) as f64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown unit `{unit}` in `{raw}`")]
    UnknownUnit { unit: String, raw: String },
    #[error("Invalid number in `{0}`")]
    InvalidNumber(String),
    #[error("Expected a `<tx> / <rx>` pair, got `{0}`")]
    InvalidPair(String),
    #[error("Invalid timestamp `{0}`")]
    InvalidTimestamp(String),
    #[error("Expected at least {expected} fields in row `{row}`")]
    MalformedRow { expected: usize, row: String },
}

/// Byte units recognised in the I/O columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Byte,
    /// Decimal kilobyte, `kB`
    Kilobyte,
    /// Binary kilobyte, `kiB`
    Kibibyte,
    /// Decimal megabyte, `MB`
    Megabyte,
    /// Binary megabyte, `MiB`
    Mebibyte,
}

impl Unit {
    /// Number of bytes in one of this unit.
    pub fn factor(self) -> f64 {
        match self {
            Unit::Byte => 1.0,
            Unit::Kilobyte => 1e3,
            Unit::Kibibyte => 1024.0,
            Unit::Megabyte => 1e6,
            Unit::Mebibyte => MIB,
        }
    }
}

impl FromStr for Unit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(Unit::Byte),
            "kB" => Ok(Unit::Kilobyte),
            "kiB" => Ok(Unit::Kibibyte),
            "MB" => Ok(Unit::Megabyte),
            "MiB" => Ok(Unit::Mebibyte),
            _ => Err(()),
        }
    }
}

/// Split a token into its magnitude and unit symbol.
fn split_quantity<'a>(regex: &Regex, raw: &'a str) -> Result<(f64, &'a str), ParseError> {
    let captures = regex
        .captures(raw)
        .ok_or_else(|| ParseError::InvalidNumber(raw.to_string()))?;
    let (_, [number, unit]) = captures.extract();
    let value = number
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))?;
    Ok((value, unit))
}

fn unit_of(unit: &str, raw: &str) -> Result<Unit, ParseError> {
    Unit::from_str(unit).map_err(|_| ParseError::UnknownUnit {
        unit: unit.to_string(),
        raw: raw.to_string(),
    })
}

/// Parse a byte quantity such as `1.5kB` or `3 MiB` into bytes.
pub fn parse_bytes(raw: &str) -> Result<f64, ParseError> {
    let raw = raw.trim();
    let (value, unit) = split_quantity(&QUANTITY, raw)?;
    Ok(value * unit_of(unit, raw)?.factor())
}

/// Parse a cpu percentage such as `250.00%`.
///
/// Docker reports 100% per fully used core, the result is divided by `core_count` so that it is
/// relative to the whole machine.
pub fn parse_cpu(raw: &str, core_count: u16) -> Result<f64, ParseError> {
    let raw = raw.trim();
    let (value, unit) = split_quantity(&QUANTITY, raw)?;
    if unit != "%" {
        return Err(ParseError::UnknownUnit {
            unit: unit.to_string(),
            raw: raw.to_string(),
        });
    }
    Ok(value / f64::from(core_count))
}

/// Parse a memory usage column such as `10.5MiB / 15.5GiB` into MiB.
///
/// Only the leading quantity is read, the limit that follows it is ignored. A usage in `GiB` has
/// no entry in the unit table and is an [ParseError::UnknownUnit].
pub fn parse_mem_mib(raw: &str) -> Result<f64, ParseError> {
    let raw = raw.trim();
    let (value, unit) = split_quantity(&LEADING_QUANTITY, raw)?;
    match unit_of(unit, raw)? {
        Unit::Mebibyte => Ok(value),
        other => Ok(value * other.factor() / MIB),
    }
}

/// Parse a `<tx> / <rx>` pair of byte quantities.
pub fn parse_io_pair(raw: &str) -> Result<(f64, f64), ParseError> {
    let (tx, rx) = raw
        .split_once('/')
        .ok_or_else(|| ParseError::InvalidPair(raw.trim().to_string()))?;
    Ok((parse_bytes(tx)?, parse_bytes(rx)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_is_divided_by_core_count() {
        assert_eq!(2.5, parse_cpu("30.00%", 12).unwrap());
        assert_eq!(30.0, parse_cpu("30%", 1).unwrap());
        assert_eq!(0.0, parse_cpu(" 0.00% ", 12).unwrap());
    }

    #[test]
    fn cpu_without_percent_is_rejected() {
        assert!(matches!(
            parse_cpu("30.00", 12),
            Err(ParseError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn byte_units_scale_by_their_factor() {
        assert_eq!(12.0, parse_bytes("12B").unwrap());
        assert_eq!(1500.0, parse_bytes("1.5kB").unwrap());
        assert_eq!(2048.0, parse_bytes("2kiB").unwrap());
        assert_eq!(3_000_000.0, parse_bytes("3MB").unwrap());
        assert_eq!(4.0 * 1024.0 * 1024.0, parse_bytes("4 MiB").unwrap());
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert_eq!(
            Err(ParseError::UnknownUnit {
                unit: "TB".to_string(),
                raw: "1.2TB".to_string()
            }),
            parse_bytes("1.2TB")
        );
        assert!(matches!(
            parse_bytes("7"),
            Err(ParseError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn malformed_number_is_rejected() {
        assert!(matches!(
            parse_bytes("kB"),
            Err(ParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_bytes("1.2.3kB"),
            Err(ParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn memory_ignores_the_limit() {
        assert_eq!(10.5, parse_mem_mib("10.5MiB / 15.5GiB").unwrap());
        assert_eq!(0.5, parse_mem_mib("512kiB / 15.5GiB").unwrap());
    }

    #[test]
    fn memory_in_gib_is_rejected() {
        let err = parse_mem_mib("1.2GiB / 15.5GiB").unwrap_err();
        assert!(matches!(err, ParseError::UnknownUnit { unit, .. } if unit == "GiB"));
    }

    #[test]
    fn io_pair_parses_both_sides() {
        assert_eq!(
            (1200.0, 3.0 * 1024.0),
            parse_io_pair("1.2kB / 3kiB").unwrap()
        );
        assert_eq!((0.0, 0.0), parse_io_pair("0B / 0B").unwrap());
    }

    #[test]
    fn io_without_separator_is_rejected() {
        assert_eq!(
            Err(ParseError::InvalidPair("1.2kB".to_string())),
            parse_io_pair("1.2kB")
        );
    }
}
