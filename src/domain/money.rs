use std::fmt;

use serde::{Deserialize, Deserializer};

/// Money is represented as integer cents to avoid floating-point precision issues.
/// €50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a plain decimal string, the way the server echoes balances.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}", sign, format_magnitude(cents))
}

/// Unsigned "units.cents" text; `unsigned_abs` keeps `i64::MIN` printable.
fn format_magnitude(cents: Cents) -> String {
    let abs_cents = cents.unsigned_abs();
    format!("{}.{:02}", abs_cents / 100, abs_cents % 100)
}

/// Format cents with the Italian decimal separator and euro suffix.
/// Example: 13500 -> "135,00 €", -4000 -> "-40,00 €"
pub fn format_euro(cents: Cents) -> String {
    format!("{} €", format_cents(cents).replace('.', ","))
}

/// Format cents for a ledger row: always signed when negative, optionally
/// signed when positive.
/// Example: 5000 -> "+50.00 €" (with `show_plus`), -5000 -> "-50.00 €"
pub fn format_signed_euro(cents: Cents, show_plus: bool) -> String {
    let plain = format_magnitude(cents);
    if cents < 0 {
        format!("-{} €", plain)
    } else if show_plus {
        format!("+{} €", plain)
    } else {
        format!("{} €", plain)
    }
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
///
/// At most one leading minus is accepted. Amounts too large for [`Cents`]
/// are rejected rather than wrapped.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    if input.is_empty() || input.starts_with('-') || input.starts_with('+') && negative {
        return Err(ParseCentsError::InvalidFormat);
    }

    let parts: Vec<&str> = input.split('.').collect();
    let cents = match parts.len() {
        1 => {
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParseCentsError::InvalidFormat)?;
            units.checked_mul(100)
        }
        2 => {
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?
            };

            let decimal_str = parts[1];
            if !decimal_str.chars().all(|c| c.is_ascii_digit()) {
                return Err(ParseCentsError::InvalidFormat);
            }
            let decimal_cents: i64 = match decimal_str.len() {
                0 => 0,
                // "5" means 50 cents
                1 => decimal_str
                    .parse::<i64>()
                    .map_err(|_| ParseCentsError::InvalidFormat)?
                    * 10,
                2 => decimal_str
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?,
                // Truncate anything past the second decimal
                _ => decimal_str[..2]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?,
            };

            units
                .checked_mul(100)
                .and_then(|c| c.checked_add(decimal_cents))
        }
        _ => return Err(ParseCentsError::InvalidFormat),
    };

    let cents = cents.ok_or(ParseCentsError::InvalidFormat)?;
    Ok(if negative { -cents } else { cents })
}

/// Lenient numeric coercion for operator-typed fields.
///
/// Accepts a comma as decimal separator and an optional trailing euro sign.
/// Anything that does not parse counts as zero.
pub fn coerce_cents(input: &str) -> Cents {
    let cleaned = input.trim().trim_end_matches('€').trim().replace(',', ".");
    parse_cents(&cleaned).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

/// Sign classification of an amount, used to pick alert or success styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
}

impl Tone {
    /// Negative amounts are alerts, everything else is fine.
    pub fn of(cents: Cents) -> Self {
        if cents < 0 { Tone::Danger } else { Tone::Success }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Success => "success",
            Tone::Danger => "danger",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deserialize an amount sent either as a decimal string ("-15.00") or as a
/// JSON number (-15.0).
pub fn deserialize_cents<'de, D>(deserializer: D) -> Result<Cents, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => parse_cents(&s).map_err(serde::de::Error::custom),
        Raw::Int(units) => units
            .checked_mul(100)
            .ok_or_else(|| serde::de::Error::custom("amount out of range")),
        Raw::Float(value) => {
            let cents = (value * 100.0).round();
            if cents.is_finite() && cents.abs() < Cents::MAX as f64 {
                Ok(cents as Cents)
            } else {
                Err(serde::de::Error::custom("amount out of range"))
            }
        }
    }
}

/// Optional variant of [`deserialize_cents`] for fields the server may omit.
pub fn deserialize_opt_cents<'de, D>(deserializer: D) -> Result<Option<Cents>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_cents")] Cents);

    Option::<Wrapper>::deserialize(deserializer).map(|w| w.map(|Wrapper(c)| c))
}
