//! Step timeout strings such as `10m` or `1h30m`

use crate::error::{ChainError, Result};

const UNITS: &[(&str, u64)] = &[
    ("w", 7 * 24 * 60 * 60 * 1000),
    ("d", 24 * 60 * 60 * 1000),
    ("h", 60 * 60 * 1000),
    ("m", 60 * 1000),
    ("s", 1000),
    ("ms", 1),
];

/// Converts a timeout string into milliseconds.
///
/// Accepts any sequence of `<number><unit>` pairs with units `w`, `d`, `h`,
/// `m`, `s` and `ms`, optionally separated by whitespace.
pub fn parse_timeout_millis(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(value));
    }

    let mut total: u64 = 0;
    let mut chars = trimmed.chars().filter(|c| !c.is_whitespace()).peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(c);
            chars.next();
        }
        let mut unit = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
            unit.push(c.to_ascii_lowercase());
            chars.next();
        }

        if digits.is_empty() || unit.is_empty() {
            return Err(invalid(value));
        }
        let amount: u64 = digits.parse().map_err(|_| invalid(value))?;
        let factor = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, factor)| *factor)
            .ok_or_else(|| invalid(value))?;
        total = total.saturating_add(amount.saturating_mul(factor));
    }

    if total == 0 {
        return Err(invalid(value));
    }
    Ok(total)
}

fn invalid(value: &str) -> ChainError {
    ChainError::config(format!("Invalid timeout value: [{}]", value))
}
