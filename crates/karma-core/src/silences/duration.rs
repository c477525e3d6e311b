use std::time::Duration;

use crate::error::EngineError;

/// Parses a silence duration such as `2h`, `90m`, `1h30m`, `1d` or `1w`.
///
/// Units are `s`, `m`, `h`, `d` and `w`. Every number needs a unit, and
/// components may repeat in any order (`30m1h` equals `1h30m`). Whitespace may
/// separate components (`1h 30m`) or a number from its unit (`2 h`), but not
/// split a number (`1 5m` is rejected).
///
/// # Errors
///
/// Returns [`EngineError::InvalidSilenceRequest`] for empty, malformed, zero or
/// overflowing input.
pub fn parse_duration(raw: &str) -> Result<Duration, EngineError> {
    let invalid = |reason: &str| {
        EngineError::InvalidSilenceRequest(format!("invalid duration '{raw}': {reason}"))
    };

    let input = raw.trim().to_ascii_lowercase();
    if input.is_empty() {
        return Err(invalid("empty"));
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    // Set when whitespace follows pending digits; only a unit may come next.
    let mut spaced = false;

    for ch in input.chars() {
        if ch.is_ascii_digit() {
            if spaced {
                return Err(invalid("whitespace inside a number"));
            }
            digits.push(ch);
            continue;
        }
        if ch.is_whitespace() {
            spaced = !digits.is_empty();
            continue;
        }
        spaced = false;

        let unit_secs: u64 = match ch {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return Err(invalid("unknown unit, expected one of s, m, h, d, w")),
        };
        if digits.is_empty() {
            return Err(invalid("unit without a number"));
        }

        let amount: u64 = digits.parse().map_err(|_| invalid("number too large"))?;
        total = amount
            .checked_mul(unit_secs)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| invalid("too large"))?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(invalid("number without a unit"));
    }
    if total == 0 {
        return Err(invalid("must be positive"));
    }

    Ok(Duration::from_secs(total))
}

/// Renders a duration in the largest whole units, e.g. `1h30m`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    const UNITS: [(u64, char); 5] =
        [(604_800, 'w'), (86_400, 'd'), (3_600, 'h'), (60, 'm'), (1, 's')];

    let mut remaining = duration.as_secs();
    if remaining == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit_secs, suffix) in UNITS {
        let amount = remaining / unit_secs;
        if amount > 0 {
            out.push_str(&amount.to_string());
            out.push(suffix);
            remaining %= unit_secs;
        }
    }
    out
}
