use serde_json::Value;
use time::format_description::{self, BorrowedFormatItem};
use time::OffsetDateTime;

use crate::error::MalformedReason;

/// Case sheet timestamp layout, always rendered in UTC.
pub const CASE_TIME_FORMAT: &str = "[month]/[day]/[year] [hour]:[minute]:[second]";

fn case_time_items() -> Result<Vec<BorrowedFormatItem<'static>>, MalformedReason> {
    // The layout is a constant; a parse failure here would be a programming error,
    // surfaced as OutOfRange rather than a panic.
    format_description::parse(CASE_TIME_FORMAT).map_err(|_| MalformedReason::OutOfRange)
}

/// Read an epoch-milliseconds field.
///
/// JSON integers are taken as-is; fractional values are floored to the millisecond.
/// Strings are rejected, even when they look numeric (no coercion).
pub fn epoch_ms_from_value(value: &Value) -> Result<i64, MalformedReason> {
    let Value::Number(n) = value else {
        return Err(MalformedReason::NotNumeric);
    };
    if let Some(ms) = n.as_i64() {
        return Ok(ms);
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.floor() as i64),
        Some(_) => Err(MalformedReason::OutOfRange),
        None => Err(MalformedReason::NotNumeric),
    }
}

pub fn datetime_from_epoch_ms(ms: i64) -> Result<OffsetDateTime, MalformedReason> {
    let nanos = i128::from(ms) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|_| MalformedReason::OutOfRange)
}

/// Format epoch milliseconds as `MM/DD/YYYY HH:MM:SS` UTC.
pub fn format_epoch_ms(ms: i64) -> Result<String, MalformedReason> {
    let dt = datetime_from_epoch_ms(ms)?;
    let items = case_time_items()?;
    dt.format(&items).map_err(|_| MalformedReason::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_epoch_ms_in_utc() {
        // 2026-01-02T03:04:05.678Z
        assert_eq!(
            format_epoch_ms(1_767_323_045_678).as_deref(),
            Ok("01/02/2026 03:04:05")
        );
        assert_eq!(format_epoch_ms(0).as_deref(), Ok("01/01/1970 00:00:00"));
    }

    #[test]
    fn rejects_non_numeric_and_out_of_range() {
        assert_eq!(
            epoch_ms_from_value(&json!("1767323045678")),
            Err(MalformedReason::NotNumeric)
        );
        assert_eq!(epoch_ms_from_value(&json!(true)), Err(MalformedReason::NotNumeric));
        assert_eq!(epoch_ms_from_value(&json!(1.5e300)), Err(MalformedReason::OutOfRange));
        assert_eq!(format_epoch_ms(i64::MAX), Err(MalformedReason::OutOfRange));
    }

    #[test]
    fn floors_fractional_millis() {
        assert_eq!(epoch_ms_from_value(&json!(1000.9)), Ok(1000));
        assert_eq!(epoch_ms_from_value(&json!(-0.5)), Ok(-1));
    }
}
