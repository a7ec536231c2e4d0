use serde_json::{Number, Value};

use crate::domain::{CaseClosure, CaseRecord, RawCaseRecord};
use crate::error::{MalformedReason, MalformedRecord};

pub mod timestamps;

use timestamps::{epoch_ms_from_value, format_epoch_ms};

fn text_field(index: usize, raw: &RawCaseRecord, field: &str) -> Result<String, MalformedRecord> {
    match raw.get(field) {
        None => Err(MalformedRecord::new(index, field, MalformedReason::Missing)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(number_text(n)),
        Some(_) => Err(MalformedRecord::new(index, field, MalformedReason::WrongType)),
    }
}

/// Integral floats print without the fraction: `2.0` reads as `"2"`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

fn epoch_field(index: usize, raw: &RawCaseRecord, field: &str) -> Result<Option<i64>, MalformedRecord> {
    raw.get(field)
        .map(|v| epoch_ms_from_value(v).map_err(|reason| MalformedRecord::new(index, field, reason)))
        .transpose()
}

fn formatted(index: usize, field: &str, ms: i64) -> Result<String, MalformedRecord> {
    format_epoch_ms(ms).map_err(|reason| MalformedRecord::new(index, field, reason))
}

/// Normalize one raw case into its canonical form.
///
/// Contract:
/// - `title`, `owner`, `severity` must be present as strings or numbers; values pass
///   through verbatim (empty strings included).
/// - `createdAt` must be numeric epoch milliseconds.
/// - `endDate` (when set) closes the case and requires `resolutionStatus`.
pub fn normalize(index: usize, raw: &RawCaseRecord) -> Result<CaseRecord, MalformedRecord> {
    let name = text_field(index, raw, "title")?;
    let owner = text_field(index, raw, "owner")?;
    let severity = text_field(index, raw, "severity")?;

    let created_ms = epoch_field(index, raw, "createdAt")?
        .ok_or_else(|| MalformedRecord::new(index, "createdAt", MalformedReason::Missing))?;
    let created = formatted(index, "createdAt", created_ms)?;

    let closure = match epoch_field(index, raw, "endDate")? {
        None => None,
        Some(end_ms) => {
            let resolution = match raw.get("resolutionStatus") {
                None => {
                    return Err(MalformedRecord::new(
                        index,
                        "resolutionStatus",
                        MalformedReason::ClosedWithoutResolution,
                    ))
                }
                Some(_) => text_field(index, raw, "resolutionStatus")?,
            };
            Some(CaseClosure {
                closed: formatted(index, "endDate", end_ms)?,
                resolution,
            })
        }
    };

    Ok(CaseRecord {
        name,
        owner,
        severity,
        created,
        created_ms,
        closure,
    })
}
