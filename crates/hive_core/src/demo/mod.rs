use serde_json::{json, Map};
use time::{Date, Duration};

use crate::domain::RawCaseRecord;
use crate::summary::{DEFAULT_TEAM_MEMBERS, RESOLUTION_LABELS};

const HOUR_MS: i64 = 60 * 60 * 1000;

fn noon_ms(day: Date) -> i64 {
    day.midnight().assume_utc().unix_timestamp() * 1000 + 12 * HOUR_MS
}

/// Sanitized, deterministic case list shaped like a TheHive `_search` response.
///
/// Cases are created every three days going back from `today`, so all three
/// windows are populated; every other case is closed with a rotating resolution.
pub fn demo_cases(today: Date) -> Vec<RawCaseRecord> {
    (0..40i64)
        .map(|i| {
            let created = noon_ms(today - Duration::days(i * 3));
            let owner = DEFAULT_TEAM_MEMBERS[i as usize % DEFAULT_TEAM_MEMBERS.len()];
            let mut fields = Map::new();
            fields.insert("title".to_string(), json!(format!("Demo case {}", i + 1)));
            fields.insert("owner".to_string(), json!(owner));
            fields.insert("severity".to_string(), json!((i % 3) + 1));
            fields.insert("createdAt".to_string(), json!(created));
            if i % 2 == 1 {
                fields.insert("endDate".to_string(), json!(created + (i + 1) * HOUR_MS));
                fields.insert(
                    "resolutionStatus".to_string(),
                    json!(RESOLUTION_LABELS[i as usize % RESOLUTION_LABELS.len()]),
                );
            }
            RawCaseRecord::new(fields)
        })
        .collect()
}
