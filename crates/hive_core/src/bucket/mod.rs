use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{Date, Duration};
use tracing::{debug, warn};

use crate::domain::{CaseRecord, RawCaseRecord, Window, WindowBucket};
use crate::error::{MalformedReason, MalformedRecord};
use crate::normalize::normalize;

/// What to do with a record that fails normalization.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectPolicy {
    /// Collect the defect in `WindowedCases::rejected` and keep going.
    #[default]
    Skip,
    /// Stop at the first malformed record.
    Abort,
}

/// Window boundaries in epoch milliseconds (UTC midnight of `today - N days`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCutoffs {
    pub within30_after_ms: i64,
    pub within60_after_ms: i64,
}

impl WindowCutoffs {
    pub fn for_today(today: Date) -> Self {
        Self {
            within30_after_ms: midnight_ms(today - Duration::days(30)),
            within60_after_ms: midnight_ms(today - Duration::days(60)),
        }
    }

    /// First match wins; both comparisons are strict.
    pub fn classify(&self, created_ms: i64) -> Window {
        if created_ms > self.within30_after_ms {
            Window::Within30
        } else if created_ms > self.within60_after_ms {
            Window::Within60
        } else {
            Window::Within90
        }
    }
}

fn midnight_ms(day: Date) -> i64 {
    let ts = day.midnight().assume_utc().unix_timestamp();
    ts.saturating_mul(1000)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowedCases {
    pub within30: WindowBucket,
    pub within60: WindowBucket,
    pub within90: WindowBucket,
    pub rejected: Vec<MalformedRecord>,
}

impl WindowedCases {
    pub fn bucket(&self, window: Window) -> &WindowBucket {
        match window {
            Window::Within30 => &self.within30,
            Window::Within60 => &self.within60,
            Window::Within90 => &self.within90,
        }
    }

    fn bucket_mut(&mut self, window: Window) -> &mut WindowBucket {
        match window {
            Window::Within30 => &mut self.within30,
            Window::Within60 => &mut self.within60,
            Window::Within90 => &mut self.within90,
        }
    }

    pub fn accepted_count(&self) -> usize {
        self.within30.len() + self.within60.len() + self.within90.len()
    }

    pub fn contains_key(&self, key: usize) -> bool {
        Window::ALL.iter().any(|w| self.bucket(*w).contains_key(&key))
    }

    /// Place an already normalized record. A key held by any window is never
    /// overwritten; the rejected record is handed back.
    pub fn insert(
        &mut self,
        cutoffs: &WindowCutoffs,
        key: usize,
        record: CaseRecord,
    ) -> Result<Window, CaseRecord> {
        if self.contains_key(key) {
            return Err(record);
        }
        let window = cutoffs.classify(record.created_ms);
        self.bucket_mut(window).insert(key, record);
        Ok(window)
    }
}

/// Normalize and classify every record into exactly one recency window.
///
/// Keys must be unique. A repeated key is a `DuplicateKey` defect and the first
/// record keeps the slot. With `RejectPolicy::Skip` every defective record lands
/// in `rejected` and in no bucket, so accepted plus rejected equals the input.
pub fn bucket<'a, I>(records: I, today: Date, policy: RejectPolicy) -> Result<WindowedCases, MalformedRecord>
where
    I: IntoIterator<Item = (usize, &'a RawCaseRecord)>,
{
    let cutoffs = WindowCutoffs::for_today(today);
    let mut out = WindowedCases::default();

    let mut seen = BTreeSet::new();

    for (index, raw) in records {
        let placed = if seen.insert(index) {
            normalize(index, raw).and_then(|record| {
                out.insert(&cutoffs, index, record)
                    .map(|_| ())
                    .map_err(|_| MalformedRecord::new(index, "key", MalformedReason::DuplicateKey))
            })
        } else {
            Err(MalformedRecord::new(index, "key", MalformedReason::DuplicateKey))
        };

        match placed {
            Ok(()) => {}
            Err(err) => match policy {
                RejectPolicy::Abort => return Err(err),
                RejectPolicy::Skip => {
                    warn!(index = err.index, field = %err.field, "skipping malformed case record: {err}");
                    out.rejected.push(err);
                }
            },
        }
    }

    debug!(
        within30 = out.within30.len(),
        within60 = out.within60.len(),
        within90 = out.within90.len(),
        rejected = out.rejected.len(),
        "bucketed case records"
    );
    Ok(out)
}
