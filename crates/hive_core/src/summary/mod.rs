use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{ValidationWarning, WindowBucket};
use crate::error::AppError;

pub const TOTALS_LABEL: &str = "totals";
pub const RESOLUTION_LABELS: [&str; 3] = ["Duplicated", "TruePositive", "FalsePositive"];
pub const SEVERITY_LABELS: [&str; 3] = ["1", "2", "3"];

pub const DEFAULT_TEAM_MEMBERS: [&str; 7] = [
    "Team.Member",
    "Team.Member1",
    "Team.Member2",
    "Team.Member3",
    "Team.Member4",
    "Team.Member5",
    "Team.Member6",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SummaryColumn {
    Created,
    Closed,
    Owner,
    Resolution,
    Severity,
}

impl SummaryColumn {
    pub const ALL: [SummaryColumn; 5] = [
        SummaryColumn::Created,
        SummaryColumn::Closed,
        SummaryColumn::Owner,
        SummaryColumn::Resolution,
        SummaryColumn::Severity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SummaryColumn::Created => "Created",
            SummaryColumn::Closed => "Closed",
            SummaryColumn::Owner => "Owner",
            SummaryColumn::Resolution => "Resolution",
            SummaryColumn::Severity => "Severity",
        }
    }
}

/// Ordered, closed set of summary row labels.
///
/// Layout: `totals`, the team roster, the three resolutions, the three severities.
/// Chart ranges are positional over this order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryLayout {
    team_members: Vec<String>,
}

impl Default for SummaryLayout {
    fn default() -> Self {
        Self {
            team_members: DEFAULT_TEAM_MEMBERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl SummaryLayout {
    /// Build a layout for a team roster. Labels must be non-empty and unique across
    /// the whole row set, otherwise two rows would claim the same counts.
    pub fn new(team_members: Vec<String>) -> Result<Self, AppError> {
        if team_members.is_empty() {
            return Err(AppError::new(
                "SUMMARY_LAYOUT_INVALID",
                "Team roster must name at least one member",
            ));
        }
        let layout = Self { team_members };
        let mut seen = BTreeSet::new();
        for label in layout.row_labels() {
            if label.trim().is_empty() {
                return Err(AppError::new(
                    "SUMMARY_LAYOUT_INVALID",
                    "Summary row labels must not be empty",
                ));
            }
            if !seen.insert(label.clone()) {
                return Err(AppError::new(
                    "SUMMARY_LAYOUT_INVALID",
                    "Summary row labels must be unique",
                )
                .with_details(format!("label={label}")));
            }
        }
        Ok(layout)
    }

    pub fn team_members(&self) -> &[String] {
        &self.team_members
    }

    pub fn row_labels(&self) -> Vec<String> {
        std::iter::once(TOTALS_LABEL.to_string())
            .chain(self.team_members.iter().cloned())
            .chain(RESOLUTION_LABELS.iter().map(|l| l.to_string()))
            .chain(SEVERITY_LABELS.iter().map(|l| l.to_string()))
            .collect()
    }

    /// Row positions (0-based, among summary rows) of each labelled group.
    pub fn members_rows(&self) -> std::ops::Range<usize> {
        1..1 + self.team_members.len()
    }

    pub fn resolution_rows(&self) -> std::ops::Range<usize> {
        let start = self.members_rows().end;
        start..start + RESOLUTION_LABELS.len()
    }

    pub fn severity_rows(&self) -> std::ops::Range<usize> {
        let start = self.resolution_rows().end;
        start..start + SEVERITY_LABELS.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRow {
    pub label: String,
    pub created: u64,
    pub closed: u64,
    pub owner: u64,
    pub resolution: u64,
    pub severity: u64,
}

impl SummaryRow {
    fn zero(label: String) -> Self {
        Self {
            label,
            created: 0,
            closed: 0,
            owner: 0,
            resolution: 0,
            severity: 0,
        }
    }

    pub fn get(&self, column: SummaryColumn) -> u64 {
        match column {
            SummaryColumn::Created => self.created,
            SummaryColumn::Closed => self.closed,
            SummaryColumn::Owner => self.owner,
            SummaryColumn::Resolution => self.resolution,
            SummaryColumn::Severity => self.severity,
        }
    }
}

/// An observed value with no row of its own in the fixed layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnplacedCount {
    pub column: SummaryColumn,
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountsSummary {
    pub layout: SummaryLayout,
    pub rows: Vec<SummaryRow>,
    pub unplaced: Vec<UnplacedCount>,
}

impl CountsSummary {
    pub fn row(&self, label: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Cell lookup; unknown labels read as 0 like any unobserved cell.
    pub fn cell(&self, label: &str, column: SummaryColumn) -> u64 {
        self.row(label).map(|r| r.get(column)).unwrap_or(0)
    }

    pub fn totals(&self) -> Option<&SummaryRow> {
        self.row(TOTALS_LABEL)
    }

    pub fn warnings(&self) -> Vec<ValidationWarning> {
        self.unplaced
            .iter()
            .map(|u| {
                ValidationWarning::new(
                    "SUMMARY_VALUE_UNPLACED",
                    format!("{} value has no summary row", u.column.label()),
                )
                .with_details(format!("value={}; count={}", u.value, u.count))
            })
            .collect()
    }
}

fn frequencies<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, u64> {
    let mut out: BTreeMap<String, u64> = BTreeMap::new();
    for v in values {
        *out.entry(v.to_string()).or_default() += 1;
    }
    out
}

/// Aggregate the most recent window into the fixed-row summary.
///
/// Frequency tables are aligned to the row labels; every label not observed reads 0.
pub fn aggregate(recent: &WindowBucket, layout: &SummaryLayout) -> CountsSummary {
    let owners = frequencies(recent.values().map(|r| r.owner.as_str()));
    let resolutions = frequencies(recent.values().filter_map(|r| r.resolution()));
    let severities = frequencies(recent.values().map(|r| r.severity.as_str()));

    let mut rows = layout
        .row_labels()
        .into_iter()
        .map(|label| {
            let mut row = SummaryRow::zero(label);
            row.owner = owners.get(&row.label).copied().unwrap_or(0);
            row.resolution = resolutions.get(&row.label).copied().unwrap_or(0);
            row.severity = severities.get(&row.label).copied().unwrap_or(0);
            row
        })
        .collect::<Vec<_>>();

    rows[0].created = recent.len() as u64;
    rows[0].closed = recent.values().filter(|r| r.is_closed()).count() as u64;

    let labels = rows.iter().map(|r| r.label.as_str()).collect::<BTreeSet<_>>();
    let mut unplaced = Vec::new();
    for (column, freq) in [
        (SummaryColumn::Owner, &owners),
        (SummaryColumn::Resolution, &resolutions),
        (SummaryColumn::Severity, &severities),
    ] {
        for (value, count) in freq {
            if !labels.contains(value.as_str()) {
                warn!(column = column.label(), value = %value, count, "value has no summary row");
                unplaced.push(UnplacedCount {
                    column,
                    value: value.clone(),
                    count: *count,
                });
            }
        }
    }

    debug!(
        created = rows[0].created,
        closed = rows[0].closed,
        unplaced = unplaced.len(),
        "aggregated recent window"
    );

    CountsSummary {
        layout: layout.clone(),
        rows,
        unplaced,
    }
}
