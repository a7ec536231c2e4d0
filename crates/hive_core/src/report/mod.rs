use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::domain::{CaseRecord, Window, WindowBucket};
use crate::error::AppError;
use crate::summary::{CountsSummary, SummaryColumn};

pub const CHARTS_SHEET: &str = "Summary Charts";
pub const TRACKING_SHEET: &str = "Tracking";
pub const CASE_COLUMNS: [&str; 6] = ["Name", "Owner", "Severity", "Created", "Closed", "Resolution"];

/// Pie chart style index understood by xlsx renderers.
pub const CHART_STYLE: u8 = 10;

pub fn case_sheet_name(window: Window) -> &'static str {
    match window {
        Window::Within30 => "Cases newer than 30 Days",
        Window::Within60 => "Cases 30 to 60 Days",
        Window::Within90 => "Cases older than 60 Days",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    /// Nothing to show, e.g. `Closed` of a case that is still open.
    Empty,
    Text(String),
    Count(u64),
}

impl Cell {
    fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }

    fn optional_text(s: Option<&str>) -> Self {
        s.map(Cell::text).unwrap_or(Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Count(n) => write!(f, "{n}"),
        }
    }
}

/// One worksheet. Row 0 of the grid is the header (`columns`), data follows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn is_blank(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn cell(&self, at: CellRef) -> Cell {
        let col = at.col as usize;
        match at.row {
            0 => self
                .columns
                .get(col)
                .map(|c| Cell::text(c))
                .unwrap_or(Cell::Empty),
            r => self
                .rows
                .get(r as usize - 1)
                .and_then(|row| row.get(col))
                .cloned()
                .unwrap_or(Cell::Empty),
        }
    }
}

/// Zero-based cell coordinate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    pub fn column_letters(&self) -> String {
        let mut n = self.col + 1;
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        out.reverse();
        String::from_utf8_lossy(&out).into_owned()
    }

    /// `$B$1` form.
    pub fn absolute(&self) -> String {
        format!("${}${}", self.column_letters(), self.row + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letters(), self.row + 1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellRange {
    pub sheet: String,
    pub first: CellRef,
    pub last: CellRef,
}

impl CellRange {
    /// Spreadsheet formula reference, e.g. `=Tracking!$B$1:$C$1`.
    pub fn formula(&self) -> String {
        format!(
            "={}!{}:{}",
            quote_sheet_name(&self.sheet),
            self.first.absolute(),
            self.last.absolute()
        )
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> Vec<CellRef> {
        let mut out = Vec::new();
        for row in self.first.row..=self.last.row {
            for col in self.first.col..=self.last.col {
                out.push(CellRef::new(col, row));
            }
        }
        out
    }
}

fn quote_sheet_name(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SeriesData {
    Ranges {
        categories: CellRange,
        values: CellRange,
    },
    Literal {
        categories: Vec<String>,
        values: Vec<u64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Anchor {
    pub sheet: String,
    pub cell: CellRef,
    pub x_offset: u32,
    pub y_offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub series_name: String,
    pub data: SeriesData,
    pub anchor: Anchor,
    pub style: u8,
}

/// Everything a rendering collaborator needs to produce the workbook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportPayload {
    pub sheets: Vec<Sheet>,
    pub charts: Vec<ChartSpec>,
}

impl ExportPayload {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Replace range-linked series with literal arrays read from this payload's
    /// own sheets, keeping category order. For renderers without formula-linked charts.
    pub fn with_literal_charts(&self) -> Result<ExportPayload, AppError> {
        let mut charts = Vec::with_capacity(self.charts.len());
        for chart in &self.charts {
            let data = match &chart.data {
                SeriesData::Ranges { categories, values } => SeriesData::Literal {
                    categories: self
                        .read_range(categories)?
                        .into_iter()
                        .map(|c| c.to_string())
                        .collect(),
                    values: self
                        .read_range(values)?
                        .into_iter()
                        .map(|c| literal_value(&c, values))
                        .collect::<Result<Vec<_>, _>>()?,
                },
                literal => literal.clone(),
            };
            charts.push(ChartSpec {
                data,
                ..chart.clone()
            });
        }
        Ok(ExportPayload {
            sheets: self.sheets.clone(),
            charts,
        })
    }

    fn read_range(&self, range: &CellRange) -> Result<Vec<Cell>, AppError> {
        let sheet = self.sheet(&range.sheet).ok_or_else(|| {
            AppError::new("REPORT_CHART_RANGE_INVALID", "Chart range references a missing sheet")
                .with_details(range.formula())
        })?;
        Ok(range.cells().into_iter().map(|at| sheet.cell(at)).collect())
    }
}

fn literal_value(cell: &Cell, range: &CellRange) -> Result<u64, AppError> {
    match cell {
        Cell::Count(n) => Ok(*n),
        Cell::Empty => Ok(0),
        Cell::Text(s) => s.parse::<u64>().map_err(|e| {
            AppError::new("REPORT_CHART_RANGE_INVALID", "Chart value cell is not a count")
                .with_details(format!("range={}; value={s}; err={e}", range.formula()))
        }),
    }
}

fn case_row(record: &CaseRecord) -> Vec<Cell> {
    vec![
        Cell::text(&record.name),
        Cell::text(&record.owner),
        Cell::text(&record.severity),
        Cell::text(&record.created),
        Cell::optional_text(record.closed()),
        Cell::optional_text(record.resolution()),
    ]
}

pub fn case_sheet(window: Window, bucket: &WindowBucket) -> Sheet {
    Sheet {
        name: case_sheet_name(window).to_string(),
        columns: CASE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        // BTreeMap iteration is already key-ordered.
        rows: bucket.values().map(case_row).collect(),
    }
}

/// Summary sheet: column A holds row labels, then one column per summary column.
pub fn tracking_sheet(summary: &CountsSummary) -> Sheet {
    let columns = std::iter::once(String::new())
        .chain(SummaryColumn::ALL.iter().map(|c| c.label().to_string()))
        .collect();
    let rows = summary
        .rows
        .iter()
        .map(|row| {
            std::iter::once(Cell::text(&row.label))
                .chain(SummaryColumn::ALL.iter().map(|c| Cell::Count(row.get(*c))))
                .collect()
        })
        .collect();
    Sheet {
        name: TRACKING_SHEET.to_string(),
        columns,
        rows,
    }
}

fn column_index(column: SummaryColumn) -> u32 {
    // Column A is the label column.
    1 + SummaryColumn::ALL
        .iter()
        .position(|c| *c == column)
        .unwrap_or(0) as u32
}

/// Range over summary rows `rows` (0-based among data rows) in one grid column.
fn tracking_rows(col: u32, rows: Range<usize>) -> CellRange {
    CellRange {
        sheet: TRACKING_SHEET.to_string(),
        first: CellRef::new(col, rows.start as u32 + 1),
        last: CellRef::new(col, rows.end as u32),
    }
}

fn pie(title: &str, series_name: &str, anchor: CellRef, categories: CellRange, values: CellRange) -> ChartSpec {
    ChartSpec {
        title: title.to_string(),
        kind: ChartKind::Pie,
        series_name: series_name.to_string(),
        data: SeriesData::Ranges { categories, values },
        anchor: Anchor {
            sheet: CHARTS_SHEET.to_string(),
            cell: anchor,
            x_offset: 25,
            y_offset: 10,
        },
        style: CHART_STYLE,
    }
}

pub fn summary_charts(summary: &CountsSummary) -> Vec<ChartSpec> {
    let layout = &summary.layout;
    let created = column_index(SummaryColumn::Created);
    let closed = column_index(SummaryColumn::Closed);
    let totals_header = CellRange {
        sheet: TRACKING_SHEET.to_string(),
        first: CellRef::new(created, 0),
        last: CellRef::new(closed, 0),
    };
    let totals_values = CellRange {
        sheet: TRACKING_SHEET.to_string(),
        first: CellRef::new(created, 1),
        last: CellRef::new(closed, 1),
    };

    vec![
        pie(
            "New vs. Closed Cases",
            "Open vs. Closed Cases Last 30",
            CellRef::new(3, 1),
            totals_header,
            totals_values,
        ),
        pie(
            "Case Ownership",
            "Case Ownership Last 30",
            CellRef::new(12, 18),
            tracking_rows(0, layout.members_rows()),
            tracking_rows(column_index(SummaryColumn::Owner), layout.members_rows()),
        ),
        pie(
            "Case Resolution",
            "Case Resolution Last 30",
            CellRef::new(3, 18),
            tracking_rows(0, layout.resolution_rows()),
            tracking_rows(column_index(SummaryColumn::Resolution), layout.resolution_rows()),
        ),
        pie(
            "Case Severities",
            "Severity Last 30",
            CellRef::new(12, 1),
            tracking_rows(0, layout.severity_rows()),
            tracking_rows(column_index(SummaryColumn::Severity), layout.severity_rows()),
        ),
    ]
}

/// Compose the case sheets, the summary sheet and the chart specs.
///
/// Sheet order: chart sheet, newest to oldest window, then the summary sheet.
pub fn assemble(
    b30: &WindowBucket,
    b60: &WindowBucket,
    b90: &WindowBucket,
    summary: &CountsSummary,
) -> ExportPayload {
    let charts_sheet = Sheet {
        name: CHARTS_SHEET.to_string(),
        columns: Vec::new(),
        rows: Vec::new(),
    };

    ExportPayload {
        sheets: vec![
            charts_sheet,
            case_sheet(Window::Within30, b30),
            case_sheet(Window::Within60, b60),
            case_sheet(Window::Within90, b90),
            tracking_sheet(summary),
        ],
        charts: summary_charts(summary),
    }
}
