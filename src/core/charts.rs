//! Chart data ranges and anchor placement

use super::cell::CellRef;
use super::formulas::AggregatePlan;
use super::layout::{BandKind, DeviceBand, TableLayout, LIFETIME_COLUMN};
use crate::config::ChartConfig;
use crate::types::Tag;

/// A single-column block of cells, rows inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpan {
    pub col: u16,
    pub first_row: u32,
    pub last_row: u32,
}

impl ColumnSpan {
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.first_row..=self.last_row).map(move |row| CellRef::new(row, self.col))
    }
}

//==============================================================================
// Lifetime charts
//==============================================================================

/// One "charge vs. lifetime" series for one density column of one band
#[derive(Debug, Clone, PartialEq)]
pub struct LifetimeSeries {
    pub device: String,
    pub kind: BandKind,
    pub density: Tag,
    pub categories: ColumnSpan,
    pub values: ColumnSpan,
}

/// Density columns of `band` worth charting.
///
/// The category axis is the lifetime column over the band's rows minus
/// `excluded_trailing_rows`; a column with no value in that range is skipped.
pub fn select_lifetime_series(
    layout: &TableLayout,
    band: &DeviceBand,
    plan: &AggregatePlan,
    excluded_trailing_rows: u32,
) -> Vec<LifetimeSeries> {
    if band.row_count() <= excluded_trailing_rows {
        tracing::debug!(device = %band.device, "every row excluded from charts");
        return Vec::new();
    }
    let first_row = band.start_row;
    let last_row = band.end_row - 1 - excluded_trailing_rows;

    layout
        .pool()
        .columns()
        .filter_map(|(density, rel_col)| {
            let values = ColumnSpan {
                col: layout.data_column(rel_col),
                first_row,
                last_row,
            };
            if !values.cells().any(|cell| plan.is_filled(cell)) {
                return None;
            }
            Some(LifetimeSeries {
                device: band.device.clone(),
                kind: band.kind,
                density: density.clone(),
                categories: ColumnSpan {
                    col: LIFETIME_COLUMN,
                    first_row,
                    last_row,
                },
                values,
            })
        })
        .collect()
}

/// Packs charts two per row-block: left, right, then down by one chart height
#[derive(Debug, Clone)]
pub struct ChartFlow {
    row: u32,
    left: bool,
    left_column: u16,
    right_column: u16,
    rows_per_chart: u32,
    padding_rows: u32,
}

impl ChartFlow {
    pub fn new(start_row: u32, config: &ChartConfig, padding_rows: u32) -> Self {
        Self {
            row: start_row,
            left: true,
            left_column: config.left_column,
            right_column: config.right_column,
            rows_per_chart: config.rows_per_chart,
            padding_rows,
        }
    }

    /// Cell for a section label; charts start on the row below
    pub fn begin_section(&mut self) -> CellRef {
        let label = CellRef::new(self.row, self.left_column);
        self.row += 1;
        label
    }

    pub fn next_anchor(&mut self) -> CellRef {
        let col = if self.left {
            self.left_column
        } else {
            self.right_column
        };
        let anchor = CellRef::new(self.row, col);
        self.left = !self.left;
        if self.left {
            self.row += self.rows_per_chart;
        }
        anchor
    }

    /// Close a half-filled pair and leave a padding gap
    pub fn end_section(&mut self) {
        if !self.left {
            self.row += self.rows_per_chart;
            self.left = true;
        }
        self.row += self.padding_rows;
    }

    pub fn row(&self) -> u32 {
        self.row
    }
}

//==============================================================================
// Density-as-category transposition
//==============================================================================

pub const TRANSPOSED_CATEGORY_COLUMN: u16 = 1;
pub const TRANSPOSED_HEADER_ROW: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct TransposedColumn {
    pub voltage: Tag,
    /// Aggregate row this column reads from
    pub source_row: u32,
    pub col: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransposedRow {
    pub density: Tag,
    /// Aggregate column this row reads from
    pub source_col: u16,
    pub row: u32,
}

/// One lifetime slice of a device table, one row per density and one column per voltage
#[derive(Debug, Clone, PartialEq)]
pub struct TransposePlan {
    pub device: String,
    pub columns: Vec<TransposedColumn>,
    pub rows: Vec<TransposedRow>,
}

impl TransposePlan {
    /// `None` when no pool row has the requested lifetime
    pub fn build(layout: &TableLayout, band: &DeviceBand, lifetime: f64) -> Option<Self> {
        let columns: Vec<TransposedColumn> = layout
            .pool()
            .rows()
            .filter(|(_, lt, _)| lt.approx_eq(lifetime))
            .zip(TRANSPOSED_CATEGORY_COLUMN + 1..)
            .map(|((voltage, _, rel_row), col)| TransposedColumn {
                voltage: voltage.clone(),
                source_row: band.absolute_row(rel_row),
                col,
            })
            .collect();
        if columns.is_empty() {
            return None;
        }

        let rows = layout
            .pool()
            .columns()
            .zip(TRANSPOSED_HEADER_ROW + 1..)
            .map(|((density, rel_col), row)| TransposedRow {
                density: density.clone(),
                source_col: layout.data_column(rel_col),
                row,
            })
            .collect();

        Some(Self {
            device: band.device.clone(),
            columns,
            rows,
        })
    }

    pub fn source_cell(&self, row: &TransposedRow, column: &TransposedColumn) -> CellRef {
        CellRef::new(column.source_row, row.source_col)
    }

    pub fn last_row(&self) -> u32 {
        TRANSPOSED_HEADER_ROW + self.rows.len() as u32
    }

    pub fn last_column(&self) -> u16 {
        TRANSPOSED_CATEGORY_COLUMN + self.columns.len() as u16
    }

    /// Density values, the category axis of the chart
    pub fn categories(&self) -> ColumnSpan {
        ColumnSpan {
            col: TRANSPOSED_CATEGORY_COLUMN,
            first_row: TRANSPOSED_HEADER_ROW + 1,
            last_row: self.last_row(),
        }
    }

    /// Voltage columns holding at least one value
    pub fn charted_columns(&self, plan: &AggregatePlan) -> Vec<&TransposedColumn> {
        self.columns
            .iter()
            .filter(|column| {
                self.rows
                    .iter()
                    .any(|row| plan.is_filled(self.source_cell(row, column)))
            })
            .collect()
    }

    /// Chart sits one blank column right of the table
    pub fn chart_anchor(&self) -> CellRef {
        CellRef::new(TRANSPOSED_HEADER_ROW, self.last_column() + 2)
    }
}
