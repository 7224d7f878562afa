//! Shared coordinate pool and vertical stacking of device tables
//!
//! Every device table on the aggregate sheet has the same rows (one per
//! `(voltage, lifetime)` seen anywhere) and the same columns (one per density
//! seen anywhere). Tables are stacked in equal-height bands, followed by one
//! synthetic band for normalized values:
//!
//! ```text
//! row  1  PC:
//! row  2  Voltage | Lifetime | Charge (D=1.00e-4) | ...
//! row  3  5V      | 1.00e-3  | ='PC 5V ...'!E2    | ...      <- band.start_row
//! ...                                                        <- band.end_row (exclusive)
//! ```

use super::cell::CellRef;
use super::hierarchy::Hierarchy;
use crate::types::{ExperimentKey, Tag};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

pub const VOLTAGE_COLUMN: u16 = 1;
pub const LIFETIME_COLUMN: u16 = 2;

/// Relative rows and columns start at 1
const RELATIVE_DATA_START: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    /// Rows above each table's data (device label and column headers). At least 2.
    pub non_data_rows: u32,
    /// Label columns left of the density columns (voltage, lifetime)
    pub non_data_columns: u16,
    /// Blank rows between bands and between chart sections
    pub padding_rows: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            non_data_rows: 2,
            non_data_columns: 2,
            padding_rows: 1,
        }
    }
}

//==============================================================================
// Coordinate Pool
//==============================================================================

/// Relative row per `(voltage, lifetime)` and relative column per density,
/// shared by every device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatePool {
    rows: BTreeMap<(Tag, Tag), u32>,
    columns: BTreeMap<Tag, u16>,
}

impl CoordinatePool {
    pub fn allocate(hierarchy: &Hierarchy) -> Self {
        let mut pairs = BTreeSet::new();
        let mut densities = BTreeSet::new();
        for key in hierarchy.keys() {
            pairs.insert((key.voltage.clone(), key.lifetime.clone()));
            densities.insert(key.density.clone());
        }

        let rows: BTreeMap<(Tag, Tag), u32> = pairs.into_iter().zip(RELATIVE_DATA_START..).collect();
        let columns: BTreeMap<Tag, u16> = densities.into_iter().zip(1u16..).collect();

        tracing::debug!(rows = rows.len(), columns = columns.len(), "allocated coordinate pool");
        Self { rows, columns }
    }

    pub fn row_of(&self, voltage: &Tag, lifetime: &Tag) -> Option<u32> {
        self.rows.get(&(voltage.clone(), lifetime.clone())).copied()
    }

    pub fn column_of(&self, density: &Tag) -> Option<u16> {
        self.columns.get(density).copied()
    }

    /// `N`: distinct `(voltage, lifetime)` pairs
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// `M`: distinct densities
    pub fn column_count(&self) -> u16 {
        self.columns.len() as u16
    }

    /// `(voltage, lifetime, relative row)` in row order
    pub fn rows(&self) -> impl Iterator<Item = (&Tag, &Tag, u32)> {
        self.rows.iter().map(|((v, l), row)| (v, l, *row))
    }

    /// `(density, relative column)` in column order
    pub fn columns(&self) -> impl Iterator<Item = (&Tag, u16)> {
        self.columns.iter().map(|(d, col)| (d, *col))
    }
}

//==============================================================================
// Device Bands
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    Measured,
    Normalized,
}

/// Absolute rows reserved for one device's table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceBand {
    pub device: String,
    pub kind: BandKind,
    /// First data row
    pub start_row: u32,
    /// One past the last data row; `end_row - start_row == N`
    pub end_row: u32,
}

impl DeviceBand {
    pub fn header_row(&self) -> u32 {
        self.start_row - 1
    }

    pub fn label_row(&self) -> u32 {
        self.start_row - 2
    }

    pub fn absolute_row(&self, relative_row: u32) -> u32 {
        self.start_row + relative_row - RELATIVE_DATA_START
    }

    pub fn data_rows(&self) -> Range<u32> {
        self.start_row..self.end_row
    }

    pub fn row_count(&self) -> u32 {
        self.end_row - self.start_row
    }

    pub fn overlaps(&self, other: &DeviceBand) -> bool {
        self.label_row() < other.end_row && other.label_row() < self.end_row
    }
}

//==============================================================================
// Table Layout
//==============================================================================

/// Where every table on the aggregate sheet lives
#[derive(Debug, Clone)]
pub struct TableLayout {
    pool: CoordinatePool,
    bands: Vec<DeviceBand>,
    normalized: DeviceBand,
    params: LayoutParams,
}

impl TableLayout {
    /// Allocate the pool, then stack one band per device plus the normalized band
    pub fn stack(hierarchy: &Hierarchy, params: LayoutParams, normalized_label: &str) -> Self {
        let params = LayoutParams {
            non_data_rows: params.non_data_rows.max(2),
            ..params
        };
        let pool = CoordinatePool::allocate(hierarchy);
        let data_rows = pool.row_count();
        let band_height = params.non_data_rows + RELATIVE_DATA_START + data_rows + params.padding_rows;

        let band_at = |index: u32, device: String, kind: BandKind| {
            let start_row = params.non_data_rows + RELATIVE_DATA_START + index * band_height;
            let band = DeviceBand {
                device,
                kind,
                start_row,
                end_row: start_row + data_rows,
            };
            tracing::debug!(
                device = %band.device,
                start = band.start_row,
                end = band.end_row,
                "stacked device band"
            );
            band
        };

        let bands: Vec<DeviceBand> = hierarchy
            .devices()
            .into_iter()
            .zip(0u32..)
            .map(|(device, index)| band_at(index, device.to_string(), BandKind::Measured))
            .collect();
        let normalized = band_at(
            bands.len() as u32,
            normalized_label.to_string(),
            BandKind::Normalized,
        );

        Self {
            pool,
            bands,
            normalized,
            params,
        }
    }

    pub fn pool(&self) -> &CoordinatePool {
        &self.pool
    }

    /// Bands of real devices, in hierarchy order
    pub fn bands(&self) -> &[DeviceBand] {
        &self.bands
    }

    pub fn normalized_band(&self) -> &DeviceBand {
        &self.normalized
    }

    /// Real device bands followed by the normalized band
    pub fn all_bands(&self) -> impl Iterator<Item = &DeviceBand> {
        self.bands.iter().chain(std::iter::once(&self.normalized))
    }

    pub fn band(&self, device: &str) -> Option<&DeviceBand> {
        self.bands.iter().find(|band| band.device == device)
    }

    /// Absolute column of a relative density column
    pub fn data_column(&self, relative_col: u16) -> u16 {
        self.params.non_data_columns + relative_col
    }

    /// Rightmost column any table uses
    pub fn last_column(&self) -> u16 {
        self.data_column(self.pool.column_count())
    }

    /// Aggregate cell holding the value of `key`
    pub fn cell_for(&self, key: &ExperimentKey) -> Option<CellRef> {
        let band = self.band(key.device.as_str())?;
        let row = self.pool.row_of(&key.voltage, &key.lifetime)?;
        let col = self.pool.column_of(&key.density)?;
        Some(CellRef::new(band.absolute_row(row), self.data_column(col)))
    }

    /// First row below every band, padding included
    pub fn next_free_row(&self) -> u32 {
        self.normalized.end_row + self.params.padding_rows
    }
}
