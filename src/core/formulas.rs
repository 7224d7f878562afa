//! Formula generation
//!
//! Nothing here computes a number. Every derived value is emitted as a formula
//! so the workbook stays live when raw data is edited in the spreadsheet.

use super::cell::CellRef;
use super::hierarchy::Hierarchy;
use super::layout::TableLayout;
use crate::error::{ExportError, ExportResult};
use crate::types::ExperimentKey;
use std::collections::{BTreeMap, BTreeSet};

//==============================================================================
// Per-file sheet
//==============================================================================

pub const TIME_COLUMN: u16 = 1;
pub const SIGNAL_COLUMN: u16 = 2;
pub const DIFFERENCE_COLUMN: u16 = 3;
pub const INTEGRAL_COLUMN: u16 = 4;
pub const SUM_COLUMN: u16 = 5;

pub const HEADER_ROW: u32 = 1;
/// First raw data row; also the fixed baseline of the difference column
pub const FIRST_DATA_ROW: u32 = 2;

/// Cell holding a file's sum of integrals
pub const SUM_CELL: CellRef = CellRef {
    row: FIRST_DATA_ROW,
    col: SUM_COLUMN,
};

pub const DERIVED_HEADERS: [(u16, &str); 3] = [
    (DIFFERENCE_COLUMN, "Difference from Start"),
    (INTEGRAL_COLUMN, "Integral"),
    (SUM_COLUMN, "Sum of Integrals"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFormula {
    pub cell: CellRef,
    pub formula: String,
}

impl PlannedFormula {
    fn new(cell: CellRef, formula: String) -> Self {
        Self { cell, formula }
    }
}

/// Difference, integral and sum formulas of a per-file sheet
pub struct DerivedFormulas;

impl DerivedFormulas {
    /// `=B5-$B$2`: current signal minus the first data row's signal
    pub fn difference(row: u32) -> String {
        format!(
            "={}-{}",
            CellRef::new(row, SIGNAL_COLUMN).a1(),
            CellRef::new(FIRST_DATA_ROW, SIGNAL_COLUMN).absolute()
        )
    }

    /// `=C5*(A5-A4)`; none on the first data row, which has no previous point
    pub fn integral(row: u32) -> Option<String> {
        if row <= FIRST_DATA_ROW {
            return None;
        }
        Some(format!(
            "={}*({}-{})",
            CellRef::new(row, DIFFERENCE_COLUMN).a1(),
            CellRef::new(row, TIME_COLUMN).a1(),
            CellRef::new(row - 1, TIME_COLUMN).a1()
        ))
    }

    /// `=SUM(D3:D{last_row})`, skipping the undefined first integral
    pub fn sum(last_row: u32) -> String {
        format!(
            "=SUM({}:{})",
            CellRef::new(FIRST_DATA_ROW + 1, INTEGRAL_COLUMN).a1(),
            CellRef::new(last_row, INTEGRAL_COLUMN).a1()
        )
    }

    /// Every formula for a sheet whose last written row is `last_row` (row 1 is the header)
    pub fn for_rows(last_row: u32) -> Vec<PlannedFormula> {
        let mut formulas = Vec::new();
        for row in FIRST_DATA_ROW..=last_row {
            formulas.push(PlannedFormula::new(
                CellRef::new(row, DIFFERENCE_COLUMN),
                Self::difference(row),
            ));
            if let Some(integral) = Self::integral(row) {
                formulas.push(PlannedFormula::new(
                    CellRef::new(row, INTEGRAL_COLUMN),
                    integral,
                ));
            }
        }
        formulas.push(PlannedFormula::new(SUM_CELL, Self::sum(last_row)));
        formulas
    }
}

//==============================================================================
// Cross-sheet references
//==============================================================================

/// `'PC 5V'`, with embedded quotes doubled
pub fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// `='PC 5V τ=1.00e-3 D=1.00e-4'!E2`
pub fn sheet_sum_reference(sheet: &str) -> String {
    format!("={}!{}", quote_sheet_name(sheet), SUM_CELL.a1())
}

/// `='All Charge Integrals'!C9`
pub fn cell_reference(sheet: &str, cell: CellRef) -> String {
    format!("={}!{}", quote_sheet_name(sheet), cell.a1())
}

/// `=C9/C$3`: numerator cell over the baseline's first data row in the same column
pub fn normalization_formula(numerator: CellRef, baseline_first_row: u32) -> String {
    format!(
        "={}/{}",
        numerator.a1(),
        CellRef::new(baseline_first_row, numerator.col).row_absolute()
    )
}

//==============================================================================
// Aggregate sheet plan
//==============================================================================

/// Every formula on the aggregate sheet, plus which cells end up non-blank
#[derive(Debug, Clone, Default)]
pub struct AggregatePlan {
    references: Vec<PlannedFormula>,
    normalized: Vec<PlannedFormula>,
    blank_baselines: Vec<CellRef>,
    filled: BTreeSet<CellRef>,
}

impl AggregatePlan {
    /// Fails when the baseline or numerator device has no band
    pub fn build(
        layout: &TableLayout,
        hierarchy: &Hierarchy,
        sheet_names: &BTreeMap<ExperimentKey, String>,
        baseline_device: &str,
        numerator_device: &str,
    ) -> ExportResult<Self> {
        let baseline = layout
            .band(baseline_device)
            .ok_or_else(|| ExportError::MissingDevice {
                role: "baseline",
                device: baseline_device.to_string(),
            })?;
        let numerator = layout
            .band(numerator_device)
            .ok_or_else(|| ExportError::MissingDevice {
                role: "numerator",
                device: numerator_device.to_string(),
            })?;

        let mut plan = Self::default();

        for key in hierarchy.keys() {
            let Some(cell) = layout.cell_for(key) else {
                continue;
            };
            let sheet = sheet_names
                .get(key)
                .cloned()
                .unwrap_or_else(|| key.sheet_name());
            plan.references
                .push(PlannedFormula::new(cell, sheet_sum_reference(&sheet)));
            plan.filled.insert(cell);
        }

        let normalized_band = layout.normalized_band();
        for (_, rel_col) in layout.pool().columns() {
            let col = layout.data_column(rel_col);
            let baseline_cell = CellRef::new(baseline.start_row, col);
            let mut column_used = false;

            for (_, _, rel_row) in layout.pool().rows() {
                let numerator_cell = CellRef::new(numerator.absolute_row(rel_row), col);
                if !plan.filled.contains(&numerator_cell) {
                    continue;
                }
                column_used = true;
                let target = CellRef::new(normalized_band.absolute_row(rel_row), col);
                plan.normalized.push(PlannedFormula::new(
                    target,
                    normalization_formula(numerator_cell, baseline.start_row),
                ));
            }

            if column_used && !plan.filled.contains(&baseline_cell) {
                plan.blank_baselines.push(baseline_cell);
            }
        }
        for formula in &plan.normalized {
            plan.filled.insert(formula.cell);
        }

        Ok(plan)
    }

    /// `='{sheet}'!E2` per source file
    pub fn references(&self) -> &[PlannedFormula] {
        &self.references
    }

    /// Normalized band formulas
    pub fn normalized(&self) -> &[PlannedFormula] {
        &self.normalized
    }

    /// Baseline cells that normalized formulas divide by but that hold nothing
    pub fn blank_baselines(&self) -> &[CellRef] {
        &self.blank_baselines
    }

    pub fn is_filled(&self, cell: CellRef) -> bool {
        self.filled.contains(&cell)
    }
}
