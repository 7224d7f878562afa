//! Table layout and formula engine
//!
//! Runs strictly in order: hierarchy → coordinate pool → device bands →
//! formulas → chart ranges. Nothing in here touches the workbook.

pub mod cell;
pub mod charts;
pub mod formulas;
pub mod hierarchy;
pub mod layout;

pub use cell::{column_letter, CellRef};
pub use charts::{select_lifetime_series, ChartFlow, ColumnSpan, LifetimeSeries, TransposePlan};
pub use formulas::{AggregatePlan, DerivedFormulas, PlannedFormula};
pub use hierarchy::Hierarchy;
pub use layout::{BandKind, CoordinatePool, DeviceBand, LayoutParams, TableLayout};
