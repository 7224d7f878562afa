//! Workbook export pipeline
//!
//! Stages run strictly in order: discover files, build the hierarchy, stack the
//! layout, plan every aggregate formula, then write sheets and charts. Nothing
//! reaches the disk until every sheet has been built in memory.

use super::sheet_names::SheetNames;
use crate::config::ExportConfig;
use crate::core::charts::{TRANSPOSED_CATEGORY_COLUMN, TRANSPOSED_HEADER_ROW};
use crate::core::formulas::{
    cell_reference, DERIVED_HEADERS, FIRST_DATA_ROW, HEADER_ROW, SIGNAL_COLUMN, TIME_COLUMN,
};
use crate::core::layout::{LIFETIME_COLUMN, VOLTAGE_COLUMN};
use crate::core::{
    select_lifetime_series, AggregatePlan, BandKind, CellRef, ChartFlow, ColumnSpan,
    DerivedFormulas, Hierarchy, LayoutParams, LifetimeSeries, TableLayout, TransposePlan,
};
use crate::diagnostics::DiagnosticSink;
use crate::error::{ExportError, ExportResult};
use crate::parser::{discover_csv_files, CellValue, KeyExtractor, RawCsvReader};
use crate::types::ExperimentKey;
use rust_xlsxwriter::{Chart, ChartType, Format, Formula, Workbook, Worksheet, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};

const SCIENTIFIC_FORMAT: &str = "0.00E+00";
const TRANSPOSED_CHART_WIDTH: u32 = 945;
const TRANSPOSED_CHART_HEIGHT: u32 = 680;

/// What a finished export produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub output: PathBuf,
    /// Source files written as data sheets
    pub files: usize,
    /// Files skipped for an unrecognized name
    pub skipped: usize,
    pub devices: Vec<String>,
    pub charts: usize,
    pub sheets: usize,
}

fn workbook_error(context: &'static str) -> impl Fn(XlsxError) -> ExportError {
    move |e| ExportError::Workbook(format!("{}: {}", context, e))
}

/// Builds the charge workbook for one experiment directory
pub struct WorkbookExporter {
    config: ExportConfig,
    params: LayoutParams,
}

impl WorkbookExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            params: LayoutParams::default(),
        }
    }

    /// Export every CSV below `root` into `config.output`
    pub fn export(&self, root: &Path, sink: &mut dyn DiagnosticSink) -> ExportResult<ExportSummary> {
        let paths = discover_csv_files(root);
        if paths.is_empty() {
            return Err(ExportError::NoInputFiles(root.to_path_buf()));
        }
        sink.info(&format!("Found {} CSV files in {}", paths.len(), root.display()));

        let extractor = KeyExtractor::new(&self.config)?;
        let hierarchy = Hierarchy::build(&paths, &extractor, sink);
        if hierarchy.is_empty() {
            return Err(ExportError::EmptyHierarchy);
        }

        let layout = TableLayout::stack(&hierarchy, self.params, &self.config.normalized_label);

        let mut names = SheetNames::new();
        let aggregate_name = names.reserve(&self.config.aggregate_sheet)?;
        // only an explicit transpose sheet name must be usable as given
        let transpose = &self.config.transpose;
        let transpose_name = if !transpose.enabled {
            None
        } else if transpose.sheet_name.is_some() {
            Some(names.reserve(&self.config.transpose_sheet_name())?)
        } else {
            Some(names.claim(&self.config.transpose_sheet_name()))
        };
        for key in hierarchy.keys() {
            names.assign(key);
        }

        let plan = AggregatePlan::build(
            &layout,
            &hierarchy,
            names.by_key(),
            &self.config.baseline_device,
            &self.config.numerator_device,
        )?;
        let transpose_band = if transpose_name.is_some() {
            let device = self.config.transpose_device();
            Some(layout.band(device).ok_or_else(|| ExportError::MissingDevice {
                role: "transpose",
                device: device.to_string(),
            })?)
        } else {
            None
        };

        for cell in plan.blank_baselines() {
            sink.warn(&format!(
                "{} has no {} value at {}; normalized values in that column will not evaluate",
                aggregate_name,
                self.config.baseline_device,
                cell.a1()
            ));
        }

        let mut charts = 0;
        let mut aggregate = Worksheet::new();
        aggregate
            .set_name(&aggregate_name)
            .map_err(workbook_error("Failed to name aggregate sheet"))?;
        self.write_tables(&mut aggregate, &layout)?;
        self.write_formulas(&mut aggregate, &plan)?;
        charts += self.write_lifetime_charts(&mut aggregate, &aggregate_name, &layout, &plan)?;
        aggregate.autofit();

        let mut transposed = None;
        if let (Some(name), Some(band)) = (transpose_name, transpose_band) {
            match TransposePlan::build(&layout, band, self.config.transpose.lifetime) {
                Some(transpose) => {
                    let mut sheet = Worksheet::new();
                    sheet
                        .set_name(&name)
                        .map_err(workbook_error("Failed to name transposed sheet"))?;
                    charts += self.write_transposed(&mut sheet, &name, &aggregate_name, &transpose, &plan)?;
                    sheet.autofit();
                    transposed = Some(sheet);
                }
                None => sink.warn(&format!(
                    "No {} file has lifetime {:e}; skipping \"{}\"",
                    band.device, self.config.transpose.lifetime, name
                )),
            }
        }

        sink.info(&format!("Writing {} data sheets", hierarchy.len()));
        let mut data_sheets = Vec::with_capacity(hierarchy.len());
        for (key, path) in hierarchy.files() {
            let name = names.get(key).map(str::to_string).unwrap_or_else(|| key.sheet_name());
            data_sheets.push(self.write_data_sheet(key, path, &name, sink)?);
        }

        let mut workbook = Workbook::new();
        workbook.push_worksheet(aggregate);
        let mut sheets = 1;
        if let Some(sheet) = transposed {
            workbook.push_worksheet(sheet);
            sheets += 1;
        }
        for sheet in data_sheets {
            workbook.push_worksheet(sheet);
            sheets += 1;
        }

        let output = self.config.output.clone();
        save_atomically(&mut workbook, &output)?;
        sink.success(&format!("Saved {}", output.display()));

        Ok(ExportSummary {
            output,
            files: hierarchy.len(),
            skipped: hierarchy.skipped(),
            devices: hierarchy.devices().iter().map(|d| d.to_string()).collect(),
            charts,
            sheets,
        })
    }

    //==========================================================================
    // Per-file sheets
    //==========================================================================

    fn write_data_sheet(
        &self,
        key: &ExperimentKey,
        path: &Path,
        name: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> ExportResult<Worksheet> {
        let mut sheet = Worksheet::new();
        sheet
            .set_name(name)
            .map_err(workbook_error("Failed to name data sheet"))?;

        let mut last_row = HEADER_ROW - 1;
        let mut warned = false;
        for (row, record) in (HEADER_ROW..).zip(RawCsvReader::open(path, &self.config.columns)?) {
            let record = record?;
            if !record.has_signal && !warned {
                sink.warn(&format!(
                    "Row {} of \"{}\" has no signal column; leaving it blank",
                    row,
                    path.display()
                ));
                warned = true;
            }
            write_value(&mut sheet, CellRef::new(row, TIME_COLUMN), &record.time)?;
            write_value(&mut sheet, CellRef::new(row, SIGNAL_COLUMN), &record.signal)?;
            last_row = row;
        }
        tracing::debug!(sheet = name, device = %key.device, rows = last_row, "wrote raw rows");

        for (col, header) in DERIVED_HEADERS {
            let (r, c) = CellRef::new(HEADER_ROW, col).zero_based();
            sheet
                .write_string(r, c, header)
                .map_err(workbook_error("Failed to write header"))?;
        }
        for planned in DerivedFormulas::for_rows(last_row.max(FIRST_DATA_ROW)) {
            write_formula(&mut sheet, planned.cell, &planned.formula)?;
        }

        sheet.autofit();
        Ok(sheet)
    }

    //==========================================================================
    // Aggregate sheet
    //==========================================================================

    fn write_tables(&self, sheet: &mut Worksheet, layout: &TableLayout) -> ExportResult<()> {
        let bold = Format::new().set_bold();
        let scientific = Format::new().set_num_format(SCIENTIFIC_FORMAT);

        for band in layout.all_bands() {
            let (r, c) = CellRef::new(band.label_row(), VOLTAGE_COLUMN).zero_based();
            sheet
                .write_string_with_format(r, c, format!("{}:", band.device), &bold)
                .map_err(workbook_error("Failed to write device label"))?;

            let header_row = band.header_row();
            let charge = match band.kind {
                BandKind::Measured => "Charge",
                BandKind::Normalized => "Norm. Charge",
            };
            let mut headers = vec![
                (VOLTAGE_COLUMN, "Voltage".to_string()),
                (LIFETIME_COLUMN, "Lifetime".to_string()),
            ];
            for (density, rel_col) in layout.pool().columns() {
                headers.push((layout.data_column(rel_col), format!("{} ({})", charge, density)));
            }
            for (col, text) in headers {
                let (r, c) = CellRef::new(header_row, col).zero_based();
                sheet
                    .write_string_with_format(r, c, text, &bold)
                    .map_err(workbook_error("Failed to write table header"))?;
            }

            for (voltage, lifetime, rel_row) in layout.pool().rows() {
                let row = band.absolute_row(rel_row);
                let (r, c) = CellRef::new(row, VOLTAGE_COLUMN).zero_based();
                sheet
                    .write_string(r, c, voltage.display())
                    .map_err(workbook_error("Failed to write voltage label"))?;
                let (r, c) = CellRef::new(row, LIFETIME_COLUMN).zero_based();
                sheet
                    .write_number_with_format(r, c, lifetime.value(), &scientific)
                    .map_err(workbook_error("Failed to write lifetime label"))?;
            }
        }
        Ok(())
    }

    fn write_formulas(&self, sheet: &mut Worksheet, plan: &AggregatePlan) -> ExportResult<()> {
        for planned in plan.references().iter().chain(plan.normalized()) {
            write_formula(sheet, planned.cell, &planned.formula)?;
        }
        tracing::debug!(
            references = plan.references().len(),
            normalized = plan.normalized().len(),
            "wrote aggregate formulas"
        );
        Ok(())
    }

    /// One section of lifetime charts per band; returns the number of charts
    fn write_lifetime_charts(
        &self,
        sheet: &mut Worksheet,
        sheet_name: &str,
        layout: &TableLayout,
        plan: &AggregatePlan,
    ) -> ExportResult<usize> {
        let bold = Format::new().set_bold();
        let mut flow = ChartFlow::new(layout.next_free_row(), &self.config.charts, self.params.padding_rows);
        let mut count = 0;

        for band in layout.all_bands() {
            let series = select_lifetime_series(layout, band, plan, self.config.charts.excluded_trailing_rows);
            if series.is_empty() {
                tracing::debug!(device = %band.device, "no chartable density columns");
                continue;
            }

            let (r, c) = flow.begin_section().zero_based();
            sheet
                .write_string_with_format(r, c, format!("{} Graphs:", band.device), &bold)
                .map_err(workbook_error("Failed to write chart section label"))?;

            for s in &series {
                let chart = self.lifetime_chart(sheet_name, s);
                let anchor = flow.next_anchor();
                tracing::debug!(device = %s.device, density = %s.density, anchor = %anchor, "placed chart");
                let (r, c) = anchor.zero_based();
                sheet
                    .insert_chart(r, c, &chart)
                    .map_err(workbook_error("Failed to insert chart"))?;
                count += 1;
            }
            flow.end_section();
        }
        Ok(count)
    }

    fn lifetime_chart(&self, sheet_name: &str, series: &LifetimeSeries) -> Chart {
        let charge = match series.kind {
            BandKind::Measured => "Charge",
            BandKind::Normalized => "Norm. Charge",
        };
        let title = format!("{} vs. Lifetime ({})", charge, series.density);
        let mut chart = Chart::new(ChartType::ScatterStraightWithMarkers);
        chart.title().set_name(title.as_str());
        chart.x_axis().set_name("Lifetime").set_log_base(10);
        chart.y_axis().set_name(charge);
        chart.legend().set_hidden();
        chart
            .set_style(self.config.charts.style)
            .set_width(self.config.charts.width)
            .set_height(self.config.charts.height);
        chart
            .add_series()
            .set_categories(chart_range(sheet_name, series.categories))
            .set_values(chart_range(sheet_name, series.values));
        chart
    }

    //==========================================================================
    // Transposed sheet
    //==========================================================================

    fn write_transposed(
        &self,
        sheet: &mut Worksheet,
        sheet_name: &str,
        aggregate_name: &str,
        transpose: &TransposePlan,
        plan: &AggregatePlan,
    ) -> ExportResult<usize> {
        let bold = Format::new().set_bold();
        let scientific = Format::new().set_num_format(SCIENTIFIC_FORMAT);

        let (r, c) = CellRef::new(TRANSPOSED_HEADER_ROW, TRANSPOSED_CATEGORY_COLUMN).zero_based();
        sheet
            .write_string_with_format(r, c, "Density", &bold)
            .map_err(workbook_error("Failed to write transposed header"))?;
        for column in &transpose.columns {
            let (r, c) = CellRef::new(TRANSPOSED_HEADER_ROW, column.col).zero_based();
            sheet
                .write_string_with_format(r, c, format!("Charge ({})", column.voltage), &bold)
                .map_err(workbook_error("Failed to write transposed header"))?;
        }

        for row in &transpose.rows {
            let (r, c) = CellRef::new(row.row, TRANSPOSED_CATEGORY_COLUMN).zero_based();
            sheet
                .write_number_with_format(r, c, row.density.value(), &scientific)
                .map_err(workbook_error("Failed to write density"))?;
            for column in &transpose.columns {
                let source = transpose.source_cell(row, column);
                if plan.is_filled(source) {
                    write_formula(sheet, CellRef::new(row.row, column.col), &cell_reference(aggregate_name, source))?;
                }
            }
        }

        let charted = transpose.charted_columns(plan);
        if charted.is_empty() {
            return Ok(0);
        }

        let mut chart = Chart::new(ChartType::ScatterStraightWithMarkers);
        chart.title().set_name("Charge vs. Density");
        chart.x_axis().set_name("Density").set_log_base(10);
        chart.y_axis().set_name("Charge").set_log_base(10);
        chart
            .set_style(self.config.charts.style)
            .set_width(TRANSPOSED_CHART_WIDTH)
            .set_height(TRANSPOSED_CHART_HEIGHT);

        let categories = transpose.categories();
        for column in charted {
            let values = ColumnSpan {
                col: column.col,
                first_row: categories.first_row,
                last_row: categories.last_row,
            };
            let (name_row, name_col) = CellRef::new(TRANSPOSED_HEADER_ROW, column.col).zero_based();
            chart
                .add_series()
                .set_categories(chart_range(sheet_name, categories))
                .set_values(chart_range(sheet_name, values))
                .set_name((sheet_name, name_row, name_col));
        }

        let (r, c) = transpose.chart_anchor().zero_based();
        sheet
            .insert_chart(r, c, &chart)
            .map_err(workbook_error("Failed to insert transposed chart"))?;
        Ok(1)
    }
}

fn chart_range(sheet_name: &str, span: ColumnSpan) -> (&str, u32, u16, u32, u16) {
    let (first_row, col) = CellRef::new(span.first_row, span.col).zero_based();
    let (last_row, _) = CellRef::new(span.last_row, span.col).zero_based();
    (sheet_name, first_row, col, last_row, col)
}

fn write_value(sheet: &mut Worksheet, cell: CellRef, value: &CellValue) -> ExportResult<()> {
    let (r, c) = cell.zero_based();
    match value {
        CellValue::Number(n) => {
            sheet
                .write_number(r, c, *n)
                .map_err(workbook_error("Failed to write number"))?;
        }
        CellValue::Text(text) => {
            sheet
                .write_string(r, c, text)
                .map_err(workbook_error("Failed to write text"))?;
        }
        CellValue::Blank => {}
    }
    Ok(())
}

fn write_formula(sheet: &mut Worksheet, cell: CellRef, formula: &str) -> ExportResult<()> {
    let (r, c) = cell.zero_based();
    sheet
        .write_formula(r, c, Formula::new(formula))
        .map_err(workbook_error("Failed to write formula"))?;
    Ok(())
}

/// Save next to `output` and rename into place, so a failed save never leaves a half-written file
fn save_atomically(workbook: &mut Workbook, output: &Path) -> ExportResult<()> {
    let mut partial = output.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    if let Err(e) = workbook.save(&partial) {
        let _ = fs::remove_file(&partial);
        return Err(workbook_error("Failed to save workbook")(e));
    }
    if let Err(e) = fs::rename(&partial, output) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_range_is_zero_based() {
        let span = ColumnSpan {
            col: 3,
            first_row: 9,
            last_row: 12,
        };
        assert_eq!(chart_range("All", span), ("All", 8, 2, 11, 2));
    }

    #[test]
    fn test_missing_root_has_no_input_files() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = WorkbookExporter::new(ExportConfig::default());
        let mut sink = crate::diagnostics::MemorySink::new();
        let result = exporter.export(&dir.path().join("nothing"), &mut sink);
        assert!(matches!(result, Err(ExportError::NoInputFiles(_))));
    }
}
