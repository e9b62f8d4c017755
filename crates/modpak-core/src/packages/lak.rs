//! Lake (LAK) package adapter.
//!
//! LAK interleaves four kinds of per-period data in a fixed block order:
//! lake-ID arrays, lakebed leakance arrays, sublake sill tables, and
//! per-lake flux tables. All four follow the same explicit / clear /
//! carry-forward convention and stay synchronized on one period axis; they
//! are held as separate stores because each has its own record shape.

use super::skip_header_comments;
use crate::error::PackageError;
use crate::io::arrays::Array3d;
use crate::io::codec::{self, FieldLayout};
use crate::io::traits::PackageFile;
use crate::io::LineReader;
use crate::model::{GridShape, Model};
use crate::records::{
    FieldType, PeriodEntry, RecordSchema, RecordSet, Transient, TransientList, Value,
};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::debug;

/// One sublake system of dataset 8: the connected sublake IDs and the sill
/// elevations between consecutive pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct SillRecord {
    pub sublakes: Vec<i64>,
    pub sill_elevations: Vec<f64>,
}

impl SillRecord {
    pub fn new(sublakes: Vec<i64>, sill_elevations: Vec<f64>) -> Result<Self, PackageError> {
        if sublakes.is_empty() || sill_elevations.len() != sublakes.len() - 1 {
            return Err(PackageError::Config(format!(
                "a sill record connecting {} sublakes needs {} elevations, got {}",
                sublakes.len(),
                sublakes.len().saturating_sub(1),
                sill_elevations.len()
            )));
        }
        Ok(SillRecord {
            sublakes,
            sill_elevations,
        })
    }
}

/// Package-level LAK parameters, validated once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LakConfig {
    pub nlakes: usize,
    /// Cell-by-cell budget unit number; zero disables budget output.
    pub ipakcb: i32,
    /// Explicit/implicit weighting factor; negative selects the implicit
    /// Newton scheme and enables `surfdep`.
    pub theta: f64,
    pub nssitr: i64,
    pub sscncr: f64,
    pub surfdep: f64,
    /// Initial stage per lake; length must equal `nlakes`.
    pub stages: Vec<f64>,
    /// Valid (min, max) stage per lake for steady-state solutions; empty
    /// selects the engine's wide-open default range.
    pub stage_range: Vec<(f64, f64)>,
    /// Stage/volume/area table files, one per lake (TABLEINPUT option).
    pub table_input: bool,
    pub tab_files: Vec<String>,
    /// Per-period print suppression flag written on every control line.
    pub lwrt: i64,
}

impl Default for LakConfig {
    fn default() -> Self {
        LakConfig {
            nlakes: 1,
            ipakcb: 0,
            theta: -1.0,
            nssitr: 0,
            sscncr: 0.0,
            surfdep: 0.0,
            stages: vec![1.0],
            stage_range: Vec::new(),
            table_input: false,
            tab_files: Vec::new(),
            lwrt: 0,
        }
    }
}

const DEFAULT_STAGE_RANGE: (f64, f64) = (-10000.0, 10000.0);

/// The four per-period stores of a LAK package, bundled for construction.
#[derive(Debug, Clone)]
pub struct LakData {
    pub lake_arrays: Transient<Array3d<i32>>,
    pub leakance_arrays: Transient<Array3d<f64>>,
    pub sill_data: Transient<Vec<SillRecord>>,
    pub flux_data: TransientList,
}

impl LakData {
    pub fn empty(nper: usize) -> Self {
        LakData {
            lake_arrays: Transient::new(nper),
            leakance_arrays: Transient::new(nper),
            sill_data: Transient::new(nper),
            flux_data: TransientList::new(nper, RecordSchema::lak_flux()),
        }
    }
}

/// Lake package adapter.
#[derive(Debug, Clone)]
pub struct LakPackage {
    config: LakConfig,
    stage_range: Vec<(f64, f64)>,
    tab_units: Vec<i32>,
    data: LakData,
    nper: usize,
    steady: Vec<bool>,
    free_format: bool,
    heading: String,
}

impl LakPackage {
    pub const FTYPE: &'static str = "LAK";
    pub const DEFAULT_UNIT: i32 = 119;

    /// Builds the adapter from caller-supplied data, bypassing load.
    ///
    /// Validates every cross-cutting shape constraint once: stage and
    /// stage-range lengths against `nlakes`, array shapes against the
    /// model grid, flux-table schema and row counts, and period-axis
    /// agreement between the four stores. Sill entries are normalized so
    /// that every period with explicit arrays carries an explicit sill
    /// state (data or clear).
    pub fn new(
        model: &mut impl Model,
        config: LakConfig,
        mut data: LakData,
        tab_units: Option<Vec<i32>>,
    ) -> Result<Self, PackageError> {
        let nper = model.nper();
        let shape = model.shape();

        if config.stages.len() != config.nlakes {
            return Err(PackageError::Config(format!(
                "stages has {} entries but nlakes is {}",
                config.stages.len(),
                config.nlakes
            )));
        }
        let stage_range = if config.stage_range.is_empty() {
            vec![DEFAULT_STAGE_RANGE; config.nlakes]
        } else if config.stage_range.len() == config.nlakes {
            config.stage_range.clone()
        } else {
            return Err(PackageError::Config(format!(
                "stage_range has {} entries but nlakes is {}",
                config.stage_range.len(),
                config.nlakes
            )));
        };

        if data.flux_data.schema() != &RecordSchema::lak_flux() {
            return Err(PackageError::Config(
                "flux data must use the six-column lake flux schema".to_string(),
            ));
        }
        for store_nper in [
            data.lake_arrays.nper(),
            data.leakance_arrays.nper(),
            data.sill_data.nper(),
            data.flux_data.nper(),
        ] {
            if store_nper != nper {
                return Err(PackageError::Config(format!(
                    "a period store covers {store_nper} periods but the model has {nper}"
                )));
            }
        }

        let lake_periods: Vec<usize> = data.lake_arrays.explicit_periods().collect();
        let leakance_periods: Vec<usize> = data.leakance_arrays.explicit_periods().collect();
        if lake_periods != leakance_periods {
            return Err(PackageError::Config(
                "lake-ID and leakance arrays must be explicit for the same periods".to_string(),
            ));
        }
        for kper in &lake_periods {
            for arr_shape in [
                data.lake_arrays
                    .entry(*kper)
                    .and_then(entry_array_shape_i32),
                data.leakance_arrays
                    .entry(*kper)
                    .and_then(entry_array_shape_f64),
            ]
            .into_iter()
            .flatten()
            {
                if arr_shape != shape {
                    return Err(PackageError::Config(format!(
                        "array for stress period {} does not match the model grid",
                        kper + 1
                    )));
                }
            }
        }

        let array_explicit: Vec<usize> = lake_periods;
        for kper in data.sill_data.explicit_periods().collect::<Vec<_>>() {
            if !array_explicit.contains(&kper) {
                return Err(PackageError::Config(format!(
                    "sill data for stress period {} has no matching lake arrays",
                    kper + 1
                )));
            }
        }
        // Sill state is only representable on disk inside an explicit
        // array block, so pin it down for those periods.
        for &kper in &array_explicit {
            if data.sill_data.entry(kper).is_none() {
                data.sill_data.set(kper, PeriodEntry::Clear)?;
            }
        }

        for kper in data.flux_data.explicit_periods().collect::<Vec<_>>() {
            if let Some(PeriodEntry::Data(set)) = data.flux_data.entry(kper) {
                if set.len() != config.nlakes {
                    return Err(PackageError::Config(format!(
                        "flux data for stress period {} has {} rows but nlakes is {}",
                        kper + 1,
                        set.len(),
                        config.nlakes
                    )));
                }
            }
        }

        let tab_units = if config.table_input {
            if !config.tab_files.is_empty() && config.tab_files.len() != config.nlakes {
                return Err(PackageError::Config(format!(
                    "TABLEINPUT needs one table file per lake ({} given, {} lakes)",
                    config.tab_files.len(),
                    config.nlakes
                )));
            }
            match tab_units {
                Some(units) => {
                    if units.len() != config.nlakes {
                        return Err(PackageError::Config(format!(
                            "TABLEINPUT needs one table unit per lake ({} given, {} lakes)",
                            units.len(),
                            config.nlakes
                        )));
                    }
                    units
                }
                None => {
                    let units: Vec<i32> =
                        (0..config.nlakes).map(|_| model.next_ext_unit()).collect();
                    for (unit, fname) in units.iter().zip(&config.tab_files) {
                        model.add_external(fname, *unit);
                    }
                    units
                }
            }
        } else {
            Vec::new()
        };

        if config.ipakcb != 0 {
            model.add_output_file(config.ipakcb, None, Self::FTYPE);
        }

        let steady = (0..nper).map(|kper| model.is_steady(kper)).collect();
        Ok(LakPackage {
            stage_range,
            tab_units,
            data,
            nper,
            steady,
            free_format: model.free_format(),
            heading: format!("# {} package for MODFLOW, generated by modpak.", Self::FTYPE),
            config,
        })
    }

    pub fn config(&self) -> &LakConfig {
        &self.config
    }

    pub fn data(&self) -> &LakData {
        &self.data
    }

    pub fn stage_range(&self) -> &[(f64, f64)] {
        &self.stage_range
    }

    pub fn tab_units(&self) -> &[i32] {
        &self.tab_units
    }

    fn encode(
        &self,
        values: &[Value],
        widths: &[usize],
        comment: Option<&str>,
    ) -> Result<String, PackageError> {
        let layout = scalar_layout(values, widths);
        codec::encode_line(values, &layout, self.free_format, comment)
            .map_err(|source| PackageError::Format { line: 0, source })
    }

    fn flux_line_is_long(&self, kper: usize) -> bool {
        kper > 0 && self.steady.get(kper).copied().unwrap_or(false)
    }
}

fn entry_array_shape_i32(entry: &PeriodEntry<Array3d<i32>>) -> Option<GridShape> {
    match entry {
        PeriodEntry::Data(array) => Some(array.shape()),
        PeriodEntry::Clear => None,
    }
}

fn entry_array_shape_f64(entry: &PeriodEntry<Array3d<f64>>) -> Option<GridShape> {
    match entry {
        PeriodEntry::Data(array) => Some(array.shape()),
        PeriodEntry::Clear => None,
    }
}

fn scalar_layout(values: &[Value], widths: &[usize]) -> Vec<FieldLayout> {
    values
        .iter()
        .zip(widths)
        .map(|(value, &width)| {
            let ty = match value {
                Value::Int(_) => FieldType::Int,
                Value::Float(_) => FieldType::Float,
            };
            FieldLayout::with_width(ty, width)
        })
        .collect()
}

fn decode_scalars(
    line: &str,
    line_no: usize,
    layout: &[FieldLayout],
    free: bool,
) -> Result<Vec<Value>, PackageError> {
    codec::decode_line(line, layout, free).map_err(|source| PackageError::Format {
        line: line_no,
        source,
    })
}

fn period_sentinel<T>(entry: Option<&PeriodEntry<T>>, explicit: i64) -> i64 {
    match entry {
        Some(PeriodEntry::Data(_)) => explicit,
        Some(PeriodEntry::Clear) => 0,
        None => -1,
    }
}

impl PackageFile for LakPackage {
    fn read_from(
        reader: &mut impl BufRead,
        model: &mut impl Model,
        nper: Option<usize>,
    ) -> Result<Self, PackageError> {
        let mut reader = LineReader::new(reader);
        let free = model.free_format();
        let nper = nper.unwrap_or_else(|| model.nper());
        let shape = model.shape();
        let steady_any = (0..nper).any(|kper| model.is_steady(kper));
        let steady_first = model.is_steady(0);

        let mut line = skip_header_comments(&mut reader, "the LAK header")?;

        let mut table_input = false;
        if line.to_ascii_uppercase().contains("TABLEINPUT") {
            table_input = true;
            line = reader.expect_line("LAK dataset 1b")?;
        }

        // Dataset 1b: NLAKES ILKCB.
        let line_no = reader.line_no();
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let nlakes: usize = tokens
            .first()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| PackageError::parse(line_no, "expected NLAKES in LAK dataset 1b"))?;
        let ipakcb: i32 = tokens.get(1).and_then(|t| t.parse().ok()).unwrap_or(0);

        // Dataset 2: THETA [NSSITR SSCNCR] [SURFDEP].
        let line = reader.expect_line("LAK dataset 2")?;
        let line_no = reader.line_no();
        let theta = decode_scalars(
            &line,
            line_no,
            &[FieldLayout::new(FieldType::Float)],
            free,
        )?[0]
            .as_float()
            .unwrap_or(0.0);
        let mut layout = vec![FieldLayout::new(FieldType::Float)];
        if theta < 0.0 || steady_any {
            layout.push(FieldLayout::new(FieldType::Int));
            layout.push(FieldLayout::new(FieldType::Float));
        }
        if theta < 0.0 {
            layout.push(FieldLayout::new(FieldType::Float));
        }
        let values = decode_scalars(&line, line_no, &layout, free)?;
        let mut nssitr = 0;
        let mut sscncr = 0.0;
        let mut surfdep = 0.0;
        if theta < 0.0 || steady_any {
            nssitr = values[1].as_int().unwrap_or(0);
            sscncr = values[2].as_float().unwrap_or(0.0);
        }
        if theta < 0.0 {
            surfdep = values[3].as_float().unwrap_or(0.0);
        }

        // Dataset 3: one line per lake.
        let mut stages = Vec::with_capacity(nlakes);
        let mut stage_range = Vec::new();
        let mut tab_units = Vec::new();
        for _ in 0..nlakes {
            let line = reader.expect_line("LAK dataset 3")?;
            let line_no = reader.line_no();
            let mut layout = vec![FieldLayout::new(FieldType::Float)];
            if steady_first {
                layout.push(FieldLayout::new(FieldType::Float));
                layout.push(FieldLayout::new(FieldType::Float));
            }
            if table_input {
                layout.push(FieldLayout::with_width(FieldType::Int, 5));
            }
            let values = decode_scalars(&line, line_no, &layout, free)?;
            let mut pos = 1;
            stages.push(values[0].as_float().unwrap_or(0.0));
            if steady_first {
                stage_range.push((
                    values[pos].as_float().unwrap_or(0.0),
                    values[pos + 1].as_float().unwrap_or(0.0),
                ));
                pos += 2;
            }
            if table_input {
                tab_units.push(values[pos].as_int().unwrap_or(0) as i32);
            }
        }

        let mut data = LakData::empty(nper);
        let flux_schema = RecordSchema::lak_flux();

        for kper in 0..nper {
            let Some(line) = reader.next_line()? else {
                break;
            };
            debug!(kper = kper + 1, "loading LAK stress period data");
            let line_no = reader.line_no();
            let control = decode_scalars(
                &line,
                line_no,
                &[
                    FieldLayout::new(FieldType::Int),
                    FieldLayout::new(FieldType::Int),
                    FieldLayout::new(FieldType::Int),
                ],
                free,
            )?;
            let itmp = control[0].as_int().unwrap_or(0);
            let itmp2 = control[1].as_int().unwrap_or(0);

            if itmp > 0 {
                let lakarr = Array3d::<i32>::read_from(&mut reader, shape, "LAKARR")?;
                let bdlknc = Array3d::<f64>::read_from(&mut reader, shape, "BDLKNC")?;
                data.lake_arrays.set(kper, PeriodEntry::Data(lakarr))?;
                data.leakance_arrays.set(kper, PeriodEntry::Data(bdlknc))?;

                // Dataset 7: NSLMS.
                let line = reader.expect_line("LAK dataset 7")?;
                let line_no = reader.line_no();
                let nslms: i64 = line
                    .split_whitespace()
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| {
                        PackageError::parse(line_no, "expected NSLMS sublake count")
                    })?;
                if nslms > 0 {
                    let mut sills = Vec::with_capacity(nslms as usize);
                    for _ in 0..nslms {
                        sills.push(read_sill_record(&mut reader, free)?);
                    }
                    data.sill_data.set(kper, PeriodEntry::Data(sills))?;
                } else {
                    data.sill_data.set(kper, PeriodEntry::Clear)?;
                }
            } else if itmp == 0 {
                data.lake_arrays.set(kper, PeriodEntry::Clear)?;
                data.leakance_arrays.set(kper, PeriodEntry::Clear)?;
            }

            if itmp2 > 0 {
                let long = kper > 0 && model.is_steady(kper);
                let n_fields = if long { 6 } else { 4 };
                let layout = vec![FieldLayout::new(FieldType::Float); n_fields];
                let mut set = RecordSet::new(flux_schema.clone());
                for lake in 0..nlakes {
                    let line = reader.expect_line("LAK dataset 9")?;
                    let line_no = reader.line_no();
                    let mut values = decode_scalars(&line, line_no, &layout, free)?;
                    if !long {
                        if model.is_steady(kper) {
                            // First-period steady ranges come from dataset 3.
                            let (ssmn, ssmx) =
                                stage_range.get(lake).copied().unwrap_or(DEFAULT_STAGE_RANGE);
                            values.push(Value::Float(ssmn));
                            values.push(Value::Float(ssmx));
                        } else {
                            values.push(Value::Float(0.0));
                            values.push(Value::Float(0.0));
                        }
                    }
                    set.push(values).map_err(|source| PackageError::Schema {
                        line: line_no,
                        source,
                    })?;
                }
                data.flux_data.set_records(kper, set)?;
            } else if itmp2 == 0 {
                data.flux_data.set_clear(kper)?;
            }
        }

        let config = LakConfig {
            nlakes,
            ipakcb,
            theta,
            nssitr,
            sscncr,
            surfdep,
            stages,
            stage_range,
            table_input,
            tab_files: Vec::new(),
            lwrt: 0,
        };
        let tab_units = table_input.then_some(tab_units);
        Self::new(model, config, data, tab_units)
    }

    fn write_to(&self, writer: &mut impl Write) -> Result<(), PackageError> {
        writeln!(writer, "{}", self.heading)?;

        // Dataset 1a: options.
        if self.config.table_input {
            writeln!(writer, "TABLEINPUT")?;
        }

        // Dataset 1b.
        let line = self.encode(
            &[
                Value::Int(self.config.nlakes as i64),
                Value::Int(self.config.ipakcb as i64),
            ],
            &[10, 10],
            None,
        )?;
        writeln!(writer, "{line}")?;

        // Dataset 2.
        let steady_any = self.steady.iter().any(|&s| s);
        let mut values = vec![Value::Float(self.config.theta)];
        if self.config.theta < 0.0 || steady_any {
            values.push(Value::Int(self.config.nssitr));
            values.push(Value::Float(self.config.sscncr));
        }
        if self.config.theta < 0.0 {
            values.push(Value::Float(self.config.surfdep));
        }
        let widths = vec![10; values.len()];
        let line = self.encode(&values, &widths, None)?;
        writeln!(writer, "{line}")?;

        // Dataset 3.
        let steady_first = self.steady.first().copied().unwrap_or(false);
        for lake in 0..self.config.nlakes {
            let mut values = vec![Value::Float(self.config.stages[lake])];
            let mut widths = vec![10];
            if steady_first {
                let (ssmn, ssmx) = self.stage_range[lake];
                values.push(Value::Float(ssmn));
                values.push(Value::Float(ssmx));
                widths.push(10);
                widths.push(10);
            }
            if self.config.table_input {
                values.push(Value::Int(self.tab_units[lake] as i64));
                widths.push(5);
            }
            let line = self.encode(&values, &widths, None)?;
            writeln!(writer, "{line}")?;
        }

        // Datasets 4..9, one block per stress period.
        for kper in 0..self.nper {
            let itmp = period_sentinel(
                self.data.lake_arrays.entry(kper),
                1,
            );
            let itmp2 = period_sentinel(self.data.flux_data.entry(kper), 1);
            let line = self.encode(
                &[
                    Value::Int(itmp),
                    Value::Int(itmp2),
                    Value::Int(self.config.lwrt),
                ],
                &[10, 10, 10],
                Some(&format!("Stress period {}", kper + 1)),
            )?;
            writeln!(writer, "{line}")?;

            if itmp > 0 {
                let Some(PeriodEntry::Data(lakarr)) = self.data.lake_arrays.entry(kper) else {
                    unreachable!()
                };
                let Some(PeriodEntry::Data(bdlknc)) = self.data.leakance_arrays.entry(kper)
                else {
                    unreachable!()
                };
                lakarr.write_to(writer)?;
                bdlknc.write_to(writer)?;

                let sills: &[SillRecord] = match self.data.sill_data.entry(kper) {
                    Some(PeriodEntry::Data(sills)) => sills,
                    _ => &[],
                };
                let line = self.encode(
                    &[Value::Int(sills.len() as i64)],
                    &[5],
                    Some("Data set 7"),
                )?;
                writeln!(writer, "{line}")?;
                for sill in sills {
                    let mut values = vec![Value::Int(sill.sublakes.len() as i64)];
                    values.extend(sill.sublakes.iter().map(|&s| Value::Int(s)));
                    let widths = vec![5; values.len()];
                    let line = self.encode(&values, &widths, Some("Data set 8a"))?;
                    writeln!(writer, "{line}")?;
                    let values: Vec<Value> = sill
                        .sill_elevations
                        .iter()
                        .map(|&e| Value::Float(e))
                        .collect();
                    let widths = vec![10; values.len()];
                    let line = self.encode(&values, &widths, Some("Data set 8b"))?;
                    writeln!(writer, "{line}")?;
                }
            }

            if itmp2 > 0 {
                let Some(PeriodEntry::Data(set)) = self.data.flux_data.entry(kper) else {
                    unreachable!()
                };
                let n_fields = if self.flux_line_is_long(kper) { 6 } else { 4 };
                for record in set.records() {
                    let values = &record[..n_fields];
                    let widths = vec![10; n_fields];
                    let line = self.encode(values, &widths, Some("Data set 9a"))?;
                    writeln!(writer, "{line}")?;
                }
            }
        }
        Ok(())
    }
}

fn read_sill_record<R: BufRead>(
    reader: &mut LineReader<R>,
    free: bool,
) -> Result<SillRecord, PackageError> {
    // Dataset 8a: IC then IC sublake IDs, five-character fields.
    let line = reader.expect_line("LAK dataset 8a")?;
    let line_no = reader.line_no();
    let ic_value = decode_scalars(
        &line,
        line_no,
        &[FieldLayout::with_width(FieldType::Int, 5)],
        free,
    )?[0];
    let ic = ic_value.as_int().unwrap_or(0);
    if ic < 1 {
        return Err(PackageError::parse(
            line_no,
            format!("sublake count IC must be positive, got {ic}"),
        ));
    }
    let layout = vec![FieldLayout::with_width(FieldType::Int, 5); ic as usize + 1];
    let values = decode_scalars(&line, line_no, &layout, free)?;
    let sublakes: Vec<i64> = values[1..].iter().filter_map(Value::as_int).collect();

    // Dataset 8b: IC - 1 sill elevations.
    let line = reader.expect_line("LAK dataset 8b")?;
    let line_no = reader.line_no();
    let layout = vec![FieldLayout::new(FieldType::Float); ic as usize - 1];
    let values = decode_scalars(&line, line_no, &layout, free)?;
    let sill_elevations: Vec<f64> = values.iter().filter_map(Value::as_float).collect();

    SillRecord::new(sublakes, sill_elevations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BasicModel;
    use crate::records::Effective;
    use std::io::Cursor;

    fn shape() -> GridShape {
        GridShape::new(1, 2, 2)
    }

    fn model(nper: usize) -> BasicModel {
        BasicModel::new(shape(), nper).with_steady(vec![true])
    }

    fn flux_record(scale: f64) -> Vec<Value> {
        vec![
            Value::Float(0.01 * scale),
            Value::Float(0.02 * scale),
            Value::Float(0.0),
            Value::Float(0.0),
            Value::Float(14.0),
            Value::Float(22.0),
        ]
    }

    fn sample_package(model: &mut BasicModel) -> LakPackage {
        let nper = model.nper();
        let mut data = LakData::empty(nper);
        data.lake_arrays
            .set(0, PeriodEntry::Data(Array3d::constant(shape(), 1)))
            .unwrap();
        data.leakance_arrays
            .set(0, PeriodEntry::Data(Array3d::constant(shape(), 0.1)))
            .unwrap();
        let mut flux = RecordSet::new(RecordSchema::lak_flux());
        flux.push(flux_record(1.0)).unwrap();
        data.flux_data.set_records(0, flux).unwrap();

        let config = LakConfig {
            stages: vec![15.6],
            stage_range: vec![(14.0, 22.0)],
            ..Default::default()
        };
        LakPackage::new(model, config, data, None).unwrap()
    }

    fn write_to_string(package: &LakPackage) -> String {
        let mut out = Vec::new();
        package.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn write_orders_datasets_like_the_engine_expects() {
        let mut model = model(2);
        let package = sample_package(&mut model);
        let text = write_to_string(&package);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("# LAK package"));
        // Dataset 1b: nlakes, ipakcb.
        assert_eq!(lines[1].split_whitespace().next(), Some("1"));
        // Dataset 2: theta, nssitr, sscncr, surfdep (theta < 0).
        assert_eq!(lines[2].split_whitespace().count(), 4);
        // Dataset 3: stage, ssmn, ssmx (first period steady).
        assert_eq!(lines[3].split_whitespace().count(), 3);
        assert!(text.contains("Stress period 1"));
        assert!(text.contains("CONSTANT 1"));
        assert!(text.contains("Data set 7"));
    }

    #[test]
    fn round_trip_preserves_every_period_store() {
        let mut model = model(3);
        let mut package = sample_package(&mut model);
        // Period 2 clears the flux tables; period 1 carries everything.
        package.data.flux_data.set_clear(2).unwrap();
        let text = write_to_string(&package);

        let mut model2 = model.clone();
        let loaded =
            LakPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model2, None).unwrap();

        assert_eq!(loaded.config().nlakes, 1);
        assert_eq!(loaded.config().stages, vec![15.6]);
        assert_eq!(loaded.stage_range(), &[(14.0, 22.0)]);

        for kper in 0..3 {
            assert_eq!(
                package.data.lake_arrays.effective(kper).unwrap(),
                loaded.data.lake_arrays.effective(kper).unwrap(),
                "lake arrays, period {kper}"
            );
            assert_eq!(
                package.data.flux_data.effective(kper).unwrap(),
                loaded.data.flux_data.effective(kper).unwrap(),
                "flux data, period {kper}"
            );
        }
        // A loaded file writes back identically.
        assert_eq!(text, write_to_string(&loaded));
    }

    #[test]
    fn sill_tables_round_trip_inside_the_array_block() {
        let mut model = model(1);
        let mut data = LakData::empty(1);
        data.lake_arrays
            .set(0, PeriodEntry::Data(Array3d::constant(shape(), 2)))
            .unwrap();
        data.leakance_arrays
            .set(0, PeriodEntry::Data(Array3d::constant(shape(), 0.5)))
            .unwrap();
        data.sill_data
            .set(
                0,
                PeriodEntry::Data(vec![
                    SillRecord::new(vec![1, 2, 3], vec![100.5, 101.0]).unwrap()
                ]),
            )
            .unwrap();
        let config = LakConfig {
            stages: vec![15.6],
            ..Default::default()
        };
        let package = LakPackage::new(&mut model, config, data, None).unwrap();
        let text = write_to_string(&package);

        let loaded =
            LakPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model.clone(), None)
                .unwrap();
        let Effective::Explicit(sills) = loaded.data.sill_data.effective(0).unwrap() else {
            panic!("expected explicit sill data");
        };
        assert_eq!(sills.len(), 1);
        assert_eq!(sills[0].sublakes, vec![1, 2, 3]);
        assert_eq!(sills[0].sill_elevations, vec![100.5, 101.0]);
    }

    #[test]
    fn steady_periods_after_the_first_write_six_flux_columns() {
        let mut model = BasicModel::new(shape(), 2).with_steady(vec![true, true]);
        let mut package = sample_package(&mut model);
        let mut flux = RecordSet::new(RecordSchema::lak_flux());
        flux.push(flux_record(2.0)).unwrap();
        package.data.flux_data.set_records(1, flux).unwrap();

        let text = write_to_string(&package);
        let flux_lines: Vec<&str> = text
            .lines()
            .filter(|l| l.contains("Data set 9a"))
            .collect();
        assert_eq!(flux_lines.len(), 2);
        // Four value columns plus the comment on period 1, six on period 2.
        assert_eq!(flux_lines[0].split_whitespace().count(), 4 + 3);
        assert_eq!(flux_lines[1].split_whitespace().count(), 6 + 3);

        let loaded =
            LakPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model.clone(), None)
                .unwrap();
        let Effective::Explicit(set) = loaded.data.flux_data.effective(1).unwrap() else {
            panic!();
        };
        assert_eq!(set.records()[0][4], Value::Float(14.0));
    }

    #[test]
    fn fixed_format_files_round_trip() {
        let mut model = BasicModel::new(shape(), 2)
            .with_steady(vec![true])
            .with_free_format(false);
        let package = sample_package(&mut model);
        let text = write_to_string(&package);

        let mut model2 = model.clone();
        let loaded =
            LakPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model2, None).unwrap();
        assert_eq!(loaded.config().stages, vec![15.6]);
        assert_eq!(text, write_to_string(&loaded));
    }

    #[test]
    fn stage_count_mismatch_is_rejected_at_construction() {
        let mut model = model(1);
        let config = LakConfig {
            nlakes: 2,
            stages: vec![15.6],
            ..Default::default()
        };
        let err = LakPackage::new(&mut model, config, LakData::empty(1), None).unwrap_err();
        assert!(matches!(err, PackageError::Config(_)));
    }

    #[test]
    fn mismatched_array_periods_are_rejected() {
        let mut model = model(2);
        let mut data = LakData::empty(2);
        data.lake_arrays
            .set(0, PeriodEntry::Data(Array3d::constant(shape(), 1)))
            .unwrap();
        // No leakance array for period 0.
        let config = LakConfig {
            stages: vec![15.6],
            ..Default::default()
        };
        let err = LakPackage::new(&mut model, config, data, None).unwrap_err();
        assert!(matches!(err, PackageError::Config(_)));
    }

    #[test]
    fn table_input_allocates_and_registers_tab_units() {
        let mut model = model(1);
        let config = LakConfig {
            stages: vec![15.6],
            table_input: true,
            tab_files: vec!["lake1.tab".to_string()],
            ..Default::default()
        };
        let package = LakPackage::new(&mut model, config, LakData::empty(1), None).unwrap();
        assert_eq!(package.tab_units().len(), 1);
        assert_eq!(model.external_files().len(), 1);
        assert_eq!(model.external_files()[0].0, "lake1.tab");
    }

    #[test]
    fn tableinput_option_and_units_survive_a_round_trip() {
        let mut model = model(1);
        let config = LakConfig {
            stages: vec![15.6],
            table_input: true,
            tab_files: vec!["lake1.tab".to_string()],
            ..Default::default()
        };
        let package = LakPackage::new(&mut model, config, LakData::empty(1), None).unwrap();
        let text = write_to_string(&package);
        assert!(text.starts_with("# LAK package"));
        assert!(text.contains("TABLEINPUT"));

        let loaded =
            LakPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model.clone(), None)
                .unwrap();
        assert!(loaded.config().table_input);
        assert_eq!(loaded.tab_units(), package.tab_units());
    }
}
