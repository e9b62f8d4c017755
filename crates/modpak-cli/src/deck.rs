//! TOML deck descriptions for the `build` subcommand.
//!
//! A deck restates the simulation context (grid, timing, format) and
//! describes exactly one package. Grid indices and stress periods are
//! 1-based in the deck, matching the engine's input conventions; they are
//! shifted to the crate's 0-based in-memory convention here.

use crate::cli::PackageKind;
use crate::error::{CliError, Result};
use modpak::io::arrays::Array3d;
use modpak::model::{BasicModel, GridShape, Model};
use modpak::packages::ghb::{GhbConfig, GhbPackage};
use modpak::packages::lak::{LakConfig, LakData, LakPackage, SillRecord};
use modpak::records::{PeriodEntry, RecordSchema, RecordSet, Value};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Deck {
    pub model: ModelSection,
    pub ghb: Option<GhbSection>,
    pub lak: Option<LakSection>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ModelSection {
    pub nper: usize,
    pub nlay: usize,
    pub nrow: usize,
    pub ncol: usize,
    /// 1-based stress periods that are steady-state.
    #[serde(default)]
    pub steady: Vec<usize>,
    #[serde(default = "default_true")]
    pub free_format: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GhbSection {
    #[serde(default)]
    pub ipakcb: i32,
    #[serde(default)]
    pub no_print: bool,
    #[serde(default)]
    pub aux: Vec<String>,
    #[serde(default, rename = "period")]
    pub periods: Vec<GhbPeriod>,
}

/// One stress-period entry of a GHB deck: either an explicit record list
/// or an explicit clear.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GhbPeriod {
    /// 1-based stress period.
    pub period: usize,
    #[serde(default)]
    pub clear: bool,
    /// Records as `[layer, row, column, bhead, cond, aux...]` with 1-based
    /// grid indices.
    #[serde(default)]
    pub records: Vec<Vec<f64>>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LakSection {
    #[serde(default = "default_nlakes")]
    pub nlakes: usize,
    #[serde(default)]
    pub ipakcb: i32,
    #[serde(default = "default_theta")]
    pub theta: f64,
    #[serde(default)]
    pub nssitr: i64,
    #[serde(default)]
    pub sscncr: f64,
    #[serde(default)]
    pub surfdep: f64,
    pub stages: Vec<f64>,
    #[serde(default)]
    pub stage_range: Vec<(f64, f64)>,
    #[serde(default)]
    pub table_input: bool,
    #[serde(default)]
    pub tab_files: Vec<String>,
    #[serde(default)]
    pub lwrt: i64,
    #[serde(default, rename = "period")]
    pub periods: Vec<LakPeriod>,
}

fn default_nlakes() -> usize {
    1
}

fn default_theta() -> f64 {
    -1.0
}

/// One stress-period entry of a LAK deck. Arrays are given as uniform
/// constants; `lake-ids` and `leakance` must appear together.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LakPeriod {
    /// 1-based stress period.
    pub period: usize,
    #[serde(default)]
    pub clear: bool,
    pub lake_ids: Option<i32>,
    pub leakance: Option<f64>,
    #[serde(default)]
    pub sills: Vec<SillSpec>,
    /// Per-lake flux rows `[precip, evap, runoff, withdrawal]`, optionally
    /// followed by `[ssmn, ssmx]`.
    pub fluxes: Option<Vec<Vec<f64>>>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SillSpec {
    pub sublakes: Vec<i64>,
    pub elevations: Vec<f64>,
}

impl Deck {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let deck: Deck = toml::from_str(&text).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        deck.validate()?;
        Ok(deck)
    }

    fn validate(&self) -> Result<()> {
        match (&self.ghb, &self.lak) {
            (Some(_), Some(_)) => Err(CliError::Deck(
                "a deck must describe exactly one package, found both [ghb] and [lak]".to_string(),
            )),
            (None, None) => Err(CliError::Deck(
                "a deck must contain a [ghb] or [lak] section".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn package_kind(&self) -> PackageKind {
        if self.ghb.is_some() {
            PackageKind::Ghb
        } else {
            PackageKind::Lak
        }
    }

    pub fn build_model(&self) -> Result<BasicModel> {
        let m = &self.model;
        if m.nper == 0 {
            return Err(CliError::Deck(
                "the model needs at least one stress period".to_string(),
            ));
        }
        let mut steady = vec![false; m.nper];
        for &period in &m.steady {
            if period == 0 || period > m.nper {
                return Err(CliError::Deck(format!(
                    "steady period {period} out of range 1..={}",
                    m.nper
                )));
            }
            steady[period - 1] = true;
        }
        Ok(
            BasicModel::new(GridShape::new(m.nlay, m.nrow, m.ncol), m.nper)
                .with_steady(steady)
                .with_free_format(m.free_format),
        )
    }

    fn check_period(&self, period: usize) -> Result<usize> {
        if period == 0 || period > self.model.nper {
            return Err(CliError::Deck(format!(
                "stress period {period} out of range 1..={}",
                self.model.nper
            )));
        }
        Ok(period - 1)
    }

    pub fn build_ghb(&self, model: &mut BasicModel) -> Result<GhbPackage> {
        let section = self
            .ghb
            .as_ref()
            .ok_or_else(|| CliError::Deck("deck has no [ghb] section".to_string()))?;
        let config = GhbConfig {
            ipakcb: section.ipakcb,
            no_print: section.no_print,
            aux: section.aux.clone(),
        };
        let schema = RecordSchema::ghb().with_aux(&config.aux);
        let mut package = GhbPackage::empty(model, config)?;

        for entry in &section.periods {
            let kper = self.check_period(entry.period)?;
            if entry.clear {
                if !entry.records.is_empty() {
                    return Err(CliError::Deck(format!(
                        "stress period {} sets both clear and records",
                        entry.period
                    )));
                }
                package.stress_period_data_mut().set_clear(kper)?;
                continue;
            }
            let mut set = RecordSet::new(schema.clone());
            for row in &entry.records {
                set.push(ghb_record(row, &schema, entry.period)?)
                    .map_err(|e| CliError::Deck(e.to_string()))?;
            }
            package.stress_period_data_mut().set_records(kper, set)?;
        }
        debug!(
            max_active = package.max_active(),
            "built GHB package from deck"
        );
        Ok(package)
    }

    pub fn build_lak(&self, model: &mut BasicModel) -> Result<LakPackage> {
        let section = self
            .lak
            .as_ref()
            .ok_or_else(|| CliError::Deck("deck has no [lak] section".to_string()))?;
        let config = LakConfig {
            nlakes: section.nlakes,
            ipakcb: section.ipakcb,
            theta: section.theta,
            nssitr: section.nssitr,
            sscncr: section.sscncr,
            surfdep: section.surfdep,
            stages: section.stages.clone(),
            stage_range: section.stage_range.clone(),
            table_input: section.table_input,
            tab_files: section.tab_files.clone(),
            lwrt: section.lwrt,
        };
        let shape = model.shape();
        let mut data = LakData::empty(model.nper());

        for entry in &section.periods {
            let kper = self.check_period(entry.period)?;
            if entry.clear {
                data.lake_arrays.set(kper, PeriodEntry::Clear)?;
                data.leakance_arrays.set(kper, PeriodEntry::Clear)?;
                data.flux_data.set_clear(kper)?;
                continue;
            }
            match (entry.lake_ids, entry.leakance) {
                (Some(ids), Some(leakance)) => {
                    data.lake_arrays
                        .set(kper, PeriodEntry::Data(Array3d::constant(shape, ids)))?;
                    data.leakance_arrays
                        .set(kper, PeriodEntry::Data(Array3d::constant(shape, leakance)))?;
                    if !entry.sills.is_empty() {
                        let mut sills = Vec::with_capacity(entry.sills.len());
                        for spec in &entry.sills {
                            sills.push(SillRecord::new(
                                spec.sublakes.clone(),
                                spec.elevations.clone(),
                            )?);
                        }
                        data.sill_data.set(kper, PeriodEntry::Data(sills))?;
                    }
                }
                (None, None) => {
                    if !entry.sills.is_empty() {
                        return Err(CliError::Deck(format!(
                            "stress period {} gives sills without lake arrays",
                            entry.period
                        )));
                    }
                }
                _ => {
                    return Err(CliError::Deck(format!(
                        "stress period {} must give lake-ids and leakance together",
                        entry.period
                    )));
                }
            }
            if let Some(rows) = &entry.fluxes {
                let mut set = RecordSet::new(RecordSchema::lak_flux());
                for (lake, row) in rows.iter().enumerate() {
                    set.push(flux_record(row, section, lake, entry.period)?)
                        .map_err(|e| CliError::Deck(e.to_string()))?;
                }
                data.flux_data.set_records(kper, set)?;
            }
        }
        Ok(LakPackage::new(model, config, data, None)?)
    }
}

/// Converts one deck row into a typed GHB record, shifting the three
/// leading grid indices from 1-based to 0-based.
fn ghb_record(row: &[f64], schema: &RecordSchema, period: usize) -> Result<Vec<Value>> {
    if row.len() != schema.len() {
        return Err(CliError::Deck(format!(
            "stress period {period}: record has {} values but the schema needs {}",
            row.len(),
            schema.len()
        )));
    }
    let mut values = Vec::with_capacity(row.len());
    for (pos, &v) in row.iter().enumerate() {
        if pos < 3 {
            if v.fract() != 0.0 || v < 1.0 {
                return Err(CliError::Deck(format!(
                    "stress period {period}: grid index {v} is not a positive integer"
                )));
            }
            values.push(Value::Int(v as i64 - 1));
        } else {
            values.push(Value::Float(v));
        }
    }
    Ok(values)
}

/// Converts one deck flux row to the six-column schema, filling omitted
/// stage limits from the deck's `stage-range` (or zeros).
fn flux_record(row: &[f64], section: &LakSection, lake: usize, period: usize) -> Result<Vec<Value>> {
    let mut values: Vec<Value> = row.iter().map(|&v| Value::Float(v)).collect();
    match row.len() {
        6 => {}
        4 => {
            let (ssmn, ssmx) = section
                .stage_range
                .get(lake)
                .copied()
                .unwrap_or((0.0, 0.0));
            values.push(Value::Float(ssmn));
            values.push(Value::Float(ssmx));
        }
        n => {
            return Err(CliError::Deck(format!(
                "stress period {period}: flux row has {n} values, expected 4 or 6"
            )));
        }
    }
    Ok(values)
}
