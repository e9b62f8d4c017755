//! General-Head Boundary (GHB) package adapter.

use super::{decode_record, encode_record, skip_header_comments};
use crate::error::PackageError;
use crate::io::traits::PackageFile;
use crate::io::LineReader;
use crate::model::Model;
use crate::records::{
    Effective, PeriodEntry, RecordSchema, RecordSet, SchemaError, TransientList, Value,
};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::debug;

/// Package-level GHB parameters, validated once at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GhbConfig {
    /// Cell-by-cell budget unit number; zero disables budget output.
    pub ipakcb: i32,
    /// Suppress printing of boundary lists in the engine listing file.
    pub no_print: bool,
    /// Names of auxiliary columns appended to every boundary record.
    pub aux: Vec<String>,
}

/// General-Head Boundary package: per-period boundary records of
/// (layer, row, column, boundary head, conductance) plus any auxiliary
/// columns.
#[derive(Debug, Clone)]
pub struct GhbPackage {
    config: GhbConfig,
    stress_period_data: TransientList,
    free_format: bool,
    heading: String,
}

impl GhbPackage {
    pub const FTYPE: &'static str = "GHB";
    pub const DEFAULT_UNIT: i32 = 23;

    /// Builds the adapter from caller-supplied data, bypassing load.
    ///
    /// The store's schema must be the GHB base schema extended with exactly
    /// the auxiliary names in `config.aux`. A nonzero `ipakcb` is
    /// registered with the host model as a budget output unit.
    pub fn new(
        model: &mut impl Model,
        config: GhbConfig,
        stress_period_data: TransientList,
    ) -> Result<Self, PackageError> {
        let expected = RecordSchema::ghb().with_aux(&config.aux);
        if stress_period_data.schema() != &expected {
            return Err(PackageError::Config(
                "stress period data schema does not match the configured auxiliary names"
                    .to_string(),
            ));
        }
        if config.ipakcb != 0 {
            model.add_output_file(config.ipakcb, None, Self::FTYPE);
        }
        Ok(GhbPackage {
            config,
            stress_period_data,
            free_format: model.free_format(),
            heading: format!("# {} package for MODFLOW, generated by modpak.", Self::FTYPE),
        })
    }

    /// Builds an adapter with an empty store covering every stress period.
    pub fn empty(model: &mut impl Model, config: GhbConfig) -> Result<Self, PackageError> {
        let schema = RecordSchema::ghb().with_aux(&config.aux);
        let store = TransientList::new(model.nper(), schema);
        Self::new(model, config, store)
    }

    pub fn config(&self) -> &GhbConfig {
        &self.config
    }

    pub fn stress_period_data(&self) -> &TransientList {
        &self.stress_period_data
    }

    pub fn stress_period_data_mut(&mut self) -> &mut TransientList {
        &mut self.stress_period_data
    }

    /// Maximum number of boundaries active in any stress period.
    pub fn max_active(&self) -> usize {
        self.stress_period_data.max_active()
    }

    /// Convenience record mutator; see [`TransientList::add_record`].
    pub fn add_record(
        &mut self,
        period: usize,
        index: usize,
        values: Vec<Value>,
    ) -> Result<(), PackageError> {
        self.stress_period_data
            .add_record(period, index, values)
            .map_err(PackageError::from)
    }

    fn parse_options(
        tokens: &[&str],
        line_no: usize,
    ) -> Result<(bool, Vec<String>), PackageError> {
        let mut no_print = false;
        let mut aux = Vec::new();
        let mut it = tokens.iter();
        while let Some(token) = it.next() {
            let upper = token.to_ascii_uppercase();
            if upper == "NOPRINT" {
                no_print = true;
            } else if upper == "AUX" || upper == "AUXILIARY" {
                let name = it.next().ok_or_else(|| {
                    PackageError::parse(line_no, "AUX option is missing a variable name")
                })?;
                aux.push(name.to_lowercase());
            }
            // Unrecognized option tokens are tolerated, like trailing
            // columns on record lines.
        }
        Ok((no_print, aux))
    }
}

impl PackageFile for GhbPackage {
    fn read_from(
        reader: &mut impl BufRead,
        model: &mut impl Model,
        nper: Option<usize>,
    ) -> Result<Self, PackageError> {
        let mut reader = LineReader::new(reader);
        let mut line = skip_header_comments(&mut reader, "the GHB header")?;

        // Named-parameter blocks are a separate legacy mechanism this
        // adapter does not reproduce.
        if line.to_ascii_lowercase().contains("parameter") {
            let line_no = reader.line_no();
            let np: i64 = line
                .split_whitespace()
                .nth(1)
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| PackageError::parse(line_no, "malformed PARAMETER line"))?;
            if np != 0 {
                return Err(PackageError::unsupported(line_no, "GHB parameters"));
            }
            line = reader.expect_line("the GHB header")?;
        }

        let header_no = reader.line_no();
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let _mxact: i64 = tokens
            .first()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| {
                PackageError::parse(header_no, "expected MXACTB count in the GHB header")
            })?;
        let ipakcb: i32 = tokens.get(1).and_then(|t| t.parse().ok()).unwrap_or(0);
        let (no_print, aux) = Self::parse_options(tokens.get(2..).unwrap_or(&[]), header_no)?;

        let nper = nper.unwrap_or_else(|| model.nper());
        let free = model.free_format();
        let schema = RecordSchema::ghb().with_aux(&aux);
        let mut store = TransientList::new(nper, schema.clone());

        for kper in 0..nper {
            let Some(line) = reader.next_line()? else {
                // Remaining periods carry forward, matching the engine's
                // tolerance for truncated period blocks.
                break;
            };
            debug!(kper = kper + 1, "loading GHB stress period data");
            let count_no = reader.line_no();
            let itmp: i64 = line
                .split_whitespace()
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| {
                    PackageError::parse(count_no, "expected ITMP count for stress period")
                })?;
            if itmp > 0 {
                let mut set = RecordSet::new(schema.clone());
                for _ in 0..itmp {
                    let line = reader.expect_line("GHB boundary records")?;
                    let line_no = reader.line_no();
                    let record = decode_record(&line, line_no, &schema, free)?;
                    set.push(record)
                        .map_err(|source| PackageError::Schema {
                            line: line_no,
                            source,
                        })?;
                }
                store.set_records(kper, set)?;
            } else if itmp == 0 {
                store.set_clear(kper)?;
            }
            // Negative ITMP: reuse the previous period's data; the store
            // key stays absent.
        }

        let config = GhbConfig {
            ipakcb,
            no_print,
            aux,
        };
        Self::new(model, config, store)
    }

    fn write_to(&self, writer: &mut impl Write) -> Result<(), PackageError> {
        writeln!(writer, "{}", self.heading)?;

        let mut header = format!("{:>10}{:>10}", self.max_active(), self.config.ipakcb);
        if self.config.no_print {
            header.push_str("  NOPRINT");
        }
        for name in &self.config.aux {
            header.push_str(&format!("  AUX {}", name.to_uppercase()));
        }
        writeln!(writer, "{header}")?;

        for kper in 0..self.stress_period_data.nper() {
            let itmp: i64 = match self.stress_period_data.entry(kper) {
                Some(PeriodEntry::Data(set)) => set.len() as i64,
                Some(PeriodEntry::Clear) => 0,
                None => -1,
            };
            writeln!(
                writer,
                "{:>10}{:>10}  # stress period {}",
                itmp,
                0,
                kper + 1
            )?;
            if let Some(PeriodEntry::Data(set)) = self.stress_period_data.entry(kper) {
                for record in set.records() {
                    let line = encode_record(record, self.stress_period_data.schema(), self.free_format)
                        .map_err(|source| PackageError::Format { line: 0, source })?;
                    writeln!(writer, "{line}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BasicModel, GridShape};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn model(nper: usize) -> BasicModel {
        BasicModel::new(GridShape::new(3, 10, 10), nper)
    }

    fn ghb_record(stage: f64) -> Vec<Value> {
        vec![
            Value::Int(2),
            Value::Int(3),
            Value::Int(4),
            Value::Float(stage),
            Value::Float(100.0),
        ]
    }

    fn sample_package(model: &mut BasicModel) -> GhbPackage {
        let mut store = TransientList::new(model.nper(), RecordSchema::ghb());
        let mut set = RecordSet::new(RecordSchema::ghb());
        set.push(ghb_record(10.0)).unwrap();
        store.set_records(0, set).unwrap();
        store.set_clear(2).unwrap();
        GhbPackage::new(model, GhbConfig::default(), store).unwrap()
    }

    fn write_to_string(package: &GhbPackage) -> String {
        let mut out = Vec::new();
        package.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn write_emits_three_way_period_counts() {
        let mut model = model(4);
        let package = sample_package(&mut model);
        let text = write_to_string(&package);
        let counts: Vec<i64> = text
            .lines()
            .filter(|l| l.contains("# stress period"))
            .map(|l| l.split_whitespace().next().unwrap().parse().unwrap())
            .collect();
        // Explicit, carried, cleared, carried.
        assert_eq!(counts, vec![1, -1, 0, -1]);
    }

    #[test]
    fn round_trip_preserves_effective_state_of_every_period() {
        let mut model = model(4);
        let package = sample_package(&mut model);
        let text = write_to_string(&package);

        let mut model2 = model.clone();
        let loaded =
            GhbPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model2, None).unwrap();

        for kper in 0..4 {
            let before = package.stress_period_data().effective(kper).unwrap();
            let after = loaded.stress_period_data().effective(kper).unwrap();
            match (before, after) {
                (Effective::Explicit(a), Effective::Explicit(b)) => {
                    assert_eq!(a.records(), b.records(), "period {kper}");
                }
                (a, b) => assert_eq!(a, b, "period {kper}"),
            }
        }
        // A loaded file writes back identically.
        assert_eq!(text, write_to_string(&loaded));
    }

    #[test]
    fn aux_columns_round_trip_through_the_header_and_records() {
        let mut model = model(1);
        let config = GhbConfig {
            aux: vec!["temp".to_string()],
            no_print: true,
            ..Default::default()
        };
        let schema = RecordSchema::ghb().with_aux(&["temp"]);
        let mut store = TransientList::new(1, schema.clone());
        let mut set = RecordSet::new(schema);
        let mut record = ghb_record(10.0);
        record.push(Value::Float(17.5));
        set.push(record).unwrap();
        store.set_records(0, set).unwrap();
        let package = GhbPackage::new(&mut model, config, store).unwrap();

        let text = write_to_string(&package);
        assert!(text.contains("NOPRINT"));
        assert!(text.contains("AUX TEMP"));

        let loaded =
            GhbPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model.clone(), None)
                .unwrap();
        assert_eq!(loaded.config().aux, vec!["temp"]);
        let set = loaded.stress_period_data().effective(0).unwrap();
        let Effective::Explicit(set) = set else {
            panic!("expected explicit period 0");
        };
        assert_eq!(set.records()[0][5], Value::Float(17.5));
    }

    #[test]
    fn load_maps_counts_to_explicit_clear_and_absent() {
        let text = "\
# GHB input
        10         0
         1         0
         3         4         5      10.5     120.0
         0         0
        -1         0
";
        let mut model = model(3);
        let loaded =
            GhbPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model, None).unwrap();
        let store = loaded.stress_period_data();
        assert!(matches!(store.entry(0), Some(PeriodEntry::Data(_))));
        assert!(matches!(store.entry(1), Some(PeriodEntry::Clear)));
        assert!(store.entry(2).is_none());
        // Grid indices come back 0-based.
        let Effective::Explicit(set) = store.effective(0).unwrap() else {
            panic!();
        };
        assert_eq!(set.records()[0][0], Value::Int(2));
    }

    #[test]
    fn nonzero_parameter_count_is_unsupported() {
        let text = "PARAMETER 2 10\n        10         0\n        -1\n";
        let mut model = model(1);
        let err =
            GhbPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model, None).unwrap_err();
        assert!(matches!(err, PackageError::Unsupported { .. }));
    }

    #[test]
    fn non_numeric_count_line_aborts_the_load() {
        let text = "# GHB input\nbogus header\n";
        let mut model = model(1);
        let err =
            GhbPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model, None).unwrap_err();
        assert!(matches!(err, PackageError::Parse { .. }));
    }

    #[test]
    fn open_close_in_a_period_block_is_unsupported() {
        let text = "\
        10         0
         1         0
OPEN/CLOSE ghb_sp1.dat
";
        let mut model = model(1);
        let err =
            GhbPackage::read_from(&mut Cursor::new(text.as_bytes()), &mut model, None).unwrap_err();
        assert!(matches!(err, PackageError::Unsupported { .. }));
    }

    #[test]
    fn nonzero_ipakcb_registers_a_budget_output_unit() {
        let mut model = model(1);
        let config = GhbConfig {
            ipakcb: 53,
            ..Default::default()
        };
        GhbPackage::empty(&mut model, config).unwrap();
        assert_eq!(model.output_files().len(), 1);
        assert_eq!(model.output_files()[0].0, 53);
        assert_eq!(model.output_files()[0].2, "GHB");
    }

    #[test]
    fn schema_mismatch_with_config_is_rejected_at_construction() {
        let mut model = model(1);
        let store = TransientList::new(1, RecordSchema::ghb().with_aux(&["temp"]));
        let err = GhbPackage::new(&mut model, GhbConfig::default(), store).unwrap_err();
        assert!(matches!(err, PackageError::Config(_)));
    }

    #[test]
    fn path_round_trip_via_tempdir() {
        let mut model = model(4);
        let package = sample_package(&mut model);
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ghb");
        package.write_to_path(&path).unwrap();
        let loaded = GhbPackage::read_from_path(&path, &mut model.clone(), None).unwrap();
        assert_eq!(loaded.max_active(), package.max_active());
    }
}
