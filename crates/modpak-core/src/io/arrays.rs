//! Inline 3-D array blocks (LAK datasets 5 and 6).
//!
//! Each layer of an array is introduced by a control record. `CONSTANT`
//! fills the layer with one value; `INTERNAL` is followed by the layer's
//! values wrapped across as many lines as needed. `EXTERNAL` and
//! `OPEN/CLOSE` indirection is deliberately not reproduced: encountering it
//! is an explicit unsupported-feature error, never a silent skip.

use super::LineReader;
use crate::error::PackageError;
use crate::model::GridShape;
use std::io::{BufRead, Write};
use tracing::trace;

/// Scalar element of an inline array.
pub trait ArrayElement: Copy + PartialEq {
    const KIND: &'static str;

    fn parse(token: &str) -> Option<Self>;
    fn format(&self) -> String;
    fn apply_multiplier(self, cnstnt: f64) -> Self;
}

impl ArrayElement for i32 {
    const KIND: &'static str = "integer";

    fn parse(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    fn format(&self) -> String {
        self.to_string()
    }

    fn apply_multiplier(self, cnstnt: f64) -> Self {
        if cnstnt == 0.0 || cnstnt == 1.0 {
            self
        } else {
            (self as f64 * cnstnt) as i32
        }
    }
}

impl ArrayElement for f64 {
    const KIND: &'static str = "real";

    fn parse(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    fn format(&self) -> String {
        if *self == self.trunc() && self.abs() < 1e15 {
            format!("{self:.1}")
        } else {
            format!("{self}")
        }
    }

    fn apply_multiplier(self, cnstnt: f64) -> Self {
        if cnstnt == 0.0 { self } else { self * cnstnt }
    }
}

/// Dense (nlay, nrow, ncol) array with row-major layer storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Array3d<T> {
    shape: GridShape,
    data: Vec<T>,
}

impl<T: ArrayElement> Array3d<T> {
    pub fn constant(shape: GridShape, value: T) -> Self {
        let n = shape.nlay * shape.layer_cells();
        Array3d {
            shape,
            data: vec![value; n],
        }
    }

    pub fn from_vec(shape: GridShape, data: Vec<T>) -> Result<Self, PackageError> {
        let expected = shape.nlay * shape.layer_cells();
        if data.len() != expected {
            return Err(PackageError::Config(format!(
                "array data has {} values but the grid holds {} cells",
                data.len(),
                expected
            )));
        }
        Ok(Array3d { shape, data })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn get(&self, k: usize, i: usize, j: usize) -> T {
        self.data[k * self.shape.layer_cells() + i * self.shape.ncol + j]
    }

    /// True when every cell of layer `k` holds the same value.
    fn layer_constant(&self, k: usize) -> Option<T> {
        let cells = self.shape.layer_cells();
        let layer = &self.data[k * cells..(k + 1) * cells];
        let first = *layer.first()?;
        layer.iter().all(|v| *v == first).then_some(first)
    }

    /// Reads one layer control record plus any following value lines.
    fn read_layer<R: BufRead>(
        reader: &mut LineReader<R>,
        shape: GridShape,
        name: &str,
        out: &mut Vec<T>,
    ) -> Result<(), PackageError> {
        let line = reader.expect_line(name)?;
        let line_no = reader.line_no();
        let mut tokens = line.split_whitespace();
        let control = tokens
            .next()
            .ok_or_else(|| PackageError::parse(line_no, format!("empty {name} control record")))?
            .to_ascii_uppercase();

        match control.as_str() {
            "CONSTANT" => {
                let token = tokens.next().ok_or_else(|| {
                    PackageError::parse(line_no, format!("CONSTANT record for {name} has no value"))
                })?;
                let value = T::parse(token).ok_or_else(|| {
                    PackageError::parse(
                        line_no,
                        format!("invalid {} constant '{token}' for {name}", T::KIND),
                    )
                })?;
                out.extend(std::iter::repeat_n(value, shape.layer_cells()));
            }
            "INTERNAL" => {
                let cnstnt: f64 = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(1.0);
                let mut remaining = shape.layer_cells();
                while remaining > 0 {
                    let line = reader.expect_line(name)?;
                    let line_no = reader.line_no();
                    for token in line.split_whitespace() {
                        if remaining == 0 {
                            break;
                        }
                        let value = T::parse(token).ok_or_else(|| {
                            PackageError::parse(
                                line_no,
                                format!("invalid {} value '{token}' in {name}", T::KIND),
                            )
                        })?;
                        out.push(value.apply_multiplier(cnstnt));
                        remaining -= 1;
                    }
                }
            }
            "EXTERNAL" | "OPEN/CLOSE" => {
                return Err(PackageError::unsupported(
                    line_no,
                    format!("{control} array indirection for {name}"),
                ));
            }
            other => {
                return Err(PackageError::parse(
                    line_no,
                    format!("unrecognized array control record '{other}' for {name}"),
                ));
            }
        }
        Ok(())
    }

    /// Reads all `nlay` layers of an inline array.
    pub fn read_from<R: BufRead>(
        reader: &mut LineReader<R>,
        shape: GridShape,
        name: &str,
    ) -> Result<Self, PackageError> {
        trace!(name, "reading inline array block");
        let mut data = Vec::with_capacity(shape.nlay * shape.layer_cells());
        for _ in 0..shape.nlay {
            Self::read_layer(reader, shape, name, &mut data)?;
        }
        Ok(Array3d { shape, data })
    }

    /// Writes all layers, using `CONSTANT` for uniform layers and
    /// `INTERNAL` with one line per grid row otherwise.
    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), std::io::Error> {
        for k in 0..self.shape.nlay {
            if let Some(value) = self.layer_constant(k) {
                writeln!(writer, "CONSTANT {}", value.format())?;
                continue;
            }
            writeln!(writer, "INTERNAL 1 (FREE) -1")?;
            for i in 0..self.shape.nrow {
                let mut line = String::new();
                for j in 0..self.shape.ncol {
                    // The leading space keeps adjacent wide tokens apart.
                    line.push_str(&format!(" {:>13}", self.get(k, i, j).format()));
                }
                writeln!(writer, "{line}")?;
            }
        }
        Ok(())
    }
}
