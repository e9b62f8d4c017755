//! Host-model seam required by the package adapters.
//!
//! Adapters never own grid dimensions, stress-period timing, or unit-number
//! bookkeeping; they ask the surrounding model through the [`Model`] trait.
//! [`BasicModel`] is a self-contained implementation for building input
//! decks programmatically and for tests.

/// Grid dimensions of the host model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub nlay: usize,
    pub nrow: usize,
    pub ncol: usize,
}

impl GridShape {
    pub fn new(nlay: usize, nrow: usize, ncol: usize) -> Self {
        GridShape { nlay, nrow, ncol }
    }

    pub fn layer_cells(&self) -> usize {
        self.nrow * self.ncol
    }
}

/// Interface the package adapters require from the surrounding model.
pub trait Model {
    /// Number of stress periods in the simulation.
    fn nper(&self) -> usize;

    /// Grid dimensions (layers, rows, columns).
    fn shape(&self) -> GridShape;

    /// Whether the given stress period is steady-state.
    fn is_steady(&self, period: usize) -> bool;

    /// Whether package files are written and read in free format.
    fn free_format(&self) -> bool;

    /// Allocates the next unused external file unit number.
    fn next_ext_unit(&mut self) -> i32;

    /// Registers an output file produced by a package (for example the
    /// cell-by-cell budget file selected by a nonzero `ipakcb`).
    fn add_output_file(&mut self, unit: i32, fname: Option<&str>, ftype: &str);

    /// Registers an external input file consumed by a package.
    fn add_external(&mut self, fname: &str, unit: i32);
}

/// In-memory host model for programmatic deck construction.
#[derive(Debug, Clone)]
pub struct BasicModel {
    nper: usize,
    shape: GridShape,
    steady: Vec<bool>,
    free_format: bool,
    next_unit: i32,
    output_files: Vec<(i32, Option<String>, String)>,
    external_files: Vec<(String, i32)>,
}

impl BasicModel {
    pub fn new(shape: GridShape, nper: usize) -> Self {
        BasicModel {
            nper,
            shape,
            steady: vec![false; nper],
            free_format: true,
            next_unit: 1001,
            output_files: Vec::new(),
            external_files: Vec::new(),
        }
    }

    /// Marks which stress periods are steady-state. The flag list must have
    /// one entry per period; shorter lists leave the remainder transient.
    pub fn with_steady(mut self, steady: Vec<bool>) -> Self {
        for (i, flag) in steady.into_iter().take(self.nper).enumerate() {
            self.steady[i] = flag;
        }
        self
    }

    pub fn with_free_format(mut self, free: bool) -> Self {
        self.free_format = free;
        self
    }

    pub fn output_files(&self) -> &[(i32, Option<String>, String)] {
        &self.output_files
    }

    pub fn external_files(&self) -> &[(String, i32)] {
        &self.external_files
    }
}

impl Model for BasicModel {
    fn nper(&self) -> usize {
        self.nper
    }

    fn shape(&self) -> GridShape {
        self.shape
    }

    fn is_steady(&self, period: usize) -> bool {
        self.steady.get(period).copied().unwrap_or(false)
    }

    fn free_format(&self) -> bool {
        self.free_format
    }

    fn next_ext_unit(&mut self) -> i32 {
        let unit = self.next_unit;
        self.next_unit += 1;
        unit
    }

    fn add_output_file(&mut self, unit: i32, fname: Option<&str>, ftype: &str) {
        self.output_files
            .push((unit, fname.map(str::to_string), ftype.to_string()));
    }

    fn add_external(&mut self, fname: &str, unit: i32) {
        self.external_files.push((fname.to_string(), unit));
    }
}
