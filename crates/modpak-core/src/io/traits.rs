use crate::error::PackageError;
use crate::model::Model;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing package input files.
///
/// Implementors parse an existing engine input file into a fully populated
/// adapter (registering any referenced units with the host model) and
/// serialize an adapter back to the exact on-disk layout. Loads are
/// all-or-nothing: a failed read returns no partial adapter.
pub trait PackageFile: Sized {
    /// Reads a package from a buffered reader.
    ///
    /// `nper` overrides the number of stress periods to read; when `None`
    /// it is obtained from the host model.
    fn read_from(
        reader: &mut impl BufRead,
        model: &mut impl Model,
        nper: Option<usize>,
    ) -> Result<Self, PackageError>;

    /// Writes the package input file.
    fn write_to(&self, writer: &mut impl Write) -> Result<(), PackageError>;

    /// Reads a package from a file path.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
        model: &mut impl Model,
        nper: Option<usize>,
    ) -> Result<Self, PackageError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, model, nper)
    }

    /// Writes the package to a file path, flushing on every exit path.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), PackageError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
