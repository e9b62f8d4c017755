//! # modpak Core Library
//!
//! I/O adapters between in-memory model objects and the fixed/free-format
//! text files consumed by MODFLOW-style groundwater simulation engines.
//!
//! ## Architectural Philosophy
//!
//! The library separates the three concerns of legacy package marshalling:
//!
//! - **[`records`]: The Data Model.** Typed record schemas (with optional
//!   auxiliary columns), ordered record sets, and the stress-period store
//!   that resolves the explicit / carry-forward / clear convention used by
//!   the on-disk format to avoid re-specifying unchanged boundary data.
//!
//! - **[`io`]: The Codec Layer.** A symmetric fixed-width / free-format
//!   line codec, inline 2-D/3-D array blocks, and the `PackageFile` trait
//!   that every adapter implements for reading and writing whole files.
//!
//! - **[`packages`]: The Adapters.** One type per boundary-condition
//!   package (GHB, LAK). Each owns its stress-period stores plus validated
//!   package-level parameters and composes the codec on load and write.
//!
//! The [`model`] module defines the small host-model seam (grid shape,
//! stress-period count, unit bookkeeping) the adapters require.

pub mod error;
pub mod io;
pub mod model;
pub mod packages;
pub mod records;
