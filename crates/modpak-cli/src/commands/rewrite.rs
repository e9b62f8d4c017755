use crate::cli::{PackageKind, RewriteArgs};
use crate::error::Result;
use modpak::io::traits::PackageFile;
use modpak::packages::ghb::GhbPackage;
use modpak::packages::lak::LakPackage;
use tracing::info;

pub fn run(args: RewriteArgs) -> Result<()> {
    let mut model = args.model.build()?;
    info!("Loading package file from {:?}", &args.input);

    match args.package {
        PackageKind::Ghb => {
            let package = GhbPackage::read_from_path(&args.input, &mut model, None)?;
            package.write_to_path(&args.output)?;
        }
        PackageKind::Lak => {
            let package = LakPackage::read_from_path(&args.input, &mut model, None)?;
            package.write_to_path(&args.output)?;
        }
    }

    info!("Wrote normalized package file to {:?}", &args.output);
    println!("Wrote {}", args.output.display());
    Ok(())
}
