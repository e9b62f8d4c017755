use crate::cli::{BuildArgs, PackageKind};
use crate::deck::Deck;
use crate::error::Result;
use modpak::io::traits::PackageFile;
use tracing::info;

pub fn run(args: BuildArgs) -> Result<()> {
    info!("Reading deck from {:?}", &args.deck);
    let deck = Deck::from_file(&args.deck)?;
    let mut model = deck.build_model()?;

    match deck.package_kind() {
        PackageKind::Ghb => {
            let package = deck.build_ghb(&mut model)?;
            package.write_to_path(&args.output)?;
        }
        PackageKind::Lak => {
            let package = deck.build_lak(&mut model)?;
            package.write_to_path(&args.output)?;
        }
    }

    info!("Wrote package file to {:?}", &args.output);
    println!("Wrote {}", args.output.display());
    Ok(())
}
