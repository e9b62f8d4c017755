use crate::cli::{CheckArgs, PackageKind};
use crate::error::Result;
use modpak::io::traits::PackageFile;
use modpak::packages::ghb::GhbPackage;
use modpak::packages::lak::LakPackage;
use modpak::records::{Effective, Transient, TransientList};
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    let mut model = args.model.build()?;
    info!("Loading package file from {:?}", &args.input);

    match args.package {
        PackageKind::Ghb => {
            let package = GhbPackage::read_from_path(&args.input, &mut model, None)?;
            println!("GHB package: {}", args.input.display());
            println!("  maximum active boundaries: {}", package.max_active());
            if !package.config().aux.is_empty() {
                println!("  auxiliary columns: {}", package.config().aux.join(", "));
            }
            if package.config().ipakcb != 0 {
                println!("  budget output unit: {}", package.config().ipakcb);
            }
            print_list_periods(package.stress_period_data());
        }
        PackageKind::Lak => {
            let package = LakPackage::read_from_path(&args.input, &mut model, None)?;
            let config = package.config();
            println!("LAK package: {}", args.input.display());
            println!("  lakes: {}", config.nlakes);
            println!("  initial stages: {:?}", config.stages);
            if config.table_input {
                println!("  table units: {:?}", package.tab_units());
            }
            print_array_periods(&package.data().lake_arrays);
            print_list_periods(&package.data().flux_data);
        }
    }
    Ok(())
}

fn print_list_periods(store: &TransientList) {
    for period in 0..store.nper() {
        let state = match store.effective(period) {
            Ok(Effective::Explicit(set)) => format!("{} record(s)", set.len()),
            Ok(Effective::Clear) => "cleared".to_string(),
            Ok(Effective::Empty) => "no data".to_string(),
            Err(_) => continue,
        };
        let origin = if store.entry(period).is_some() {
            "explicit"
        } else {
            "carried"
        };
        println!("  period {:>3}: {state} ({origin})", period + 1);
    }
}

fn print_array_periods<T>(store: &Transient<T>) {
    let explicit: Vec<usize> = store.explicit_periods().map(|p| p + 1).collect();
    println!("  explicit array periods: {explicit:?}");
}
