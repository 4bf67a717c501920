use std::fs::canonicalize;
use std::path::{Path, PathBuf};

use clap::Parser;
use sky130::Sky130;
use substrate::block::Block;
use substrate::context::Context;
use substrate::layout::Layout;
use substrate::schematic::Schematic;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::args::Args;
use crate::config::{parse_config, Cell, CellConfig, CellKind};
use crate::error::{Error, Result};
use crate::params::Orientation;
use crate::verify::{check_drc, run_lvs, write_gds, write_netlist};

pub mod args;

pub fn run() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = load_config(&args.config, args.orientation)?;
    let cell = config.cell();
    match cell {
        Cell::Inverter(inv) => info!(
            cell = %cell.name(),
            pmos = ?config.pmos,
            nmos = ?config.nmos,
            orientation = ?inv.orientation,
            "generating cell"
        ),
        Cell::TGate(_) | Cell::TGateInv(_) => info!(
            cell = %cell.name(),
            pmos = ?config.pmos,
            nmos = ?config.nmos,
            "generating cell"
        ),
    }

    let work_dir = if let Some(output_dir) = &args.output_dir {
        output_dir.clone()
    } else {
        PathBuf::from(cell.name().as_str())
    };
    std::fs::create_dir_all(&work_dir)?;
    let work_dir = canonicalize(work_dir)?;

    let ctx = Context::builder().build();
    match cell {
        Cell::Inverter(inv) => generate(&ctx, inv, &work_dir, &args)?,
        Cell::TGate(tg) => generate(&ctx, tg, &work_dir, &args)?,
        Cell::TGateInv(tgi) => generate(&ctx, tgi, &work_dir, &args)?,
    }

    println!("Artifacts saved to: {:?}", &work_dir);

    Ok(())
}

/// Reads the configuration file at `path` and applies command-line overrides.
fn load_config(path: &Path, orientation: Option<Orientation>) -> Result<CellConfig> {
    let config_path = canonicalize(path).map_err(|err| Error::ConfigRead {
        path: path.to_path_buf(),
        err,
    })?;
    info!(path = ?config_path, "reading configuration file");
    let mut config = parse_config(&config_path)?;
    apply_orientation(&mut config, orientation);
    Ok(config)
}

/// Only inverters have an orientation.
fn apply_orientation(config: &mut CellConfig, orientation: Option<Orientation>) {
    let Some(orientation) = orientation else {
        return;
    };
    match config.cell {
        CellKind::Inverter => config.orientation = orientation,
        cell => warn!(?cell, ?orientation, "ignoring --orientation for a non-inverter cell"),
    }
}

fn generate<T>(ctx: &Context, block: T, work_dir: &Path, args: &Args) -> Result<()>
where
    T: Layout<Schema = Sky130> + Schematic<Schema = Sky130> + Clone,
{
    let name = block.name();
    let gds_path = work_dir.join(format!("{name}.gds"));
    let netlist_path = work_dir.join(format!("{name}.spice"));

    write_gds(ctx, block.clone(), &gds_path)?;
    write_netlist(ctx, block.clone(), &netlist_path)?;

    if args.drc {
        check_drc(&name, &gds_path, &work_dir.join("drc"))?;
    }
    if args.lvs {
        run_lvs(ctx, block, &gds_path, &work_dir.join("lvs"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::params::DeviceSize;

    fn config(cell: CellKind) -> CellConfig {
        CellConfig {
            cell,
            orientation: Orientation::Vertical,
            pmos: DeviceSize::new(2_400, 150),
            nmos: DeviceSize::new(1_200, 150),
        }
    }

    #[test]
    fn orientation_override_applies_to_inverters() {
        let mut inv = config(CellKind::Inverter);
        apply_orientation(&mut inv, Some(Orientation::Horizontal));
        assert_eq!(inv.orientation, Orientation::Horizontal);
        assert!(inv.cell().name().ends_with("_h"));

        apply_orientation(&mut inv, None);
        assert_eq!(inv.orientation, Orientation::Horizontal);
    }

    #[test]
    fn orientation_override_ignored_for_tgates() {
        for kind in [CellKind::Tgate, CellKind::TgateInv] {
            let mut cfg = config(kind);
            let before = cfg.cell().name();
            apply_orientation(&mut cfg, Some(Orientation::Horizontal));
            assert_eq!(cfg, config(kind));
            assert_eq!(cfg.cell().name(), before);
        }
    }

    #[test]
    fn missing_config_path_is_reported() {
        let path = PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/missing_config_path_is_reported/tgate.toml"
        ));
        let err = load_config(&path, None).unwrap_err();
        assert!(matches!(&err, Error::ConfigRead { path: p, .. } if *p == path));
        assert!(err
            .to_string()
            .contains("missing_config_path_is_reported/tgate.toml"));
    }
}
