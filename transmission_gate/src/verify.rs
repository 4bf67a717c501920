//! GDS and netlist export, plus DRC and LVS with the open-source tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use magic::drc::DrcParams;
use magic_netgen::LvsParams;
use scir::netlist::ConvertibleNetlister;
use sky130::layout::to_gds;
use sky130::{Sky130, Sky130OpenSchema};
use spice::netlist::NetlistOptions;
use spice::Spice;
use substrate::block::Block;
use substrate::context::Context;
use substrate::layout::Layout;
use substrate::schematic::{ConvertSchema, Schematic};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const OPEN_PDKS_ROOT: &str = "OPEN_PDKS_ROOT";

/// Root of the Open-PDKs repo.
pub fn open_pdks_root() -> Result<PathBuf> {
    std::env::var(OPEN_PDKS_ROOT)
        .map(PathBuf::from)
        .map_err(|_| Error::MissingEnv(OPEN_PDKS_ROOT))
}

/// SKY130 magic techfile.
pub fn sky130_magic_tech_file() -> Result<PathBuf> {
    Ok(open_pdks_root()?.join("sky130/magic/sky130.tech"))
}

/// SKY130 netgen setup file.
pub fn sky130_netgen_setup_file() -> Result<PathBuf> {
    Ok(open_pdks_root()?.join("sky130/netgen/sky130_setup.tcl"))
}

/// Writes the layout of `block` to a GDS file.
pub fn write_gds<T>(ctx: &Context, block: T, path: impl AsRef<Path>) -> Result<()>
where
    T: Layout<Schema = Sky130>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    ctx.write_layout(block, to_gds, path)?;
    info!(path = %path.display(), "wrote layout");
    Ok(())
}

/// Writes the schematic of `block` as a SPICE netlist using the open PDK device models.
pub fn write_netlist<T>(ctx: &Context, block: T, path: impl AsRef<Path>) -> Result<()>
where
    T: Schematic<Schema = Sky130>,
{
    let path = path.as_ref();
    let rawlib = ctx
        .export_scir(ConvertSchema::<_, Spice>::new(ConvertSchema::<
            _,
            Sky130OpenSchema,
        >::new(block)))
        .map_err(|err| Error::Netlist(format!("{err:?}")))?;
    Spice.write_scir_netlist_to_file(&rawlib.scir, path, NetlistOptions::default())?;
    info!(path = %path.display(), "wrote netlist");
    Ok(())
}

/// Runs magic DRC on `cell_name` in the given GDS file.
///
/// Returns the total number of violations.
pub fn run_drc(cell_name: &str, gds_path: &Path, work_dir: &Path) -> Result<usize> {
    let tech_file_path = sky130_magic_tech_file()?;
    let drc_report_path = work_dir.join("drc_results.rpt");
    let data = magic::drc::run_drc(&DrcParams {
        cell_name,
        work_dir,
        gds_path,
        tech_file_path: &tech_file_path,
        drc_report_path: &drc_report_path,
    })?;

    let mut count = 0;
    for check in data.rule_checks {
        warn!(reason = %check.reason, count = check.num_results, "drc violation");
        count += check.num_results as usize;
    }
    info!(cell = cell_name, count, "drc complete");
    Ok(count)
}

/// Like [`run_drc`], but fails with [`Error::Drc`] unless the layout is clean.
pub fn check_drc(cell_name: &str, gds_path: &Path, work_dir: &Path) -> Result<()> {
    match run_drc(cell_name, gds_path, work_dir)? {
        0 => Ok(()),
        count => Err(Error::Drc(count)),
    }
}

/// Compares the layout in `gds_path` against the schematic of `block` with magic and netgen.
pub fn run_lvs<T>(ctx: &Context, block: T, gds_path: &Path, work_dir: &Path) -> Result<()>
where
    T: Schematic<Schema = Sky130>,
{
    let cell_name = block.name();
    let output = magic_netgen::run_lvs(LvsParams {
        schematic: Arc::new(ConvertSchema::<_, Spice>::new(ConvertSchema::<
            _,
            Sky130OpenSchema,
        >::new(block))),
        gds_path: gds_path.to_path_buf(),
        layout_cell_name: cell_name.clone(),
        work_dir: work_dir.to_path_buf(),
        magic_tech_file_path: sky130_magic_tech_file()?,
        netgen_setup_file_path: sky130_netgen_setup_file()?,
        ctx: ctx.clone(),
    })?;

    if output.matches {
        info!(cell = %cell_name, "lvs clean");
        Ok(())
    } else {
        Err(Error::LvsMismatch(cell_name))
    }
}
