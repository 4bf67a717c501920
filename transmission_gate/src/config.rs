use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use substrate::arcstr::ArcStr;
use substrate::block::Block;

use crate::error::{Error, Result};
use crate::inverter::Inverter;
use crate::params::{DeviceSize, Orientation};
use crate::tgate::TGate;
use crate::tgate_inv::TGateInv;

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Inverter,
    Tgate,
    TgateInv,
}

/// A cell to generate, as read from a TOML file.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellConfig {
    pub cell: CellKind,
    /// Only used by inverters.
    #[serde(default)]
    pub orientation: Orientation,
    pub pmos: DeviceSize,
    pub nmos: DeviceSize,
}

/// A fully resolved cell generator.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Cell {
    Inverter(Inverter),
    TGate(TGate),
    TGateInv(TGateInv),
}

impl Cell {
    pub fn name(&self) -> ArcStr {
        match self {
            Cell::Inverter(inv) => inv.name(),
            Cell::TGate(tg) => tg.name(),
            Cell::TGateInv(tgi) => tgi.name(),
        }
    }
}

impl CellConfig {
    pub fn validate(&self) -> Result<()> {
        self.pmos.validate("pmos")?;
        self.nmos.validate("nmos")
    }

    pub fn cell(&self) -> Cell {
        match self.cell {
            CellKind::Inverter => {
                Cell::Inverter(Inverter::new(self.pmos, self.nmos, self.orientation))
            }
            CellKind::Tgate => Cell::TGate(TGate::new(self.pmos, self.nmos)),
            CellKind::TgateInv => Cell::TGateInv(TGateInv::new(self.pmos, self.nmos)),
        }
    }
}

pub fn parse_config(path: impl AsRef<Path>) -> Result<CellConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|err| Error::ConfigRead {
        path: path.to_path_buf(),
        err,
    })?;
    let config: CellConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TGATE_INV: &str = r#"
cell = "tgate_inv"

[pmos]
w = 2400
l = 150

[nmos]
w = 1200
l = 150
"#;

    #[test]
    fn parses_tgate_inv() {
        let config: CellConfig = toml::from_str(TGATE_INV).unwrap();
        config.validate().unwrap();
        assert_eq!(config.cell, CellKind::TgateInv);
        assert_eq!(config.orientation, Orientation::Vertical);
        let cell = config.cell();
        assert!(matches!(cell, Cell::TGateInv(_)));
        assert_eq!(cell.name(), "tgate_inv_pw2400_pl150_nw1200_nl150");
    }

    #[test]
    fn parses_horizontal_inverter() {
        let config: CellConfig = toml::from_str(
            r#"
cell = "inverter"
orientation = "horizontal"
pmos = { w = 2000, l = 150 }
nmos = { w = 1000, l = 150 }
"#,
        )
        .unwrap();
        assert_eq!(
            config.cell(),
            Cell::Inverter(Inverter::new(
                DeviceSize::new(2_000, 150),
                DeviceSize::new(1_000, 150),
                Orientation::Horizontal,
            ))
        );
    }

    #[test]
    fn rejects_unknown_cell() {
        let res: std::result::Result<CellConfig, _> =
            toml::from_str(&TGATE_INV.replace("tgate_inv", "nand2"));
        assert!(res.is_err());
    }

    #[test]
    fn parse_config_validates_sizes() {
        let dir = std::path::PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/parse_config_validates_sizes"
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tgate.toml");
        fs::write(&path, TGATE_INV.replace("w = 1200", "w = 100")).unwrap();

        assert!(matches!(parse_config(&path), Err(Error::InvalidParams(_))));
    }

    #[test]
    fn missing_config_reports_path() {
        let path = std::path::PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/missing_config_reports_path/absent.toml"
        ));
        let err = parse_config(&path).unwrap_err();
        assert!(matches!(&err, Error::ConfigRead { path: p, .. } if *p == path));
        assert!(err.to_string().contains("absent.toml"));
    }
}
