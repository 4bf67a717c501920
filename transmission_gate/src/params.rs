//! Device sizing shared by every cell.

use serde::{Deserialize, Serialize};
use sky130::mos::MosLength;

use crate::error::{Error, Result};

/// Minimum diffusion width in SKY130, in nanometers.
pub const MIN_WIDTH: i64 = 420;

/// Gate lengths the transistor tiles can draw, in nanometers.
pub const SUPPORTED_LENGTHS: [i64; 1] = [150];

/// Width and channel length of one transistor, in nanometers.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct DeviceSize {
    /// Transistor width.
    pub w: i64,
    /// Channel length.
    pub l: i64,
}

impl DeviceSize {
    #[inline]
    pub const fn new(w: i64, l: i64) -> Self {
        Self { w, l }
    }

    /// Checks that the device can be both simulated and drawn.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.w < MIN_WIDTH {
            return Err(Error::InvalidParams(format!(
                "{name} width {} is below the minimum of {MIN_WIDTH}",
                self.w
            )));
        }
        if !SUPPORTED_LENGTHS.contains(&self.l) {
            return Err(Error::InvalidParams(format!(
                "{name} length {} is not one of {SUPPORTED_LENGTHS:?}",
                self.l
            )));
        }
        Ok(())
    }

    /// The tile length used when drawing this device.
    pub fn mos_length(&self) -> Result<MosLength> {
        match self.l {
            150 => Ok(MosLength::L150),
            l => Err(Error::InvalidParams(format!(
                "no transistor tile is available for length {l}"
            ))),
        }
    }
}

impl From<(i64, i64)> for DeviceSize {
    fn from((w, l): (i64, i64)) -> Self {
        Self { w, l }
    }
}

/// Placement of the PMOS relative to the NMOS inside an inverter.
#[derive(
    Serialize, Deserialize, Debug, Default, Copy, Clone, Hash, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// PMOS stacked above the NMOS.
    #[default]
    Vertical,
    /// PMOS to the right of the NMOS.
    Horizontal,
}

impl Orientation {
    pub(crate) fn suffix(&self) -> &'static str {
        match self {
            Self::Vertical => "v",
            Self::Horizontal => "h",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimum_device() {
        assert!(DeviceSize::new(MIN_WIDTH, 150).validate("nmos").is_ok());
    }

    #[test]
    fn rejects_narrow_device() {
        let err = DeviceSize::new(300, 150).validate("pmos").unwrap_err();
        assert!(matches!(err, Error::InvalidParams(msg) if msg.contains("pmos width 300")));
    }

    #[test]
    fn rejects_unsupported_length() {
        let err = DeviceSize::new(1_200, 180).validate("nmos").unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }

    #[test]
    fn mos_length_follows_channel_length() {
        assert_eq!(
            DeviceSize::new(1_200, 150).mos_length().unwrap(),
            MosLength::L150
        );
        assert!(matches!(
            DeviceSize::new(1_200, 180).mos_length(),
            Err(Error::InvalidParams(_))
        ));
    }

    #[test]
    fn orientation_parses_from_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            orientation: Orientation,
        }
        let w: Wrapper = toml::from_str("orientation = \"horizontal\"").unwrap();
        assert_eq!(w.orientation, Orientation::Horizontal);
        assert_eq!(Orientation::default(), Orientation::Vertical);
    }
}
