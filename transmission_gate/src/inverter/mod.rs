use serde::{Deserialize, Serialize};
use sky130::mos::{Nfet01v8, Pfet01v8};
use sky130::Sky130;
use substrate::arcstr;
use substrate::arcstr::ArcStr;
use substrate::block::Block;
use substrate::schematic::{CellBuilder, Schematic};
use substrate::types::schematic::IoNodeBundle;
use substrate::types::{InOut, Input, Io, Output, Signal};

use crate::error::Result;
use crate::params::{DeviceSize, Orientation};

pub mod layout;

#[derive(Io, Clone, Default, Debug)]
pub struct InverterIo {
    pub vdd: InOut<Signal>,
    pub vss: InOut<Signal>,
    pub din: Input<Signal>,
    pub dout: Output<Signal>,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Inverter {
    /// PMOS size.
    pub pmos: DeviceSize,
    /// NMOS size.
    pub nmos: DeviceSize,
    /// Placement of the PMOS relative to the NMOS.
    pub orientation: Orientation,
}

impl Inverter {
    #[inline]
    pub fn new(pmos: DeviceSize, nmos: DeviceSize, orientation: Orientation) -> Self {
        Self {
            pmos,
            nmos,
            orientation,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.pmos.validate("pmos")?;
        self.nmos.validate("nmos")
    }
}

impl Block for Inverter {
    type Io = InverterIo;

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "inverter_pw{}_pl{}_nw{}_nl{}_{}",
            self.pmos.w,
            self.pmos.l,
            self.nmos.w,
            self.nmos.l,
            self.orientation.suffix()
        )
    }

    fn io(&self) -> Self::Io {
        Default::default()
    }
}

impl Schematic for Inverter {
    type Schema = Sky130;
    type NestedData = ();

    fn schematic(
        &self,
        io: &IoNodeBundle<Self>,
        cell: &mut CellBuilder<<Self as Schematic>::Schema>,
    ) -> substrate::error::Result<Self::NestedData> {
        let nmos = cell.instantiate(Nfet01v8::new((self.nmos.w, self.nmos.l)));
        cell.connect(io.dout, nmos.io().d);
        cell.connect(io.din, nmos.io().g);
        cell.connect(io.vss, nmos.io().s);
        cell.connect(io.vss, nmos.io().b);

        let pmos = cell.instantiate(Pfet01v8::new((self.pmos.w, self.pmos.l)));
        cell.connect(io.dout, pmos.io().d);
        cell.connect(io.din, pmos.io().g);
        cell.connect(io.vdd, pmos.io().s);
        cell.connect(io.vdd, pmos.io().b);

        Ok(())
    }
}
