use serde::{Deserialize, Serialize};
use sky130::Sky130;
use substrate::arcstr;
use substrate::arcstr::ArcStr;
use substrate::block::Block;
use substrate::schematic::{CellBuilder, NestedData, Schematic};
use substrate::types::schematic::{IoNodeBundle, Node, NodeBundle};
use substrate::types::{InOut, Input, Io, Signal};

use crate::error::Result;
use crate::inverter::{Inverter, InverterIo};
use crate::params::{DeviceSize, Orientation};
use crate::tgate::{TGate, TGateIo};

pub mod layout;

#[derive(Io, Clone, Default, Debug)]
pub struct TGateInvIo {
    pub vin: InOut<Signal>,
    pub vout: InOut<Signal>,
    pub en: Input<Signal>,
    pub vdd: InOut<Signal>,
    pub vss: InOut<Signal>,
}

/// A transmission gate whose complementary enable is derived by a local inverter.
///
/// The same device sizes are used for the inverter and the pass devices.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct TGateInv {
    pub pmos: DeviceSize,
    pub nmos: DeviceSize,
}

impl TGateInv {
    #[inline]
    pub fn new(pmos: DeviceSize, nmos: DeviceSize) -> Self {
        Self { pmos, nmos }
    }

    pub fn validate(&self) -> Result<()> {
        self.pmos.validate("pmos")?;
        self.nmos.validate("nmos")
    }

    pub fn inverter(&self) -> Inverter {
        Inverter::new(self.pmos, self.nmos, Orientation::Vertical)
    }

    pub fn tgate(&self) -> TGate {
        TGate::new(self.pmos, self.nmos)
    }
}

impl Block for TGateInv {
    type Io = TGateInvIo;

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "tgate_inv_pw{}_pl{}_nw{}_nl{}",
            self.pmos.w,
            self.pmos.l,
            self.nmos.w,
            self.nmos.l
        )
    }

    fn io(&self) -> Self::Io {
        Default::default()
    }
}

#[derive(NestedData)]
pub struct TGateInvData {
    /// Inverted enable driving the PMOS pass device.
    pub en_b: Node,
}

impl Schematic for TGateInv {
    type Schema = Sky130;
    type NestedData = TGateInvData;

    fn schematic(
        &self,
        io: &IoNodeBundle<Self>,
        cell: &mut CellBuilder<<Self as Schematic>::Schema>,
    ) -> substrate::error::Result<Self::NestedData> {
        let en_b = cell.signal("en_b", Signal);

        let _inv = cell.instantiate_connected(
            self.inverter(),
            NodeBundle::<InverterIo> {
                vdd: io.vdd,
                vss: io.vss,
                din: io.en,
                dout: en_b,
            },
        );

        let _tgate = cell.instantiate_connected(
            self.tgate(),
            NodeBundle::<TGateIo> {
                a: io.vin,
                b: io.vout,
                en: io.en,
                en_b,
                vdd: io.vdd,
                vss: io.vss,
            },
        );

        Ok(TGateInvData { en_b })
    }
}
