use serde::{Deserialize, Serialize};
use sky130::mos::{Nfet01v8, Pfet01v8};
use sky130::Sky130;
use substrate::arcstr;
use substrate::arcstr::ArcStr;
use substrate::block::Block;
use substrate::schematic::{CellBuilder, Schematic};
use substrate::types::schematic::IoNodeBundle;
use substrate::types::{InOut, Input, Io, Signal};

use crate::error::Result;
use crate::params::DeviceSize;

pub mod layout;

/// Transmission gate IO.
///
/// `a` and `b` are connected when `en` is high and `en_b` is low.
#[derive(Io, Clone, Default, Debug)]
pub struct TGateIo {
    pub a: InOut<Signal>,
    pub b: InOut<Signal>,
    pub en: Input<Signal>,
    pub en_b: Input<Signal>,
    pub vdd: InOut<Signal>,
    pub vss: InOut<Signal>,
}

/// A PMOS and an NMOS pass device in parallel.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct TGate {
    pub pmos: DeviceSize,
    pub nmos: DeviceSize,
}

impl TGate {
    #[inline]
    pub fn new(pmos: DeviceSize, nmos: DeviceSize) -> Self {
        Self { pmos, nmos }
    }

    pub fn validate(&self) -> Result<()> {
        self.pmos.validate("pmos")?;
        self.nmos.validate("nmos")
    }
}

impl Block for TGate {
    type Io = TGateIo;

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "tgate_pw{}_pl{}_nw{}_nl{}",
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

impl Schematic for TGate {
    type Schema = Sky130;
    type NestedData = ();

    fn schematic(
        &self,
        io: &IoNodeBundle<Self>,
        cell: &mut CellBuilder<<Self as Schematic>::Schema>,
    ) -> substrate::error::Result<Self::NestedData> {
        let nmos = cell.instantiate(Nfet01v8::new((self.nmos.w, self.nmos.l)));
        cell.connect(io.a, nmos.io().d);
        cell.connect(io.en, nmos.io().g);
        cell.connect(io.b, nmos.io().s);
        cell.connect(io.vss, nmos.io().b);

        let pmos = cell.instantiate(Pfet01v8::new((self.pmos.w, self.pmos.l)));
        cell.connect(io.a, pmos.io().s);
        cell.connect(io.en_b, pmos.io().g);
        cell.connect(io.b, pmos.io().d);
        cell.connect(io.vdd, pmos.io().b);

        Ok(())
    }
}
