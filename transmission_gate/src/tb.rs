// begin-code-snippet imports
use std::path::{Path, PathBuf};

use ngspice::blocks::{Pulse, Vsource};
use ngspice::Ngspice;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sky130::corner::Sky130Corner;
use sky130::{Sky130, Sky130OpenSchema};
use substrate::block::Block;
use substrate::context::Context;
use substrate::schematic::{CellBuilder, ConvertSchema, Schematic};
use substrate::simulation::waveform::{EdgeDir, TimeWaveform};
use substrate::simulation::Pvt;
use substrate::types::schematic::{IoNodeBundle, Node};
use substrate::types::{Signal, TestbenchIo};
use tracing::info;

use crate::error::{Error, Result};
use crate::inverter::Inverter;
use crate::params::{DeviceSize, Orientation};
use crate::tgate_inv::TGateInv;
// end-code-snippet imports

pub const SKY130_OPEN_PDK_ROOT: &str = "SKY130_OPEN_PDK_ROOT";

// begin-code-snippet inverter-tb
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Block)]
#[substrate(io = "TestbenchIo")]
pub struct InverterTb {
    pvt: Pvt<Sky130Corner>,
    dut: Inverter,
}

impl InverterTb {
    #[inline]
    pub fn new(pvt: Pvt<Sky130Corner>, dut: Inverter) -> Self {
        Self { pvt, dut }
    }
}

impl Schematic for InverterTb {
    type Schema = Ngspice;
    type NestedData = Node;
    fn schematic(
        &self,
        io: &IoNodeBundle<Self>,
        cell: &mut CellBuilder<<Self as Schematic>::Schema>,
    ) -> substrate::error::Result<Self::NestedData> {
        let inv = cell
            .sub_builder::<Sky130OpenSchema>()
            .instantiate(ConvertSchema::new(self.dut));

        let vdd = cell.signal("vdd", Signal);
        let dout = cell.signal("dout", Signal);

        let vddsrc = cell.instantiate(Vsource::dc(self.pvt.voltage));
        cell.connect(vddsrc.io().p, vdd);
        cell.connect(vddsrc.io().n, io.vss);

        let vin = cell.instantiate(Vsource::pulse(Pulse {
            val0: 0.into(),
            val1: self.pvt.voltage,
            delay: Some(dec!(0.1e-9)),
            width: Some(dec!(1e-9)),
            fall: Some(dec!(1e-12)),
            rise: Some(dec!(1e-12)),
            period: None,
            num_pulses: Some(dec!(1)),
        }));
        cell.connect(inv.io().din, vin.io().p);
        cell.connect(vin.io().n, io.vss);

        cell.connect(inv.io().vdd, vdd);
        cell.connect(inv.io().vss, io.vss);
        cell.connect(inv.io().dout, dout);

        Ok(dout)
    }
}
// end-code-snippet inverter-tb

// begin-code-snippet tgate-inv-tb
/// Drives a [`TGateInv`] with DC levels on `en` and `vin`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Block)]
#[substrate(io = "TestbenchIo")]
pub struct TGateInvTb {
    pvt: Pvt<Sky130Corner>,
    dut: TGateInv,
    en: Decimal,
    vin: Decimal,
}

impl TGateInvTb {
    #[inline]
    pub fn new(pvt: Pvt<Sky130Corner>, dut: TGateInv, en: Decimal, vin: Decimal) -> Self {
        Self { pvt, dut, en, vin }
    }
}

impl Schematic for TGateInvTb {
    type Schema = Ngspice;
    type NestedData = Node;
    fn schematic(
        &self,
        io: &IoNodeBundle<Self>,
        cell: &mut CellBuilder<<Self as Schematic>::Schema>,
    ) -> substrate::error::Result<Self::NestedData> {
        let dut = cell
            .sub_builder::<Sky130OpenSchema>()
            .instantiate(ConvertSchema::new(self.dut));

        let vout = cell.signal("vout", Signal);

        for (node, value) in [
            (dut.io().vdd, self.pvt.voltage),
            (dut.io().en, self.en),
            (dut.io().vin, self.vin),
        ] {
            let src = cell.instantiate(Vsource::dc(value));
            cell.connect(src.io().p, node);
            cell.connect(src.io().n, io.vss);
        }

        cell.connect(dut.io().vss, io.vss);
        cell.connect(dut.io().vout, vout);

        Ok(vout)
    }
}
// end-code-snippet tgate-inv-tb

/// Fall and rise times of an inverter output driven by a single input pulse.
///
/// The input rises first, so the first output transition is the fall.
pub fn measure_edges<W: TimeWaveform>(vout: &W, vdd: f64) -> Result<(f64, f64)> {
    let mut trans = vout.transitions(0.2 * vdd, 0.8 * vdd);
    let falling = trans
        .next()
        .filter(|t| t.dir() == EdgeDir::Falling)
        .ok_or_else(|| Error::Simulation("expected a falling output transition".into()))?;
    let rising = trans
        .next()
        .filter(|t| t.dir() == EdgeDir::Rising)
        .ok_or_else(|| Error::Simulation("expected a rising output transition".into()))?;
    Ok((falling.duration(), rising.duration()))
}

fn nominal_pvt() -> Pvt<Sky130Corner> {
    Pvt::new(Sky130Corner::Tt, dec!(1.8), dec!(25))
}

// begin-code-snippet design
/// Designs an inverter for balanced pull-up and pull-down times.
///
/// The NMOS size is kept constant; the PMOS width is swept over
/// the given range.
pub struct InverterDesign {
    /// The fixed NMOS size.
    pub nmos: DeviceSize,
    /// The set of PMOS widths to sweep.
    pub pw: Vec<i64>,
    /// The PMOS channel length.
    pub pl: i64,
}

impl InverterDesign {
    /// Runs the sweep with a caller-supplied simulation returning `(tf, tr)` for each candidate.
    pub fn run_with<F>(&self, mut simulate: F) -> Result<Inverter>
    where
        F: FnMut(Inverter) -> Result<(f64, f64)>,
    {
        let mut opt: Option<(f64, Inverter)> = None;
        for pw in self.pw.iter().copied() {
            let dut = Inverter::new(
                DeviceSize::new(pw, self.pl),
                self.nmos,
                Orientation::Vertical,
            );
            dut.validate()?;
            let (tf, tr) = simulate(dut)?;
            info!(pw, tf, tr, "simulated inverter candidate");

            let diff = (tr - tf).abs();
            if opt.map_or(true, |(pdiff, _)| diff < pdiff) {
                opt = Some((diff, dut));
            }
        }

        opt.map(|(_, dut)| dut)
            .ok_or_else(|| Error::InvalidParams("no PMOS widths to sweep".into()))
    }

    /// Runs the sweep with ngspice.
    pub fn run(&self, ctx: &Context, work_dir: impl AsRef<Path>) -> Result<Inverter> {
        let work_dir = work_dir.as_ref();
        let pvt = nominal_pvt();
        let vdd = pvt.voltage.to_f64().unwrap_or(1.8);

        self.run_with(|dut| {
            let sim_dir = work_dir.join(format!("pw{}", dut.pmos.w));
            let sim = ctx.get_sim_controller(InverterTb::new(pvt, dut), sim_dir)?;
            let mut opts = ngspice::Options::default();
            sim.set_option(pvt.corner, &mut opts);
            let output = sim
                .simulate(
                    opts,
                    ngspice::tran::Tran {
                        stop: dec!(2e-9),
                        step: dec!(1e-11),
                        ..Default::default()
                    },
                )
                .map_err(|err| Error::Simulation(err.to_string()))?;
            measure_edges(&output.as_ref(), vdd)
        })
    }
}
// end-code-snippet design

/// Simulates a [`TGateInv`] at DC and returns the settled output voltage.
pub fn simulate_tgate_inv(
    ctx: &Context,
    dut: TGateInv,
    en: Decimal,
    vin: Decimal,
    work_dir: impl Into<PathBuf>,
) -> Result<f64> {
    let pvt = nominal_pvt();
    let sim = ctx.get_sim_controller(TGateInvTb::new(pvt, dut, en, vin), work_dir)?;
    let mut opts = ngspice::Options::default();
    sim.set_option(pvt.corner, &mut opts);
    let output = sim
        .simulate(
            opts,
            ngspice::tran::Tran {
                stop: dec!(1e-9),
                step: dec!(1e-11),
                ..Default::default()
            },
        )
        .map_err(|err| Error::Simulation(err.to_string()))?;
    output
        .as_ref()
        .last_x()
        .ok_or_else(|| Error::Simulation("empty output waveform".into()))
}

// begin-code-snippet sky130-open-ctx
/// Create a new Substrate context for the SKY130 open PDK.
///
/// Sets the PDK root to the value of the `SKY130_OPEN_PDK_ROOT`
/// environment variable and installs ngspice with default configuration.
///
/// # Errors
///
/// Returns [`Error::MissingEnv`] if the `SKY130_OPEN_PDK_ROOT` environment variable is not set.
pub fn sky130_open_ctx() -> Result<Context> {
    let pdk_root = std::env::var(SKY130_OPEN_PDK_ROOT)
        .map_err(|_| Error::MissingEnv(SKY130_OPEN_PDK_ROOT))?;
    Ok(Context::builder()
        .install(Ngspice::default())
        .install(Sky130::open(pdk_root))
        .build())
}
// end-code-snippet sky130-open-ctx

// begin-code-snippet tests
#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use substrate::simulation::waveform::Waveform;

    use super::*;

    fn pulse_response() -> Waveform {
        // Falls between 1ns and 1.1ns, then rises between 2ns and 2.3ns.
        [
            (0.0, 1.8),
            (1.0e-9, 1.8),
            (1.1e-9, 0.0),
            (2.0e-9, 0.0),
            (2.3e-9, 1.8),
            (3.0e-9, 1.8),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn measure_edges_reports_fall_then_rise() {
        let (tf, tr) = measure_edges(&pulse_response(), 1.8).unwrap();
        assert_abs_diff_eq!(tf, 0.1e-9, epsilon = 1e-15);
        assert_abs_diff_eq!(tr, 0.3e-9, epsilon = 1e-15);
    }

    #[test]
    fn measure_edges_rejects_flat_output() {
        let flat: Waveform = [(0.0, 1.8), (1.0e-9, 1.8)].into_iter().collect();
        assert!(matches!(
            measure_edges(&flat, 1.8),
            Err(Error::Simulation(_))
        ));
    }

    #[test]
    fn design_picks_most_balanced_width() {
        let script = InverterDesign {
            nmos: DeviceSize::new(1_200, 150),
            pw: vec![2_000, 3_000, 4_000],
            pl: 150,
        };
        // Rise time scales inversely with PMOS width; fall time is fixed.
        let inv = script
            .run_with(|dut| Ok((30e-12, 30e-12 * 3_000.0 / dut.pmos.w as f64)))
            .unwrap();
        assert_eq!(inv.pmos.w, 3_000);
        assert_eq!(inv.nmos, script.nmos);
    }

    #[test]
    fn design_requires_candidates() {
        let script = InverterDesign {
            nmos: DeviceSize::new(1_200, 150),
            pw: Vec::new(),
            pl: 150,
        };
        assert!(script.run_with(|_| Ok((0.0, 0.0))).is_err());
    }

    #[test]
    #[ignore = "requires ngspice and SKY130_OPEN_PDK_ROOT"]
    pub fn design_inverter_ngspice() {
        let work_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/design_inverter_ngspice");
        let ctx = sky130_open_ctx().expect("failed to create context");
        let script = InverterDesign {
            nmos: DeviceSize::new(1_200, 150),
            pw: (3_000..=5_000).step_by(200).collect(),
            pl: 150,
        };

        let inv = script.run(&ctx, work_dir).expect("failed to design inverter");
        println!("Designed inverter:\n{:#?}", inv);
    }

    #[test]
    #[ignore = "requires ngspice and SKY130_OPEN_PDK_ROOT"]
    pub fn tgate_inv_passes_input_when_enabled() {
        let work_dir = PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/tgate_inv_passes_input_when_enabled"
        ));
        let ctx = sky130_open_ctx().expect("failed to create context");
        let dut = TGateInv::new(DeviceSize::new(2_400, 150), DeviceSize::new(1_200, 150));

        for (i, vin) in [dec!(0), dec!(0.9), dec!(1.8)].into_iter().enumerate() {
            let vout = simulate_tgate_inv(&ctx, dut, dec!(1.8), vin, work_dir.join(format!("vin{i}")))
                .expect("failed to simulate");
            assert_abs_diff_eq!(vout, vin.to_f64().unwrap(), epsilon = 1e-2);
        }
    }
}
// end-code-snippet tests

// begin-code-snippet spectre-support
#[cfg(feature = "spectre")]
pub mod spectre_support {
    use super::*;
    use sky130::Sky130SrcNdaSchema;
    use spectre::Spectre;

    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Block)]
    #[substrate(io = "TestbenchIo")]
    pub struct SpectreInverterTb(pub InverterTb);

    impl Schematic for SpectreInverterTb {
        type Schema = Spectre;
        type NestedData = Node;

        fn schematic(
            &self,
            io: &IoNodeBundle<Self>,
            cell: &mut CellBuilder<<Self as Schematic>::Schema>,
        ) -> substrate::error::Result<Self::NestedData> {
            let inv = cell
                .sub_builder::<Sky130SrcNdaSchema>()
                .instantiate(ConvertSchema::new(self.0.dut));

            let vdd = cell.signal("vdd", Signal);
            let dout = cell.signal("dout", Signal);

            let vddsrc = cell.instantiate(spectre::blocks::Vsource::dc(self.0.pvt.voltage));
            cell.connect(vddsrc.io().p, vdd);
            cell.connect(vddsrc.io().n, io.vss);

            let vin = cell.instantiate(spectre::blocks::Vsource::pulse(spectre::blocks::Pulse {
                val0: 0.into(),
                val1: self.0.pvt.voltage,
                delay: Some(dec!(0.1e-9)),
                width: Some(dec!(1e-9)),
                fall: Some(dec!(1e-12)),
                rise: Some(dec!(1e-12)),
                period: None,
            }));
            cell.connect(inv.io().din, vin.io().p);
            cell.connect(vin.io().n, io.vss);

            cell.connect(inv.io().vdd, vdd);
            cell.connect(inv.io().vss, io.vss);
            cell.connect(inv.io().dout, dout);

            Ok(dout)
        }
    }

    pub const SKY130_SRC_NDA_PDK_ROOT: &str = "SKY130_SRC_NDA_PDK_ROOT";

    /// Create a new Substrate context for the SKY130 SRC NDA PDK.
    ///
    /// The open PDK root is still needed for standard cells.
    pub fn sky130_src_nda_ctx() -> Result<Context> {
        let open_root = std::env::var(SKY130_OPEN_PDK_ROOT)
            .map_err(|_| Error::MissingEnv(SKY130_OPEN_PDK_ROOT))?;
        let src_nda_root = std::env::var(SKY130_SRC_NDA_PDK_ROOT)
            .map_err(|_| Error::MissingEnv(SKY130_SRC_NDA_PDK_ROOT))?;
        Ok(Context::builder()
            .install(Spectre::default())
            .install(Sky130::src_nda(open_root, src_nda_root))
            .build())
    }

    impl InverterDesign {
        /// Runs the sweep with Spectre.
        pub fn run_spectre(&self, ctx: &Context, work_dir: impl AsRef<Path>) -> Result<Inverter> {
            let work_dir = work_dir.as_ref();
            let pvt = nominal_pvt();
            let vdd = pvt.voltage.to_f64().unwrap_or(1.8);

            self.run_with(|dut| {
                let sim_dir = work_dir.join(format!("pw{}", dut.pmos.w));
                let tb = SpectreInverterTb(InverterTb::new(pvt, dut));
                let sim = ctx.get_sim_controller(tb, sim_dir)?;
                let mut opts = spectre::Options::default();
                sim.set_option(pvt.corner, &mut opts);
                let output = sim
                    .simulate(
                        opts,
                        spectre::analysis::tran::Tran {
                            stop: dec!(2e-9),
                            errpreset: Some(spectre::ErrPreset::Conservative),
                            ..Default::default()
                        },
                    )
                    .map_err(|err| Error::Simulation(err.to_string()))?;
                measure_edges(&output.as_ref(), vdd)
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        #[ignore = "requires Spectre and the SKY130 SRC NDA PDK"]
        pub fn design_inverter_spectre() {
            let work_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/design_inverter_spectre");
            let ctx = sky130_src_nda_ctx().expect("failed to create context");
            let script = InverterDesign {
                nmos: DeviceSize::new(1_200, 150),
                pw: (3_000..=5_000).step_by(200).collect(),
                pl: 150,
            };
            let inv = script
                .run_spectre(&ctx, work_dir)
                .expect("failed to design inverter");
            println!("Designed inverter:\n{:#?}", inv);
        }
    }
}
// end-code-snippet spectre-support
