use layir::Shape;
use sky130::{
    layers::Sky130Layer,
    layout::{NtapTile, PtapTile},
    mos::{GateDir, NmosTile, PmosTile},
    Sky130,
};
use substrate::{
    block::Block,
    error::Result,
    geometry::{
        align::{AlignMode, AlignRectMut},
        bbox::Bbox,
        prelude::Transformation,
        rect::Rect,
        span::Span,
        transform::TransformMut,
    },
    layout::{CellBuilder, CellBundle, Layout},
    types::codegen::{PortGeometryBundle, View},
};
use tracing::debug;

use crate::{
    params::Orientation,
    pins::label_port,
    place::{center_at_origin, max_metal_separation, place_above, place_right_of, HAlign, VAlign},
    route::{smart_route, PortDir, RouteLayer, RoutePort},
};

use super::{Inverter, InverterIo};

/// Overlap between the p-tap and the NMOS beneath which it sits.
const PTAP_OVERLAP: i64 = 20;

impl Layout for Inverter {
    type Schema = Sky130;
    type Bundle = View<InverterIo, PortGeometryBundle<Sky130>>;
    type Data = ();
    fn layout(&self, cell: &mut CellBuilder<Self::Schema>) -> Result<(Self::Bundle, Self::Data)> {
        self.validate()?;
        let mut nmos = cell.generate(
            NmosTile::new(self.nmos.w, self.nmos.mos_length()?, 1).with_gate_dir(GateDir::Left),
        );
        let mut pmos = cell.generate(
            PmosTile::new(self.pmos.w, self.pmos.mos_length()?, 1).with_gate_dir(GateDir::Left),
        );
        center_at_origin(&mut nmos);
        center_at_origin(&mut pmos);

        let gap = max_metal_separation();
        debug!(cell = %self.name(), orientation = ?self.orientation, gap, "placing inverter devices");

        let (din, dout) = match self.orientation {
            Orientation::Vertical => {
                // Gate contacts face each other across the gap.
                nmos.transform_mut(Transformation::reflect_vert());
                place_above(&mut pmos, nmos.bbox_rect(), gap, HAlign::Center);
                pmos.align_mut(
                    AlignMode::Left,
                    pmos.io().sd[0].primary.bbox_rect(),
                    nmos.io().sd[0].primary.bbox_rect(),
                    0,
                );

                let din = smart_route(
                    RoutePort::from_port(&nmos.io().g[0], PortDir::North)?,
                    RoutePort::from_port(&pmos.io().g[0], PortDir::South)?,
                    RouteLayer::Li1,
                )?;
                let dout = smart_route(
                    RoutePort::from_port(&nmos.io().sd[1], PortDir::North)?,
                    RoutePort::from_port(&pmos.io().sd[1], PortDir::South)?,
                    RouteLayer::Li1,
                )?;
                (din.draw(cell)?, dout.draw(cell)?)
            }
            Orientation::Horizontal => {
                place_right_of(&mut pmos, nmos.bbox_rect(), gap, VAlign::Bottom);

                let din = smart_route(
                    RoutePort::from_port(&nmos.io().g[0], PortDir::East)?,
                    RoutePort::from_port(&pmos.io().g[0], PortDir::West)?,
                    RouteLayer::Met1,
                )?;
                let dout = smart_route(
                    RoutePort::from_port(&nmos.io().sd[1], PortDir::East)?,
                    RoutePort::from_port(&pmos.io().sd[1], PortDir::West)?,
                    RouteLayer::Met1,
                )?;
                (din.draw(cell)?, dout.draw(cell)?)
            }
        };

        let mut ntap = cell.generate(NtapTile::new(2, 2));
        place_above(&mut ntap, pmos.bbox_rect(), 0, HAlign::Center);

        let mut ptap = cell.generate(PtapTile::new(2, 2));
        match self.orientation {
            Orientation::Vertical => {
                ptap.align_mut(
                    AlignMode::Beneath,
                    ptap.bbox_rect(),
                    nmos.bbox_rect(),
                    -PTAP_OVERLAP,
                );
                ptap.align_mut(
                    AlignMode::CenterHorizontal,
                    ptap.bbox_rect(),
                    nmos.bbox_rect(),
                    0,
                );
            }
            Orientation::Horizontal => {
                place_above(&mut ptap, nmos.bbox_rect(), 0, HAlign::Center);
            }
        }

        let vdd = ntap.io().vpb.primary.clone();
        let vss = ptap.io().vnb.primary.clone();

        // Sources run straight out to the taps on li1.
        let nmos_s = nmos.io().sd[0].primary.bbox_rect();
        let vss_rect = vss.bbox_rect();
        let vss_conn = Rect::from_spans(
            nmos_s.hspan(),
            nmos_s.vspan().union(Span::from_point(vss_rect.center().y)),
        );
        cell.draw(Shape::new(Sky130Layer::Li1, vss_conn))?;

        let pmos_s = pmos.io().sd[0].primary.bbox_rect();
        let vdd_rect = vdd.bbox_rect();
        let vdd_conn = Rect::from_spans(
            pmos_s.hspan(),
            pmos_s.vspan().union(Span::from_point(vdd_rect.center().y)),
        );
        cell.draw(Shape::new(Sky130Layer::Li1, vdd_conn))?;

        cell.draw(ntap)?;
        cell.draw(ptap)?;
        cell.draw(nmos)?;
        cell.draw(pmos)?;

        Ok((
            CellBundle::<Inverter> {
                vdd: label_port(vdd),
                vss: label_port(vss),
                din: label_port(din),
                dout: label_port(dout),
            },
            (),
        ))
    }
}

#[cfg(test)]
mod tests {
    use sky130::layers::Sky130Layer;
    use substrate::{block::Block, context::Context};
    use test_log::test;

    use crate::{
        params::{DeviceSize, Orientation},
        testing::{contains, flat_rects, instance_port_rects, islands, port_rects, top_rects, touches},
        Inverter,
    };

    fn inverter(orientation: Orientation) -> Inverter {
        Inverter::new(
            DeviceSize::new(2_400, 150),
            DeviceSize::new(1_200, 150),
            orientation,
        )
    }

    #[test]
    fn inverter_layout_exports_ports() {
        let ctx = Context::builder().build();
        for orientation in [Orientation::Vertical, Orientation::Horizontal] {
            let dut = inverter(orientation);
            let lib = ctx.export_layir(dut).expect("failed to export layout");
            let cell = lib.layir.cell_named(&dut.name());
            for port in ["vdd", "vss", "din", "dout"] {
                assert!(cell.try_port(port).is_some(), "missing port {port}");
            }
        }
    }

    #[test]
    fn inverter_layout_draws_devices_and_taps() {
        let ctx = Context::builder().build();
        let instances = |orientation| {
            let dut = inverter(orientation);
            let lib = ctx.export_layir(dut).expect("failed to export layout");
            let cell = lib.layir.cell_named(&dut.name());
            cell.instances().count()
        };
        // Both orientations draw two devices and two taps.
        assert_eq!(instances(Orientation::Vertical), 4);
        assert_eq!(instances(Orientation::Horizontal), 4);
    }

    #[test]
    fn horizontal_inverter_keeps_gate_and_drain_apart() {
        let ctx = Context::builder().build();
        let dut = inverter(Orientation::Horizontal);
        let lib = ctx.export_layir(dut).expect("failed to export layout");
        let cell = lib.layir.cell_named(&dut.name());

        let din = port_rects(cell, "din", Sky130Layer::Met1);
        let dout = port_rects(cell, "dout", Sky130Layer::Met1);
        assert_eq!((din.len(), dout.len()), (1, 1));
        assert!(!touches(din[0], dout[0]));

        // One met1 net for the gates and one for the drains.
        let met1 = flat_rects(&lib.layir, cell, Sky130Layer::Met1);
        assert_eq!(islands(&met1), 2);

        let terminals = instance_port_rects(&lib.layir, cell, Sky130Layer::Li1);
        let mcons = top_rects(cell, Sky130Layer::Mcon);
        assert_eq!(mcons.len(), 4);
        for mcon in mcons {
            assert!(
                terminals.iter().any(|t| contains(*t, mcon)),
                "contact {mcon:?} is off every device terminal"
            );
        }
    }

    #[test]
    fn inverter_layout_rejects_unsupported_length() {
        let ctx = Context::builder().build();
        let dut = Inverter::new(
            DeviceSize::new(2_400, 180),
            DeviceSize::new(1_200, 150),
            Orientation::Vertical,
        );
        assert!(ctx.export_layir(dut).is_err());
    }
}
