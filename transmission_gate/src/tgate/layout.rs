use sky130::{
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
        transform::TransformMut,
    },
    layout::{CellBuilder, CellBundle, Layout},
    types::codegen::{PortGeometryBundle, View},
};
use tracing::debug;

use crate::{
    pins::label_port,
    place::{center_at_origin, max_metal_separation, place_above, HAlign},
    route::{straight_route, PortDir, RouteLayer, RoutePort},
};

use super::{TGate, TGateIo};

impl Layout for TGate {
    type Schema = Sky130;
    type Bundle = View<TGateIo, PortGeometryBundle<Sky130>>;
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
        debug!(cell = %self.name(), gap, "placing transmission gate devices");

        nmos.transform_mut(Transformation::reflect_vert());
        place_above(&mut pmos, nmos.bbox_rect(), gap, HAlign::Center);
        pmos.align_mut(
            AlignMode::Left,
            pmos.io().sd[0].primary.bbox_rect(),
            nmos.io().sd[0].primary.bbox_rect(),
            0,
        );

        // The left contacts share a column with both gate contacts, so `a` hops over them on met2.
        let a = straight_route(
            RoutePort::from_port(&pmos.io().sd[0], PortDir::South)?,
            RoutePort::from_port(&nmos.io().sd[0], PortDir::North)?,
            RouteLayer::Met2,
        )?
        .draw(cell)?;
        let b = straight_route(
            RoutePort::from_port(&pmos.io().sd[1], PortDir::South)?,
            RoutePort::from_port(&nmos.io().sd[1], PortDir::North)?,
            RouteLayer::Li1,
        )?
        .draw(cell)?;

        let en = nmos.io().g[0].primary.clone();
        let en_b = pmos.io().g[0].primary.clone();

        let mut ntap = cell.generate(NtapTile::new(2, 2));
        place_above(&mut ntap, pmos.bbox_rect(), 0, HAlign::Center);

        let mut ptap = cell.generate(PtapTile::new(2, 2));
        ptap.align_mut(AlignMode::Beneath, ptap.bbox_rect(), nmos.bbox_rect(), -20);
        ptap.align_mut(
            AlignMode::CenterHorizontal,
            ptap.bbox_rect(),
            nmos.bbox_rect(),
            0,
        );

        let vdd = ntap.io().vpb.primary.clone();
        let vss = ptap.io().vnb.primary.clone();

        cell.draw(ntap)?;
        cell.draw(ptap)?;
        cell.draw(nmos)?;
        cell.draw(pmos)?;

        Ok((
            CellBundle::<TGate> {
                a: label_port(a),
                b: label_port(b),
                en: label_port(en),
                en_b: label_port(en_b),
                vdd: label_port(vdd),
                vss: label_port(vss),
            },
            (),
        ))
    }
}
