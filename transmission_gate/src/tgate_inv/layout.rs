use sky130::Sky130;
use substrate::{
    block::Block,
    error::Result,
    geometry::bbox::Bbox,
    layout::{CellBuilder, CellBundle, Layout},
    types::codegen::{PortGeometryBundle, View},
};
use tracing::debug;

use crate::{
    pins::{label_port, pin_on_port, DEFAULT_PIN_ALIGN, PIN_SIZE},
    place::{max_metal_separation, place_right_of, VAlign},
    route::{smart_route, straight_route, PortDir, RouteLayer, RoutePort},
};

use super::{TGateInv, TGateInvIo};

impl Layout for TGateInv {
    type Schema = Sky130;
    type Bundle = View<TGateInvIo, PortGeometryBundle<Sky130>>;
    type Data = ();
    fn layout(&self, cell: &mut CellBuilder<Self::Schema>) -> Result<(Self::Bundle, Self::Data)> {
        self.validate()?;
        let inv = cell.generate(self.inverter());
        let mut tg = cell.generate(self.tgate());

        let gap = max_metal_separation();
        place_right_of(&mut tg, inv.bbox_rect(), gap, VAlign::Bottom);
        debug!(
            cell = %self.name(),
            inv = ?inv.bbox_rect(),
            tgate = ?tg.bbox_rect(),
            "placed inverter and transmission gate"
        );

        // Inverter output drives the PMOS pass gate.
        smart_route(
            RoutePort::from_port(&inv.io().dout, PortDir::East)?,
            RoutePort::from_port(&tg.io().en_b, PortDir::West)?,
            RouteLayer::Met1,
        )?
        .draw(cell)?;
        straight_route(
            RoutePort::from_port(&inv.io().din, PortDir::East)?,
            RoutePort::from_port(&tg.io().en, PortDir::West)?,
            RouteLayer::Met1,
        )?
        .draw(cell)?;

        let rails = [
            (
                RoutePort::from_port(&inv.io().vdd, PortDir::East)?,
                RoutePort::from_port(&tg.io().vdd, PortDir::West)?,
            ),
            (
                RoutePort::from_port(&inv.io().vss, PortDir::East)?,
                RoutePort::from_port(&tg.io().vss, PortDir::West)?,
            ),
        ];
        for (src, dst) in rails {
            smart_route(src, dst, RouteLayer::Li1)?.draw(cell)?;
        }

        let vin = pin_on_port(&tg.io().a.primary, PIN_SIZE, DEFAULT_PIN_ALIGN);
        let vout = pin_on_port(&tg.io().b.primary, PIN_SIZE, DEFAULT_PIN_ALIGN);
        let en = inv.io().din.primary.clone();
        let vdd = inv.io().vdd.primary.clone();
        let vss = inv.io().vss.primary.clone();

        cell.draw(inv)?;
        cell.draw(tg)?;

        Ok((
            CellBundle::<TGateInv> {
                vin: label_port(vin),
                vout: label_port(vout),
                en: label_port(en),
                vdd: label_port(vdd),
                vss: label_port(vss),
            },
            (),
        ))
    }
}
