//! Labeled pins for layout-versus-schematic checks.
//!
//! GDS export writes every port shape on the pin purpose of its layer, along with a text
//! label carrying the port name. The helpers here decide where on a port that pin sits.

use layir::Shape;
use sky130::layers::Sky130Layer;
use substrate::{
    geometry::{bbox::Bbox, rect::Rect},
    types::layout::PortGeometry,
};

use crate::place::{align_to_port, HAlign, VAlign};

/// Edge length of a pin, in nanometers.
pub const PIN_SIZE: i64 = 1_000;

pub type PinAlign = (HAlign, VAlign);

pub const DEFAULT_PIN_ALIGN: PinAlign = (HAlign::Center, VAlign::Bottom);

/// A `size` by `size` pin aligned on `port` and clipped to it.
///
/// The pin is drawn on the port's own layer and never extends past the port.
pub fn pin_on_port(port: &Shape<Sky130Layer>, size: i64, align: PinAlign) -> Shape<Sky130Layer> {
    let port_rect = port.bbox_rect();
    let pin = align_to_port(Rect::from_sides(0, 0, size, size), port_rect, align);
    Shape::new(
        *port.layer(),
        pin.intersection(port_rect).unwrap_or(port_rect),
    )
}

/// Exposes `shape` as a cell port.
#[inline]
pub fn label_port(shape: Shape<Sky130Layer>) -> PortGeometry<Sky130Layer> {
    PortGeometry::new(shape)
}
