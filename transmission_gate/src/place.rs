//! Placement helpers.
//!
//! Every helper here only translates. Nothing is rotated, mirrored, or resized.

use serde::{Deserialize, Serialize};
use sky130::layers::Sky130Layer;
use substrate::geometry::{
    align::{AlignMode, AlignRectMut},
    bbox::Bbox,
    point::Point,
    rect::Rect,
    transform::TranslateMut,
};

/// Metal layers considered when computing device-to-device spacing.
const SPACING_LAYERS: [Sky130Layer; 5] = [
    Sky130Layer::Met1,
    Sky130Layer::Met2,
    Sky130Layer::Met3,
    Sky130Layer::Met4,
    Sky130Layer::Met5,
];

/// Minimum same-layer spacing of a routing layer, in nanometers.
pub fn min_spacing(layer: Sky130Layer) -> Option<i64> {
    match layer {
        Sky130Layer::Li1 => Some(170),
        Sky130Layer::Met1 | Sky130Layer::Met2 => Some(140),
        Sky130Layer::Met3 | Sky130Layer::Met4 => Some(300),
        Sky130Layer::Met5 => Some(1_600),
        _ => None,
    }
}

/// The largest minimum spacing over `met1` through `met5`.
///
/// Used as the gap between devices so that any metal drawn on either side is DRC clean.
pub fn max_metal_separation() -> i64 {
    SPACING_LAYERS
        .iter()
        .filter_map(|&layer| min_spacing(layer))
        .max()
        .unwrap_or_default()
}

/// Width and height of an object's bounding box.
pub fn bbox_dims<T: Bbox>(obj: &T) -> (i64, i64) {
    let rect = obj.bbox_rect();
    (rect.width(), rect.height())
}

/// Moves an object so that the center of its bounding box sits at the origin.
pub fn center_at_origin<T: Bbox + TranslateMut>(obj: &mut T) {
    let center = obj.bbox_rect().center();
    obj.translate_mut(Point::new(-center.x, -center.y));
}

/// Horizontal alignment reference.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical alignment reference.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Bottom,
    Center,
    Top,
}

impl HAlign {
    fn mode(&self) -> AlignMode {
        match self {
            Self::Left => AlignMode::Left,
            Self::Center => AlignMode::CenterHorizontal,
            Self::Right => AlignMode::Right,
        }
    }
}

impl VAlign {
    fn mode(&self) -> AlignMode {
        match self {
            Self::Bottom => AlignMode::Bottom,
            Self::Center => AlignMode::CenterVertical,
            Self::Top => AlignMode::Top,
        }
    }
}

/// Places `obj` above `anchor` with a gap of `gap` between the two bounding boxes.
pub fn place_above<T: Bbox + AlignRectMut>(obj: &mut T, anchor: Rect, gap: i64, halign: HAlign) {
    obj.align_mut(AlignMode::Above, obj.bbox_rect(), anchor, gap);
    obj.align_mut(halign.mode(), obj.bbox_rect(), anchor, 0);
}

/// Places `obj` to the right of `anchor` with a gap of `gap` between the two bounding boxes.
pub fn place_right_of<T: Bbox + AlignRectMut>(
    obj: &mut T,
    anchor: Rect,
    gap: i64,
    valign: VAlign,
) {
    obj.align_mut(AlignMode::ToTheRight, obj.bbox_rect(), anchor, gap);
    obj.align_mut(valign.mode(), obj.bbox_rect(), anchor, 0);
}

/// Moves `rect` so that its chosen references coincide with the same references of `port`.
pub fn align_to_port(rect: Rect, port: Rect, (halign, valign): (HAlign, VAlign)) -> Rect {
    let mut rect = rect;
    rect.align_mut(halign.mode(), rect, port, 0);
    rect.align_mut(valign.mode(), rect, port, 0);
    rect
}
