//! Geometry queries over exported layouts.

use layir::{Cell, Element, Library};
use sky130::layers::Sky130Layer;
use substrate::geometry::{bbox::Bbox, prelude::Transformation, rect::Rect, transform::Transform};

fn shape_rects<'a>(
    elements: impl Iterator<Item = &'a Element<Sky130Layer>>,
    layer: Sky130Layer,
) -> Vec<Rect> {
    elements
        .filter_map(|elt| match elt {
            Element::Shape(shape) if *shape.layer() == layer => Some(shape.shape().bbox_rect()),
            _ => None,
        })
        .collect()
}

/// Rectangles on `layer` drawn directly in `cell`.
pub(crate) fn top_rects(cell: &Cell<Sky130Layer>, layer: Sky130Layer) -> Vec<Rect> {
    shape_rects(cell.elements(), layer)
}

/// Rectangles on `layer` anywhere below `cell`, in the coordinates of `cell`.
pub(crate) fn flat_rects(
    lib: &Library<Sky130Layer>,
    cell: &Cell<Sky130Layer>,
    layer: Sky130Layer,
) -> Vec<Rect> {
    let mut rects = Vec::new();
    collect_rects(lib, cell, layer, Transformation::identity(), &mut rects);
    rects
}

fn collect_rects(
    lib: &Library<Sky130Layer>,
    cell: &Cell<Sky130Layer>,
    layer: Sky130Layer,
    trans: Transformation,
    out: &mut Vec<Rect>,
) {
    out.extend(
        top_rects(cell, layer)
            .into_iter()
            .map(|rect| rect.transform(trans)),
    );
    for (_, inst) in cell.instances() {
        collect_rects(
            lib,
            lib.cell(inst.child()),
            layer,
            Transformation::cascade(trans, inst.transformation()),
            out,
        );
    }
}

/// Rectangles on `layer` making up port `port` of `cell`.
pub(crate) fn port_rects(cell: &Cell<Sky130Layer>, port: &str, layer: Sky130Layer) -> Vec<Rect> {
    shape_rects(cell.port(port).elements(), layer)
}

/// Port rectangles on `layer` of every instance directly inside `cell`.
pub(crate) fn instance_port_rects(
    lib: &Library<Sky130Layer>,
    cell: &Cell<Sky130Layer>,
    layer: Sky130Layer,
) -> Vec<Rect> {
    cell.instances()
        .flat_map(|(_, inst)| {
            let child = lib.cell(inst.child());
            child
                .ports()
                .flat_map(|(_, port)| shape_rects(port.elements(), layer))
                .map(|rect| rect.transform(inst.transformation()))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Rectangles of port `port` on the instance of `child` inside `cell`.
pub(crate) fn child_port_rects(
    lib: &Library<Sky130Layer>,
    cell: &Cell<Sky130Layer>,
    child: &str,
    port: &str,
    layer: Sky130Layer,
) -> Vec<Rect> {
    let (_, inst) = cell
        .instances()
        .find(|(_, inst)| lib.cell(inst.child()).name() == child)
        .unwrap_or_else(|| panic!("no instance of {child}"));
    port_rects(lib.cell(inst.child()), port, layer)
        .into_iter()
        .map(|rect| rect.transform(inst.transformation()))
        .collect()
}

#[inline]
pub(crate) fn contains(outer: Rect, inner: Rect) -> bool {
    outer.intersection(inner) == Some(inner)
}

#[inline]
pub(crate) fn touches(a: Rect, b: Rect) -> bool {
    a.intersection(b).is_some()
}

/// Number of groups of rectangles that touch one another.
pub(crate) fn islands(rects: &[Rect]) -> usize {
    let mut seen = vec![false; rects.len()];
    let mut count = 0;
    for start in 0..rects.len() {
        if seen[start] {
            continue;
        }
        count += 1;
        seen[start] = true;
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            for j in 0..rects.len() {
                if !seen[j] && touches(rects[i], rects[j]) {
                    seen[j] = true;
                    stack.push(j);
                }
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn islands_join_touching_rects() {
        let rects = [
            Rect::from_sides(0, 0, 100, 100),
            Rect::from_sides(100, 50, 200, 100),
            Rect::from_sides(200, 200, 400, 400),
        ];
        assert_eq!(islands(&rects), 2);
        assert!(contains(rects[0], Rect::from_sides(10, 10, 90, 90)));
        assert!(!contains(rects[0], rects[1]));
    }
}
