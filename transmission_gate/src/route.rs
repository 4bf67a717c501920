//! Port-to-port routing.
//!
//! Routes are Manhattan and are built from wires on `li1`, `met1`, and `met2`.
//! A via stack is dropped wherever a route changes layer, including at the ports themselves.

use layir::Shape;
use sky130::{layers::Sky130Layer, Sky130};
use substrate::{
    geometry::{bbox::Bbox, point::Point, rect::Rect, span::Span},
    layout::CellBuilder,
    types::layout::PortGeometry,
};
use thiserror::Error;
use tracing::debug;

/// How far a C route extends beyond the outermost port.
pub const C_ROUTE_EXTENSION: i64 = 1_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("ports at {0:?} and {1:?} share no horizontal or vertical span")]
    NotAligned(Rect, Rect),

    #[error("cannot route on layer {0:?}")]
    UnsupportedLayer(Sky130Layer),

    #[error("ports at {0:?} and {1:?} are too close to route between")]
    Degenerate(Rect, Rect),

    #[error("C routes require both ports to face the same horizontal direction")]
    MismatchedDirs,
}

/// The side of a port that a route leaves from.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum PortDir {
    East,
    West,
    North,
    South,
}

impl PortDir {
    #[inline]
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::East | Self::West)
    }
}

/// A layer that routes may be drawn on.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RouteLayer {
    Li1,
    Met1,
    Met2,
}

impl RouteLayer {
    /// Wire width on this layer.
    pub fn width(&self) -> i64 {
        match self {
            Self::Li1 => 170,
            Self::Met1 => 290,
            Self::Met2 => 280,
        }
    }

    pub fn layer(&self) -> Sky130Layer {
        match self {
            Self::Li1 => Sky130Layer::Li1,
            Self::Met1 => Sky130Layer::Met1,
            Self::Met2 => Sky130Layer::Met2,
        }
    }

    /// The next routing layer up, if any.
    pub fn above(&self) -> Option<Self> {
        match self {
            Self::Li1 => Some(Self::Met1),
            Self::Met1 => Some(Self::Met2),
            Self::Met2 => None,
        }
    }
}

impl TryFrom<Sky130Layer> for RouteLayer {
    type Error = RouteError;

    fn try_from(value: Sky130Layer) -> Result<Self, Self::Error> {
        match value {
            Sky130Layer::Li1 => Ok(Self::Li1),
            Sky130Layer::Met1 => Ok(Self::Met1),
            Sky130Layer::Met2 => Ok(Self::Met2),
            other => Err(RouteError::UnsupportedLayer(other)),
        }
    }
}

/// A port rectangle that a route can start or end at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RoutePort {
    pub rect: Rect,
    pub layer: RouteLayer,
    pub dir: PortDir,
}

impl RoutePort {
    #[inline]
    pub fn new(rect: Rect, layer: RouteLayer, dir: PortDir) -> Self {
        Self { rect, layer, dir }
    }

    pub fn from_shape(shape: &Shape<Sky130Layer>, dir: PortDir) -> Result<Self, RouteError> {
        Ok(Self {
            rect: shape.bbox_rect(),
            layer: RouteLayer::try_from(*shape.layer())?,
            dir,
        })
    }

    pub fn from_port(port: &PortGeometry<Sky130Layer>, dir: PortDir) -> Result<Self, RouteError> {
        Self::from_shape(&port.primary, dir)
    }

    #[inline]
    fn center(&self) -> Point {
        self.rect.center()
    }
}

/// The shapes produced by one routing call.
#[derive(Debug, Clone)]
pub struct Route {
    primary: Shape<Sky130Layer>,
    shapes: Vec<Shape<Sky130Layer>>,
}

impl Route {
    /// The main wire of the route.
    ///
    /// Cells export this shape when the route itself forms one of their ports.
    pub fn primary(&self) -> &Shape<Sky130Layer> {
        &self.primary
    }

    /// Every shape in the route, including the primary wire.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape<Sky130Layer>> {
        std::iter::once(&self.primary).chain(self.shapes.iter())
    }

    /// Draws the route and returns its primary wire.
    pub fn draw(self, cell: &mut CellBuilder<Sky130>) -> substrate::error::Result<Shape<Sky130Layer>> {
        for shape in self.shapes {
            cell.draw(shape)?;
        }
        cell.draw(self.primary.clone())?;
        Ok(self.primary)
    }
}

impl Bbox for Route {
    fn bbox(&self) -> Option<Rect> {
        self.shapes()
            .map(|shape| shape.bbox_rect())
            .reduce(|a, b| a.union(b))
    }
}

fn centered_rect(center: Point, width: i64, height: i64) -> Rect {
    Rect::from_spans(
        Span::from_center_span(center.x, width),
        Span::from_center_span(center.y, height),
    )
}

/// Contact and via shapes needed to go from `from` to `to` at `center`.
///
/// Returns nothing when the two layers are the same.
pub fn via_stack(center: Point, from: RouteLayer, to: RouteLayer) -> Vec<Shape<Sky130Layer>> {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let mut shapes = Vec::new();
    let mut layer = lo;
    while layer < hi {
        match layer {
            RouteLayer::Li1 => {
                shapes.push(Shape::new(Sky130Layer::Li1, centered_rect(center, 170, 170)));
                shapes.push(Shape::new(Sky130Layer::Mcon, centered_rect(center, 170, 170)));
                shapes.push(Shape::new(Sky130Layer::Met1, centered_rect(center, 290, 400)));
            }
            RouteLayer::Met1 => {
                shapes.push(Shape::new(Sky130Layer::Met1, centered_rect(center, 260, 400)));
                shapes.push(Shape::new(Sky130Layer::Via, centered_rect(center, 150, 150)));
                shapes.push(Shape::new(Sky130Layer::Met2, centered_rect(center, 260, 400)));
            }
            RouteLayer::Met2 => break,
        }
        match layer.above() {
            Some(next) => layer = next,
            None => break,
        }
    }
    shapes
}

/// A wire across the shared span of two ports.
///
/// Prefers a vertical wire when the ports overlap horizontally.
pub fn straight_route(
    src: RoutePort,
    dst: RoutePort,
    layer: RouteLayer,
) -> Result<Route, RouteError> {
    let width = layer.width();
    let (sc, dc) = (src.center(), dst.center());

    let (wire, vertical) = if let Some(ov) = shared_span(src.rect.hspan(), dst.rect.hspan()) {
        let hspan = wire_span(ov, width);
        let vspan = Span::new(sc.y, dc.y);
        if vspan.length() == 0 {
            return Err(RouteError::Degenerate(src.rect, dst.rect));
        }
        (Rect::from_spans(hspan, vspan), true)
    } else if let Some(ov) = shared_span(src.rect.vspan(), dst.rect.vspan()) {
        let vspan = wire_span(ov, width);
        let hspan = Span::new(sc.x, dc.x);
        if hspan.length() == 0 {
            return Err(RouteError::Degenerate(src.rect, dst.rect));
        }
        (Rect::from_spans(hspan, vspan), false)
    } else {
        return Err(RouteError::NotAligned(src.rect, dst.rect));
    };

    let mut shapes = Vec::new();
    // The wire's cross span lies inside both ports, so each landing stays on its port.
    for port in [src, dst] {
        if port.layer != layer {
            let pc = port.center();
            let landing = if vertical {
                Point::new(wire.center().x, pc.y)
            } else {
                Point::new(pc.x, wire.center().y)
            };
            shapes.extend(via_stack(landing, port.layer, layer));
        }
    }

    Ok(Route {
        primary: Shape::new(layer.layer(), wire),
        shapes,
    })
}

/// A horizontal leg out of `src` followed by a vertical leg into `dst`.
pub fn l_route(
    src: RoutePort,
    dst: RoutePort,
    hlayer: RouteLayer,
    vlayer: RouteLayer,
) -> Result<Route, RouteError> {
    let (sc, dc) = (src.center(), dst.center());
    if sc.x == dc.x || sc.y == dc.y {
        return Err(RouteError::Degenerate(src.rect, dst.rect));
    }
    let corner = Point::new(dc.x, sc.y);
    let (hw, vw) = (hlayer.width(), vlayer.width());

    let hleg = Rect::from_spans(
        Span::new(sc.x, corner.x).union(Span::from_center_span(corner.x, vw)),
        Span::from_center_span(sc.y, hw),
    );
    let vleg = Rect::from_spans(
        Span::from_center_span(dc.x, vw),
        Span::new(corner.y, dc.y).union(Span::from_center_span(corner.y, hw)),
    );

    let mut shapes = vec![Shape::new(vlayer.layer(), vleg)];
    shapes.extend(via_stack(sc, src.layer, hlayer));
    shapes.extend(via_stack(corner, hlayer, vlayer));
    shapes.extend(via_stack(dc, dst.layer, vlayer));

    Ok(Route {
        primary: Shape::new(hlayer.layer(), hleg),
        shapes,
    })
}

/// Two parallel legs leaving both ports in the same direction, joined by a vertical leg.
pub fn c_route(
    src: RoutePort,
    dst: RoutePort,
    extension: i64,
    hlayer: RouteLayer,
    vlayer: RouteLayer,
) -> Result<Route, RouteError> {
    let x = match (src.dir, dst.dir) {
        (PortDir::East, PortDir::East) => src.rect.right().max(dst.rect.right()) + extension,
        (PortDir::West, PortDir::West) => src.rect.left().min(dst.rect.left()) - extension,
        _ => return Err(RouteError::MismatchedDirs),
    };
    let (sc, dc) = (src.center(), dst.center());
    if sc.y == dc.y {
        return Err(RouteError::Degenerate(src.rect, dst.rect));
    }
    let (hw, vw) = (hlayer.width(), vlayer.width());

    let leg = |from: Point| {
        Rect::from_spans(
            Span::new(from.x, x).union(Span::from_center_span(x, vw)),
            Span::from_center_span(from.y, hw),
        )
    };
    let connector = Rect::from_spans(
        Span::from_center_span(x, vw),
        Span::new(sc.y, dc.y)
            .union(Span::from_center_span(sc.y, hw))
            .union(Span::from_center_span(dc.y, hw)),
    );

    let mut shapes = vec![
        Shape::new(hlayer.layer(), leg(sc)),
        Shape::new(hlayer.layer(), leg(dc)),
    ];
    shapes.extend(via_stack(sc, src.layer, hlayer));
    shapes.extend(via_stack(dc, dst.layer, hlayer));
    shapes.extend(via_stack(Point::new(x, sc.y), hlayer, vlayer));
    shapes.extend(via_stack(Point::new(x, dc.y), hlayer, vlayer));

    Ok(Route {
        primary: Shape::new(vlayer.layer(), connector),
        shapes,
    })
}

/// Picks a straight, C, or L route depending on how the ports sit relative to each other.
pub fn smart_route(
    src: RoutePort,
    dst: RoutePort,
    layer: RouteLayer,
) -> Result<Route, RouteError> {
    let aligned = shared_span(src.rect.hspan(), dst.rect.hspan()).is_some()
        || shared_span(src.rect.vspan(), dst.rect.vspan()).is_some();
    let vlayer = layer.above().unwrap_or(layer);

    if aligned {
        debug!(?src, ?dst, ?layer, "routing straight");
        straight_route(src, dst, layer)
    } else if src.dir == dst.dir && src.dir.is_horizontal() {
        debug!(?src, ?dst, ?layer, "routing with a C route");
        c_route(src, dst, C_ROUTE_EXTENSION, layer, vlayer)
    } else {
        debug!(?src, ?dst, ?layer, "routing with an L route");
        l_route(src, dst, layer, vlayer)
    }
}

/// The overlap of two spans, if it has positive length.
fn shared_span(a: Span, b: Span) -> Option<Span> {
    a.intersection(b).filter(|span| span.length() > 0)
}

fn wire_span(overlap: Span, width: i64) -> Span {
    if overlap.length() < width {
        overlap
    } else {
        Span::from_center_span(overlap.center(), width)
    }
}
