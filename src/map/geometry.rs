//! Trigger Containment
//!
//! The step dispatcher only asks one geometric question: which trigger
//! objects contain a sprite's anchor point. `GeometryOracle` is that
//! question; `ShapeOracle` answers it for the stock `Shape` variants.
//!
//! All tests run on widened integers, never floats.

use crate::core::fixed::Fixed;
use crate::core::vec2::FixedVec2;
use crate::map::object::{MapObject, ObjectId, ObjectLayer, Shape};

/// Containment query used by the trigger resolver.
pub trait GeometryOracle {
    /// Return every object in `candidates` whose area contains `point`,
    /// skipping `exclude`. Results keep the candidate layer's order.
    fn find_containing(
        &self,
        point: FixedVec2,
        candidates: &ObjectLayer,
        exclude: Option<ObjectId>,
    ) -> Vec<MapObject>;
}

/// Oracle that tests each object's `Shape`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShapeOracle;

impl GeometryOracle for ShapeOracle {
    fn find_containing(
        &self,
        point: FixedVec2,
        candidates: &ObjectLayer,
        exclude: Option<ObjectId>,
    ) -> Vec<MapObject> {
        candidates
            .iter()
            .filter(|object| Some(object.id) != exclude)
            .filter(|object| shape_contains(&object.shape, point))
            .cloned()
            .collect()
    }
}

/// Check if a shape contains a point.
pub fn shape_contains(shape: &Shape, point: FixedVec2) -> bool {
    match shape {
        Shape::Point => false,
        Shape::Rect { x, y, width, height } => rect_contains(*x, *y, *width, *height, point),
        Shape::Ellipse { x, y, width, height } => ellipse_contains(*x, *y, *width, *height, point),
        Shape::Polygon(points) => polygon_contains(points, point),
    }
}

/// Half-open rectangle test: left and top edges inside, right and bottom outside.
///
/// Two triggers that share an edge never both claim a point on it.
#[inline]
pub fn rect_contains(x: Fixed, y: Fixed, width: Fixed, height: Fixed, point: FixedVec2) -> bool {
    let (px, py) = (point.x as i64, point.y as i64);
    let (x, y) = (x as i64, y as i64);
    px >= x && px < x + width as i64 && py >= y && py < y + height as i64
}

/// Ellipse test inside a bounding box, boundary inclusive.
pub fn ellipse_contains(x: Fixed, y: Fixed, width: Fixed, height: Fixed, point: FixedVec2) -> bool {
    if width <= 0 || height <= 0 {
        return false;
    }

    // Outside the closed bounding box is outside the ellipse. Inside it,
    // |dx| <= rx and |dy| <= ry, so every product below fits in i128.
    let (px, py) = (point.x as i64, point.y as i64);
    let (left, top) = (x as i64, y as i64);
    if px < left || px > left + width as i64 || py < top || py > top + height as i64 {
        return false;
    }

    // Doubled coordinates keep the center on the integer grid
    let rx = width as i128;
    let ry = height as i128;
    let dx = 2 * point.x as i128 - (2 * x as i128 + rx);
    let dy = 2 * point.y as i128 - (2 * y as i128 + ry);

    dx * dx * ry * ry + dy * dy * rx * rx <= rx * rx * ry * ry
}

/// Even-odd polygon test.
///
/// Crossings are compared by cross-multiplication so no division happens.
pub fn polygon_contains(points: &[FixedVec2], point: FixedVec2) -> bool {
    if points.len() < 3 {
        return false;
    }

    let (px, py) = (point.x as i128, point.y as i128);
    let mut inside = false;
    let mut j = points.len() - 1;

    for i in 0..points.len() {
        let (ax, ay) = (points[i].x as i128, points[i].y as i128);
        let (bx, by) = (points[j].x as i128, points[j].y as i128);

        if (ay > py) != (by > py) {
            // px < ax + (py - ay) * (bx - ax) / (by - ay), sign-adjusted
            let lhs = (px - ax) * (by - ay);
            let rhs = (py - ay) * (bx - ax);
            let crosses = if by > ay { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}
