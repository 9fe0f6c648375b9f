//! Periodic-boundary vector math and the clockwise angle conventions used
//! throughout the move engine.
//!
//! Angles are measured *clockwise* from the positive x-axis and live in
//! [0, 2pi), flipping the natural counter-clockwise `atan2` convention.

use nalgebra::{Point2, Vector2};
use std::f64::consts::TAU;

/// Winding sense of an ordered path of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    Anticlockwise,
}

/// Minimum-image vector from `from` to `to` in a periodic box.
pub fn pbc_vector(from: &Point2<f64>, to: &Point2<f64>, dimensions: &Vector2<f64>) -> Vector2<f64> {
    let mut v = to - from;
    v.x -= dimensions.x * (v.x / dimensions.x).round();
    v.y -= dimensions.y * (v.y / dimensions.y).round();
    v
}

/// Minimum-image distance between two points.
pub fn pbc_distance(a: &Point2<f64>, b: &Point2<f64>, dimensions: &Vector2<f64>) -> f64 {
    pbc_vector(a, b, dimensions).norm()
}

/// Wraps a point back into `[0, Lx) x [0, Ly)`.
pub fn wrap_point(point: &Point2<f64>, dimensions: &Vector2<f64>) -> Point2<f64> {
    Point2::new(
        point.x.rem_euclid(dimensions.x),
        point.y.rem_euclid(dimensions.y),
    )
}

/// Wraps a flat `[x0, y0, x1, y1, ..]` buffer back into the box.
pub fn wrap_coordinates(coords: &mut [f64], dimensions: &Vector2<f64>) {
    for pair in coords.chunks_exact_mut(2) {
        pair[0] = pair[0].rem_euclid(dimensions.x);
        pair[1] = pair[1].rem_euclid(dimensions.y);
    }
}

/// Clockwise angle of the periodic vector `origin -> target` relative to the
/// positive x-axis, in [0, 2pi).
pub fn clockwise_angle(
    origin: &Point2<f64>,
    target: &Point2<f64>,
    dimensions: &Vector2<f64>,
) -> f64 {
    let v = pbc_vector(origin, target, dimensions);
    // atan2 ranges over (-pi, pi]; shift to [0, 2pi) and flip direction.
    let mut angle = v.y.atan2(v.x);
    if angle < 0.0 {
        angle += TAU;
    }
    let clockwise = TAU - angle;
    if clockwise >= TAU { 0.0 } else { clockwise }
}

/// Clockwise angle swept from `v1` to `v2`, in [0, 2pi).
pub fn clockwise_angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> f64 {
    let cosine = (v1.dot(v2) / (v1.norm() * v2.norm())).clamp(-1.0, 1.0);
    let mut angle = cosine.acos();
    if v1.x * v2.y - v1.y * v2.x > 0.0 {
        angle = TAU - angle;
    }
    angle
}

/// Winding sense of an ordered path around its mean centre.
///
/// The clockwise angle of consecutive points should only decrease at the
/// wrap from 2pi back to 0; a second decrease means the path runs
/// anticlockwise.
pub fn path_winding(points: &[Point2<f64>], dimensions: &Vector2<f64>) -> Winding {
    debug_assert!(points.len() >= 3);
    let origin = points[0];
    let mut displacement = Vector2::zeros();
    for point in points {
        displacement += pbc_vector(&origin, point, dimensions);
    }
    displacement /= points.len() as f64;
    let centre = wrap_point(&(origin + displacement), dimensions);

    let mut previous = clockwise_angle(&centre, &points[points.len() - 1], dimensions);
    let mut times_decreased = 0;
    for point in points {
        let angle = clockwise_angle(&centre, point, dimensions);
        if angle < previous {
            times_decreased += 1;
            if times_decreased == 2 {
                return Winding::Anticlockwise;
            }
        }
        previous = angle;
    }
    Winding::Clockwise
}

/// Rotates the segment `p1 -> p2` by 90 degrees about its midpoint, in the
/// given winding sense. Used as the initial geometric guess for the two
/// re-formed bonds of a switch move.
pub fn rotate_about_midpoint(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    winding: Winding,
) -> (Point2<f64>, Point2<f64>) {
    let centre = nalgebra::center(p1, p2);
    let rotate = |p: &Point2<f64>| {
        let v = p - centre;
        let rotated = match winding {
            Winding::Clockwise => Vector2::new(v.y, -v.x),
            Winding::Anticlockwise => Vector2::new(-v.y, v.x),
        };
        centre + rotated
    };
    (rotate(p1), rotate(p2))
}

/// Sorts `ids` into ascending clockwise-angle order around `centre`.
pub fn sort_clockwise(
    centre: &Point2<f64>,
    dimensions: &Vector2<f64>,
    ids: &mut [usize],
    coord_of: impl Fn(usize) -> Point2<f64>,
) {
    let mut keyed: Vec<(usize, f64)> = ids
        .iter()
        .map(|&id| (id, clockwise_angle(centre, &coord_of(id), dimensions)))
        .collect();
    keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
    for (slot, (id, _)) in ids.iter_mut().zip(keyed) {
        *slot = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn dims() -> Vector2<f64> {
        Vector2::new(10.0, 10.0)
    }

    #[test]
    fn pbc_vector_takes_the_nearest_image() {
        let v = pbc_vector(
            &Point2::new(0.5, 0.5),
            &Point2::new(9.5, 0.5),
            &dims(),
        );
        assert!((v.x + 1.0).abs() < 1e-12);
        assert!(v.y.abs() < 1e-12);
    }

    #[test]
    fn clockwise_angle_flips_the_ccw_convention() {
        let origin = Point2::new(5.0, 5.0);
        // Straight along +x: zero either way.
        assert!(clockwise_angle(&origin, &Point2::new(6.0, 5.0), &dims()).abs() < 1e-12);
        // Straight up (+y) is a quarter turn counter-clockwise, so three
        // quarters clockwise.
        let up = clockwise_angle(&origin, &Point2::new(5.0, 6.0), &dims());
        assert!((up - 1.5 * PI).abs() < 1e-12);
        // Straight down is a quarter turn clockwise.
        let down = clockwise_angle(&origin, &Point2::new(5.0, 4.0), &dims());
        assert!((down - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn clockwise_angle_between_orients_by_cross_product() {
        let v1 = Vector2::new(1.0, 0.0);
        let v2 = Vector2::new(0.0, 1.0);
        // Sweeping clockwise from +x to +y covers three quarters of a turn.
        assert!((clockwise_angle_between(&v1, &v2) - 1.5 * PI).abs() < 1e-12);
        assert!((clockwise_angle_between(&v2, &v1) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn path_winding_detects_both_senses() {
        let square_cw = [
            Point2::new(4.0, 6.0),
            Point2::new(6.0, 6.0),
            Point2::new(6.0, 4.0),
            Point2::new(4.0, 4.0),
        ];
        assert_eq!(path_winding(&square_cw, &dims()), Winding::Clockwise);
        let mut square_ccw = square_cw;
        square_ccw.reverse();
        assert_eq!(path_winding(&square_ccw, &dims()), Winding::Anticlockwise);
    }

    #[test]
    fn rotation_preserves_the_midpoint() {
        let p1 = Point2::new(4.0, 5.0);
        let p2 = Point2::new(6.0, 5.0);
        let (r1, r2) = rotate_about_midpoint(&p1, &p2, Winding::Clockwise);
        assert!((r1.x - 5.0).abs() < 1e-12 && (r1.y - 6.0).abs() < 1e-12);
        assert!((r2.x - 5.0).abs() < 1e-12 && (r2.y - 4.0).abs() < 1e-12);
        let (a1, a2) = rotate_about_midpoint(&p1, &p2, Winding::Anticlockwise);
        assert!((a1.y - 4.0).abs() < 1e-12 && (a2.y - 6.0).abs() < 1e-12);
    }

    #[test]
    fn sort_clockwise_orders_by_angle() {
        let centre = Point2::new(5.0, 5.0);
        let coords = [
            Point2::new(6.0, 5.0), // 0
            Point2::new(5.0, 6.0), // 3/2 pi
            Point2::new(5.0, 4.0), // 1/2 pi
            Point2::new(4.0, 5.0), // pi
        ];
        let mut ids = vec![0, 1, 2, 3];
        sort_clockwise(&centre, &dims(), &mut ids, |id| coords[id]);
        assert_eq!(ids, vec![0, 2, 3, 1]);
    }
}
