//! Projected overlap area of two base outlines.
//!
//! A base outline is the ring perimeter with every ring atom that carries an exocyclic
//! substituent replaced by that substituent, so the polygon covers the whole base. Both
//! outlines are projected onto the plane perpendicular to the averaged normal and their
//! intersection area is measured by splitting each polygon into a signed triangle fan around
//! its vertex mean and clipping the triangles pairwise.

use crate::db::TemplateView;
use crate::model::residue::Residue;
use crate::model::types::Point;
use nalgebra::{Point2, Vector3};

type Point2d = Point2<f64>;

const AREA_EPSILON: f64 = 1e-12;

/// Outline vertices of a base in perimeter order.
///
/// Ring atoms missing from the residue are skipped; a substituent is looked up under its
/// canonical name first and then under each alias.
pub fn base_outline(residue: &Residue, template: TemplateView<'_>) -> Vec<Point> {
    template
        .ring_atoms()
        .filter_map(|(ring_name, _)| {
            let substituent = template.substituent(ring_name).and_then(|(name, aliases)| {
                residue
                    .atom(name)
                    .or_else(|| aliases.iter().find_map(|alias| residue.atom(alias)))
            });
            substituent.or_else(|| residue.atom(ring_name)).map(|a| a.pos)
        })
        .collect()
}

/// Area shared by two outlines after projection along `normal`.
///
/// # Arguments
///
/// * `first` / `second` - Outline vertices in world coordinates.
/// * `center` - Any point on the projection plane.
/// * `normal` - Plane normal; need not be unit length.
///
/// # Returns
///
/// The intersection area in Å², or `0.0` when either outline has fewer than three vertices.
pub fn overlap_area(first: &[Point], second: &[Point], center: &Point, normal: &Vector3<f64>) -> f64 {
    if first.len() < 3 || second.len() < 3 || normal.norm() == 0.0 {
        return 0.0;
    }

    let n = normal.normalize();
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let e1 = (helper - n * helper.dot(&n)).normalize();
    let e2 = n.cross(&e1);

    let project = |points: &[Point]| -> Vec<Point2d> {
        points
            .iter()
            .map(|p| {
                let d = p - center;
                Point2d::new(d.dot(&e1), d.dot(&e2))
            })
            .collect()
    };

    polygon_intersection_area(&project(first), &project(second))
}

fn polygon_intersection_area(first: &[Point2d], second: &[Point2d]) -> f64 {
    let fan_a = fan(first);
    let fan_b = fan(second);

    let mut total = 0.0_f64;
    for (a, sign_a) in &fan_a {
        for (b, sign_b) in &fan_b {
            total += sign_a * sign_b * signed_area(&clip(a, b)).abs();
        }
    }
    total.abs()
}

/// Vertex-mean fan of a polygon.
///
/// Each triangle is wound counter-clockwise and carries the sign of its original winding, so
/// the signed sum reproduces any simple polygon, concave outlines included.
fn fan(polygon: &[Point2d]) -> Vec<([Point2d; 3], f64)> {
    let count = polygon.len() as f64;
    let centroid = Point2d::from(polygon.iter().map(|p| p.coords).sum::<nalgebra::Vector2<f64>>() / count);

    (0..polygon.len())
        .filter_map(|i| {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];
            let tri = [centroid, a, b];
            let area = signed_area(&tri);
            if area.abs() < AREA_EPSILON {
                None
            } else if area < 0.0 {
                Some(([centroid, b, a], -1.0))
            } else {
                Some((tri, 1.0))
            }
        })
        .collect()
}

/// Sutherland–Hodgman clip of `subject` against a counter-clockwise triangle.
fn clip(subject: &[Point2d; 3], window: &[Point2d; 3]) -> Vec<Point2d> {
    let mut output: Vec<Point2d> = subject.to_vec();

    for i in 0..3 {
        if output.is_empty() {
            break;
        }
        let edge_start = window[i];
        let edge_end = window[(i + 1) % 3];
        let inside = |p: &Point2d| cross(&edge_start, &edge_end, p) >= 0.0;

        let input = std::mem::take(&mut output);
        for j in 0..input.len() {
            let current = input[j];
            let previous = input[(j + input.len() - 1) % input.len()];
            match (inside(&previous), inside(&current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(intersect(&previous, &current, &edge_start, &edge_end)),
                (false, true) => {
                    output.push(intersect(&previous, &current, &edge_start, &edge_end));
                    output.push(current);
                }
                (false, false) => {}
            }
        }
    }

    output
}

fn cross(a: &Point2d, b: &Point2d, p: &Point2d) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn intersect(p: &Point2d, q: &Point2d, a: &Point2d, b: &Point2d) -> Point2d {
    let side_p = cross(a, b, p);
    let side_q = cross(a, b, q);
    let denom = side_p - side_q;
    if denom.abs() < AREA_EPSILON {
        return *q;
    }
    let t = side_p / denom;
    Point2d::new(p.x + t * (q.x - p.x), p.y + t * (q.y - p.y))
}

fn signed_area(polygon: &[Point2d]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    0.5 * sum
}
