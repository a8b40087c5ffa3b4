//! Rigid-body decomposition of the transform between two base frames.
//!
//! The same six-parameter decomposition describes both a base pair (shear, stretch, stagger,
//! buckle, propeller, opening) and a step between consecutive pairs (shift, slide, rise, tilt,
//! roll, twist). The two frames are each rotated halfway towards the other about the hinge
//! axis `z1 × z2`, which yields a shared middle frame; the translation between origins is read
//! in that frame and the rotation is split into a twist about the shared z axis plus a
//! roll-tilt bend about the hinge.

use crate::model::frame::Frame;
use crate::model::types::Point;
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use serde::Serialize;

/// Below this norm the hinge axis is undefined and a fallback axis is used.
const HINGE_EPSILON: f64 = 1e-10;

/// Six rigid-body components of the transform from one frame to another.
///
/// Translations are in ångströms and rotations in degrees. For a base pair the six values are
/// read as shear, stretch, stagger, buckle, propeller, opening; for a step as shift, slide,
/// rise, tilt, roll, twist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBodyParameters {
    pub translation: Vector3<f64>,
    /// Components ordered as (tilt-like, roll-like, twist-like).
    pub rotation: Vector3<f64>,
    /// Middle frame in which the components are expressed.
    pub middle: Frame,
}

/// Geometry of a single base pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BasePairParameters {
    pub shear: f64,
    pub stretch: f64,
    pub stagger: f64,
    pub buckle: f64,
    pub propeller: f64,
    pub opening: f64,
}

/// Decomposes the transform taking `first` onto `second`.
///
/// # Arguments
///
/// * `first` - Starting frame.
/// * `second` - Target frame.
///
/// # Returns
///
/// The six components together with the middle frame they are expressed in.
pub fn decompose(first: &Frame, second: &Frame) -> RigidBodyParameters {
    let z1 = first.z();
    let z2 = second.z();

    let bend = angle_between(&z1, &z2);
    let mut hinge = z1.cross(&z2);
    if hinge.norm() < HINGE_EPSILON {
        hinge = first.x() + second.x() + first.y() + second.y();
        if hinge.norm() < HINGE_EPSILON {
            hinge = first.x();
        }
    }
    let hinge = Unit::new_normalize(hinge);

    let half_first = Rotation3::from_axis_angle(&hinge, 0.5 * bend);
    let half_second = Rotation3::from_axis_angle(&hinge, -0.5 * bend);
    let para_first: Matrix3<f64> = half_first.matrix() * first.rotation;
    let para_second: Matrix3<f64> = half_second.matrix() * second.rotation;

    let mid_z: Vector3<f64> = para_second.column(2).into_owned();
    let y1: Vector3<f64> = para_first.column(1).into_owned();
    let y2: Vector3<f64> = para_second.column(1).into_owned();

    let twist = signed_angle(&y1, &y2, &mid_z);
    let mid_y = (y1 + y2).normalize();
    let mid_x = mid_y.cross(&mid_z);
    let mid_origin = Point::from((first.origin.coords + second.origin.coords) / 2.0);

    let displacement = second.origin - first.origin;
    let translation = Vector3::new(
        displacement.dot(&mid_x),
        displacement.dot(&mid_y),
        displacement.dot(&mid_z),
    );

    let phi = signed_angle(&hinge, &mid_y, &mid_z);
    let roll = bend * phi.cos();
    let tilt = bend * phi.sin();

    let middle = Frame::new(
        mid_origin,
        Matrix3::from_columns(&[mid_x, mid_y, mid_z]),
        0.0,
    );

    RigidBodyParameters {
        translation,
        rotation: Vector3::new(tilt.to_degrees(), roll.to_degrees(), twist.to_degrees()),
        middle,
    }
}

/// Base-pair parameters between a reference base and its partner.
///
/// A partner whose normal points against the reference normal is first rotated 180° about its
/// own x axis, so that an ideal antiparallel pair decomposes to all-zero parameters.
///
/// # Arguments
///
/// * `reference` - Frame of the base that defines the pair's reference strand.
/// * `partner` - Frame of the other base.
pub fn base_pair_parameters(reference: &Frame, partner: &Frame) -> BasePairParameters {
    let partner = if reference.z().dot(&partner.z()) < 0.0 {
        partner.flipped()
    } else {
        *partner
    };
    let parts = decompose(&partner, reference);

    BasePairParameters {
        shear: parts.translation.x,
        stretch: parts.translation.y,
        stagger: parts.translation.z,
        buckle: parts.rotation.x,
        propeller: parts.rotation.y,
        opening: parts.rotation.z,
    }
}

/// Unsigned angle between two vectors, in radians.
pub(crate) fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Angle from `a` to `b` after projection onto the plane normal to `axis`, in radians.
///
/// Positive when the rotation from `a` to `b` is counter-clockwise looking down `axis`.
pub(crate) fn signed_angle(a: &Vector3<f64>, b: &Vector3<f64>, axis: &Vector3<f64>) -> f64 {
    let axis = axis.normalize();
    let pa = a - axis * a.dot(&axis);
    let pb = b - axis * b.dot(&axis);
    let angle = angle_between(&pa, &pb);
    if pa.cross(&pb).dot(&axis) < 0.0 {
        -angle
    } else {
        angle
    }
}
