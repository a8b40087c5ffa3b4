//! Orthonormal base reference frames.
//!
//! A [`Frame`] is an origin plus a rotation whose columns are the base's x, y, and z axes in
//! world coordinates. The z axis is the base-plane normal; the y axis points from the
//! glycosidic side towards the Watson-Crick edge's partner. Frames are produced by the frame
//! fitter and consumed by every downstream geometric computation.

use super::types::Point;
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

/// Base reference frame with the residual of the fit that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    /// Frame origin in ångströms.
    pub origin: Point,
    /// Rotation whose columns are the x, y, and z axes.
    pub rotation: Matrix3<f64>,
    /// Root-mean-square deviation of the superposition, in ångströms.
    pub rms: f64,
}

impl Frame {
    pub fn new(origin: Point, rotation: Matrix3<f64>, rms: f64) -> Self {
        Self {
            origin,
            rotation,
            rms,
        }
    }

    /// Frame at the world origin aligned with the world axes.
    pub fn identity() -> Self {
        Self::new(Point::origin(), Matrix3::identity(), 0.0)
    }

    pub fn x(&self) -> Vector3<f64> {
        self.rotation.column(0).into_owned()
    }

    pub fn y(&self) -> Vector3<f64> {
        self.rotation.column(1).into_owned()
    }

    pub fn z(&self) -> Vector3<f64> {
        self.rotation.column(2).into_owned()
    }

    /// Returns the frame rotated 180° about its own x axis (y and z negated).
    ///
    /// This is the orientation a complementary base adopts relative to its partner in an
    /// antiparallel pair.
    pub fn flipped(&self) -> Self {
        let mut rotation = self.rotation;
        rotation.set_column(1, &(-self.y()));
        rotation.set_column(2, &(-self.z()));
        Self::new(self.origin, rotation, self.rms)
    }

    /// Maps a point expressed in this frame's local coordinates into world coordinates.
    pub fn to_world(&self, local: &Point) -> Point {
        self.origin + self.rotation * local.coords
    }

    /// Expresses a world point in this frame's local coordinates.
    pub fn to_local(&self, world: &Point) -> Point {
        Point::from(self.rotation.transpose() * (world - self.origin))
    }

    /// Checks that the axes are unit length, mutually orthogonal, and right-handed.
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let gram = self.rotation.transpose() * self.rotation;
        (gram - Matrix3::identity()).abs().max() <= tolerance
            && (self.rotation.determinant() - 1.0).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    fn tilted_frame() -> Frame {
        let rotation = Rotation3::from_euler_angles(0.4, -0.3, 1.2);
        Frame::new(Point::new(1.0, -2.0, 3.0), *rotation.matrix(), 0.05)
    }

    #[test]
    fn axis_accessors_return_rotation_columns() {
        let frame = Frame::identity();
        assert_eq!(frame.x(), Vector3::x());
        assert_eq!(frame.y(), Vector3::y());
        assert_eq!(frame.z(), Vector3::z());
    }

    #[test]
    fn flipped_negates_y_and_z_and_stays_proper() {
        let frame = tilted_frame();
        let flipped = frame.flipped();

        assert!((flipped.x() - frame.x()).norm() < 1e-12);
        assert!((flipped.y() + frame.y()).norm() < 1e-12);
        assert!((flipped.z() + frame.z()).norm() < 1e-12);
        assert!(flipped.is_orthonormal(1e-9));
        assert_eq!(flipped.origin, frame.origin);
    }

    #[test]
    fn local_and_world_coordinates_are_inverse() {
        let frame = tilted_frame();
        let local = Point::new(0.5, 2.5, -1.0);
        let back = frame.to_local(&frame.to_world(&local));
        assert!((back - local).norm() < 1e-12);
    }

    #[test]
    fn orthonormality_check_rejects_scaled_axes() {
        let mut frame = tilted_frame();
        assert!(frame.is_orthonormal(1e-9));
        frame.rotation *= 1.01;
        assert!(!frame.is_orthonormal(1e-6));
    }
}
