// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal vector/quaternion math used to compare transforms.
//!
//! The engine never composes transforms; it only needs to decide whether two
//! local transforms are "the same" within float tolerance.

/// Squared-length threshold under which two vectors compare equal.
pub const VECTOR_EPSILON_SQUARED: f32 = 1.0e-10;

/// Tolerance on `1 - |dot|` under which two rotations compare equal.
pub const ROTATION_EPSILON: f32 = 1.0e-6;

/// Three-component vector (positions, Euler angles in degrees, scales).
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// All components zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All components one.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Subtracts another vector.
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Squared magnitude of the vector.
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Tolerant equality: the difference has squared length below
    /// [`VECTOR_EPSILON_SQUARED`].
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.sub(other).length_squared() < VECTOR_EPSILON_SQUARED
    }
}

/// Quaternion stored as `(x, y, z, w)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat {
    data: [f32; 4],
}

impl Quat {
    /// Creates a quaternion from components.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { data: [x, y, z, w] }
    }

    /// Returns the identity quaternion.
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `degrees` about a unit axis.
    fn about_axis(axis: [f32; 3], degrees: f32) -> Self {
        let half = degrees.to_radians() * 0.5;
        let (sin_half, cos_half) = half.sin_cos();
        Self::new(
            axis[0] * sin_half,
            axis[1] * sin_half,
            axis[2] * sin_half,
            cos_half,
        )
    }

    /// Builds a rotation from Euler angles in degrees.
    ///
    /// Rotation order is Z, then X, then Y (extrinsic), i.e. `qy * qx * qz`.
    pub fn from_euler_degrees(euler: Vec3) -> Self {
        let qx = Self::about_axis([1.0, 0.0, 0.0], euler.x);
        let qy = Self::about_axis([0.0, 1.0, 0.0], euler.y);
        let qz = Self::about_axis([0.0, 0.0, 1.0], euler.z);
        qy.multiply(&qx).multiply(&qz)
    }

    /// Hamilton product `self * other`.
    pub fn multiply(&self, other: &Self) -> Self {
        let [ax, ay, az, aw] = self.data;
        let [bx, by, bz, bw] = other.data;
        Self::new(
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Four-component dot product.
    pub fn dot(&self, other: &Self) -> f32 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Tolerant equality of the rotations the quaternions represent.
    ///
    /// `q` and `-q` encode the same rotation, so the sign of the dot product
    /// is ignored.
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.dot(other).abs() >= 1.0 - ROTATION_EPSILON
    }

    /// Compares two Euler rotations (degrees) by the rotation they produce.
    pub fn euler_approx_eq(a: Vec3, b: Vec3) -> bool {
        Self::from_euler_degrees(a).approx_eq(&Self::from_euler_degrees(b))
    }
}
