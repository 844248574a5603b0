//! Small fixed-size vector and rotation math
//!
//! Everything here is `no_std`; transcendental functions come from `libm`.

use core::ops::{Add, Mul, Neg, Sub};

/// A point or direction in the platform frame (metres)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length
    pub fn norm(self) -> f64 {
        libm::sqrt(self.dot(self))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Row-major 3x3 matrix, used for rotations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    rows: [[f64; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Rotation about the x axis (roll)
    pub fn rot_x(angle: f64) -> Self {
        let (s, c) = (libm::sin(angle), libm::cos(angle));
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    /// Rotation about the y axis (pitch)
    pub fn rot_y(angle: f64) -> Self {
        let (s, c) = (libm::sin(angle), libm::cos(angle));
        Self::from_rows([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    /// Rotation about the z axis (yaw)
    pub fn rot_z(angle: f64) -> Self {
        let (s, c) = (libm::sin(angle), libm::cos(angle));
        Self::from_rows([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn row(&self, index: usize) -> Vec3 {
        let r = self.rows[index];
        Vec3::new(r[0], r[1], r[2])
    }

    pub fn transpose(&self) -> Self {
        let r = &self.rows;
        Self::from_rows([
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ])
    }

    pub fn determinant(&self) -> f64 {
        let r = &self.rows;
        r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0])
    }

    /// Solve `self * x = rhs` by Cramer's rule
    ///
    /// Returns `None` when the matrix is (numerically) singular.
    pub fn solve(&self, rhs: Vec3) -> Option<Vec3> {
        let det = self.determinant();
        if !det.is_finite() || libm::fabs(det) < 1e-18 {
            return None;
        }

        let mut out = [0.0; 3];
        for (col, slot) in out.iter_mut().enumerate() {
            let mut m = self.rows;
            m[0][col] = rhs.x;
            m[1][col] = rhs.y;
            m[2][col] = rhs.z;
            *slot = Mat3::from_rows(m).determinant() / det;
        }
        Some(Vec3::new(out[0], out[1], out[2]))
    }
}

impl Mul for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Mat3 {
        let mut rows = [[0.0; 3]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        Mat3::from_rows(rows)
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        Vec3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }
}

/// Angle between the platform normal and vertical for a roll/pitch attitude
///
/// Independent of yaw and of the rotation order used by the variants.
pub fn tilt_magnitude(roll: f64, pitch: f64) -> f64 {
    let cos_pitch = libm::cos(pitch);
    let nx = libm::sin(pitch);
    let ny = -libm::sin(roll) * cos_pitch;
    let nz = libm::cos(roll) * cos_pitch;
    libm::atan2(libm::sqrt(nx * nx + ny * ny), nz)
}
