//! Math type aliases, small geometric value types and helper functions.
//!
//! Vectors and quaternions are `nalgebra` types. The remaining value types
//! ([`Color`], [`Rect`], [`Bounds`]) are plain structs so they serialize to
//! compact wire shapes.

use serde::{Deserialize, Serialize};

pub use nalgebra;

pub type Vec2 = nalgebra::Vector2<f32>;
pub type Vec3 = nalgebra::Vector3<f32>;
pub type Vec4 = nalgebra::Vector4<f32>;
pub type Mat4 = nalgebra::Matrix4<f32>;

/// `w` is the scalar part; see [`quat_to_array`] for wire order.
pub type Quat = nalgebra::Quaternion<f32>;

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Axis-aligned 2D rectangle (position + size).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// Axis-aligned 3D bounding box (center + size).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            center: Vec3::zeros(),
            size: Vec3::zeros(),
        }
    }
}

/// Local-to-parent matrix for a translation, rotation and per-axis scale.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let rotation = nalgebra::UnitQuaternion::new_normalize(rotation);
    nalgebra::Isometry3::from_parts(translation.into(), rotation).to_homogeneous()
        * Mat4::new_nonuniform_scaling(&scale)
}

/// Builds a quaternion from components given in `x, y, z, w` order.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    Quat::new(w, x, y, z)
}

/// Wire order is `x, y, z, w`; nalgebra stores `w` separately.
pub fn quat_to_array(q: Quat) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}

fn axis_rotation(axis: nalgebra::Unit<Vec3>, radians: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&axis, radians).into_inner()
}

pub fn quat_from_rotation_x(radians: f32) -> Quat {
    axis_rotation(Vec3::x_axis(), radians)
}

pub fn quat_from_rotation_y(radians: f32) -> Quat {
    axis_rotation(Vec3::y_axis(), radians)
}

pub fn quat_from_rotation_z(radians: f32) -> Quat {
    axis_rotation(Vec3::z_axis(), radians)
}

/// Applies `q` (normalized first) to `v`.
pub fn quat_rotate_vec3(q: Quat, v: Vec3) -> Vec3 {
    nalgebra::UnitQuaternion::new_normalize(q).transform_vector(&v)
}

/// Euler angles in degrees, applied Z first, then X, then Y.
///
/// Matches the editor convention where `q = Ry * Rx * Rz`. Each component is
/// normalized into `[0, 360)`.
pub fn quat_to_euler_degrees(q: Quat) -> Vec3 {
    let r = nalgebra::UnitQuaternion::new_normalize(q).to_rotation_matrix();
    let m = r.matrix();
    let sin_x = (-m[(1, 2)]).clamp(-1.0, 1.0);
    let (x, y, z) = if sin_x.abs() > 0.9999 {
        // Gimbal lock: fold roll into yaw.
        let x = sin_x.asin();
        let y = (-m[(2, 0)]).atan2(m[(0, 0)]);
        (x, y, 0.0)
    } else {
        let x = sin_x.asin();
        let y = m[(0, 2)].atan2(m[(2, 2)]);
        let z = m[(1, 0)].atan2(m[(1, 1)]);
        (x, y, z)
    };
    Vec3::new(
        normalize_degrees(x.to_degrees()),
        normalize_degrees(y.to_degrees()),
        normalize_degrees(z.to_degrees()),
    )
}

/// Inverse of [`quat_to_euler_degrees`].
pub fn quat_from_euler_degrees(euler: Vec3) -> Quat {
    let qx = quat_from_rotation_x(euler.x.to_radians());
    let qy = quat_from_rotation_y(euler.y.to_radians());
    let qz = quat_from_rotation_z(euler.z.to_radians());
    qy * qx * qz
}

/// Widen an `f32` to the `f64` with the same shortest decimal form, so
/// `0.1f32` becomes `0.1` instead of `0.10000000149011612`.
pub fn widen_f32(v: f32) -> f64 {
    if !v.is_finite() {
        return f64::from(v);
    }
    v.to_string().parse().unwrap_or(f64::from(v))
}

fn normalize_degrees(mut deg: f32) -> f32 {
    deg %= 360.0;
    if deg < 0.0 {
        deg += 360.0;
    }
    // -0.0 and values that round up to 360 both collapse to 0.
    if deg >= 359.9995 || deg == 0.0 {
        0.0
    } else {
        deg
    }
}
