use crate::Reflect;
use crate::math::{
    Mat4, Quat, Vec3, mat4_from_scale_rotation_translation, quat_to_euler_degrees,
};
use crate::reflect::{DeclaredType, FieldValue, ReadError, ScalarKind, TypeInfoBuilder};

/// Local transform of a node.
///
/// Every node owns exactly one `Transform`, created together with the node.
/// The world matrix is cached and refreshed by
/// [`Scene::propagate_transforms`](crate::Scene::propagate_transforms);
/// [`Scene::world_matrix`](crate::Scene::world_matrix) always recomputes it.
#[derive(Debug, Clone, PartialEq, Reflect)]
#[reflect(component, properties = transform_properties, constructible)]
pub struct Transform {
    /// Translation relative to the parent.
    pub local_position: Vec3,
    /// Rotation relative to the parent.
    pub local_rotation: Quat,
    /// Non-uniform scale relative to the parent.
    pub local_scale: Vec3,
    #[reflect(opaque = "Matrix4x4")]
    _world: Mat4,
}

impl Transform {
    /// Identity transform: origin position, no rotation, unit scale.
    pub fn identity() -> Self {
        Self {
            local_position: Vec3::zeros(),
            local_rotation: Quat::identity(),
            local_scale: Vec3::new(1.0, 1.0, 1.0),
            _world: Mat4::identity(),
        }
    }

    /// Create from translation only (identity rotation and scale).
    pub fn from_position(position: Vec3) -> Self {
        Self {
            local_position: position,
            ..Self::identity()
        }
    }

    /// Create from rotation only (origin position and unit scale).
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            local_rotation: rotation,
            ..Self::identity()
        }
    }

    /// Compute the local 4x4 transform matrix (T * R * S).
    pub fn to_matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(
            self.local_scale,
            self.local_rotation,
            self.local_position,
        )
    }

    /// World matrix as of the last propagation.
    pub fn cached_world_matrix(&self) -> Mat4 {
        self._world
    }

    pub(crate) fn set_world_matrix(&mut self, world: Mat4) {
        self._world = world;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

fn transform_properties(builder: TypeInfoBuilder<Transform>) -> TypeInfoBuilder<Transform> {
    builder
        .property(
            "localEulerAngles",
            DeclaredType::Scalar(ScalarKind::Vec3),
            |t| Ok(FieldValue::Vec3(quat_to_euler_degrees(t.local_rotation))),
        )
        .property(
            "position",
            DeclaredType::Scalar(ScalarKind::Vec3),
            |t| {
                let m = &t._world;
                Ok(FieldValue::Vec3(Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])))
            },
        )
        .property(
            "localToWorldMatrix",
            DeclaredType::Opaque("Matrix4x4"),
            |_| Ok(FieldValue::Opaque("Matrix4x4")),
        )
        .property(
            "worldToLocalMatrix",
            DeclaredType::Opaque("Matrix4x4"),
            |t| match t._world.try_inverse() {
                Some(_) => Ok(FieldValue::Opaque("Matrix4x4")),
                None => Err(ReadError::Unavailable {
                    attribute: "worldToLocalMatrix",
                    reason: "world matrix is singular".to_owned(),
                }),
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::quat_from_rotation_y;
    use crate::reflect::{MemberKind, Typed};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_transform() {
        let t = Transform::identity();
        assert_eq!(t.local_position, Vec3::zeros());
        assert_eq!(t.local_rotation, Quat::identity());
        assert_eq!(t.local_scale, Vec3::new(1.0, 1.0, 1.0));
        assert!((t.to_matrix() - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn attribute_names_are_camel_case() {
        let info = Transform::type_info_static();
        let names: Vec<_> = info.attributes().iter().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec![
                "localPosition",
                "localRotation",
                "localScale",
                "_world",
                "localEulerAngles",
                "position",
                "localToWorldMatrix",
                "worldToLocalMatrix",
            ]
        );
        assert!(info.attribute("_world").unwrap().is_synthesized());
        assert_eq!(
            info.attribute("position").unwrap().member(),
            MemberKind::Property
        );
    }

    #[test]
    fn euler_property_reads_degrees() {
        let t = Transform::from_rotation(quat_from_rotation_y(FRAC_PI_2));
        let attr = Transform::type_info_static()
            .attribute("localEulerAngles")
            .unwrap();
        let FieldValue::Vec3(euler) = attr.read(t.as_any()).unwrap() else {
            panic!("expected Vec3");
        };
        assert!((euler.y - 90.0).abs() < 1e-3);
    }

    #[test]
    fn singular_world_matrix_fails_inverse_read() {
        let mut t = Transform::identity();
        t.set_world_matrix(Mat4::zeros());
        let attr = Transform::type_info_static()
            .attribute("worldToLocalMatrix")
            .unwrap();
        assert!(attr.read(t.as_any()).is_err());
    }
}
