use super::Behaviour;
use crate::math::{Color, Rect, widen_f32};
use crate::reflect::{DeclaredType, FieldValue, ReadError, ScalarKind, TypeInfoBuilder};
use crate::{ObjectRef, Reflect, enum_field};

/// What a camera clears its target to before rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearFlags {
    #[default]
    Skybox,
    SolidColor,
    Depth,
    Nothing,
}

enum_field!(ClearFlags {
    Skybox,
    SolidColor,
    Depth,
    Nothing
});

/// Pixel size of the surface a camera renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
}

/// Camera component.
///
/// Properties derived from the output surface (`aspect`, `pixelWidth`,
/// `pixelHeight`, the projection matrices) fail to read while no render
/// target is attached.
#[derive(Debug, Clone, Reflect)]
#[reflect(component, properties = camera_properties, constructible)]
pub struct Camera {
    #[reflect(base)]
    pub behaviour: Behaviour,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub near_clip_plane: f32,
    pub far_clip_plane: f32,
    pub orthographic: bool,
    pub orthographic_size: f32,
    pub depth: f32,
    pub clear_flags: ClearFlags,
    pub background_color: Color,
    pub culling_mask: i32,
    /// Normalized viewport rectangle.
    pub rect: Rect,
    pub target_texture: Option<ObjectRef>,
    #[reflect(skip)]
    pub render_target: Option<RenderTarget>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            behaviour: Behaviour::default(),
            field_of_view: 60.0,
            near_clip_plane: 0.3,
            far_clip_plane: 1000.0,
            orthographic: false,
            orthographic_size: 5.0,
            depth: -1.0,
            clear_flags: ClearFlags::Skybox,
            background_color: Color::rgba(0.19, 0.3, 0.47, 0.0),
            culling_mask: -1,
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            target_texture: None,
            render_target: None,
        }
    }
}

impl Camera {
    fn target(&self, attribute: &'static str) -> Result<RenderTarget, ReadError> {
        self.render_target.ok_or_else(|| ReadError::Unavailable {
            attribute,
            reason: "camera has no render target".to_owned(),
        })
    }

    /// Width over height of the viewport in pixels.
    pub fn aspect(&self) -> Result<f32, ReadError> {
        let target = self.target("aspect")?;
        let width = target.width as f32 * self.rect.width;
        let height = target.height as f32 * self.rect.height;
        if height <= 0.0 {
            return Err(ReadError::Unavailable {
                attribute: "aspect",
                reason: "viewport has zero height".to_owned(),
            });
        }
        Ok(width / height)
    }
}

fn camera_properties(builder: TypeInfoBuilder<Camera>) -> TypeInfoBuilder<Camera> {
    builder
        .property(
            "aspect",
            DeclaredType::Scalar(ScalarKind::Float),
            |c| c.aspect().map(|a| FieldValue::Float(widen_f32(a))),
        )
        .property(
            "pixelWidth",
            DeclaredType::Scalar(ScalarKind::Int),
            |c| {
                let target = c.target("pixelWidth")?;
                Ok(FieldValue::Int((target.width as f32 * c.rect.width) as i64))
            },
        )
        .property(
            "pixelHeight",
            DeclaredType::Scalar(ScalarKind::Int),
            |c| {
                let target = c.target("pixelHeight")?;
                Ok(FieldValue::Int((target.height as f32 * c.rect.height) as i64))
            },
        )
        .property(
            "projectionMatrix",
            DeclaredType::Opaque("Matrix4x4"),
            |c| c.target("projectionMatrix").map(|_| FieldValue::Opaque("Matrix4x4")),
        )
        .property(
            "worldToCameraMatrix",
            DeclaredType::Opaque("Matrix4x4"),
            |_| Ok(FieldValue::Opaque("Matrix4x4")),
        )
        .property(
            "cullingMatrix",
            DeclaredType::Opaque("Matrix4x4"),
            |c| c.target("cullingMatrix").map(|_| FieldValue::Opaque("Matrix4x4")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Typed, find_base};

    #[test]
    fn aspect_requires_render_target() {
        let mut camera = Camera::default();
        assert!(camera.aspect().is_err());
        camera.render_target = Some(RenderTarget {
            width: 1920,
            height: 1080,
        });
        let aspect = camera.aspect().unwrap();
        assert!((aspect - 16.0 / 9.0).abs() < 1e-4);
    }

    #[test]
    fn clear_flags_reflect_as_variant_name() {
        let attr = Camera::type_info_static().attribute("clearFlags").unwrap();
        let camera = Camera::default();
        assert!(matches!(
            attr.read(camera.as_any()),
            Ok(FieldValue::Enum(name)) if name == "Skybox"
        ));
    }

    #[test]
    fn behaviour_is_base() {
        let camera = Camera::default();
        assert!(find_base::<Behaviour>(&camera).unwrap().enabled);
        assert_eq!(
            Camera::type_info_static().base().unwrap().info().name(),
            "Behaviour"
        );
    }
}
