//! Hand-written projections for types whose generic walk is unsafe or
//! noisy.
//!
//! A special case replaces the generic walk for its type and every type
//! deriving from it. It reads only the attributes it names and never hands
//! a subtree back to the generic projector.

use std::any::TypeId;

use scenewire_scene::components::{Camera, Transform, UiDocument};
use scenewire_scene::math::{Vec3, quat_rotate_vec3, quat_to_euler_degrees};
use scenewire_scene::reflect::{FieldValue, TypeInfo, Typed};
use scenewire_scene::{ComponentEntry, ObjectRef};

use super::walk::Walk;
use crate::wire::{WireMap, WireValue};

/// Override projector for one component type.
pub trait SpecialCase: Send + Sync {
    fn project(&self, walk: &mut Walk<'_>, component: &ComponentEntry) -> WireMap;
}

struct Registration {
    type_id: TypeId,
    type_name: &'static str,
    case: Box<dyn SpecialCase>,
}

/// Maps component types to their [`SpecialCase`].
pub struct SpecialCaseRegistry {
    cases: Vec<Registration>,
}

impl SpecialCaseRegistry {
    pub fn empty() -> Self {
        Self { cases: Vec::new() }
    }

    /// Registry with the `Transform`, `Camera` and `UIDocument` cases.
    pub fn with_defaults() -> Self {
        Self::empty()
            .register::<Transform>(TransformCase)
            .register::<Camera>(CameraCase)
            .register::<UiDocument>(UiDocumentCase)
    }

    /// Use `case` for `T` and its subtypes, replacing an earlier
    /// registration for `T`.
    pub fn register<T: Typed>(mut self, case: impl SpecialCase + 'static) -> Self {
        let type_id = TypeId::of::<T>();
        self.cases.retain(|r| r.type_id != type_id);
        self.cases.push(Registration {
            type_id,
            type_name: T::type_info_static().name(),
            case: Box::new(case),
        });
        self
    }

    /// The case for the nearest registered type along `info`'s base chain.
    pub fn find(&self, info: &'static TypeInfo) -> Option<&dyn SpecialCase> {
        info.chain().find_map(|level| {
            self.cases
                .iter()
                .find(|r| r.type_id == level.type_id())
                .map(|r| r.case.as_ref())
        })
    }

    /// Registered type names, in registration order.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.cases.iter().map(|r| r.type_name).collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl Default for SpecialCaseRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Positions, Euler rotations, scale, basis vectors and hierarchy links.
/// Matrix properties are never read.
pub struct TransformCase;

impl SpecialCase for TransformCase {
    fn project(&self, walk: &mut Walk<'_>, component: &ComponentEntry) -> WireMap {
        let mut out = WireMap::new();
        let Some(transform) = component.get::<Transform>() else {
            return out;
        };
        let scene = walk.scene();
        let node = component.owner();
        let world = scene.world_matrix(node);
        let world_rotation = scene.world_rotation(node);

        out.insert("localPosition", WireValue::floats(transform.local_position.as_slice()));
        out.insert(
            "position",
            WireValue::floats(&[world[(0, 3)], world[(1, 3)], world[(2, 3)]]),
        );
        out.insert(
            "localRotation",
            WireValue::floats(quat_to_euler_degrees(transform.local_rotation).as_slice()),
        );
        out.insert(
            "rotation",
            WireValue::floats(quat_to_euler_degrees(world_rotation).as_slice()),
        );
        out.insert("localScale", WireValue::floats(transform.local_scale.as_slice()));
        for (name, axis) in [("forward", Vec3::z()), ("up", Vec3::y()), ("right", Vec3::x())] {
            let direction = quat_rotate_vec3(world_rotation, axis);
            out.insert(name, WireValue::floats(direction.as_slice()));
        }

        let parent = scene.node(node).and_then(|n| n.parent());
        out.insert("parent", walk.project_optional_reference(parent.map(ObjectRef::from)));
        let root = scene.root_of(node);
        out.insert("root", walk.project_optional_reference(root.map(ObjectRef::from)));
        let child_count = scene.node(node).map_or(0, |n| n.child_count());
        out.insert("childCount", child_count as i64);
        out
    }
}

/// Attributes the camera case tries, in output order.
pub const CAMERA_ATTRIBUTES: &[&str] = &[
    "enabled",
    "fieldOfView",
    "nearClipPlane",
    "farClipPlane",
    "orthographic",
    "orthographicSize",
    "depth",
    "aspect",
    "clearFlags",
    "backgroundColor",
    "cullingMask",
    "rect",
    "pixelWidth",
    "pixelHeight",
    "targetTexture",
];

/// Curated scalar and reference attributes. A failed read skips only that
/// attribute.
pub struct CameraCase;

impl SpecialCase for CameraCase {
    fn project(&self, walk: &mut Walk<'_>, component: &ComponentEntry) -> WireMap {
        let target = component.data();
        let descriptors = walk.descriptors(target.type_info(), false);
        let mut out = WireMap::new();
        for &name in CAMERA_ATTRIBUTES {
            let Some(desc) = descriptors.iter().find(|d| d.name() == name) else {
                continue;
            };
            let Some(value) = walk.read(target, desc) else {
                continue;
            };
            let wire = match value {
                FieldValue::Reference(r) => walk.project_reference(r),
                other => match WireValue::from_scalar(&other) {
                    Some(wire) => wire,
                    None => continue,
                },
            };
            out.insert(name, wire);
        }
        out
    }
}

/// External references only; the live visual tree is omitted.
pub struct UiDocumentCase;

impl SpecialCase for UiDocumentCase {
    fn project(&self, walk: &mut Walk<'_>, component: &ComponentEntry) -> WireMap {
        let mut out = WireMap::new();
        let Some(doc) = component.get::<UiDocument>() else {
            return out;
        };
        out.insert("enabled", doc.behaviour.enabled);
        out.insert("sortingOrder", doc.sorting_order);
        out.insert("panelSettings", walk.project_optional_reference(doc.panel_settings));
        out.insert(
            "visualTreeAsset",
            walk.project_optional_reference(doc.visual_tree_asset),
        );
        out.insert("parentUI", walk.project_optional_reference(doc.parent_ui));

        let mut omitted = WireMap::new();
        omitted.insert("_omitted", true);
        omitted.insert("reason", "live visual tree holds parent/child cycles");
        out.insert("rootVisualElement", omitted);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenewire_scene::Reflect;
    use scenewire_scene::components::{Behaviour, MeshRenderer};

    #[derive(Debug, Default, Reflect)]
    struct OrbitCamera {
        #[reflect(base)]
        pub camera: Camera,
        pub distance: f32,
    }

    struct Marker;

    impl SpecialCase for Marker {
        fn project(&self, _: &mut Walk<'_>, _: &ComponentEntry) -> WireMap {
            let mut out = WireMap::new();
            out.insert("marker", true);
            out
        }
    }

    #[test]
    fn defaults_cover_three_types() {
        let registry = SpecialCaseRegistry::with_defaults();
        assert_eq!(
            registry.type_names(),
            vec!["Transform", "Camera", "UIDocument"]
        );
        assert!(registry.find(MeshRenderer::type_info_static()).is_none());
    }

    #[test]
    fn subtypes_match_through_base_chain() {
        let registry = SpecialCaseRegistry::with_defaults();
        assert!(registry.find(OrbitCamera::type_info_static()).is_some());
        assert!(registry.find(Behaviour::type_info_static()).is_none());
    }

    #[test]
    fn register_replaces_existing_case() {
        let registry = SpecialCaseRegistry::with_defaults().register::<Camera>(Marker);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.type_names().last(), Some(&"Camera"));
    }

    #[test]
    fn empty_registry_matches_nothing() {
        let registry = SpecialCaseRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.find(Transform::type_info_static()).is_none());
    }
}
