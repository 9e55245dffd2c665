use std::any::TypeId;

use scenewire_scene::components::{Camera, Transform};
use scenewire_scene::reflect::{TypeInfo, Typed};

/// Legacy component shortcuts that resolve sibling components on access.
pub const LEGACY_SHORTCUTS: &[&str] = &[
    "rigidbody",
    "rigidbody2D",
    "camera",
    "light",
    "animation",
    "constantForce",
    "renderer",
    "audio",
    "networkView",
    "collider",
    "collider2D",
    "hingeJoint",
    "particleSystem",
];

const TRANSFORM_DENIED: &[&str] = &["worldToLocalMatrix", "localToWorldMatrix"];

const CAMERA_DENIED: &[&str] = &[
    "projectionMatrix",
    "worldToCameraMatrix",
    "cameraToWorldMatrix",
    "cullingMatrix",
    "previousViewProjectionMatrix",
    "nonJitteredProjectionMatrix",
];

/// Attribute names the generic projector never reads.
#[derive(Debug, Clone)]
pub struct Denylist {
    global: Vec<String>,
    per_type: Vec<(TypeId, &'static [&'static str])>,
}

impl Denylist {
    /// Built-in lists plus `extra` names denied on every type.
    pub fn with_defaults(extra: &[String]) -> Self {
        let mut global: Vec<String> = LEGACY_SHORTCUTS.iter().map(|s| (*s).to_owned()).collect();
        global.extend(extra.iter().cloned());
        Self {
            global,
            per_type: vec![
                (TypeId::of::<Transform>(), TRANSFORM_DENIED),
                (TypeId::of::<Camera>(), CAMERA_DENIED),
            ],
        }
    }

    /// Deny `names` on `T` and every type deriving from it.
    pub fn deny_on<T: Typed>(&mut self, names: &'static [&'static str]) {
        self.per_type.push((TypeId::of::<T>(), names));
    }

    /// Whether `name` is denied on `info` or any of its bases.
    pub fn is_denied(&self, info: &'static TypeInfo, name: &str) -> bool {
        if self.global.iter().any(|g| g == name) {
            return true;
        }
        info.chain().any(|level| {
            self.per_type
                .iter()
                .any(|(id, names)| *id == level.type_id() && names.contains(&name))
        })
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::with_defaults(&[])
    }
}
