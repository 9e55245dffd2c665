use super::Behaviour;
use crate::math::Bounds;
use crate::{ObjectRef, Reflect};

/// Draws a mesh with a list of material slots.
#[derive(Debug, Clone, Default, Reflect)]
#[reflect(component, constructible)]
pub struct MeshRenderer {
    #[reflect(base)]
    pub behaviour: Behaviour,
    pub mesh: Option<ObjectRef>,
    /// One entry per submesh; empty slots are `None`.
    pub materials: Vec<Option<ObjectRef>>,
    pub local_bounds: Bounds,
    pub cast_shadows: bool,
    pub sorting_order: i32,
    #[reflect(serialized)]
    lightmap_index: i32,
}

impl MeshRenderer {
    pub fn lightmap_index(&self) -> i32 {
        self.lightmap_index
    }

    pub fn set_lightmap_index(&mut self, index: i32) {
        self.lightmap_index = index;
    }
}
