use serde::{Deserialize, Serialize};

/// Stable numeric identity of a scene object.
///
/// Nodes, components and assets share one identity space per [`Scene`](crate::Scene).
/// Identities are never reused within a scene, so they are safe to use as
/// keys for cycle detection independent of where the object lives in memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(i64);

impl InstanceId {
    /// Wraps a raw identity value.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identity value.
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl std::fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A graph reference stored inside a component field.
///
/// References are plain identities: they never own the target and may dangle
/// after the target is destroyed. Resolve them through
/// [`Scene::resolve`](crate::Scene::resolve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(pub InstanceId);

impl ObjectRef {
    /// Returns the referenced identity.
    pub fn id(self) -> InstanceId {
        self.0
    }
}

impl From<InstanceId> for ObjectRef {
    fn from(id: InstanceId) -> Self {
        Self(id)
    }
}

/// Hands out fresh identities for a scene.
///
/// Identities start at 1 and grow monotonically; despawned identities are
/// not recycled.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self { next: 1 }
    }

    pub(crate) fn allocate(&mut self) -> InstanceId {
        let id = InstanceId(self.next);
        self.next += 1;
        id
    }
}
