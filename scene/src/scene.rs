//! The scene arena: nodes, components and assets keyed by [`InstanceId`].

use std::collections::HashMap;
use std::fmt;

use crate::components::Transform;
use crate::id::{IdAllocator, InstanceId, ObjectRef};
use crate::math::{Mat4, Quat};
use crate::reflect::{Reflect, Typed, find_base, find_base_mut};

/// Errors from structural scene operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No node with this identity exists.
    MissingNode(InstanceId),
    /// A node cannot be its own parent.
    SelfParent(InstanceId),
    /// Parenting would make a node its own ancestor.
    WouldCycle {
        child: InstanceId,
        parent: InstanceId,
    },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode(id) => write!(f, "no node with id {id}"),
            Self::SelfParent(id) => write!(f, "node {id} cannot be its own parent"),
            Self::WouldCycle { child, parent } => {
                write!(f, "parenting {child} under {parent} would create a cycle")
            }
        }
    }
}

impl std::error::Error for SceneError {}

/// A named element of the hierarchy.
///
/// The parent link is a lookup key, never ownership; child and component
/// lists are ordered.
#[derive(Debug)]
pub struct Node {
    id: InstanceId,
    pub name: String,
    pub active_self: bool,
    pub is_static: bool,
    pub tag: String,
    pub layer: i32,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) children: Vec<InstanceId>,
    pub(crate) components: Vec<InstanceId>,
}

impl Node {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    /// Ordered child identities.
    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Attached component identities, in attachment order. The first entry
    /// is always the node's [`Transform`].
    pub fn components(&self) -> &[InstanceId] {
        &self.components
    }
}

/// A reflected value attached to exactly one node.
pub struct ComponentEntry {
    id: InstanceId,
    owner: InstanceId,
    data: Box<dyn Reflect>,
}

impl ComponentEntry {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The node this component is attached to.
    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    pub fn data(&self) -> &dyn Reflect {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> &mut dyn Reflect {
        self.data.as_mut()
    }

    pub fn type_name(&self) -> &'static str {
        self.data.type_info().name()
    }

    /// The component viewed as `C` or one of its bases.
    pub fn get<C: Typed>(&self) -> Option<&C> {
        find_base::<C>(self.data.as_ref())
    }
}

impl fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("type", &self.type_name())
            .finish()
    }
}

/// A resource referenced by components but outside the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    id: InstanceId,
    pub name: String,
    pub type_name: String,
    /// Project-relative path, e.g. `Assets/Materials/Red.mat`.
    pub path: String,
}

impl Asset {
    pub fn id(&self) -> InstanceId {
        self.id
    }
}

/// Any object a reference can point at.
#[derive(Debug, Clone, Copy)]
pub enum SceneObject<'a> {
    Node(&'a Node),
    Component(&'a ComponentEntry),
    Asset(&'a Asset),
}

impl SceneObject<'_> {
    pub fn id(&self) -> InstanceId {
        match self {
            Self::Node(n) => n.id,
            Self::Component(c) => c.id,
            Self::Asset(a) => a.id,
        }
    }
}

/// Container for the live object graph.
#[derive(Debug)]
pub struct Scene {
    pub(crate) nodes: HashMap<InstanceId, Node>,
    pub(crate) components: HashMap<InstanceId, ComponentEntry>,
    pub(crate) assets: HashMap<InstanceId, Asset>,
    pub(crate) roots: Vec<InstanceId>,
    ids: IdAllocator,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            components: HashMap::new(),
            assets: HashMap::new(),
            roots: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    // ---- Construction ----

    /// Spawns a root node with an identity [`Transform`].
    pub fn spawn(&mut self, name: impl Into<String>) -> InstanceId {
        let id = self.ids.allocate();
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.into(),
                active_self: true,
                is_static: false,
                tag: String::from("Untagged"),
                layer: 0,
                parent: None,
                children: Vec::new(),
                components: Vec::new(),
            },
        );
        self.roots.push(id);
        self.attach(id, Box::new(Transform::identity()));
        id
    }

    /// Spawns a node as the last child of `parent`.
    pub fn spawn_child(
        &mut self,
        parent: InstanceId,
        name: impl Into<String>,
    ) -> Result<InstanceId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::MissingNode(parent));
        }
        let id = self.spawn(name);
        crate::hierarchy::set_parent(self, id, parent)?;
        Ok(id)
    }

    /// Attaches a component to `node`, returning the component's identity.
    pub fn add_component<C: Reflect>(
        &mut self,
        node: InstanceId,
        component: C,
    ) -> Result<InstanceId, SceneError> {
        if !self.nodes.contains_key(&node) {
            return Err(SceneError::MissingNode(node));
        }
        Ok(self.attach(node, Box::new(component)))
    }

    fn attach(&mut self, node: InstanceId, data: Box<dyn Reflect>) -> InstanceId {
        let id = self.ids.allocate();
        self.components.insert(
            id,
            ComponentEntry {
                id,
                owner: node,
                data,
            },
        );
        if let Some(n) = self.nodes.get_mut(&node) {
            n.components.push(id);
        }
        id
    }

    /// Registers an asset.
    pub fn add_asset(
        &mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        path: impl Into<String>,
    ) -> InstanceId {
        let id = self.ids.allocate();
        self.assets.insert(
            id,
            Asset {
                id,
                name: name.into(),
                type_name: type_name.into(),
                path: path.into(),
            },
        );
        id
    }

    /// Removes a single component. The node's [`Transform`] cannot be
    /// removed; returns `false` in that case or when `id` is unknown.
    pub fn remove_component(&mut self, id: InstanceId) -> bool {
        let Some(entry) = self.components.get(&id) else {
            return false;
        };
        let owner = entry.owner;
        if self
            .nodes
            .get(&owner)
            .is_some_and(|n| n.components.first() == Some(&id))
        {
            return false;
        }
        self.components.remove(&id);
        if let Some(node) = self.nodes.get_mut(&owner) {
            node.components.retain(|&c| c != id);
        }
        true
    }

    // ---- Lookup ----

    pub fn node(&self, id: InstanceId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: InstanceId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn component(&self, id: InstanceId) -> Option<&ComponentEntry> {
        self.components.get(&id)
    }

    pub fn component_mut(&mut self, id: InstanceId) -> Option<&mut ComponentEntry> {
        self.components.get_mut(&id)
    }

    pub fn asset(&self, id: InstanceId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Components attached to `node`, in attachment order.
    pub fn components_of(&self, node: InstanceId) -> impl Iterator<Item = &ComponentEntry> {
        self.nodes
            .get(&node)
            .map(|n| n.components.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.components.get(id))
    }

    /// First component on `node` that is `C` or derives from it.
    pub fn get_component<C: Typed>(&self, node: InstanceId) -> Option<&C> {
        self.components_of(node).find_map(ComponentEntry::get::<C>)
    }

    /// Mutable variant of [`get_component`](Self::get_component).
    pub fn get_component_mut<C: Typed>(&mut self, node: InstanceId) -> Option<&mut C> {
        let ids = self.nodes.get(&node)?.components.clone();
        let id = ids.into_iter().find(|id| {
            self.components
                .get(id)
                .is_some_and(|c| c.get::<C>().is_some())
        })?;
        let entry = self.components.get_mut(&id)?;
        find_base_mut::<C>(entry.data.as_mut())
    }

    pub fn transform(&self, node: InstanceId) -> Option<&Transform> {
        self.get_component::<Transform>(node)
    }

    pub fn transform_mut(&mut self, node: InstanceId) -> Option<&mut Transform> {
        self.get_component_mut::<Transform>(node)
    }

    /// Resolves a reference to whatever it currently points at.
    ///
    /// Returns `None` for dangling references.
    pub fn resolve(&self, r: ObjectRef) -> Option<SceneObject<'_>> {
        let id = r.id();
        if let Some(node) = self.nodes.get(&id) {
            return Some(SceneObject::Node(node));
        }
        if let Some(component) = self.components.get(&id) {
            return Some(SceneObject::Component(component));
        }
        self.assets.get(&id).map(SceneObject::Asset)
    }

    /// Root nodes, in spawn order.
    pub fn roots(&self) -> &[InstanceId] {
        &self.roots
    }

    /// Topmost ancestor of `node` (the node itself when it is a root).
    pub fn root_of(&self, node: InstanceId) -> Option<InstanceId> {
        let mut current = self.nodes.get(&node)?;
        while let Some(parent) = current.parent.and_then(|p| self.nodes.get(&p)) {
            current = parent;
        }
        Some(current.id)
    }

    /// Slash-delimited names from the root down to `node`, e.g.
    /// `Root/Child/Leaf`.
    pub fn hierarchy_path(&self, node: InstanceId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.nodes.get(&node);
        while let Some(n) = current {
            names.push(n.name.as_str());
            current = n.parent.and_then(|p| self.nodes.get(&p));
        }
        if names.is_empty() {
            return None;
        }
        names.reverse();
        Some(names.join("/"))
    }

    /// `true` when the node and all of its ancestors are active.
    pub fn active_in_hierarchy(&self, node: InstanceId) -> bool {
        let mut current = self.nodes.get(&node);
        if current.is_none() {
            return false;
        }
        while let Some(n) = current {
            if !n.active_self {
                return false;
            }
            current = n.parent.and_then(|p| self.nodes.get(&p));
        }
        true
    }

    /// `start` followed by all of its descendants in pre-order.
    pub fn preorder(&self, start: InstanceId) -> Vec<InstanceId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Whether `node` is `ancestor` or lies below it.
    pub fn is_descendant_of(&self, node: InstanceId, ancestor: InstanceId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    // ---- Transforms ----

    /// Recomputes the world matrix of `node` from its ancestors' local
    /// transforms.
    pub fn world_matrix(&self, node: InstanceId) -> Mat4 {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            chain.push(id);
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        chain.iter().rev().fold(Mat4::identity(), |acc, id| {
            match self.transform(*id) {
                Some(t) => acc * t.to_matrix(),
                None => acc,
            }
        })
    }

    /// World rotation of `node`: the product of local rotations from the
    /// root down.
    pub fn world_rotation(&self, node: InstanceId) -> Quat {
        let mut rotation = Quat::identity();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(t) = self.transform(id) {
                rotation = t.local_rotation * rotation;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        rotation
    }

    /// Refreshes the cached world matrix on every [`Transform`], parents
    /// before children.
    pub fn propagate_transforms(&mut self) {
        let roots = self.roots.clone();
        for root in roots {
            let mut stack = vec![(root, Mat4::identity())];
            while let Some((id, parent_world)) = stack.pop() {
                let Some(transform) = self.transform_mut(id) else {
                    continue;
                };
                let world = parent_world * transform.to_matrix();
                transform.set_world_matrix(world);
                if let Some(node) = self.nodes.get(&id) {
                    stack.extend(node.children.iter().map(|&c| (c, world)));
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
