//! Parent-child hierarchy operations.
//!
//! All operations keep a node's parent link, its parent's child list and the
//! scene's root list consistent.
//!
//! ```ignore
//! set_parent(&mut scene, child, parent)?;
//! remove_parent(&mut scene, child);
//! despawn_recursive(&mut scene, node);
//! ```

use crate::id::InstanceId;
use crate::scene::{Scene, SceneError};

/// Makes `child` the last child of `parent`.
///
/// If `child` already has a different parent it is detached first. Fails
/// when either node is missing, when `child == parent`, or when `parent`
/// lies below `child`.
pub fn set_parent(
    scene: &mut Scene,
    child: InstanceId,
    parent: InstanceId,
) -> Result<(), SceneError> {
    if child == parent {
        return Err(SceneError::SelfParent(child));
    }
    let Some(child_node) = scene.nodes.get(&child) else {
        return Err(SceneError::MissingNode(child));
    };
    if !scene.nodes.contains_key(&parent) {
        return Err(SceneError::MissingNode(parent));
    }
    if child_node.parent == Some(parent) {
        return Ok(());
    }
    if scene.is_descendant_of(parent, child) {
        return Err(SceneError::WouldCycle { child, parent });
    }

    detach(scene, child);
    if let Some(node) = scene.nodes.get_mut(&child) {
        node.parent = Some(parent);
    }
    if let Some(node) = scene.nodes.get_mut(&parent) {
        node.children.push(child);
    }
    Ok(())
}

/// Detaches `node` from its parent, making it a root. Does nothing if
/// `node` is already a root or missing.
pub fn remove_parent(scene: &mut Scene, node: InstanceId) {
    let has_parent = scene.nodes.get(&node).is_some_and(|n| n.parent.is_some());
    if !has_parent {
        return;
    }
    detach(scene, node);
    scene.roots.push(node);
}

/// Despawns `node`, all of its descendants and every attached component.
///
/// References held elsewhere to any of the removed objects dangle
/// afterwards.
pub fn despawn_recursive(scene: &mut Scene, node: InstanceId) {
    if !scene.nodes.contains_key(&node) {
        return;
    }
    detach(scene, node);
    for id in scene.preorder(node) {
        if let Some(removed) = scene.nodes.remove(&id) {
            for component in removed.components {
                scene.components.remove(&component);
            }
        }
    }
}

/// Unlinks `node` from its parent's child list (or the root list) and
/// clears its parent link.
fn detach(scene: &mut Scene, node: InstanceId) {
    let old_parent = scene.nodes.get_mut(&node).and_then(|n| n.parent.take());
    match old_parent {
        Some(parent) => {
            if let Some(p) = scene.nodes.get_mut(&parent) {
                p.children.retain(|&c| c != node);
            }
        }
        None => scene.roots.retain(|&r| r != node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Camera;

    #[test]
    fn set_parent_creates_relationship() {
        let mut scene = Scene::new();
        let parent = scene.spawn("Parent");
        let child = scene.spawn("Child");
        set_parent(&mut scene, child, parent).unwrap();

        assert_eq!(scene.node(child).unwrap().parent(), Some(parent));
        assert_eq!(scene.node(parent).unwrap().children(), &[child]);
        assert_eq!(scene.roots(), &[parent]);
    }

    #[test]
    fn set_parent_reparents() {
        let mut scene = Scene::new();
        let a = scene.spawn("A");
        let b = scene.spawn("B");
        let child = scene.spawn_child(a, "Child").unwrap();
        set_parent(&mut scene, child, b).unwrap();

        assert!(scene.node(a).unwrap().children().is_empty());
        assert_eq!(scene.node(b).unwrap().children(), &[child]);
    }

    #[test]
    fn set_parent_idempotent() {
        let mut scene = Scene::new();
        let parent = scene.spawn("Parent");
        let child = scene.spawn_child(parent, "Child").unwrap();
        set_parent(&mut scene, child, parent).unwrap();
        assert_eq!(scene.node(parent).unwrap().child_count(), 1);
    }

    #[test]
    fn set_parent_rejects_self_and_cycles() {
        let mut scene = Scene::new();
        let a = scene.spawn("A");
        let b = scene.spawn_child(a, "B").unwrap();
        assert_eq!(set_parent(&mut scene, a, a), Err(SceneError::SelfParent(a)));
        assert_eq!(
            set_parent(&mut scene, a, b),
            Err(SceneError::WouldCycle {
                child: a,
                parent: b
            })
        );
    }

    #[test]
    fn remove_parent_makes_root() {
        let mut scene = Scene::new();
        let parent = scene.spawn("Parent");
        let child = scene.spawn_child(parent, "Child").unwrap();
        remove_parent(&mut scene, child);

        assert_eq!(scene.node(child).unwrap().parent(), None);
        assert_eq!(scene.roots(), &[parent, child]);
        remove_parent(&mut scene, child);
        assert_eq!(scene.roots().len(), 2);
    }

    #[test]
    fn despawn_recursive_removes_subtree_and_components() {
        let mut scene = Scene::new();
        let root = scene.spawn("Root");
        let child = scene.spawn_child(root, "Child").unwrap();
        let grandchild = scene.spawn_child(child, "Grandchild").unwrap();
        let cam = scene.add_component(grandchild, Camera::default()).unwrap();

        despawn_recursive(&mut scene, child);

        assert!(scene.node(child).is_none());
        assert!(scene.node(grandchild).is_none());
        assert!(scene.component(cam).is_none());
        assert!(scene.node(root).unwrap().children().is_empty());
        assert_eq!(scene.node_count(), 1);
    }
}
