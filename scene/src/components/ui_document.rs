use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::Behaviour;
use crate::reflect::{DeclaredType, FieldValue, TypeInfoBuilder};
use crate::{ObjectRef, Reflect};

/// Element of a live UI tree.
///
/// Elements hold strong references to their children and weak references
/// to their parent, so a tree is cyclic but never leaks. Cloning an element
/// clones the handle, not the tree.
#[derive(Clone)]
pub struct VisualElement {
    inner: Arc<ElementNode>,
}

struct ElementNode {
    name: String,
    parent: RwLock<Weak<ElementNode>>,
    children: RwLock<Vec<Arc<ElementNode>>>,
}

impl VisualElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ElementNode {
                name: name.into(),
                parent: RwLock::new(Weak::new()),
                children: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Appends `child`, detaching it from any previous parent.
    pub fn add(&self, child: &VisualElement) {
        if let Some(old) = child.parent() {
            old.inner
                .children
                .write()
                .retain(|c| !Arc::ptr_eq(c, &child.inner));
        }
        *child.inner.parent.write() = Arc::downgrade(&self.inner);
        self.inner.children.write().push(Arc::clone(&child.inner));
    }

    pub fn parent(&self) -> Option<VisualElement> {
        self.inner
            .parent
            .read()
            .upgrade()
            .map(|inner| VisualElement { inner })
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.read().len()
    }

    pub fn children(&self) -> Vec<VisualElement> {
        self.inner
            .children
            .read()
            .iter()
            .map(|inner| VisualElement {
                inner: Arc::clone(inner),
            })
            .collect()
    }
}

impl fmt::Debug for VisualElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualElement")
            .field("name", &self.inner.name)
            .field("children", &self.child_count())
            .finish()
    }
}

/// Hosts a UI tree on a node.
///
/// The live tree is reachable through the `rootVisualElement` property,
/// which reflection reports as opaque.
#[derive(Debug, Clone, Reflect)]
#[reflect(component, name = "UIDocument", properties = ui_document_properties, constructible)]
pub struct UiDocument {
    #[reflect(base)]
    pub behaviour: Behaviour,
    pub panel_settings: Option<ObjectRef>,
    pub visual_tree_asset: Option<ObjectRef>,
    #[reflect(rename = "parentUI")]
    pub parent_ui: Option<ObjectRef>,
    pub sorting_order: f32,
    #[reflect(skip)]
    root: VisualElement,
}

impl UiDocument {
    pub fn root_visual_element(&self) -> &VisualElement {
        &self.root
    }
}

impl Default for UiDocument {
    fn default() -> Self {
        Self {
            behaviour: Behaviour::default(),
            panel_settings: None,
            visual_tree_asset: None,
            parent_ui: None,
            sorting_order: 0.0,
            root: VisualElement::new("root"),
        }
    }
}

fn ui_document_properties(builder: TypeInfoBuilder<UiDocument>) -> TypeInfoBuilder<UiDocument> {
    builder.property(
        "rootVisualElement",
        DeclaredType::Opaque("VisualElement"),
        |_| Ok(FieldValue::Opaque("VisualElement")),
    )
}
