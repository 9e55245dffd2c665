//! Paged browsing of a node hierarchy.

use serde::Serialize;

use scenewire_scene::math::{quat_to_euler_degrees, widen_f32};
use scenewire_scene::{InstanceId, Scene};

use crate::config::ProjectionConfig;
use crate::error::{ProjectionError, ProjectionResult};

/// Which node's children to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentSelector {
    /// Numeric identity.
    Id(i64),
    /// Numeric-looking identity, `/`-delimited path or bare name.
    Text(String),
}

impl ParentSelector {
    /// Build a selector from raw text. Blank text selects nothing.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::Text(trimmed.to_owned()))
        }
    }
}

impl std::fmt::Display for ParentSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// `None` pages over the root itself.
    pub parent: Option<ParentSelector>,
    pub page_size: Option<i64>,
    pub cursor: Option<i64>,
    pub include_transform: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Root,
    Children,
}

/// Local transform values, rotation as Euler degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformSnippet {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub name: String,
    pub id: InstanceId,
    pub active_self: bool,
    pub active_in_hierarchy: bool,
    pub tag: String,
    pub layer: i32,
    pub is_static: bool,
    pub path: String,
    pub child_count: usize,
    /// Whether the node has children not included in this page.
    pub children_truncated: bool,
    /// Cursor for listing this node's children, `None` without children.
    pub children_cursor: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSnippet>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub scope: Scope,
    #[serde(rename = "rootPath")]
    pub root_path: String,
    pub cursor: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<usize>,
    pub truncated: bool,
    pub total: usize,
    pub items: Vec<NodeSummary>,
}

/// Returns one page of node summaries below a selected parent.
#[derive(Debug, Clone)]
pub struct HierarchyPaginator {
    default_page_size: usize,
    max_page_size: usize,
}

impl HierarchyPaginator {
    pub fn new(config: &ProjectionConfig) -> Self {
        let max_page_size = config.max_page_size.max(1);
        Self {
            default_page_size: config.default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn page(
        &self,
        scene: &Scene,
        root: InstanceId,
        request: &PageRequest,
    ) -> ProjectionResult<Page> {
        if scene.node(root).is_none() {
            return Err(ProjectionError::NotFound {
                what: "root node",
                selector: root.to_string(),
            });
        }

        let (scope, listed) = match &request.parent {
            None => (Scope::Root, vec![root]),
            Some(selector) => {
                let parent = resolve_selector(scene, root, selector).ok_or_else(|| {
                    ProjectionError::NotFound {
                        what: "parent",
                        selector: selector.to_string(),
                    }
                })?;
                let children = scene
                    .node(parent)
                    .map(|n| n.children().to_vec())
                    .unwrap_or_default();
                (Scope::Children, children)
            }
        };

        let total = listed.len();
        let page_size = self.clamp_page_size(request.page_size);
        let cursor = request
            .cursor
            .map_or(0, |c| usize::try_from(c).unwrap_or(0))
            .min(total);
        let end = cursor.saturating_add(page_size).min(total);
        let items: Vec<NodeSummary> = listed[cursor..end]
            .iter()
            .filter_map(|&id| summarize(scene, id, request.include_transform))
            .collect();
        let truncated = cursor + items.len() < total;

        Ok(Page {
            scope,
            root_path: scene.hierarchy_path(root).unwrap_or_default(),
            cursor,
            page_size,
            next_cursor: truncated.then_some(cursor + items.len()),
            truncated,
            total,
            items,
        })
    }

    fn clamp_page_size(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.default_page_size,
            Some(size) => usize::try_from(size)
                .unwrap_or(1)
                .clamp(1, self.max_page_size),
        }
    }
}

impl Default for HierarchyPaginator {
    fn default() -> Self {
        Self::new(&ProjectionConfig::default())
    }
}

/// Resolve `selector` below `root`: numeric identity, then path, then name.
pub fn resolve_selector(
    scene: &Scene,
    root: InstanceId,
    selector: &ParentSelector,
) -> Option<InstanceId> {
    let text = match selector {
        ParentSelector::Id(raw) => {
            if let Some(id) = by_id(scene, root, *raw) {
                return Some(id);
            }
            raw.to_string()
        }
        ParentSelector::Text(text) => {
            let numeric = text.trim().parse::<i64>().ok();
            if let Some(id) = numeric.and_then(|raw| by_id(scene, root, raw)) {
                return Some(id);
            }
            text.clone()
        }
    };
    if text.contains('/') {
        if let Some(id) = by_path(scene, root, &text) {
            return Some(id);
        }
    }
    by_name(scene, root, &text)
}

fn by_id(scene: &Scene, root: InstanceId, raw: i64) -> Option<InstanceId> {
    let id = InstanceId::from_raw(raw);
    (scene.node(id).is_some() && scene.is_descendant_of(id, root)).then_some(id)
}

fn by_path(scene: &Scene, root: InstanceId, path: &str) -> Option<InstanceId> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let root_name = scene.node(root)?.name.as_str();
    if segments.first() == Some(&root_name) {
        if let Some(id) = walk_path(scene, root, &segments[1..]) {
            return Some(id);
        }
    }
    walk_path(scene, root, &segments)
}

fn walk_path(scene: &Scene, root: InstanceId, segments: &[&str]) -> Option<InstanceId> {
    segments.iter().try_fold(root, |current, segment| {
        scene.node(current)?.children().iter().copied().find(|&child| {
            scene.node(child).is_some_and(|n| n.name == *segment)
        })
    })
}

fn by_name(scene: &Scene, root: InstanceId, name: &str) -> Option<InstanceId> {
    scene
        .preorder(root)
        .into_iter()
        .find(|&id| scene.node(id).is_some_and(|n| n.name == name))
}

/// Summary of one node; `None` if it no longer exists.
pub fn summarize(scene: &Scene, id: InstanceId, include_transform: bool) -> Option<NodeSummary> {
    let node = scene.node(id)?;
    let child_count = node.child_count();
    let transform = if include_transform {
        scene.transform(id).map(|t| {
            let euler = quat_to_euler_degrees(t.local_rotation);
            TransformSnippet {
                position: widen3(t.local_position.x, t.local_position.y, t.local_position.z),
                rotation: widen3(euler.x, euler.y, euler.z),
                scale: widen3(t.local_scale.x, t.local_scale.y, t.local_scale.z),
            }
        })
    } else {
        None
    };
    Some(NodeSummary {
        name: node.name.clone(),
        id,
        active_self: node.active_self,
        active_in_hierarchy: scene.active_in_hierarchy(id),
        tag: node.tag.clone(),
        layer: node.layer,
        is_static: node.is_static,
        path: scene.hierarchy_path(id).unwrap_or_default(),
        child_count,
        children_truncated: child_count > 0,
        children_cursor: (child_count > 0).then_some(0),
        transform,
    })
}

fn widen3(x: f32, y: f32, z: f32) -> [f64; 3] {
    [widen_f32(x), widen_f32(y), widen_f32(z)]
}
