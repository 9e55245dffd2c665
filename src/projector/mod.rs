//! Component and node projection.
//!
//! ```ignore
//! let projector = Projector::new(ProjectionConfig::default());
//! let projection = projector.project_component(&scene, camera_id, &ProjectOptions::default())?;
//! println!("{}", projection.to_json());
//! ```

mod denylist;
mod special;
mod walk;

pub use denylist::{Denylist, LEGACY_SHORTCUTS};
pub use special::{
    CAMERA_ATTRIBUTES, CameraCase, SpecialCase, SpecialCaseRegistry, TransformCase,
    UiDocumentCase,
};
pub use walk::{NODE_TYPE_NAME, Walk};

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use scenewire_scene::reflect::TypeInfo;
use scenewire_scene::{ComponentEntry, InstanceId, Scene};

use crate::config::ProjectionConfig;
use crate::error::{AttributeReadFailure, ProjectionError, ProjectionResult};
use crate::guard::TraversalContext;
use crate::metadata::MetadataCache;
use crate::wire::{WireMap, WireValue};

/// Finds the source file of a script-backed component type.
pub trait ScriptLocator: Send + Sync {
    /// `None` when the type is not script-backed or the lookup failed.
    fn locate(&self, info: &'static TypeInfo) -> Option<String>;
}

/// Reports the script path declared on the type itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredScriptLocator;

impl ScriptLocator for DeclaredScriptLocator {
    fn locate(&self, info: &'static TypeInfo) -> Option<String> {
        info.script_path().map(str::to_owned)
    }
}

/// Host-side diffing of a prefab instance against its source.
pub trait OverrideSource {
    fn is_overridden(&self, component: InstanceId, attribute_path: &str) -> bool;
}

impl<F> OverrideSource for F
where
    F: Fn(InstanceId, &str) -> bool,
{
    fn is_overridden(&self, component: InstanceId, attribute_path: &str) -> bool {
        self(component, attribute_path)
    }
}

/// Per-call projection options.
#[derive(Clone, Copy, Default)]
pub struct ProjectOptions<'a> {
    /// Overrides [`ProjectionConfig::include_non_public`] for components.
    pub include_non_public: Option<bool>,
    /// Attribute paths to report in `overrides`.
    pub override_paths: &'a [String],
    pub override_source: Option<&'a dyn OverrideSource>,
}

impl<'a> ProjectOptions<'a> {
    pub fn with_non_public(mut self, include: bool) -> Self {
        self.include_non_public = Some(include);
        self
    }

    pub fn with_overrides(mut self, source: &'a dyn OverrideSource, paths: &'a [String]) -> Self {
        self.override_source = Some(source);
        self.override_paths = paths;
        self
    }
}

/// Projection of one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProjection {
    pub type_name: String,
    pub id: InstanceId,
    pub hierarchy_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_path: Option<String>,
    pub properties: WireMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<WireMap>,
    /// Attributes omitted because their read failed.
    #[serde(skip)]
    pub read_failures: Vec<AttributeReadFailure>,
}

impl ComponentProjection {
    pub fn to_wire(&self) -> WireMap {
        let mut out = WireMap::new();
        out.insert("typeName", self.type_name.as_str());
        out.insert("id", self.id);
        out.insert("hierarchyPath", self.hierarchy_path.as_str());
        if let Some(path) = &self.script_path {
            out.insert("scriptPath", path.as_str());
        }
        out.insert("properties", self.properties.clone());
        if let Some(overrides) = &self.overrides {
            out.insert("overrides", overrides.clone());
        }
        out
    }

    pub fn to_json(&self) -> Value {
        self.to_wire().to_json()
    }
}

/// Projection of a node and all of its components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProjection {
    pub name: String,
    pub id: InstanceId,
    pub tag: String,
    pub layer: i32,
    pub active_self: bool,
    pub active_in_hierarchy: bool,
    pub is_static: bool,
    pub hierarchy_path: String,
    pub child_ids: Vec<InstanceId>,
    pub components: Vec<ComponentProjection>,
}

impl NodeProjection {
    pub fn to_json(&self) -> Value {
        let mut out = WireMap::new();
        out.insert("name", self.name.as_str());
        out.insert("id", self.id);
        out.insert("tag", self.tag.as_str());
        out.insert("layer", i64::from(self.layer));
        out.insert("activeSelf", self.active_self);
        out.insert("activeInHierarchy", self.active_in_hierarchy);
        out.insert("isStatic", self.is_static);
        out.insert("hierarchyPath", self.hierarchy_path.as_str());
        out.insert(
            "childIds",
            WireValue::Array(self.child_ids.iter().map(|&id| id.into()).collect()),
        );
        out.insert(
            "components",
            WireValue::Array(
                self.components
                    .iter()
                    .map(|c| WireValue::Object(c.to_wire()))
                    .collect(),
            ),
        );
        out.to_json()
    }

    /// Read failures of every component, in component order.
    pub fn read_failures(&self) -> impl Iterator<Item = &AttributeReadFailure> {
        self.components.iter().flat_map(|c| c.read_failures.iter())
    }
}

/// Converts live components into wire projections.
///
/// Shareable across threads: each call builds its own
/// [`TraversalContext`]; only the metadata and script-path caches are
/// shared.
pub struct Projector {
    config: ProjectionConfig,
    metadata: Arc<MetadataCache>,
    special: SpecialCaseRegistry,
    denylist: Denylist,
    locator: Box<dyn ScriptLocator>,
    scripts: RwLock<HashMap<TypeId, Option<String>>>,
}

impl Projector {
    pub fn new(config: ProjectionConfig) -> Self {
        let denylist = Denylist::with_defaults(&config.denied_attributes);
        Self {
            config,
            metadata: Arc::new(MetadataCache::new()),
            special: SpecialCaseRegistry::with_defaults(),
            denylist,
            locator: Box::new(DeclaredScriptLocator),
            scripts: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_special_cases(mut self, registry: SpecialCaseRegistry) -> Self {
        self.special = registry;
        self
    }

    pub fn with_denylist(mut self, denylist: Denylist) -> Self {
        self.denylist = denylist;
        self
    }

    pub fn with_script_locator(mut self, locator: impl ScriptLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self.scripts.write().clear();
        self
    }

    /// Share an existing metadata cache, e.g. with a
    /// [`StructSequenceConverter`](crate::StructSequenceConverter).
    pub fn with_metadata(mut self, metadata: Arc<MetadataCache>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Arc<MetadataCache> {
        &self.metadata
    }

    /// Project one component.
    pub fn project_component(
        &self,
        scene: &Scene,
        id: InstanceId,
        options: &ProjectOptions<'_>,
    ) -> ProjectionResult<ComponentProjection> {
        let entry = scene.component(id).ok_or_else(|| ProjectionError::NotFound {
            what: "component",
            selector: id.to_string(),
        })?;
        let mut walk = self.walk(scene);
        Ok(self.project_entry(&mut walk, entry, options))
    }

    /// Project a node and all of its components with one shared traversal
    /// context, so an identity is projected in full at most once across
    /// the whole node.
    pub fn project_node(
        &self,
        scene: &Scene,
        id: InstanceId,
        options: &ProjectOptions<'_>,
    ) -> ProjectionResult<NodeProjection> {
        let node = scene.node(id).ok_or_else(|| ProjectionError::NotFound {
            what: "node",
            selector: id.to_string(),
        })?;
        let mut walk = self.walk(scene);
        walk.context().enter(id);
        let components = scene
            .components_of(id)
            .map(|entry| self.project_entry(&mut walk, entry, options))
            .collect();
        Ok(NodeProjection {
            name: node.name.clone(),
            id,
            tag: node.tag.clone(),
            layer: node.layer,
            active_self: node.active_self,
            active_in_hierarchy: scene.active_in_hierarchy(id),
            is_static: node.is_static,
            hierarchy_path: scene.hierarchy_path(id).unwrap_or_default(),
            child_ids: node.children().to_vec(),
            components,
        })
    }

    fn walk<'a>(&'a self, scene: &'a Scene) -> Walk<'a> {
        Walk::new(
            scene,
            TraversalContext::from_config(&self.config),
            &self.metadata,
            &self.denylist,
        )
    }

    fn project_entry(
        &self,
        walk: &mut Walk<'_>,
        entry: &ComponentEntry,
        options: &ProjectOptions<'_>,
    ) -> ComponentProjection {
        let info = entry.data().type_info();
        walk.context().enter(entry.id());

        let properties = match self.special.find(info) {
            Some(case) => case.project(walk, entry),
            None => {
                let include = options
                    .include_non_public
                    .unwrap_or(self.config.include_non_public);
                walk.project_attributes(entry.data(), include)
            }
        };

        let overrides = match options.override_source {
            Some(source) if !options.override_paths.is_empty() => {
                let mut map = WireMap::new();
                for path in options.override_paths {
                    map.insert(path.as_str(), source.is_overridden(entry.id(), path));
                }
                Some(map)
            }
            _ => None,
        };

        ComponentProjection {
            type_name: info.name().to_owned(),
            id: entry.id(),
            hierarchy_path: walk
                .scene()
                .hierarchy_path(entry.owner())
                .unwrap_or_default(),
            script_path: self.script_path(info),
            properties,
            overrides,
            read_failures: walk.take_failures(),
        }
    }

    fn script_path(&self, info: &'static TypeInfo) -> Option<String> {
        if let Some(cached) = self.scripts.read().get(&info.type_id()) {
            return cached.clone();
        }
        let located = self.locator.locate(info);
        if located.is_none() && info.script_path().is_some() {
            log::debug!("No script path found for {}", info.name());
        }
        self.scripts
            .write()
            .entry(info.type_id())
            .or_insert(located)
            .clone()
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(ProjectionConfig::default())
    }
}
