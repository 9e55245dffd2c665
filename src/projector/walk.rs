//! Generic, type-driven traversal shared by the projector and the special
//! cases.

use std::sync::Arc;

use scenewire_scene::reflect::{DeclaredType, FieldValue, TypeInfo};
use scenewire_scene::{ObjectRef, Reflect, Scene, SceneObject};

use super::denylist::Denylist;
use crate::classify::{ValueClass, classify};
use crate::error::AttributeReadFailure;
use crate::guard::{Depth, TraversalContext, Visit};
use crate::metadata::{AttributeDescriptor, MetadataCache};
use crate::wire::{ReferenceProjection, StubReason, StubReference, WireMap, WireValue};

/// Type name reported for node references.
pub const NODE_TYPE_NAME: &str = "GameObject";

/// State of one projection call: the scene being read, the traversal
/// guard and the read failures collected so far.
pub struct Walk<'a> {
    scene: &'a Scene,
    ctx: TraversalContext,
    metadata: &'a MetadataCache,
    denylist: &'a Denylist,
    failures: Vec<AttributeReadFailure>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(
        scene: &'a Scene,
        ctx: TraversalContext,
        metadata: &'a MetadataCache,
        denylist: &'a Denylist,
    ) -> Self {
        Self {
            scene,
            ctx,
            metadata,
            denylist,
            failures: Vec::new(),
        }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn context(&mut self) -> &mut TraversalContext {
        &mut self.ctx
    }

    pub fn descriptors(
        &self,
        info: &'static TypeInfo,
        include_non_public: bool,
    ) -> Arc<[AttributeDescriptor]> {
        self.metadata.descriptors(info, include_non_public)
    }

    /// Read one attribute. A failed read is logged, recorded and yields
    /// `None`.
    pub fn read(&mut self, target: &dyn Reflect, desc: &AttributeDescriptor) -> Option<FieldValue> {
        match desc.read(target) {
            Ok(value) => Some(value),
            Err(e) => {
                let attribute = format!("{}.{}", target.type_info().name(), desc.name());
                log::warn!("Failed to read {attribute}: {e}");
                self.failures.push(AttributeReadFailure {
                    attribute,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    pub(crate) fn take_failures(&mut self) -> Vec<AttributeReadFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Project every listed, non-denied attribute of `target`.
    pub fn project_attributes(&mut self, target: &dyn Reflect, include_non_public: bool) -> WireMap {
        let info = target.type_info();
        let descriptors = self.descriptors(info, include_non_public);
        let mut out = WireMap::new();
        for desc in descriptors.iter() {
            if self.denylist.is_denied(info, desc.name()) {
                log::trace!("Skipping denied attribute {}.{}", info.name(), desc.name());
                continue;
            }
            let Some(value) = self.read(target, desc) else {
                continue;
            };
            if let Some(wire) = self.project_value(desc.declared(), value) {
                out.insert(desc.name(), wire);
            }
        }
        out
    }

    /// Project a value read from an attribute declared as `declared`.
    ///
    /// Returns `None` for unsupported values, which are dropped from the
    /// output.
    pub fn project_value(&mut self, declared: &DeclaredType, value: FieldValue) -> Option<WireValue> {
        let class = classify(declared, &value);
        let wire = match (class, value) {
            (ValueClass::Unsupported, value) => {
                log::debug!(
                    "Dropping unsupported {} value of type {}",
                    value.kind_name(),
                    declared.name()
                );
                return None;
            }
            (_, FieldValue::Null) => WireValue::Null,
            (ValueClass::Scalar, value) => WireValue::from_scalar(&value)?,
            (ValueClass::GraphReference, FieldValue::Reference(r)) => self.project_reference(r),
            (ValueClass::ValueRecord, FieldValue::Record(record)) => {
                self.project_record(record.as_ref())
            }
            (
                ValueClass::ArrayOfScalar
                | ValueClass::ArrayOfGraphReference
                | ValueClass::ArrayOfValueRecord,
                FieldValue::List(items),
            ) => {
                let DeclaredType::Array(element) = declared else {
                    return None;
                };
                self.project_array(element, items)
            }
            _ => return None,
        };
        Some(wire)
    }

    fn project_array(&mut self, element: &DeclaredType, items: Vec<FieldValue>) -> WireValue {
        if self.ctx.push_depth() == Depth::Exceeded {
            log::debug!("Depth limit reached, nulling {}[]", element.name());
            return WireValue::Null;
        }
        let out = items
            .into_iter()
            .map(|item| self.project_value(element, item).unwrap_or(WireValue::Null))
            .collect();
        self.ctx.pop_depth();
        WireValue::Array(out)
    }

    /// Project a nested value record field by field, including serialized
    /// non-public fields.
    pub fn project_record(&mut self, record: &dyn Reflect) -> WireValue {
        let name = record.type_info().name();
        if self.ctx.push_depth() == Depth::Exceeded {
            log::debug!("Depth limit reached, nulling record {name}");
            return WireValue::Null;
        }
        if self.ctx.push_record() == Depth::Exceeded {
            log::debug!("Record nesting limit reached, nulling record {name}");
            self.ctx.pop_depth();
            return WireValue::Null;
        }
        let fields = self.project_attributes(record, true);
        self.ctx.pop_record();
        self.ctx.pop_depth();
        WireValue::Object(fields)
    }

    /// Project a graph reference.
    ///
    /// Dangling references become `Null`. A reference past the depth limit
    /// or to an identity already projected in this call becomes a stub.
    pub fn project_reference(&mut self, r: ObjectRef) -> WireValue {
        let Some(object) = self.scene.resolve(r) else {
            log::debug!("Reference to {} is dangling", r.id());
            return WireValue::Null;
        };
        if self.ctx.push_depth() == Depth::Exceeded {
            log::debug!("Depth limit reached at reference {}", r.id());
            return self.stub(object, StubReason::DepthLimited);
        }
        let visit = self.ctx.enter(r.id());
        self.ctx.pop_depth();
        match visit {
            Visit::Proceed => self.describe(object).into(),
            Visit::AlreadyVisited => {
                log::debug!("Reference {} already projected, emitting stub", r.id());
                self.stub(object, StubReason::Circular)
            }
        }
    }

    /// [`project_reference`](Self::project_reference) for optional handles.
    pub fn project_optional_reference(&mut self, r: Option<ObjectRef>) -> WireValue {
        match r {
            Some(r) => self.project_reference(r),
            None => WireValue::Null,
        }
    }

    fn describe(&self, object: SceneObject<'_>) -> ReferenceProjection {
        match object {
            SceneObject::Node(node) => ReferenceProjection {
                id: node.id(),
                name: node.name.clone(),
                type_name: NODE_TYPE_NAME.to_owned(),
                hierarchy_path: self.scene.hierarchy_path(node.id()),
                game_object_name: None,
                asset_path: None,
            },
            SceneObject::Component(component) => {
                let owner = self.scene.node(component.owner());
                ReferenceProjection {
                    id: component.id(),
                    name: owner.map(|n| n.name.clone()).unwrap_or_default(),
                    type_name: component.type_name().to_owned(),
                    hierarchy_path: self.scene.hierarchy_path(component.owner()),
                    game_object_name: owner.map(|n| n.name.clone()),
                    asset_path: None,
                }
            }
            SceneObject::Asset(asset) => ReferenceProjection {
                id: asset.id(),
                name: asset.name.clone(),
                type_name: asset.type_name.clone(),
                hierarchy_path: None,
                game_object_name: None,
                asset_path: Some(asset.path.clone()),
            },
        }
    }

    fn stub(&self, object: SceneObject<'_>, reason: StubReason) -> WireValue {
        let name = match object {
            SceneObject::Node(node) => node.name.clone(),
            SceneObject::Component(component) => self
                .scene
                .node(component.owner())
                .map(|n| n.name.clone())
                .unwrap_or_default(),
            SceneObject::Asset(asset) => asset.name.clone(),
        };
        StubReference {
            id: object.id(),
            name,
            reason,
        }
        .into()
    }
}
