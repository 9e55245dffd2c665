//! Cached attribute descriptor lists.
//!
//! A descriptor list is assembled once per `(type, include_non_public)` key
//! by walking the type's base chain, and shared as an `Arc` afterwards.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use scenewire_scene::Reflect;
use scenewire_scene::reflect::{
    AttributeDecl, DeclaredType, FieldInput, FieldValue, MemberKind, ReadError, TypeInfo,
    TypeKind, Upcast, Visibility, WriteError,
};

/// One inspectable attribute of a type, possibly declared on a base.
///
/// Reads and writes take the most-derived value and follow the upcast path
/// down to the declaring base.
pub struct AttributeDescriptor {
    decl: &'static AttributeDecl,
    declaring_type: &'static str,
    path: Vec<&'static dyn Upcast>,
}

impl AttributeDescriptor {
    pub fn name(&self) -> &'static str {
        self.decl.name()
    }

    pub fn declared(&self) -> &'static DeclaredType {
        self.decl.declared()
    }

    pub fn member(&self) -> MemberKind {
        self.decl.member()
    }

    pub fn visibility(&self) -> Visibility {
        self.decl.visibility()
    }

    /// Name of the type in the chain that declares this attribute.
    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    pub fn is_writable(&self) -> bool {
        self.decl.is_writable()
    }

    pub fn read(&self, target: &dyn Reflect) -> Result<FieldValue, ReadError> {
        let mut any = target.as_any();
        for step in &self.path {
            any = step.upcast(any).ok_or(ReadError::TypeMismatch {
                expected: self.declaring_type,
            })?;
        }
        self.decl.read(any)
    }

    pub fn write(&self, target: &mut dyn Reflect, input: FieldInput) -> Result<(), WriteError> {
        let mut any = target.as_any_mut();
        for step in &self.path {
            any = step.upcast_mut(any).ok_or(WriteError::TypeMismatch {
                expected: self.declaring_type,
            })?;
        }
        self.decl.write(any, input)
    }
}

impl std::fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("name", &self.name())
            .field("declared", self.declared())
            .field("declaring_type", &self.declaring_type)
            .field("depth", &self.path.len())
            .finish()
    }
}

type CacheKey = (TypeId, bool);

/// Process-wide descriptor cache, safe to share across threads.
#[derive(Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<CacheKey, Arc<[AttributeDescriptor]>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered descriptors of `info`, most-derived level first.
    ///
    /// With `include_non_public` unset only public attributes are listed;
    /// otherwise non-public attributes marked serialized are added.
    /// Synthesized attributes are never listed. Repeated calls with the same
    /// key return the same `Arc`.
    pub fn descriptors(
        &self,
        info: &'static TypeInfo,
        include_non_public: bool,
    ) -> Arc<[AttributeDescriptor]> {
        let key = (info.type_id(), include_non_public);
        if let Some(entry) = self.entries.read().get(&key) {
            return Arc::clone(entry);
        }

        let built: Arc<[AttributeDescriptor]> = collect(info, include_non_public).into();
        log::debug!(
            "Cached {} attributes for {} (non-public: {})",
            built.len(),
            info.name(),
            include_non_public
        );
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key).or_insert(built))
    }

    /// Drop both entries for a type whose shape changed.
    pub fn invalidate(&self, type_id: TypeId) {
        let mut entries = self.entries.write();
        entries.remove(&(type_id, false));
        entries.remove(&(type_id, true));
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn collect(info: &'static TypeInfo, include_non_public: bool) -> Vec<AttributeDescriptor> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut path: Vec<&'static dyn Upcast> = Vec::new();
    let mut level = info;
    loop {
        if level.kind() == TypeKind::Root {
            break;
        }
        for decl in level.attributes() {
            if !is_listed(decl, include_non_public) || !seen.insert(decl.name()) {
                continue;
            }
            out.push(AttributeDescriptor {
                decl,
                declaring_type: level.name(),
                path: path.clone(),
            });
        }
        let Some(base) = level.base() else {
            break;
        };
        path.push(base.upcast());
        level = base.info();
    }
    out
}

fn is_listed(decl: &AttributeDecl, include_non_public: bool) -> bool {
    if decl.is_synthesized() || decl.name().starts_with('_') {
        return false;
    }
    decl.is_public() || (include_non_public && decl.is_serialized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenewire_scene::components::{Behaviour, Camera, MeshRenderer, Transform};
    use scenewire_scene::reflect::Typed;

    #[derive(Debug, Default, Reflect)]
    #[reflect(root, name = "Object")]
    struct HostObject {
        pub name: String,
    }

    #[derive(Debug, Default, Reflect)]
    #[reflect(base)]
    struct Shape {
        #[reflect(base)]
        pub object: HostObject,
        pub sides: u32,
        pub label: String,
    }

    #[derive(Debug, Default, Reflect)]
    struct Square {
        #[reflect(base)]
        pub shape: Shape,
        #[reflect(rename = "label")]
        pub caption: String,
    }

    #[derive(Debug, Default, Reflect)]
    struct Empty {}

    fn names(list: &[AttributeDescriptor]) -> Vec<&'static str> {
        list.iter().map(AttributeDescriptor::name).collect()
    }

    #[test]
    fn most_derived_first_and_wins() {
        let cache = MetadataCache::new();
        let list = cache.descriptors(Square::type_info_static(), false);
        assert_eq!(names(&list), vec!["label", "sides"]);
        assert_eq!(list[0].declaring_type(), "Square");
        assert_eq!(list[1].declaring_type(), "Shape");
    }

    #[test]
    fn stops_at_root_boundary() {
        let cache = MetadataCache::new();
        let list = cache.descriptors(Shape::type_info_static(), true);
        assert!(!names(&list).contains(&"name"));
    }

    #[test]
    fn reads_through_base_chain() {
        let cache = MetadataCache::new();
        let mut square = Square::default();
        square.shape.sides = 4;
        let list = cache.descriptors(Square::type_info_static(), false);
        let sides = list.iter().find(|d| d.name() == "sides").unwrap();
        assert!(matches!(sides.read(&square), Ok(FieldValue::UInt(4))));

        sides
            .write(&mut square, FieldInput::Wire(serde_json::json!(5)))
            .unwrap();
        assert_eq!(square.shape.sides, 5);
    }

    #[test]
    fn same_key_returns_same_arc() {
        let cache = MetadataCache::new();
        let a = cache.descriptors(Camera::type_info_static(), false);
        let b = cache.descriptors(Camera::type_info_static(), false);
        assert!(Arc::ptr_eq(&a, &b));
        let c = cache.descriptors(Camera::type_info_static(), true);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_rebuilds() {
        let cache = MetadataCache::new();
        let a = cache.descriptors(Behaviour::type_info_static(), false);
        cache.invalidate(TypeId::of::<Behaviour>());
        let b = cache.descriptors(Behaviour::type_info_static(), false);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(names(&a), names(&b));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn synthesized_and_private_filtered() {
        let cache = MetadataCache::new();
        let transform = cache.descriptors(Transform::type_info_static(), true);
        assert!(!names(&transform).contains(&"_world"));

        let public = cache.descriptors(MeshRenderer::type_info_static(), false);
        assert!(!names(&public).contains(&"lightmapIndex"));
        let serialized = cache.descriptors(MeshRenderer::type_info_static(), true);
        assert!(names(&serialized).contains(&"lightmapIndex"));
    }

    #[test]
    fn empty_type_has_no_descriptors() {
        let cache = MetadataCache::new();
        assert!(cache.descriptors(Empty::type_info_static(), true).is_empty());
    }

    #[test]
    fn camera_includes_base_enabled_last() {
        let cache = MetadataCache::new();
        let list = cache.descriptors(Camera::type_info_static(), false);
        assert_eq!(list.last().map(|d| d.name()), Some("enabled"));
        assert_eq!(list.last().map(|d| d.declaring_type()), Some("Behaviour"));
    }
}
