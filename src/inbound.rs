//! Rebuilding value-record sequences from wire arrays.
//!
//! ```ignore
//! let resolver = |descriptor: &Value| lookup(descriptor);
//! let converter = StructSequenceConverter::new(&resolver);
//! let waypoints: Vec<Option<Waypoint>> = converter.hydrate_as(&json!([
//!     {"position": [0, 1, 0], "target": {"find": {"by": "name", "value": "Player"}}},
//!     null,
//! ]))?;
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};

use scenewire_scene::reflect::{DeclaredType, FieldInput, MemberKind, TypeInfo, Typed};
use scenewire_scene::{ObjectRef, Reflect};

use crate::error::{ProjectionError, ProjectionResult};
use crate::metadata::MetadataCache;

/// Key marking a wire object as a resolver instruction.
pub const FIND_KEY: &str = "find";

/// Turns a `{"find": ...}` instruction into a live reference.
pub trait ObjectResolver {
    /// `descriptor` is the value stored under the `find` key.
    fn find(&self, descriptor: &Value) -> Option<ObjectRef>;
}

impl<F> ObjectResolver for F
where
    F: Fn(&Value) -> Option<ObjectRef>,
{
    fn find(&self, descriptor: &Value) -> Option<ObjectRef> {
        self(descriptor)
    }
}

/// Rebuilds sequences of value records from wire arrays.
///
/// Hydration is lenient: a field that fails to decode keeps its default
/// and is logged. Writing sequences back out is not supported.
pub struct StructSequenceConverter<'r> {
    resolver: &'r dyn ObjectResolver,
    metadata: Arc<MetadataCache>,
}

impl<'r> StructSequenceConverter<'r> {
    pub fn new(resolver: &'r dyn ObjectResolver) -> Self {
        Self::with_metadata(resolver, Arc::new(MetadataCache::new()))
    }

    pub fn with_metadata(resolver: &'r dyn ObjectResolver, metadata: Arc<MetadataCache>) -> Self {
        Self { resolver, metadata }
    }

    /// Hydrate `value`, an array of objects or nulls, into instances of
    /// `element`.
    pub fn hydrate(
        &self,
        value: &Value,
        element: &'static TypeInfo,
    ) -> ProjectionResult<Vec<Option<Box<dyn Reflect>>>> {
        let Value::Array(items) = value else {
            return Err(ProjectionError::validation(
                "value",
                format!("expected an array of {}, found {}", element.name(), kind_of(value)),
            ));
        };
        if !element.is_constructible() {
            return Err(ProjectionError::NotConstructible {
                type_name: element.name().to_owned(),
            });
        }

        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::Null => out.push(None),
                Value::Object(object) => out.push(self.hydrate_record(object, element)),
                other => {
                    log::warn!(
                        "Element {index} of {}[] is {}, using a default instance",
                        element.name(),
                        kind_of(other)
                    );
                    out.push(element.construct());
                }
            }
        }
        Ok(out)
    }

    /// Typed [`hydrate`](Self::hydrate).
    pub fn hydrate_as<T: Typed>(&self, value: &Value) -> ProjectionResult<Vec<Option<T>>> {
        let items = self.hydrate(value, T::type_info_static())?;
        items
            .into_iter()
            .map(|item| match item {
                None => Ok(None),
                Some(boxed) => boxed
                    .into_any()
                    .downcast::<T>()
                    .map(|t| Some(*t))
                    .map_err(|_| {
                        ProjectionError::validation(
                            "value",
                            format!("element is not a {}", T::type_info_static().name()),
                        )
                    }),
            })
            .collect()
    }

    /// Writing struct sequences outward is not supported and always fails.
    pub fn write(
        &self,
        value: &[Box<dyn Reflect>],
        element: &'static TypeInfo,
    ) -> ProjectionResult<Value> {
        log::error!(
            "Refusing to write {} {} records: struct sequences are read-only",
            value.len(),
            element.name()
        );
        Err(ProjectionError::UnsupportedWrite {
            type_name: element.name().to_owned(),
        })
    }

    fn hydrate_record(
        &self,
        object: &Map<String, Value>,
        info: &'static TypeInfo,
    ) -> Option<Box<dyn Reflect>> {
        let mut instance = info.construct()?;
        let descriptors = self.metadata.descriptors(info, true);
        for desc in descriptors.iter() {
            if desc.member() != MemberKind::Field || !desc.is_writable() {
                continue;
            }
            let Some(value) = object.get(desc.name()) else {
                continue;
            };
            let input = match (desc.declared(), value) {
                (DeclaredType::Reference(_), Value::Object(map)) if map.contains_key(FIND_KEY) => {
                    let descriptor = &map[FIND_KEY];
                    match self.resolver.find(descriptor) {
                        Some(r) => FieldInput::Reference(r),
                        None => {
                            log::debug!(
                                "{}.{}: resolver found nothing for {descriptor}, keeping default",
                                info.name(),
                                desc.name()
                            );
                            continue;
                        }
                    }
                }
                (DeclaredType::Record(nested), Value::Object(map)) => {
                    match self.hydrate_record(map, nested()) {
                        Some(record) => FieldInput::Record(record),
                        None => FieldInput::Wire(value.clone()),
                    }
                }
                _ => FieldInput::Wire(value.clone()),
            };
            if let Err(e) = desc.write(instance.as_mut(), input) {
                log::warn!("Skipping {}.{}: {e}", info.name(), desc.name());
            }
        }
        Some(instance)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenewire_scene::InstanceId;
    use scenewire_scene::math::Vec3;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Reflect)]
    #[reflect(record, serializable)]
    struct Offset {
        pub delta: Vec3,
    }

    #[derive(Debug, Clone, Default, PartialEq, Reflect)]
    #[reflect(record, serializable)]
    struct Spawn {
        pub x: i32,
        pub target: Option<ObjectRef>,
        pub offset: Offset,
        #[reflect(serialized)]
        weight: f32,
        hidden: i32,
    }

    #[derive(Debug, Reflect)]
    struct NoDefault {
        pub x: i32,
    }

    fn no_resolver(_: &Value) -> Option<ObjectRef> {
        None
    }

    #[test]
    fn non_array_is_validation_error() {
        let converter = StructSequenceConverter::new(&no_resolver);
        let err = converter.hydrate_as::<Spawn>(&json!({"x": 1})).unwrap_err();
        assert!(matches!(err, ProjectionError::Validation { .. }));
    }

    #[test]
    fn nulls_stay_null() {
        let converter = StructSequenceConverter::new(&no_resolver);
        let items = converter.hydrate_as::<Spawn>(&json!([null, {"x": 2}])).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_none());
        assert_eq!(items[1].as_ref().unwrap().x, 2);
    }

    #[test]
    fn find_descriptor_uses_resolver() {
        let resolver = |descriptor: &Value| {
            (descriptor["name"] == "Player").then(|| ObjectRef(InstanceId::from_raw(42)))
        };
        let converter = StructSequenceConverter::new(&resolver);
        let items = converter
            .hydrate_as::<Spawn>(&json!([
                {"x": 1, "target": {"find": {"name": "Player"}}},
                {"x": 2, "target": {"find": {"name": "Ghost"}}},
            ]))
            .unwrap();
        let first = items[0].as_ref().unwrap();
        assert_eq!(first.target, Some(ObjectRef(InstanceId::from_raw(42))));
        let second = items[1].as_ref().unwrap();
        assert_eq!(second.x, 2);
        assert_eq!(second.target, None);
    }

    #[test]
    fn nested_records_and_serialized_private_fields() {
        let converter = StructSequenceConverter::new(&no_resolver);
        let items = converter
            .hydrate_as::<Spawn>(&json!([
                {"offset": {"delta": [0, 1, 0]}, "weight": 0.5, "hidden": 9}
            ]))
            .unwrap();
        let spawn = items[0].as_ref().unwrap();
        assert_eq!(spawn.offset.delta, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(spawn.weight, 0.5);
        assert_eq!(spawn.hidden, 0);
    }

    #[test]
    fn bad_field_is_skipped() {
        let converter = StructSequenceConverter::new(&no_resolver);
        let items = converter
            .hydrate_as::<Spawn>(&json!([{"x": "seven", "offset": {"delta": [1, 1, 1]}}]))
            .unwrap();
        let spawn = items[0].as_ref().unwrap();
        assert_eq!(spawn.x, 0);
        assert_eq!(spawn.offset.delta, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn scalar_element_becomes_default() {
        let converter = StructSequenceConverter::new(&no_resolver);
        let items = converter.hydrate_as::<Spawn>(&json!([5])).unwrap();
        assert_eq!(items[0], Some(Spawn::default()));
    }

    #[test]
    fn element_must_be_constructible() {
        let converter = StructSequenceConverter::new(&no_resolver);
        let err = converter
            .hydrate(&json!([]), NoDefault::type_info_static())
            .err().unwrap();
        assert_eq!(
            err,
            ProjectionError::NotConstructible {
                type_name: "NoDefault".to_owned()
            }
        );
    }

    #[test]
    fn write_always_fails() {
        let converter = StructSequenceConverter::new(&no_resolver);
        let records: Vec<Box<dyn Reflect>> = vec![Box::new(Spawn::default())];
        let err = converter
            .write(&records, Spawn::type_info_static())
            .unwrap_err();
        assert!(matches!(err, ProjectionError::UnsupportedWrite { .. }));
    }
}
