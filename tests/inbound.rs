use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};

use scenewire::scene::math::{Color, Vec3};
use scenewire::scene::{InstanceId, ObjectRef, Reflect, Scene, Typed};
use scenewire::{MetadataCache, ProjectionError, Projector, StructSequenceConverter};

#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(record, serializable)]
struct Marker {
    pub x: i32,
    pub target: Option<ObjectRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(record, serializable)]
struct Tint {
    pub color: Color,
    pub strength: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(record, serializable)]
struct Stop {
    pub label: String,
    pub position: Vec3,
    pub tint: Tint,
    pub waypoints: Vec<Option<ObjectRef>>,
}

/// Resolves `{"by": "name", "value": ...}` against root node names.
fn name_resolver(scene: &Scene) -> impl Fn(&Value) -> Option<ObjectRef> + '_ {
    move |descriptor: &Value| {
        if descriptor["by"] != "name" {
            return None;
        }
        let name = descriptor["value"].as_str()?;
        scene
            .roots()
            .iter()
            .copied()
            .find(|&id| scene.node(id).is_some_and(|n| n.name == name))
            .map(ObjectRef::from)
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn scalar_set_literally_and_reference_only_when_resolved() {
    init_logging();
    let mut scene = Scene::new();
    let player = scene.spawn("Player");
    let resolver = name_resolver(&scene);
    let converter = StructSequenceConverter::new(&resolver);

    let markers = converter
        .hydrate_as::<Marker>(&json!([
            {"x": 1, "target": {"find": {"by": "name", "value": "Player"}}},
            {"x": 1, "target": {"find": {"by": "name", "value": "Nobody"}}},
            null,
        ]))
        .unwrap();

    assert_eq!(
        markers,
        vec![
            Some(Marker {
                x: 1,
                target: Some(player.into()),
            }),
            Some(Marker { x: 1, target: None }),
            None,
        ]
    );
}

#[test]
fn nested_records_and_literal_values() {
    let scene = Scene::new();
    let resolver = name_resolver(&scene);
    let converter = StructSequenceConverter::new(&resolver);

    let stops = converter
        .hydrate_as::<Stop>(&json!([{
            "label": "Gate",
            "position": [1.0, 2.0, 3.0],
            "tint": {"color": [1.0, 0.0, 0.0, 1.0], "strength": 0.25},
            "unknown": true,
        }]))
        .unwrap();
    let stop = stops[0].as_ref().unwrap();
    assert_eq!(stop.label, "Gate");
    assert_eq!(stop.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(stop.tint.color, Color::rgba(1.0, 0.0, 0.0, 1.0));
    assert_eq!(stop.tint.strength, 0.25);
    assert!(stop.waypoints.is_empty());
}

#[test]
fn malformed_fields_keep_defaults() {
    init_logging();
    let scene = Scene::new();
    let resolver = name_resolver(&scene);
    let converter = StructSequenceConverter::new(&resolver);

    let stops = converter
        .hydrate_as::<Stop>(&json!([{
            "label": 12,
            "position": "north",
            "tint": {"strength": 0.5},
        }]))
        .unwrap();
    let stop = stops[0].as_ref().unwrap();
    assert_eq!(stop.label, "");
    assert_eq!(stop.position, Vec3::zeros());
    assert_eq!(stop.tint.strength, 0.5);
    assert_eq!(stop.tint.color, Color::default());
}

#[test]
fn whole_floats_hydrate_integer_fields() {
    let scene = Scene::new();
    let resolver = name_resolver(&scene);
    let converter = StructSequenceConverter::new(&resolver);

    let markers = converter
        .hydrate_as::<Marker>(&json!([{"x": 1.0}, {"x": 2.5}]))
        .unwrap();
    assert_eq!(markers[0].as_ref().unwrap().x, 1);
    // A fractional value is rejected and the field keeps its default.
    assert_eq!(markers[1].as_ref().unwrap().x, 0);
}

#[test]
fn top_level_must_be_an_array() {
    let scene = Scene::new();
    let resolver = name_resolver(&scene);
    let converter = StructSequenceConverter::new(&resolver);
    for value in [json!({"x": 1}), json!("x"), Value::Null] {
        let err = converter
            .hydrate(&value, Marker::type_info_static())
            .err().unwrap();
        assert!(matches!(err, ProjectionError::Validation { .. }), "{err}");
    }
}

#[test]
fn write_path_fails_loudly() {
    let scene = Scene::new();
    let resolver = name_resolver(&scene);
    let converter = StructSequenceConverter::new(&resolver);
    let records: Vec<Box<dyn Reflect>> = vec![Box::new(Marker::default())];
    let err = converter
        .write(&records, Marker::type_info_static())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "writing 'Marker' sequences is not supported"
    );
}

#[test]
fn converter_and_projector_share_metadata() {
    let metadata = Arc::new(MetadataCache::new());
    let projector = Projector::default().with_metadata(Arc::clone(&metadata));
    let resolver = |_: &Value| None::<ObjectRef>;
    let converter = StructSequenceConverter::with_metadata(&resolver, Arc::clone(&metadata));

    converter
        .hydrate_as::<Marker>(&json!([{"x": 3}]))
        .unwrap();
    let cached = metadata.len();
    assert!(cached > 0);
    let from_projector = projector
        .metadata()
        .descriptors(Marker::type_info_static(), true);
    assert_eq!(metadata.len(), cached);
    assert_eq!(from_projector.len(), 2);
}

#[test]
fn resolver_sees_only_the_find_descriptor() {
    let seen = Mutex::new(Vec::new());
    let resolver = |descriptor: &Value| {
        seen.lock().push(descriptor.clone());
        Some(ObjectRef(InstanceId::from_raw(7)))
    };
    let converter = StructSequenceConverter::new(&resolver);
    let markers = converter
        .hydrate_as::<Marker>(&json!([{"target": {"find": {"path": "Root/Child"}}}]))
        .unwrap();
    assert_eq!(
        markers[0].as_ref().unwrap().target,
        Some(ObjectRef(InstanceId::from_raw(7)))
    );
    assert_eq!(*seen.lock(), vec![json!({"path": "Root/Child"})]);
}
