use rstest::rstest;
use serde_json::json;

use scenewire_scene::components::{Behaviour, Camera, MeshRenderer, Transform, UiDocument};
use scenewire_scene::math::Vec3;
use scenewire_scene::reflect::{
    AttrFlags, DeclaredType, Field, FieldInput, FieldValue, ScalarKind, TypeKind, Visibility,
};
use scenewire_scene::{InstanceId, ObjectRef, Reflect, Typed};

#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(record, serializable)]
pub struct Waypoint {
    pub position: Vec3,
    pub target: Option<ObjectRef>,
    #[reflect(serialized)]
    weight: f32,
    cache: i32,
}

#[derive(Debug, Clone, Default, Reflect)]
#[reflect(record)]
pub struct PlainRecord {
    pub value: i32,
}

#[derive(Debug, Default, Reflect)]
#[reflect(component, script = "Assets/Scripts/Patrol.cs")]
pub struct Patrol {
    #[reflect(base)]
    pub behaviour: Behaviour,
    pub route: Vec<Waypoint>,
    #[reflect(rename = "loopRoute")]
    pub looping: bool,
    #[reflect(skip)]
    pub runtime_only: u64,
}

#[rstest]
#[case::transform(Transform::type_info_static().name(), "Transform")]
#[case::camera(Camera::type_info_static().name(), "Camera")]
#[case::ui_document(UiDocument::type_info_static().name(), "UIDocument")]
#[case::mesh_renderer(MeshRenderer::type_info_static().name(), "MeshRenderer")]
fn standard_type_names(#[case] actual: &str, #[case] expected: &str) {
    assert_eq!(actual, expected);
}

#[test]
fn record_flags_and_visibility() {
    let info = Waypoint::type_info_static();
    assert_eq!(info.kind(), TypeKind::Record);
    assert!(info.is_serializable());
    assert!(info.is_constructible());

    let weight = info.attribute("weight").unwrap();
    assert_eq!(weight.visibility(), Visibility::NonPublic);
    assert!(weight.is_serialized());

    let cache = info.attribute("cache").unwrap();
    assert!(!cache.is_serialized());
    assert!(info.attribute("position").unwrap().is_public());

    assert!(!PlainRecord::type_info_static().is_serializable());
}

#[test]
fn record_declares_record_type() {
    assert_eq!(
        Waypoint::declared(),
        DeclaredType::Record(Waypoint::type_info_static)
    );
    let route = Patrol::type_info_static().attribute("route").unwrap();
    assert_eq!(
        route.declared(),
        &DeclaredType::Array(Box::new(DeclaredType::Record(Waypoint::type_info_static)))
    );
}

#[test]
fn component_attributes_follow_declaration() {
    let info = Patrol::type_info_static();
    let names: Vec<_> = info.attributes().iter().map(|a| a.name()).collect();
    assert_eq!(names, vec!["route", "loopRoute"]);
    assert_eq!(info.script_path(), Some("Assets/Scripts/Patrol.cs"));
    assert_eq!(info.base().unwrap().info().name(), "Behaviour");
    assert_eq!(
        info.base().unwrap().info().attributes()[0].declared(),
        &DeclaredType::Scalar(ScalarKind::Bool)
    );
}

#[test]
fn record_round_trips_through_field_input() {
    let wp = Waypoint {
        position: Vec3::new(1.0, 2.0, 3.0),
        target: Some(ObjectRef(InstanceId::from_raw(4))),
        weight: 0.5,
        cache: 7,
    };
    let FieldValue::Record(boxed) = wp.to_field_value() else {
        panic!("expected record");
    };
    let back = Waypoint::from_input(FieldInput::Record(boxed)).unwrap();
    assert_eq!(back, wp);
}

#[test]
fn record_from_wire_object_fills_serializable_fields() {
    let wp = Waypoint::from_input(FieldInput::Wire(json!({
        "position": [1, 2, 3],
        "weight": 2.0,
        "cache": 99,
    })))
    .unwrap();
    assert_eq!(wp.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(wp.weight, 2.0);
    assert_eq!(wp.cache, 0);
    assert_eq!(wp.target, None);
}

#[test]
fn synthesized_flag_constant() {
    assert!(AttrFlags::SYNTHESIZED.synthesized);
    assert!(!AttrFlags::PUBLIC.synthesized);
}

#[test]
fn patrol_writes_through_reflection() {
    let mut patrol = Patrol::default();
    let attr = Patrol::type_info_static().attribute("route").unwrap();
    attr.write(
        patrol.as_any_mut(),
        FieldInput::Wire(json!([{"position": [0, 1, 0]}, {"position": {"x": 2, "y": 0, "z": 0}}])),
    )
    .unwrap();
    assert_eq!(patrol.route.len(), 2);
    assert_eq!(patrol.route[1].position, Vec3::new(2.0, 0.0, 0.0));
    assert_eq!(patrol.runtime_only, 0);
}
