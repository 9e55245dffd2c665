//! The wire representation produced by projection.
//!
//! A [`WireValue`] tree is always finite and acyclic: graph references are
//! flat [`ReferenceProjection`]s (or [`StubReference`]s for repeats and
//! depth cut-offs) and never embed their target.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use scenewire_scene::InstanceId;
use scenewire_scene::math::{quat_to_array, widen_f32};
use scenewire_scene::reflect::FieldValue;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Reference(ReferenceProjection),
    Stub(StubReference),
    Object(WireMap),
    Array(Vec<WireValue>),
}

impl WireValue {
    /// Wire form of a scalar [`FieldValue`]. Returns `None` for values that
    /// are not scalars (references, records, lists, opaque values).
    ///
    /// Vectors, quaternions, colors and rects become number arrays; bounds
    /// become `{center, size}`. Non-finite floats become `Null`.
    pub fn from_scalar(value: &FieldValue) -> Option<Self> {
        let wire = match value {
            FieldValue::Null => Self::Null,
            FieldValue::Bool(v) => Self::Bool(*v),
            FieldValue::Int(v) => Self::Int(*v),
            FieldValue::UInt(v) => Self::UInt(*v),
            FieldValue::Float(v) => Self::float(*v),
            FieldValue::Char(c) => Self::String(c.to_string()),
            FieldValue::String(s) | FieldValue::Enum(s) => Self::String(s.clone()),
            FieldValue::Vec2(v) => Self::floats(v.as_slice()),
            FieldValue::Vec3(v) => Self::floats(v.as_slice()),
            FieldValue::Vec4(v) => Self::floats(v.as_slice()),
            FieldValue::Quat(q) => Self::floats(&quat_to_array(*q)),
            FieldValue::Color(c) => Self::floats(&c.to_array()),
            FieldValue::Rect(r) => Self::floats(&r.to_array()),
            FieldValue::Bounds(b) => {
                let mut map = WireMap::new();
                map.insert("center", Self::floats(b.center.as_slice()));
                map.insert("size", Self::floats(b.size.as_slice()));
                Self::Object(map)
            }
            FieldValue::Reference(_)
            | FieldValue::Record(_)
            | FieldValue::List(_)
            | FieldValue::Opaque(_) => return None,
        };
        Some(wire)
    }

    fn float(v: f64) -> Self {
        if v.is_finite() { Self::Float(v) } else { Self::Null }
    }

    /// Number array from `f32` components.
    pub fn floats(values: &[f32]) -> Self {
        Self::Array(
            values
                .iter()
                .map(|&v| Self::float(widen_f32(v)))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Look up a key on an object value.
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Convert into a `serde_json` value, keeping key order.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::from(*v),
            Self::UInt(v) => Value::from(*v),
            Self::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Reference(r) => r.to_json(),
            Self::Stub(s) => s.to_json(),
            Self::Object(map) => map.to_json(),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

impl From<ReferenceProjection> for WireValue {
    fn from(r: ReferenceProjection) -> Self {
        Self::Reference(r)
    }
}

impl From<StubReference> for WireValue {
    fn from(s: StubReference) -> Self {
        Self::Stub(s)
    }
}

impl From<WireMap> for WireValue {
    fn from(map: WireMap) -> Self {
        Self::Object(map)
    }
}

impl From<String> for WireValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<bool> for WireValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for WireValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for WireValue {
    fn from(v: f32) -> Self {
        Self::float(widen_f32(v))
    }
}

impl From<InstanceId> for WireValue {
    fn from(id: InstanceId) -> Self {
        Self::Int(id.raw())
    }
}

/// Insertion-ordered string map of wire values.
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireMap {
    entries: Vec<(String, WireValue)>,
}

impl WireMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<WireValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (k, v) in &self.entries {
            map.insert(k.clone(), v.to_json());
        }
        Value::Object(map)
    }
}

impl Serialize for WireMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A fully described graph reference.
///
/// Scene entities carry `hierarchyPath`; components also carry the name of
/// the node they are attached to; assets carry `assetPath`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceProjection {
    pub id: InstanceId,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_object_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_path: Option<String>,
}

impl ReferenceProjection {
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::from(self.id.raw()));
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("type".into(), Value::String(self.type_name.clone()));
        let optional = [
            ("hierarchyPath", &self.hierarchy_path),
            ("gameObjectName", &self.game_object_name),
            ("assetPath", &self.asset_path),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                map.insert(key.into(), Value::String(v.clone()));
            }
        }
        Value::Object(map)
    }
}

/// Why a reference was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubReason {
    /// Already projected earlier in the same call.
    Circular,
    /// Past the configured depth limit.
    DepthLimited,
}

impl StubReason {
    /// The marker key emitted on the wire.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Circular => "_circular",
            Self::DepthLimited => "_depthLimited",
        }
    }
}

/// Truncated reference: identity, name and a marker flag.
#[derive(Debug, Clone, PartialEq)]
pub struct StubReference {
    pub id: InstanceId,
    pub name: String,
    pub reason: StubReason,
}

impl StubReference {
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::from(self.id.raw()));
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert(self.reason.marker().into(), Value::Bool(true));
        Value::Object(map)
    }
}

impl Serialize for StubReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry(self.reason.marker(), &true)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenewire_scene::math::{Bounds, Color, Vec3};
    use serde_json::json;

    #[test]
    fn geometry_encodes_as_arrays() {
        let v = WireValue::from_scalar(&FieldValue::Vec3(Vec3::new(1.0, 0.5, -2.0))).unwrap();
        assert_eq!(v.to_json(), json!([1.0, 0.5, -2.0]));

        let c = WireValue::from_scalar(&FieldValue::Color(Color::rgba(0.1, 0.2, 0.3, 1.0)))
            .unwrap();
        assert_eq!(c.to_json(), json!([0.1, 0.2, 0.3, 1.0]));

        let b = WireValue::from_scalar(&FieldValue::Bounds(Bounds {
            center: Vec3::zeros(),
            size: Vec3::new(2.0, 2.0, 2.0),
        }))
        .unwrap();
        assert_eq!(b.to_json(), json!({"center": [0.0, 0.0, 0.0], "size": [2.0, 2.0, 2.0]}));
    }

    #[test]
    fn non_scalars_are_rejected() {
        assert!(WireValue::from_scalar(&FieldValue::Opaque("Matrix4x4")).is_none());
        assert!(WireValue::from_scalar(&FieldValue::List(Vec::new())).is_none());
    }

    #[test]
    fn non_finite_float_is_null() {
        let v = WireValue::from_scalar(&FieldValue::Float(f64::NAN)).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn map_keeps_insertion_order_and_replaces() {
        let mut map = WireMap::new();
        map.insert("b", "first");
        map.insert("a", true);
        map.insert("b", false);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&WireValue::Bool(false)));
    }

    #[test]
    fn stub_serializes_marker() {
        let stub = StubReference {
            id: InstanceId::from_raw(3),
            name: "Player".into(),
            reason: StubReason::Circular,
        };
        assert_eq!(
            serde_json::to_value(&stub).unwrap(),
            json!({"id": 3, "name": "Player", "_circular": true})
        );
        assert_eq!(stub.to_json(), serde_json::to_value(&stub).unwrap());
    }

    #[test]
    fn reference_skips_absent_paths() {
        let r = ReferenceProjection {
            id: InstanceId::from_raw(7),
            name: "Red".into(),
            type_name: "Material".into(),
            hierarchy_path: None,
            game_object_name: None,
            asset_path: Some("Assets/Red.mat".into()),
        };
        let expected = json!({"id": 7, "name": "Red", "type": "Material", "assetPath": "Assets/Red.mat"});
        assert_eq!(serde_json::to_value(&r).unwrap(), expected);
        assert_eq!(WireValue::from(r).to_json(), expected);
    }
}
