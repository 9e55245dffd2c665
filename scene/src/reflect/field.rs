//! Reflected field values and the [`Field`] conversion trait.
//!
//! Every Rust type that can appear as a reflected field implements [`Field`].
//! The trait maps the type to its [`DeclaredType`], produces a [`FieldValue`]
//! snapshot for reading, and rebuilds the type from a [`FieldInput`] for
//! writing.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{DeclaredType, Reflect, ScalarKind, WriteError};
use crate::id::ObjectRef;
use crate::math::{Bounds, Color, Quat, Rect, Vec2, Vec3, Vec4, quat_from_xyzw, widen_f32};

/// Snapshot of a reflected attribute's current value.
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    String(String),
    /// Enum value, carried as its variant name.
    Enum(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Color(Color),
    Rect(Rect),
    Bounds(Bounds),
    /// Non-owning handle to a node, component or asset.
    Reference(ObjectRef),
    /// Owned copy of a nested value record.
    Record(Box<dyn Reflect>),
    List(Vec<FieldValue>),
    /// A host value the reflection layer cannot describe (matrices, live
    /// handles). Carries the host type name.
    Opaque(&'static str),
}

impl FieldValue {
    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::Vec2(_) => "Vector2",
            Self::Vec3(_) => "Vector3",
            Self::Vec4(_) => "Vector4",
            Self::Quat(_) => "Quaternion",
            Self::Color(_) => "Color",
            Self::Rect(_) => "Rect",
            Self::Bounds(_) => "Bounds",
            Self::Reference(_) => "reference",
            Self::Record(_) => "record",
            Self::List(_) => "list",
            Self::Opaque(_) => "opaque",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::UInt(v) => write!(f, "UInt({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Char(v) => write!(f, "Char({v:?})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Enum(v) => write!(f, "Enum({v})"),
            Self::Vec2(v) => write!(f, "Vec2({}, {})", v.x, v.y),
            Self::Vec3(v) => write!(f, "Vec3({}, {}, {})", v.x, v.y, v.z),
            Self::Vec4(v) => write!(f, "Vec4({}, {}, {}, {})", v.x, v.y, v.z, v.w),
            Self::Quat(q) => {
                let c = &q.coords;
                write!(f, "Quat({}, {}, {}, {})", c.x, c.y, c.z, c.w)
            }
            Self::Color(c) => write!(f, "{c:?}"),
            Self::Rect(r) => write!(f, "{r:?}"),
            Self::Bounds(b) => write!(f, "{b:?}"),
            Self::Reference(r) => write!(f, "Reference({})", r.id()),
            Self::Record(r) => write!(f, "Record({})", r.type_info().name()),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Opaque(name) => write!(f, "Opaque({name})"),
        }
    }
}

/// Data handed to a field writer.
pub enum FieldInput {
    /// Raw wire data, decoded by the field's own rules.
    Wire(Value),
    /// An already-resolved graph reference.
    Reference(ObjectRef),
    /// An already-built nested record.
    Record(Box<dyn Reflect>),
}

impl FieldInput {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Wire(_) => "wire value",
            Self::Reference(_) => "reference",
            Self::Record(_) => "record",
        }
    }
}

impl fmt::Debug for FieldInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(v) => write!(f, "Wire({v})"),
            Self::Reference(r) => write!(f, "Reference({})", r.id()),
            Self::Record(r) => write!(f, "Record({})", r.type_info().name()),
        }
    }
}

/// A Rust type usable as a reflected field.
pub trait Field: Sized + Send + Sync + 'static {
    /// The declared type reported in attribute metadata.
    fn declared() -> DeclaredType;

    /// Snapshot the current value.
    fn to_field_value(&self) -> FieldValue;

    /// Rebuild a value from writer input.
    fn from_input(input: FieldInput) -> Result<Self, WriteError>;
}

pub(crate) fn expect_wire(input: FieldInput, expected: &'static str) -> Result<Value, WriteError> {
    match input {
        FieldInput::Wire(value) => Ok(value),
        other => Err(WriteError::InputMismatch {
            expected,
            found: other.kind_name(),
        }),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, WriteError> {
    serde_json::from_value(value).map_err(|e| WriteError::Decode {
        message: e.to_string(),
    })
}

/// Like [`decode`], but also accepts whole floats such as `1.0`. Serde
/// range-checks the result against the target width.
fn decode_integer<T: DeserializeOwned>(value: Value) -> Result<T, WriteError> {
    let value = match value.as_f64() {
        Some(f) if value.is_f64() => whole_number(f).ok_or_else(|| WriteError::Decode {
            message: format!("expected an integer, found {f}"),
        })?,
        _ => value,
    };
    decode(value)
}

fn whole_number(f: f64) -> Option<Value> {
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    // 2^63 and 2^64 are exact in f64; anything at or past them overflows.
    if f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
        Some(Value::from(f as i64))
    } else if f >= 0.0 && f < 18_446_744_073_709_551_616.0 {
        Some(Value::from(f as u64))
    } else {
        None
    }
}

/// Reads `N` floats either from an array or from an object with the given
/// keys.
fn floats<const N: usize>(value: &Value, keys: [&str; N]) -> Result<[f32; N], WriteError> {
    let mut out = [0.0f32; N];
    match value {
        Value::Array(items) if items.len() == N => {
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = number(item)?;
            }
        }
        Value::Object(map) => {
            for (slot, key) in out.iter_mut().zip(keys) {
                let item = map.get(key).ok_or_else(|| WriteError::Decode {
                    message: format!("missing component '{key}'"),
                })?;
                *slot = number(item)?;
            }
        }
        other => {
            return Err(WriteError::Decode {
                message: format!("expected {N} numbers, found {other}"),
            });
        }
    }
    Ok(out)
}

fn number(value: &Value) -> Result<f32, WriteError> {
    value
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| WriteError::Decode {
            message: format!("expected a number, found {value}"),
        })
}

// ---------------------------------------------------------------------------
// Primitive scalars
// ---------------------------------------------------------------------------

macro_rules! impl_numeric_field {
    ($kind:ident, $repr:ty, $decode:ident: $($ty:ty),*) => {
        $(
            impl Field for $ty {
                fn declared() -> DeclaredType {
                    DeclaredType::Scalar(ScalarKind::$kind)
                }

                fn to_field_value(&self) -> FieldValue {
                    FieldValue::$kind(*self as $repr)
                }

                fn from_input(input: FieldInput) -> Result<Self, WriteError> {
                    $decode(expect_wire(input, stringify!($ty))?)
                }
            }
        )*
    };
}

impl_numeric_field!(Int, i64, decode_integer: i8, i16, i32, i64, isize);
impl_numeric_field!(UInt, u64, decode_integer: u8, u16, u32, u64, usize);
impl_numeric_field!(Float, f64, decode: f64);

impl Field for f32 {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Float)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(widen_f32(*self))
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        decode(expect_wire(input, "f32")?)
    }
}

impl Field for bool {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Bool)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        decode(expect_wire(input, "bool")?)
    }
}

impl Field for char {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Char)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Char(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        decode(expect_wire(input, "char")?)
    }
}

impl Field for String {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::String)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        decode(expect_wire(input, "string")?)
    }
}

// ---------------------------------------------------------------------------
// Geometric scalars
// ---------------------------------------------------------------------------

impl Field for Vec2 {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Vec2)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Vec2(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        let [x, y] = floats(&expect_wire(input, "Vector2")?, ["x", "y"])?;
        Ok(Vec2::new(x, y))
    }
}

impl Field for Vec3 {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Vec3)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Vec3(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        let [x, y, z] = floats(&expect_wire(input, "Vector3")?, ["x", "y", "z"])?;
        Ok(Vec3::new(x, y, z))
    }
}

impl Field for Vec4 {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Vec4)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Vec4(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        let [x, y, z, w] = floats(&expect_wire(input, "Vector4")?, ["x", "y", "z", "w"])?;
        Ok(Vec4::new(x, y, z, w))
    }
}

impl Field for Quat {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Quat)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Quat(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        let [x, y, z, w] = floats(&expect_wire(input, "Quaternion")?, ["x", "y", "z", "w"])?;
        Ok(quat_from_xyzw(x, y, z, w))
    }
}

impl Field for Color {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Color)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Color(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        let [r, g, b, a] = floats(&expect_wire(input, "Color")?, ["r", "g", "b", "a"])?;
        Ok(Color::rgba(r, g, b, a))
    }
}

impl Field for Rect {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Rect)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Rect(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        let [x, y, w, h] = floats(
            &expect_wire(input, "Rect")?,
            ["x", "y", "width", "height"],
        )?;
        Ok(Rect::new(x, y, w, h))
    }
}

impl Field for Bounds {
    fn declared() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Bounds)
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bounds(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        let value = expect_wire(input, "Bounds")?;
        let part = |key: &str| -> Result<Vec3, WriteError> {
            let item = value.get(key).ok_or_else(|| WriteError::Decode {
                message: format!("missing '{key}'"),
            })?;
            let [x, y, z] = floats(item, ["x", "y", "z"])?;
            Ok(Vec3::new(x, y, z))
        };
        Ok(Bounds {
            center: part("center")?,
            size: part("size")?,
        })
    }
}

// ---------------------------------------------------------------------------
// References and sequences
// ---------------------------------------------------------------------------

impl Field for ObjectRef {
    fn declared() -> DeclaredType {
        DeclaredType::Reference("Object")
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Reference(*self)
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        match input {
            FieldInput::Reference(r) => Ok(r),
            FieldInput::Wire(value) => decode(value),
            other => Err(WriteError::InputMismatch {
                expected: "reference",
                found: other.kind_name(),
            }),
        }
    }
}

impl Field for Option<ObjectRef> {
    fn declared() -> DeclaredType {
        DeclaredType::Reference("Object")
    }

    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(r) => FieldValue::Reference(*r),
            None => FieldValue::Null,
        }
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        match input {
            FieldInput::Wire(Value::Null) => Ok(None),
            other => ObjectRef::from_input(other).map(Some),
        }
    }
}

impl<T: Field> Field for Vec<T> {
    fn declared() -> DeclaredType {
        DeclaredType::Array(Box::new(T::declared()))
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::List(self.iter().map(Field::to_field_value).collect())
    }

    fn from_input(input: FieldInput) -> Result<Self, WriteError> {
        match expect_wire(input, "array")? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| T::from_input(FieldInput::Wire(item)))
                .collect(),
            other => Err(WriteError::Decode {
                message: format!("expected an array, found {other}"),
            }),
        }
    }
}

/// Implements [`Field`] for a fieldless enum, carried by variant name.
///
/// ```ignore
/// enum_field!(ClearFlags { Skybox, SolidColor, Depth, Nothing });
/// ```
#[macro_export]
macro_rules! enum_field {
    ($ty:ty { $($variant:ident),+ $(,)? }) => {
        impl $crate::reflect::Field for $ty {
            fn declared() -> $crate::reflect::DeclaredType {
                $crate::reflect::DeclaredType::Scalar($crate::reflect::ScalarKind::Enum)
            }

            fn to_field_value(&self) -> $crate::reflect::FieldValue {
                let name = match self {
                    $(Self::$variant => stringify!($variant),)+
                };
                $crate::reflect::FieldValue::Enum(name.to_owned())
            }

            fn from_input(
                input: $crate::reflect::FieldInput,
            ) -> Result<Self, $crate::reflect::WriteError> {
                let found = input.kind_name();
                let $crate::reflect::FieldInput::Wire(value) = input else {
                    return Err($crate::reflect::WriteError::InputMismatch {
                        expected: "enum variant name",
                        found,
                    });
                };
                match value.as_str() {
                    $(Some(stringify!($variant)) => Ok(Self::$variant),)+
                    _ => Err($crate::reflect::WriteError::Decode {
                        message: format!("unknown {} variant {}", stringify!($ty), value),
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::InstanceId;
    use serde_json::json;

    #[test]
    fn integers_widen_to_i64() {
        assert!(matches!(7i8.to_field_value(), FieldValue::Int(7)));
        assert!(matches!(7u16.to_field_value(), FieldValue::UInt(7)));
    }

    #[test]
    fn decode_scalar_from_wire() {
        let v = i32::from_input(FieldInput::Wire(json!(-3))).unwrap();
        assert_eq!(v, -3);
        let err = i32::from_input(FieldInput::Wire(json!("x"))).unwrap_err();
        assert!(matches!(err, WriteError::Decode { .. }));
    }

    #[test]
    fn vec3_accepts_array_or_object() {
        let a = Vec3::from_input(FieldInput::Wire(json!([1.0, 2.0, 3.0]))).unwrap();
        let b = Vec3::from_input(FieldInput::Wire(json!({"x": 1, "y": 2, "z": 3}))).unwrap();
        assert_eq!(a, b);
        assert!(Vec3::from_input(FieldInput::Wire(json!([1.0, 2.0]))).is_err());
    }

    #[test]
    fn color_from_object() {
        let c = Color::from_input(FieldInput::Wire(json!({"r": 1, "g": 0.5, "b": 0, "a": 1})))
            .unwrap();
        assert_eq!(c, Color::rgba(1.0, 0.5, 0.0, 1.0));
    }

    #[test]
    fn optional_reference_from_null_and_handle() {
        let none = Option::<ObjectRef>::from_input(FieldInput::Wire(Value::Null)).unwrap();
        assert_eq!(none, None);
        let r = ObjectRef(InstanceId::from_raw(9));
        let some = Option::<ObjectRef>::from_input(FieldInput::Reference(r)).unwrap();
        assert_eq!(some, Some(r));
        assert!(matches!(none.to_field_value(), FieldValue::Null));
    }

    #[test]
    fn reference_rejects_scalar_wire_data() {
        assert!(ObjectRef::from_input(FieldInput::Wire(json!("player"))).is_err());
    }

    #[test]
    fn vec_of_scalars() {
        let v = Vec::<f32>::from_input(FieldInput::Wire(json!([1, 2.5]))).unwrap();
        assert_eq!(v, vec![1.0, 2.5]);
        assert_eq!(
            Vec::<f32>::declared(),
            DeclaredType::Array(Box::new(DeclaredType::Scalar(ScalarKind::Float)))
        );
        let FieldValue::List(items) = v.to_field_value() else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 2);
    }
}
