//! Value classification: decides how a reflected value is projected.

use scenewire_scene::reflect::{DeclaredType, FieldValue, ScalarKind};

/// How a reflected value is projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    Scalar,
    GraphReference,
    ValueRecord,
    ArrayOfScalar,
    ArrayOfGraphReference,
    ArrayOfValueRecord,
    /// Dropped from output.
    Unsupported,
}

/// Scalar kinds emitted directly on the wire.
pub const SAFE_SCALARS: &[ScalarKind] = &[
    ScalarKind::Bool,
    ScalarKind::Int,
    ScalarKind::UInt,
    ScalarKind::Float,
    ScalarKind::Char,
    ScalarKind::String,
    ScalarKind::Enum,
    ScalarKind::Vec2,
    ScalarKind::Vec3,
    ScalarKind::Vec4,
    ScalarKind::Quat,
    ScalarKind::Color,
    ScalarKind::Rect,
    ScalarKind::Bounds,
];

pub fn is_safe_scalar(kind: ScalarKind) -> bool {
    SAFE_SCALARS.contains(&kind)
}

/// Classify `value` as read from an attribute declared as `declared`.
///
/// Null values classify by their declared type. A value whose runtime shape
/// disagrees with its declaration is `Unsupported`.
pub fn classify(declared: &DeclaredType, value: &FieldValue) -> ValueClass {
    if matches!(value, FieldValue::Opaque(_)) {
        return ValueClass::Unsupported;
    }
    match declared {
        DeclaredType::Scalar(kind) if is_safe_scalar(*kind) => {
            if value.is_null() || is_scalar_value(value) {
                ValueClass::Scalar
            } else {
                ValueClass::Unsupported
            }
        }
        DeclaredType::Reference(_) => match value {
            FieldValue::Reference(_) | FieldValue::Null => ValueClass::GraphReference,
            _ => ValueClass::Unsupported,
        },
        DeclaredType::Record(info) => {
            let serializable = match value {
                FieldValue::Record(record) => record.type_info().is_serializable(),
                FieldValue::Null => info().is_serializable(),
                _ => false,
            };
            if serializable {
                ValueClass::ValueRecord
            } else {
                ValueClass::Unsupported
            }
        }
        DeclaredType::Array(element) => match value {
            FieldValue::List(_) | FieldValue::Null => array_class(element),
            _ => ValueClass::Unsupported,
        },
        DeclaredType::Scalar(_) | DeclaredType::Opaque(_) => ValueClass::Unsupported,
    }
}

fn array_class(element: &DeclaredType) -> ValueClass {
    match element {
        DeclaredType::Scalar(kind) if is_safe_scalar(*kind) => ValueClass::ArrayOfScalar,
        DeclaredType::Reference(_) => ValueClass::ArrayOfGraphReference,
        DeclaredType::Record(info) if info().is_serializable() => ValueClass::ArrayOfValueRecord,
        _ => ValueClass::Unsupported,
    }
}

fn is_scalar_value(value: &FieldValue) -> bool {
    !matches!(
        value,
        FieldValue::Reference(_)
            | FieldValue::Record(_)
            | FieldValue::List(_)
            | FieldValue::Opaque(_)
    )
}
