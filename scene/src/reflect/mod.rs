//! Ahead-of-time reflection for scene components and value records.
//!
//! Every reflected type carries a static [`TypeInfo`] describing its
//! attributes (fields and computed properties), its single base type, and a
//! few type-level flags (serializable, script-backed, constructible). The
//! descriptor list is built once, lazily, and never changes afterwards.
//!
//! Use `#[derive(Reflect)]` from [`scenewire_macro`] to generate the
//! descriptor list. Computed properties are attached with a builder hook:
//!
//! ```ignore
//! #[derive(Reflect)]
//! #[reflect(component, properties = camera_properties)]
//! pub struct Camera {
//!     #[reflect(base)]
//!     behaviour: Behaviour,
//!     pub field_of_view: f32,
//! }
//!
//! fn camera_properties(b: TypeInfoBuilder<Camera>) -> TypeInfoBuilder<Camera> {
//!     b.property("aspect", DeclaredType::Scalar(ScalarKind::Float), |c| c.aspect())
//! }
//! ```

mod error;
mod field;

pub use error::{ReadError, WriteError};
pub use field::{Field, FieldInput, FieldValue};

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value};

/// Trait for reflected values.
///
/// Implemented by `#[derive(Reflect)]`. The accessors in [`TypeInfo`] work on
/// `&dyn Any`, so reflected values must be `'static`.
pub trait Reflect: Any + Send + Sync {
    /// Static metadata for the concrete type.
    fn type_info(&self) -> &'static TypeInfo;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Static access to a type's [`TypeInfo`] without an instance.
pub trait Typed: Reflect + Sized {
    fn type_info_static() -> &'static TypeInfo;
}

/// Role a reflected type plays in the scene model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Attachable to a node.
    Component,
    /// Plain value record, only ever stored inline inside another value.
    Record,
    /// Intermediate base type in an inheritance chain.
    Base,
    /// Host root boundary. Attribute collection stops before this type.
    Root,
}

/// Scalar categories understood by the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Float,
    Char,
    String,
    Enum,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Color,
    Rect,
    Bounds,
}

/// Declared type of an attribute, known without reading it.
#[derive(Clone)]
pub enum DeclaredType {
    Scalar(ScalarKind),
    /// Graph reference to a node, component or asset of the named type.
    Reference(&'static str),
    /// Inline value record.
    Record(fn() -> &'static TypeInfo),
    Array(Box<DeclaredType>),
    /// Host type the reflection layer does not describe.
    Opaque(&'static str),
}

impl DeclaredType {
    /// Human-readable type name.
    pub fn name(&self) -> String {
        match self {
            Self::Scalar(kind) => format!("{kind:?}"),
            Self::Reference(name) | Self::Opaque(name) => (*name).to_owned(),
            Self::Record(info) => info().name().to_owned(),
            Self::Array(inner) => format!("{}[]", inner.name()),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// The record's metadata, if this is a record type.
    pub fn record_info(&self) -> Option<&'static TypeInfo> {
        match self {
            Self::Record(info) => Some(info()),
            _ => None,
        }
    }
}

impl PartialEq for DeclaredType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Reference(a), Self::Reference(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a().type_id() == b().type_id(),
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "Scalar({kind:?})"),
            Self::Reference(name) => write!(f, "Reference({name})"),
            Self::Record(info) => write!(f, "Record({})", info().name()),
            Self::Array(inner) => write!(f, "Array({inner:?})"),
            Self::Opaque(name) => write!(f, "Opaque({name})"),
        }
    }
}

/// Whether an attribute is a stored field or a computed property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    NonPublic,
}

/// Per-attribute flags supplied at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrFlags {
    pub visibility: Visibility,
    /// Non-public but persisted by the host serializer.
    pub serialized: bool,
    /// Compiler- or tool-generated; never reported.
    pub synthesized: bool,
}

impl AttrFlags {
    pub const PUBLIC: Self = Self {
        visibility: Visibility::Public,
        serialized: true,
        synthesized: false,
    };
    pub const PRIVATE: Self = Self {
        visibility: Visibility::NonPublic,
        serialized: false,
        synthesized: false,
    };
    pub const SERIALIZED_PRIVATE: Self = Self {
        visibility: Visibility::NonPublic,
        serialized: true,
        synthesized: false,
    };
    pub const SYNTHESIZED: Self = Self {
        visibility: Visibility::NonPublic,
        serialized: false,
        synthesized: true,
    };
}

type ReadFn = Box<dyn Fn(&dyn Any) -> Result<FieldValue, ReadError> + Send + Sync>;
type WriteFn = Box<dyn Fn(&mut dyn Any, FieldInput) -> Result<(), WriteError> + Send + Sync>;

/// One declared attribute of a reflected type.
pub struct AttributeDecl {
    name: &'static str,
    declared: DeclaredType,
    member: MemberKind,
    flags: AttrFlags,
    read: ReadFn,
    write: Option<WriteFn>,
}

impl AttributeDecl {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared(&self) -> &DeclaredType {
        &self.declared
    }

    pub fn member(&self) -> MemberKind {
        self.member
    }

    pub fn visibility(&self) -> Visibility {
        self.flags.visibility
    }

    pub fn is_public(&self) -> bool {
        self.flags.visibility == Visibility::Public
    }

    pub fn is_serialized(&self) -> bool {
        self.flags.serialized
    }

    pub fn is_synthesized(&self) -> bool {
        self.flags.synthesized
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    /// Read the attribute from an instance of the declaring type.
    pub fn read(&self, target: &dyn Any) -> Result<FieldValue, ReadError> {
        (self.read)(target)
    }

    /// Write the attribute on an instance of the declaring type.
    pub fn write(&self, target: &mut dyn Any, input: FieldInput) -> Result<(), WriteError> {
        match &self.write {
            Some(write) => write(target, input),
            None => Err(WriteError::ReadOnly {
                attribute: self.name,
            }),
        }
    }
}

impl fmt::Debug for AttributeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDecl")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("member", &self.member)
            .field("flags", &self.flags)
            .field("writable", &self.write.is_some())
            .finish()
    }
}

/// Projects a derived instance onto its embedded base value.
pub trait Upcast: Send + Sync {
    fn upcast<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any>;

    fn upcast_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

struct BaseUpcast<T, B> {
    get: fn(&T) -> &B,
    get_mut: fn(&mut T) -> &mut B,
}

impl<T: 'static, B: 'static> Upcast for BaseUpcast<T, B> {
    fn upcast<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        let derived = value.downcast_ref::<T>()?;
        Some((self.get)(derived) as &dyn Any)
    }

    fn upcast_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let derived = value.downcast_mut::<T>()?;
        Some((self.get_mut)(derived) as &mut dyn Any)
    }
}

/// Link from a type to its single base type.
pub struct BaseLink {
    info: fn() -> &'static TypeInfo,
    upcast: Box<dyn Upcast>,
}

impl BaseLink {
    pub fn info(&self) -> &'static TypeInfo {
        (self.info)()
    }

    pub fn upcast(&self) -> &dyn Upcast {
        self.upcast.as_ref()
    }
}

/// Static metadata for a reflected type.
pub struct TypeInfo {
    name: &'static str,
    type_id: TypeId,
    kind: TypeKind,
    serializable: bool,
    script_path: Option<&'static str>,
    base: Option<BaseLink>,
    attributes: Vec<AttributeDecl>,
    constructor: Option<fn() -> Box<dyn Reflect>>,
}

impl TypeInfo {
    /// Start building metadata for `T`.
    pub fn builder<T: Reflect>(name: &'static str, kind: TypeKind) -> TypeInfoBuilder<T> {
        TypeInfoBuilder {
            info: TypeInfo {
                name,
                type_id: TypeId::of::<T>(),
                kind,
                serializable: false,
                script_path: None,
                base: None,
                attributes: Vec::new(),
                constructor: None,
            },
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether the host marks this type as a serializable value record.
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Source path of the script that defines this type, if script-backed.
    pub fn script_path(&self) -> Option<&'static str> {
        self.script_path
    }

    pub fn base(&self) -> Option<&BaseLink> {
        self.base.as_ref()
    }

    /// Attributes declared directly on this type, in declaration order.
    pub fn attributes(&self) -> &[AttributeDecl] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    /// Build a default instance, if the type registered a constructor.
    pub fn construct(&self) -> Option<Box<dyn Reflect>> {
        self.constructor.map(|ctor| ctor())
    }

    /// This type followed by each base type, most-derived first.
    pub fn chain(&'static self) -> impl Iterator<Item = &'static TypeInfo> {
        std::iter::successors(Some(self), |info| info.base.as_ref().map(BaseLink::info))
    }

    /// Whether `other` is this type or one of its bases.
    pub fn is_or_derives(&'static self, other: TypeId) -> bool {
        self.chain().any(|info| info.type_id == other)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("serializable", &self.serializable)
            .field("base", &self.base.as_ref().map(|b| b.info().name))
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Builder for [`TypeInfo`]. Used by the derive macro and by hand-written
/// property hooks.
pub struct TypeInfoBuilder<T> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> TypeInfoBuilder<T> {
    /// Register a stored field with typed accessors.
    pub fn field<F: Field>(
        mut self,
        name: &'static str,
        flags: AttrFlags,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        let type_name = self.info.name;
        self.info.attributes.push(AttributeDecl {
            name,
            declared: F::declared(),
            member: MemberKind::Field,
            flags,
            read: Box::new(move |target: &dyn Any| {
                let target = target
                    .downcast_ref::<T>()
                    .ok_or(ReadError::TypeMismatch {
                        expected: type_name,
                    })?;
                Ok(get(target).to_field_value())
            }),
            write: Some(Box::new(move |target: &mut dyn Any, input: FieldInput| {
                let target = target
                    .downcast_mut::<T>()
                    .ok_or(WriteError::TypeMismatch {
                        expected: type_name,
                    })?;
                *get_mut(target) = F::from_input(input)?;
                Ok(())
            })),
        });
        self
    }

    /// Register a stored field whose type the reflection layer cannot
    /// describe. Reads yield [`FieldValue::Opaque`]; writes are rejected.
    pub fn opaque_field(
        mut self,
        name: &'static str,
        flags: AttrFlags,
        type_name: &'static str,
    ) -> Self {
        self.info.attributes.push(AttributeDecl {
            name,
            declared: DeclaredType::Opaque(type_name),
            member: MemberKind::Field,
            flags,
            read: Box::new(move |_: &dyn Any| Ok(FieldValue::Opaque(type_name))),
            write: None,
        });
        self
    }

    /// Register a public, read-only computed property.
    pub fn property(
        self,
        name: &'static str,
        declared: DeclaredType,
        read: impl Fn(&T) -> Result<FieldValue, ReadError> + Send + Sync + 'static,
    ) -> Self {
        self.push_property(name, declared, AttrFlags::PUBLIC, read)
    }

    /// Register a non-public computed property.
    pub fn private_property(
        self,
        name: &'static str,
        declared: DeclaredType,
        read: impl Fn(&T) -> Result<FieldValue, ReadError> + Send + Sync + 'static,
    ) -> Self {
        self.push_property(name, declared, AttrFlags::PRIVATE, read)
    }

    fn push_property(
        mut self,
        name: &'static str,
        declared: DeclaredType,
        flags: AttrFlags,
        read: impl Fn(&T) -> Result<FieldValue, ReadError> + Send + Sync + 'static,
    ) -> Self {
        let type_name = self.info.name;
        self.info.attributes.push(AttributeDecl {
            name,
            declared,
            member: MemberKind::Property,
            flags,
            read: Box::new(move |target: &dyn Any| {
                let target = target
                    .downcast_ref::<T>()
                    .ok_or(ReadError::TypeMismatch {
                        expected: type_name,
                    })?;
                read(target)
            }),
            write: None,
        });
        self
    }

    /// Declare `B` as the base type, embedded in `T` and reached through the
    /// given accessors.
    pub fn base<B: Typed>(mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> Self {
        self.info.base = Some(BaseLink {
            info: B::type_info_static,
            upcast: Box::new(BaseUpcast { get, get_mut }),
        });
        self
    }

    pub fn serializable(mut self) -> Self {
        self.info.serializable = true;
        self
    }

    /// Mark the type as defined by a script at `path`.
    pub fn script(mut self, path: &'static str) -> Self {
        self.info.script_path = Some(path);
        self
    }

    /// Apply a registration hook (used for computed properties).
    pub fn with(self, hook: impl FnOnce(Self) -> Self) -> Self {
        hook(self)
    }

    pub fn build(self) -> TypeInfo {
        self.info
    }
}

impl<T: Reflect + Default> TypeInfoBuilder<T> {
    /// Allow default construction through [`TypeInfo::construct`].
    pub fn constructible(mut self) -> Self {
        self.info.constructor = Some(make_default::<T>);
        self
    }
}

fn make_default<T: Reflect + Default>() -> Box<dyn Reflect> {
    Box::new(T::default())
}

// ---------------------------------------------------------------------------
// Base-chain helpers
// ---------------------------------------------------------------------------

/// Find the `B` embedded somewhere along `value`'s base chain.
pub fn find_base<B: Typed>(value: &dyn Reflect) -> Option<&B> {
    let target = TypeId::of::<B>();
    let mut any = value.as_any();
    let mut info = value.type_info();
    loop {
        if info.type_id == target {
            return any.downcast_ref::<B>();
        }
        let base = info.base.as_ref()?;
        any = base.upcast.upcast(any)?;
        info = base.info();
    }
}

/// Mutable variant of [`find_base`].
pub fn find_base_mut<B: Typed>(value: &mut dyn Reflect) -> Option<&mut B> {
    let target = TypeId::of::<B>();
    let mut info = value.type_info();
    let mut any = value.as_any_mut();
    loop {
        if info.type_id == target {
            return any.downcast_mut::<B>();
        }
        let base = info.base.as_ref()?;
        any = base.upcast.upcast_mut(any)?;
        info = base.info();
    }
}

/// Overwrite the serializable fields of `target` from a wire object.
///
/// Keys are matched against attribute names along the whole base chain.
/// Fields that fail to decode keep their current value and are logged.
pub fn apply_wire_object(target: &mut dyn Reflect, object: &Map<String, Value>) {
    let mut info = target.type_info();
    let mut any = target.as_any_mut();
    loop {
        for attr in &info.attributes {
            if attr.member != MemberKind::Field
                || attr.flags.synthesized
                || !(attr.is_public() || attr.flags.serialized)
                || !attr.is_writable()
            {
                continue;
            }
            let Some(value) = object.get(attr.name) else {
                continue;
            };
            if let Err(e) = attr.write(&mut *any, FieldInput::Wire(value.clone())) {
                log::warn!("{}.{}: {e}", info.name, attr.name);
            }
        }
        let Some(base) = info.base.as_ref() else {
            return;
        };
        if base.info().kind == TypeKind::Root {
            return;
        }
        let Some(next) = base.upcast.upcast_mut(any) else {
            return;
        };
        any = next;
        info = base.info();
    }
}

/// Rebuild a record from writer input. Used by derived [`Field`] impls.
pub fn record_from_input<T: Typed + Default>(input: FieldInput) -> Result<T, WriteError> {
    match input {
        FieldInput::Record(record) => record
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| WriteError::TypeMismatch {
                expected: T::type_info_static().name,
            }),
        FieldInput::Wire(Value::Object(object)) => {
            let mut value = T::default();
            apply_wire_object(&mut value, &object);
            Ok(value)
        }
        FieldInput::Wire(other) => Err(WriteError::Decode {
            message: format!(
                "expected an object for '{}', found {other}",
                T::type_info_static().name
            ),
        }),
        FieldInput::Reference(_) => Err(WriteError::InputMismatch {
            expected: "record",
            found: "reference",
        }),
    }
}
