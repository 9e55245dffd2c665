//! # scenewire scene model
//!
//! A live, mutable scene graph with ahead-of-time reflection.
//!
//! ## Core Types
//!
//! - [`Scene`]: arena of nodes, components and assets keyed by [`InstanceId`]
//! - [`Node`]: named hierarchy element with ordered children and components
//! - [`ObjectRef`]: non-owning reference stored inside component fields
//! - [`reflect::TypeInfo`]: static attribute list of a reflected type
//!
//! ## Standard components
//!
//! [`components::Transform`], [`components::Camera`],
//! [`components::UiDocument`], [`components::MeshRenderer`] and the
//! [`components::Behaviour`] base.

extern crate self as scenewire_scene;

pub mod components;
pub mod hierarchy;
mod id;
pub mod math;
pub mod reflect;
mod scene;

pub use id::{InstanceId, ObjectRef};
pub use reflect::{Reflect, Typed};
pub use scene::{Asset, ComponentEntry, Node, Scene, SceneError, SceneObject};
pub use scenewire_macro::Reflect;
