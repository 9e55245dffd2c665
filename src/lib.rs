//! # scenewire
//!
//! Projects a live scene graph into a JSON-friendly wire shape that is safe
//! to hand to an external tool: cycles become stubs, nesting is bounded and
//! a failing attribute never takes the rest of the projection down with it.
//!
//! ## Modules
//!
//! - [`projector`]: component and node projection, special cases, denylist
//! - [`paginate`]: paged hierarchy browsing with parent selectors
//! - [`inbound`]: hydrating value-record sequences from wire arrays
//! - [`command`]: panic-safe command entry points with parameter coercion
//! - [`metadata`]: cached per-type attribute lists
//! - [`guard`]: visited-set and depth bookkeeping for one traversal
//!
//! ```ignore
//! let commands = Commands::new(ProjectionConfig::default());
//! let response = commands.get_node(&scene, &json!({"nodeId": camera_node.raw()}));
//! assert!(response.success);
//! ```

pub mod classify;
pub mod command;
pub mod config;
pub mod error;
pub mod guard;
pub mod inbound;
pub mod metadata;
pub mod paginate;
pub mod projector;
pub mod wire;

pub use classify::{ValueClass, classify};
pub use command::{CommandResponse, Commands, coerce_bool, coerce_int};
pub use config::{ConfigError, ProjectionConfig};
pub use error::{AttributeReadFailure, ProjectionError, ProjectionResult};
pub use guard::TraversalContext;
pub use inbound::{ObjectResolver, StructSequenceConverter};
pub use metadata::{AttributeDescriptor, MetadataCache};
pub use paginate::{HierarchyPaginator, Page, PageRequest, ParentSelector};
pub use projector::{
    ComponentProjection, NodeProjection, ProjectOptions, Projector, SpecialCase,
    SpecialCaseRegistry,
};
pub use wire::{ReferenceProjection, StubReason, StubReference, WireMap, WireValue};

pub use scenewire_scene as scene;
