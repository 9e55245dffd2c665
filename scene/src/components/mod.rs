//! Standard host components.

mod behaviour;
mod camera;
mod mesh_renderer;
mod transform;
mod ui_document;

pub use behaviour::Behaviour;
pub use camera::{Camera, ClearFlags, RenderTarget};
pub use mesh_renderer::MeshRenderer;
pub use transform::Transform;
pub use ui_document::{UiDocument, VisualElement};
