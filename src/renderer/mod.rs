//! WebGPU rendering module
//!
//! The scene is rebuilt as flat-colored triangles every frame.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderError, RenderState, Viewport};
pub use scene::build_scene;
pub use vertex::Vertex;
