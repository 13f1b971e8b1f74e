// renderer/mod.rs
pub mod billboards;
pub mod context;
pub mod forward;
pub mod mesh;
pub mod overlay;
pub mod renderer;
pub mod shadow;
pub mod texture;
pub mod uniforms;

pub use context::{build_mesh_draws, FrameInputs, MeshDraw};
pub use mesh::Mesh;
pub use renderer::{surface_error_action, Frame, Renderer, SurfaceAction, FRAMES_IN_FLIGHT};
pub use texture::Texture;
