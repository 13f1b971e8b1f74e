pub mod camera;
pub mod components;
pub mod lights;
pub mod persist;
pub mod picking;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use scene::Scene;
pub use transform::Transform;
