pub mod camera;
pub mod node;
