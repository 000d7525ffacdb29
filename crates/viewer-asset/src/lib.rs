//! Provide asset handling for the viewer.
//!
//! This library provides a plain node structure shaped after GLTF, and a
//! loader that decodes binary GLTF (GLB) buffers into it. Nothing here
//! touches the GPU, so decoding can run on any thread.
//!
pub mod material;
pub mod mesh;
pub mod node;
pub mod normal;
pub mod primitive;
pub mod scene;

/// Model loaders.
pub mod loader;
