/// GLB loader with `gltf` crate.
#[cfg(feature = "gltf")]
pub mod gltf;

/// Synthesized GLB buffers for tests.
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
