use std::sync::Arc;

use super::material::MaterialAsset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveAssetMode {
    Points,
    LineStrip,
    LineLoop,
    LineList,
    TriangleStrip,
    TriangleFan,
    TriangleList,
}

pub type Position = Vec<[f32; 3]>;
pub type Normal = Vec<[f32; 3]>;

#[derive(Debug, Clone)]
pub struct PrimitiveAsset {
    pub position: Position,
    pub normal: Option<Normal>,
    pub indices: Option<Vec<u32>>,
    pub material: Option<Arc<MaterialAsset>>,
    pub mode: PrimitiveAssetMode,
}

impl PrimitiveAsset {
    /// Number of whole triangles in a triangle list.
    ///
    /// Indexed geometry counts indices, otherwise vertices. Both are floored.
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.position.len() / 3,
        }
    }
}
