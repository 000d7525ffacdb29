#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MaterialAlphaMode {
    #[default]
    Opaque,
    // Alpha cutoff
    Mask(f32),
    Blend,
}

/// Metallic-roughness material, reduced to the factors the viewer shades with.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAsset {
    pub index: Option<usize>,
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    pub has_base_color_texture: bool,
    pub alpha_mode: MaterialAlphaMode,
    pub double_sided: bool,
}

impl Default for MaterialAsset {
    /// The GLTF default material.
    fn default() -> Self {
        Self {
            index: None,
            name: None,
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: [0.0, 0.0, 0.0],
            has_base_color_texture: false,
            alpha_mode: MaterialAlphaMode::Opaque,
            double_sided: false,
        }
    }
}
