use wgpu::{
    Device, Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
    TextureView, TextureViewDescriptor,
};

pub const DEPTH_TEXTURE_FORMAT: TextureFormat = TextureFormat::Depth32Float;

pub struct DepthTexture {
    texture_view: TextureView,
}

impl DepthTexture {
    pub fn new(device: &Device, size: (u32, u32)) -> Self {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("Depth texture"),
            size: Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: DEPTH_TEXTURE_FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let texture_view = texture.create_view(&TextureViewDescriptor::default());
        Self { texture_view }
    }

    pub fn texture_view(&self) -> &TextureView {
        &self.texture_view
    }
}
