use wgpu::{
    include_wgsl, BlendState, ColorTargetState, ColorWrites, CompareFunction, DepthBiasState,
    DepthStencilState, Device, FragmentState, FrontFace, MultisampleState, PipelineLayout,
    PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology, RenderPipeline,
    RenderPipelineDescriptor, StencilState, TextureFormat, VertexState,
};

use super::{
    depth_texture::DEPTH_TEXTURE_FORMAT,
    vertex::{MeshVertex, Vertex},
    RendererBindGroupLayout,
};

/// The single pipeline every node is drawn with.
///
/// Faces are not culled, the fragment shader flips normals of back faces.
#[derive(Debug)]
pub struct LitPipeline {
    render_pipeline: RenderPipeline,
}

impl LitPipeline {
    fn create_pipeline_layout(
        device: &Device,
        bind_group_layout: &RendererBindGroupLayout,
    ) -> PipelineLayout {
        device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Lit Pipeline Layout"),
            bind_group_layouts: &[
                bind_group_layout.global_uniform_layout(),
                bind_group_layout.node_uniform_layout(),
            ],
            push_constant_ranges: &[],
        })
    }

    pub fn new(
        device: &Device,
        bind_group_layout: &RendererBindGroupLayout,
        target_texture_format: TextureFormat,
    ) -> Self {
        let shader_module =
            device.create_shader_module(include_wgsl!("../shader/lit_shader.wgsl"));
        let pipeline_layout = Self::create_pipeline_layout(device, bind_group_layout);
        let render_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Lit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                compilation_options: Default::default(),
                buffers: &[MeshVertex::desc()],
            },
            fragment: Some(FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                compilation_options: Default::default(),
                targets: &[Some(ColorTargetState {
                    format: target_texture_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::all(),
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_TEXTURE_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });
        Self { render_pipeline }
    }

    pub fn render_pipeline(&self) -> &RenderPipeline {
        &self.render_pipeline
    }
}
