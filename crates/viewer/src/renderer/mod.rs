use std::iter;

use camera::OrbitCamera;
use depth_texture::DepthTexture;
use glam::Vec3;
use log::debug;
use mesh::NodeMesh;
use pipeline::LitPipeline;
use uniform::camera::CameraUniformBuffer;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingType, BufferBindingType, Color, CommandEncoder,
    CommandEncoderDescriptor, Device, LoadOp, Operations, Queue, RenderPass,
    RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    ShaderStages, StoreOp, TextureFormat, TextureView,
};

use crate::scene::SceneSubtree;

pub mod camera;
mod depth_texture;
mod index;
mod mesh;
mod pipeline;
mod uniform;
mod vertex;

pub use depth_texture::DEPTH_TEXTURE_FORMAT;

pub struct OngoingRenderState {
    pub encoder: CommandEncoder,
    pub render_pass: RenderPass<'static>,
}

impl OngoingRenderState {
    pub fn new(device: &Device, texture_view: &TextureView, renderer: &Renderer) -> Self {
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        let background_color = renderer.background_color();
        let mut render_pass = encoder
            .begin_render_pass(&RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: texture_view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: background_color.x as f64,
                            g: background_color.y as f64,
                            b: background_color.z as f64,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: renderer.depth_texture.texture_view(),
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            })
            .forget_lifetime();
        render_pass.set_bind_group(0, &renderer.global_bind_group, &[]);

        Self {
            encoder,
            render_pass,
        }
    }

    pub fn finish(self, queue: &Queue) {
        drop(self.render_pass);
        queue.submit(iter::once(self.encoder.finish()));
    }
}

pub struct RendererBindGroupLayout {
    global_uniform_layout: BindGroupLayout,
    node_uniform_layout: BindGroupLayout,
}

impl RendererBindGroupLayout {
    fn uniform_entry(visibility: ShaderStages) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    pub fn new(device: &Device) -> Self {
        let global_uniform_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[Self::uniform_entry(ShaderStages::VERTEX_FRAGMENT)],
            label: Some("Global Uniform Bind Group Layout"),
        });
        let node_uniform_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[Self::uniform_entry(ShaderStages::FRAGMENT)],
            label: Some("Node Uniform Bind Group Layout"),
        });
        Self {
            global_uniform_layout,
            node_uniform_layout,
        }
    }

    pub fn global_uniform_layout(&self) -> &BindGroupLayout {
        &self.global_uniform_layout
    }

    pub fn node_uniform_layout(&self) -> &BindGroupLayout {
        &self.node_uniform_layout
    }
}

/// Draws the attached subtree. Holds GPU copies only, the scene itself
/// stays in the session.
pub struct Renderer {
    view_aspect: f32,
    background_color: Vec3,
    camera_updated: bool,

    depth_texture: DepthTexture,

    bind_group_layout: RendererBindGroupLayout,
    global_bind_group: BindGroup,
    camera_uniform: CameraUniformBuffer,
    pipeline: LitPipeline,

    meshes: Vec<NodeMesh>,
}

impl Renderer {
    pub fn new(
        device: &Device,
        size: (u32, u32),
        format: TextureFormat,
        camera: &OrbitCamera,
        background_color: Vec3,
        light_direction: Vec3,
    ) -> Self {
        let view_aspect = Self::aspect(size);
        let camera_uniform = CameraUniformBuffer::new(device, camera, view_aspect, light_direction);

        let depth_texture = DepthTexture::new(device, size);

        let bind_group_layout = RendererBindGroupLayout::new(device);
        let global_bind_group = device.create_bind_group(&BindGroupDescriptor {
            layout: bind_group_layout.global_uniform_layout(),
            entries: &[BindGroupEntry {
                binding: 0,
                resource: camera_uniform.buffer().as_entire_binding(),
            }],
            label: Some("Global Uniform Bind Group"),
        });
        let pipeline = LitPipeline::new(device, &bind_group_layout, format);

        Self {
            view_aspect,
            background_color,
            camera_updated: false,
            depth_texture,
            bind_group_layout,
            global_bind_group,
            camera_uniform,
            pipeline,
            meshes: Vec::new(),
        }
    }

    fn aspect(size: (u32, u32)) -> f32 {
        size.0.max(1) as f32 / size.1.max(1) as f32
    }

    pub fn view_aspect(&self) -> f32 {
        self.view_aspect
    }

    pub fn background_color(&self) -> &Vec3 {
        &self.background_color
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Upload a newly attached subtree. The previous meshes are dropped,
    /// which frees their buffers.
    pub fn set_scene(&mut self, device: &Device, scene: &SceneSubtree) {
        let layout = self.bind_group_layout.node_uniform_layout();
        let meshes: Vec<NodeMesh> = scene
            .nodes()
            .iter()
            .map(|node| NodeMesh::new(device, layout, node))
            .collect();
        debug!(
            "Uploaded {} meshes, dropped {}",
            meshes.len(),
            self.meshes.len()
        );
        self.meshes = meshes;
    }

    pub fn clear_scene(&mut self) {
        self.meshes.clear();
    }

    pub fn camera_changed(&mut self) {
        self.camera_updated = true;
    }

    pub fn resize(&mut self, device: &Device, size: (u32, u32)) {
        self.view_aspect = Self::aspect(size);
        self.camera_updated = true;
        self.depth_texture = DepthTexture::new(device, size);
    }

    /// Write camera and changed node treatments to the GPU.
    pub fn prepare(&mut self, queue: &Queue, camera: &OrbitCamera, scene: Option<&SceneSubtree>) {
        if self.camera_updated {
            self.camera_updated = false;
            self.camera_uniform.update_view(camera, self.view_aspect);
            self.camera_uniform.update(queue);
        }
        if let Some(scene) = scene {
            for mesh in &mut self.meshes {
                if let Some(node) = scene.node(mesh.key()) {
                    mesh.prepare(queue, node);
                }
            }
        }
    }

    pub fn render(&self, ongoing_state: &mut OngoingRenderState) {
        if self.meshes.is_empty() {
            return;
        }
        let render_pass = &mut ongoing_state.render_pass;
        render_pass.set_pipeline(self.pipeline.render_pipeline());
        for mesh in &self.meshes {
            mesh.render(render_pass);
        }
    }
}
