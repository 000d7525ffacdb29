use wgpu::{BindGroupLayout, Device, Queue, RenderPass};

use crate::scene::{NodeKey, SceneNode};

use super::{
    index::IndexBuffer,
    uniform::node::NodeUniformBuffer,
    vertex::{MeshVertex, VertexBuffer},
};

/// GPU copy of one interactive node.
#[derive(Debug)]
pub struct NodeMesh {
    key: NodeKey,
    vertex_buffer: VertexBuffer,
    index_buffer: Option<IndexBuffer>,
    uniform: NodeUniformBuffer,
}

impl NodeMesh {
    pub fn new(device: &Device, layout: &BindGroupLayout, node: &SceneNode) -> Self {
        let geometry = node.geometry();
        let vertices: Vec<MeshVertex> = geometry
            .positions()
            .iter()
            .zip(geometry.normals())
            .map(|(position, normal)| MeshVertex {
                position: position.to_array(),
                normal: normal.to_array(),
            })
            .collect();
        let vertex_buffer = VertexBuffer::new(device, &vertices, Some(node.name()));
        let index_buffer = geometry
            .indices()
            .map(|indices| IndexBuffer::new(device, indices, Some(node.name())));
        Self {
            key: node.key(),
            vertex_buffer,
            index_buffer,
            uniform: NodeUniformBuffer::new(device, layout, node.displayed()),
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn prepare(&mut self, queue: &Queue, node: &SceneNode) -> bool {
        self.uniform.update(queue, node.displayed())
    }

    pub fn render(&self, render_pass: &mut RenderPass) {
        render_pass.set_bind_group(1, self.uniform.bind_group(), &[]);
        match &self.index_buffer {
            Some(index_buffer) => self
                .vertex_buffer
                .draw_with_indexes(index_buffer, render_pass),
            None => self.vertex_buffer.draw(render_pass),
        }
    }
}
