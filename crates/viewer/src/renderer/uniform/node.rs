use bytemuck::{cast_slice, Pod, Zeroable};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, Buffer, BufferUsages, Device,
    Queue,
};

use crate::treatment::Treatment;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct NodeUniform {
    base_color: [f32; 4],
    emissive: [f32; 3],
    metallic: f32,
    roughness: f32,
    padding: [f32; 3],
}

impl From<&Treatment> for NodeUniform {
    fn from(value: &Treatment) -> Self {
        Self {
            base_color: value.base_color,
            emissive: value.emissive,
            metallic: value.metallic,
            roughness: value.roughness,
            padding: [0.0; 3],
        }
    }
}

/// Shading factors of one node, re-uploaded whenever its treatment changes.
#[derive(Debug)]
pub struct NodeUniformBuffer {
    buffer: Buffer,
    bind_group: BindGroup,
    uploaded: Treatment,
}

impl NodeUniformBuffer {
    pub fn new(device: &Device, layout: &BindGroupLayout, treatment: &Treatment) -> Self {
        let buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Node Uniform Buffer"),
            contents: cast_slice(&[NodeUniform::from(treatment)]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("Node Uniform Bind Group"),
        });
        Self {
            buffer,
            bind_group,
            uploaded: treatment.clone(),
        }
    }

    /// Returns whether a write was queued.
    pub fn update(&mut self, queue: &Queue, treatment: &Treatment) -> bool {
        if &self.uploaded == treatment {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, cast_slice(&[NodeUniform::from(treatment)]));
        self.uploaded = treatment.clone();
        true
    }

    pub fn bind_group(&self) -> &BindGroup {
        &self.bind_group
    }
}
