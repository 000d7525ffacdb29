use bytemuck::{cast_slice, Pod, Zeroable};
use glam::Vec3;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    Buffer, BufferUsages, Device, Queue,
};

use crate::renderer::camera::OrbitCamera;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, Default)]
struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub aspect: f32,
    pub light_dir: [f32; 3],
    pub _padding: f32,
}

pub struct CameraUniformBuffer {
    buffer: Buffer,
    uniform: CameraUniform,
}

impl CameraUniformBuffer {
    pub fn new(device: &Device, camera: &OrbitCamera, aspect: f32, light_direction: Vec3) -> Self {
        let uniform = CameraUniform {
            view_proj: camera.matrix(aspect).to_cols_array_2d(),
            view_pos: camera.eye().to_array(),
            aspect,
            light_dir: light_direction.normalize_or_zero().to_array(),
            _padding: 0.0,
        };
        let buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: cast_slice(&[uniform]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        Self { buffer, uniform }
    }

    pub fn update_view(&mut self, camera: &OrbitCamera, aspect: f32) {
        self.uniform.view_proj = camera.matrix(aspect).to_cols_array_2d();
        self.uniform.view_pos = camera.eye().to_array();
        self.uniform.aspect = aspect;
    }

    pub fn update(&self, queue: &Queue) {
        queue.write_buffer(&self.buffer, 0, cast_slice(&[self.uniform]));
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}
