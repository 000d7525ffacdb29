pub mod config;
pub mod controls;
pub mod gui;
pub mod inspector;
pub mod interaction;
pub mod loader;
pub mod menu;
pub mod pick;
pub mod renderer;
pub mod scene;
pub mod session;
pub mod state;
pub mod tracker;
pub mod treatment;

#[cfg(feature = "winit")]
pub mod winit;

pub use egui;
pub use egui_wgpu;
pub use viewer_asset as asset;

use wgpu::{
    rwh::{HasDisplayHandle, HasWindowHandle},
    WasmNotSendSync,
};

pub trait RenderTarget: HasWindowHandle + HasDisplayHandle + WasmNotSendSync + 'static {
    fn native_pixels_per_point(&self) -> f32;
    fn pre_present_notify(&self);
    fn request_redraw(&self);
}
