use std::sync::{Arc, Mutex, PoisonError};

use glam::{Vec2, Vec3};
use log::{debug, info, warn};
use web_time::Instant;
use wgpu::{
    util::{backend_bits_from_env, initialize_adapter_from_env, power_preference_from_env},
    Adapter, Backends, Device, DeviceDescriptor, Instance, InstanceDescriptor, Limits,
    PowerPreference, PresentMode, Queue, RequestAdapterOptions, Surface, SurfaceConfiguration,
    SurfaceError, TextureFormat, TextureUsages, TextureViewDescriptor,
};

use crate::{
    config::ViewerConfig,
    controls::PointerButton,
    gui::{event::GuiEventHandler, state::EguiState, GuiAction, LoadIndicator, ModelLoaderGui},
    interaction::ViewInput,
    loader::{ByteSource, LoadCoordinator},
    renderer::{camera::OrbitCamera, OngoingRenderState, Renderer},
    session::ViewSession,
    RenderTarget,
};

#[must_use]
#[derive(Debug, Clone, Copy)]
pub enum RenderResult {
    Succeed,
    NoSurface,
    SurfaceLost,
}

pub struct State<'a, EventHandler: GuiEventHandler> {
    instance: Instance,
    adapter: Adapter,
    surface: Option<Surface<'a>>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    limits: Limits,
    size: (u32, u32),

    viewer_config: ViewerConfig,
    renderer: Renderer,
    camera: OrbitCamera,
    session: ViewSession,
    loads: LoadCoordinator,
    input: ViewInput,
    last_render_time: Option<Instant>,
    gui_state: EguiState<EventHandler>,
}

impl<'a, EventHandler: GuiEventHandler> State<'a, EventHandler> {
    fn create_config(
        surface: &Surface,
        adapter: &Adapter,
        size: (u32, u32),
    ) -> SurfaceConfiguration {
        if cfg!(target_family = "wasm") {
            surface
                .get_default_config(adapter, size.0, size.1)
                .expect("The surface is not supported by adapter")
        } else {
            let surface_caps = surface.get_capabilities(adapter);
            let surface_format = surface_caps
                .formats
                .iter()
                .copied()
                .find(|f| f.is_srgb())
                .or_else(|| surface_caps.formats.first().copied())
                .unwrap_or(TextureFormat::Bgra8UnormSrgb);
            SurfaceConfiguration {
                usage: TextureUsages::RENDER_ATTACHMENT,
                format: surface_format,
                width: size.0,
                height: size.1,
                present_mode: PresentMode::AutoVsync,
                alpha_mode: surface_caps.alpha_modes[0],
                desired_maximum_frame_latency: 2,
                view_formats: vec![],
            }
        }
    }

    pub async fn new(
        render_target: Arc<dyn RenderTarget>,
        size: (u32, u32),
        event_handler: Arc<Mutex<EventHandler>>,
        model_loader: Arc<dyn ModelLoaderGui>,
        viewer_config: ViewerConfig,
    ) -> Self {
        let backends = if cfg!(target_family = "wasm") {
            Backends::GL | Backends::BROWSER_WEBGPU
        } else {
            backend_bits_from_env().unwrap_or(Backends::all())
        };
        let instance = Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface = instance
            .create_surface(render_target.clone())
            .expect("Failed to create surface");
        let adapter = initialize_adapter_from_env(&instance, Some(&surface));
        let adapter = match adapter {
            Some(adapter) => adapter,
            None => instance
                .request_adapter(&RequestAdapterOptions {
                    compatible_surface: Some(&surface),
                    power_preference: power_preference_from_env().unwrap_or(PowerPreference::None),
                    ..Default::default()
                })
                .await
                .expect("Failed to acquire a graphic adapter"),
        };
        let limits = if cfg!(target_family = "wasm") {
            Limits::downlevel_webgl2_defaults()
        } else {
            Limits::default()
        }
        .using_resolution(adapter.limits());
        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Device"),
                    required_limits: limits.clone(),
                    ..Default::default()
                },
                None,
            )
            .await
            .expect("Failed to acquire a device");

        let config = Self::create_config(&surface, &adapter, size);
        surface.configure(&device, &config);

        let camera = OrbitCamera::new(&viewer_config);
        let renderer = Renderer::new(
            &device,
            size,
            config.format,
            &camera,
            Vec3::from_array(viewer_config.background_color),
            viewer_config.light_direction,
        );
        let gui_state = EguiState::new(&device, config.format, event_handler, model_loader);

        Self {
            instance,
            adapter,
            surface: Some(surface),
            device,
            queue,
            config,
            limits,
            size,
            renderer,
            camera,
            session: ViewSession::new(&viewer_config),
            loads: LoadCoordinator::new(viewer_config.subtree),
            input: ViewInput::new(viewer_config.click_threshold, size),
            last_render_time: None,
            gui_state,
            viewer_config,
        }
    }

    pub fn session(&self) -> &ViewSession {
        &self.session
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn show_error(&mut self, error: String) {
        self.gui_state.state.add_error(error);
    }

    /// Start a load. Unsupported files are reported and never read.
    pub fn load(&mut self, source: ByteSource) {
        if let Err(err) = self.loads.request(source, None) {
            warn!("{}", err);
            self.show_error(err.to_string());
        }
    }

    /// Load the configured startup model, if any.
    pub fn load_default_model(&mut self) {
        if let Some(location) = self.viewer_config.default_model.clone() {
            debug!("Loading default model {}", location);
            self.load(ByteSource::from_location(&location));
        }
    }

    fn poll_loads(&mut self) {
        while let Some(completion) = self.loads.poll() {
            match completion.result {
                Ok(subtree) => {
                    self.renderer.set_scene(&self.device, &subtree);
                    if let Some(bounds) = subtree.bounds() {
                        self.camera.fit(bounds);
                        self.renderer.camera_changed();
                    }
                    if let Some(previous) = self.session.replace_scene(subtree) {
                        debug!("Released {}", previous.display_name());
                    }
                    self.input.cancel();
                    self.input.refresh_hover(&self.camera, &mut self.session);
                }
                Err(err) => {
                    self.show_error(format!(
                        "Failed to load {}: {}",
                        completion.display_name, err
                    ));
                }
            }
        }
    }

    fn handle_gui_events(&mut self) {
        while let Ok(action) = self.gui_state.recv_events() {
            match action {
                GuiAction::Load(source) => self.load(source),
                GuiAction::ApplyOverride(index) => {
                    match self.viewer_config.palette.get(index).cloned() {
                        Some(treatment) => {
                            self.session.apply_override(treatment);
                        }
                        None => warn!("No palette entry #{}", index),
                    }
                }
                GuiAction::ClearOverride => {
                    if let Some(key) = self.session.clear_override() {
                        info!("Cleared override on {}", key);
                    }
                }
                GuiAction::CloseMenu => self.session.close_menu(),
                GuiAction::CloseInspector => self.session.close_inspector(),
                GuiAction::ResetCamera => self.camera.reset(),
            }
        }
    }

    /// Whether the pointer is over a panel, so the scene should not react.
    pub fn egui_wants_pointer(&self) -> bool {
        self.gui_state.wants_pointer()
    }

    /// A camera drag keeps the pointer even over panels.
    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    pub fn set_shift_pressed(&mut self, pressed: bool) {
        self.input.set_shift_pressed(pressed);
    }

    /// Pointer position in physical pixels.
    pub fn pointer_moved(&mut self, position: Vec2) {
        self.input
            .pointer_moved(position, &mut self.camera, &mut self.session);
    }

    pub fn pointer_left(&mut self) {
        self.input.pointer_left(&mut self.session);
    }

    pub fn pointer_button(&mut self, button: PointerButton, pressed: bool) {
        self.input
            .pointer_button(button, pressed, &self.camera, &mut self.session);
    }

    /// Wheel lines, positive away from the user.
    pub fn scroll(&mut self, lines: f32) {
        self.camera.zoom(lines);
    }

    /// Close the menu, then the inspector.
    pub fn dismiss(&mut self) {
        if self.session.menu().is_open() {
            self.session.close_menu();
        } else {
            self.session.close_inspector();
        }
    }

    pub fn resize(&mut self, new_size: (u32, u32)) {
        self.size = new_size;
        self.config.width = new_size.0;
        self.config.height = new_size.1;
        if new_size.0 != 0 && new_size.1 != 0 {
            let surface = match &self.surface {
                Some(surface) => surface,
                None => return,
            };
            surface.configure(&self.device, &self.config);
            self.renderer.resize(&self.device, new_size);
            self.input.resize(new_size);
        }
    }

    pub fn recreate_surface(&mut self, display_target: Arc<impl RenderTarget>) {
        if self.size.0 != 0 && self.size.1 != 0 {
            let surface = self
                .instance
                .create_surface(display_target)
                .expect("Failed to create surface");
            self.config = Self::create_config(&surface, &self.adapter, self.size);
            surface.configure(&self.device, &self.config);
            self.surface = Some(surface);
        }
    }

    pub fn destroy_surface(&mut self) {
        self.surface = None;
    }

    pub fn render(&mut self, display_target: &impl RenderTarget) -> RenderResult {
        self.handle_gui_events();
        self.poll_loads();

        let surface = match &self.surface {
            Some(surface) => surface,
            None => return RenderResult::NoSurface,
        };

        let start_time = Instant::now();
        if let Some(last_render_time) = self.last_render_time {
            if self.camera.update(start_time - last_render_time) {
                self.renderer.camera_changed();
                self.input.camera_moved(&self.camera, &mut self.session);
            }
        }
        self.last_render_time = Some(start_time);
        self.renderer
            .prepare(&self.queue, &self.camera, self.session.scene());

        let output = loop {
            match surface.get_current_texture() {
                Ok(output) => break output,
                Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                    warn!("Surface is lost or outdated, drop this frame.");
                    return RenderResult::SurfaceLost;
                }
                Err(SurfaceError::OutOfMemory) => {
                    panic!("Out of memory when allocating a frame.");
                }
                Err(SurfaceError::Timeout) => {
                    warn!("Timed out when allocating a frame");
                }
            }
        };
        let texture_view = output
            .texture
            .create_view(&TextureViewDescriptor::default());
        let mut ongoing_state = OngoingRenderState::new(&self.device, &texture_view, &self.renderer);

        self.renderer.render(&mut ongoing_state);

        let load_indicator = match self.loads.progress() {
            Some(progress) => LoadIndicator::Loading {
                display_name: &progress.display_name,
                fraction: progress.fraction(),
            },
            None => LoadIndicator::Idle,
        };
        let native_pixels_per_point = display_target.native_pixels_per_point();
        let full_output = self.gui_state.run(
            &self.session,
            self.viewer_config.palette.entries(),
            load_indicator,
            native_pixels_per_point,
        );
        let mut event_handler = self
            .gui_state
            .event_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.size.0, self.size.1],
            pixels_per_point: full_output.pixels_per_point,
        };
        event_handler.handle_platform_output(full_output.platform_output);
        let paint_jobs = event_handler
            .egui_context()
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        drop(event_handler);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.gui_state
                .renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        self.gui_state.renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut ongoing_state.encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        self.gui_state.renderer.render(
            &mut ongoing_state.render_pass,
            &paint_jobs,
            &screen_descriptor,
        );
        ongoing_state.finish(&self.queue);
        for id in &full_output.textures_delta.free {
            self.gui_state.renderer.free_texture(id);
        }

        display_target.pre_present_notify();
        output.present();
        display_target.request_redraw();
        RenderResult::Succeed
    }
}
