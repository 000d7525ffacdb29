use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec2;
use log::{debug, warn};
use wgpu::rwh::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

pub use winit;

use crate::{
    config::ViewerConfig,
    controls::PointerButton,
    gui::{event::GuiEventHandler, ModelLoaderGui},
    loader::ByteSource,
    state::{RenderResult, State},
    RenderTarget,
};

/// Wheel pixels that count as one line.
const PIXELS_PER_LINE: f32 = 50.0;

pub trait AppCallback {
    fn window_creating(&mut self, param: WindowAttributes) -> WindowAttributes {
        param
            .with_title("GLB Viewer")
            .with_inner_size(PhysicalSize::new(1280, 800))
    }
}

#[derive(Default)]
pub struct NoOpAppCallback {}

impl AppCallback for NoOpAppCallback {}

struct WindowRenderTarget {
    window: Arc<Window>,
}

impl WindowRenderTarget {
    fn new(window: Window) -> Self {
        Self {
            window: Arc::new(window),
        }
    }
}

impl HasWindowHandle for WindowRenderTarget {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for WindowRenderTarget {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl RenderTarget for WindowRenderTarget {
    fn native_pixels_per_point(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    fn pre_present_notify(&self) {
        self.window.pre_present_notify();
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

pub struct WindowEventHandler {
    window: Arc<Window>,
    egui_state: egui_winit::State,
}

impl WindowEventHandler {
    fn new(window: Arc<Window>) -> Self {
        use egui::{Context, ViewportId};
        use egui_winit::State;

        let egui_state = State::new(
            Context::default(),
            ViewportId::default(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        Self { window, egui_state }
    }
}

impl GuiEventHandler for WindowEventHandler {
    fn egui_context(&self) -> &egui::Context {
        self.egui_state.egui_ctx()
    }

    fn take_egui_input(&mut self) -> egui::RawInput {
        self.egui_state.take_egui_input(&self.window)
    }

    fn handle_platform_output(&mut self, platform_output: egui::PlatformOutput) {
        self.egui_state
            .handle_platform_output(&self.window, platform_output)
    }
}

type AppState = State<'static, WindowEventHandler>;

/// State built asynchronously and handed back to the event loop.
pub struct CreatedState(AppState);

pub struct App<Callback: AppCallback> {
    state: Option<AppState>,
    creating_state: bool,
    render_target: Option<Arc<WindowRenderTarget>>,
    window_size: Option<PhysicalSize<u32>>,

    event_handler: Option<Arc<Mutex<WindowEventHandler>>>,

    model_loader: Arc<dyn ModelLoaderGui>,
    viewer_config: ViewerConfig,
    #[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
    proxy: EventLoopProxy<CreatedState>,
    callback: Callback,
}

impl<Callback: AppCallback + 'static> App<Callback> {
    pub fn run(
        callback: Callback,
        model_loader: Arc<dyn ModelLoaderGui>,
        viewer_config: ViewerConfig,
    ) {
        let event_loop = EventLoop::<CreatedState>::with_user_event()
            .build()
            .expect("Failed to create event loop");

        event_loop.set_control_flow(ControlFlow::Wait);

        let app = Self {
            state: None,
            creating_state: false,
            render_target: Default::default(),
            window_size: Default::default(),
            event_handler: None,
            model_loader,
            viewer_config,
            proxy: event_loop.create_proxy(),
            callback,
        };

        #[cfg(not(target_family = "wasm"))]
        {
            let mut app = app;
            event_loop
                .run_app(&mut app)
                .expect("Failed to run the application");
        }
        #[cfg(target_family = "wasm")]
        {
            use winit::platform::web::EventLoopExtWebSys;
            event_loop.spawn_app(app);
        }
    }
}

impl<Callback: AppCallback> App<Callback> {
    fn create_state(&mut self) {
        debug!("Create state requested");
        if self.state.is_some() || self.creating_state {
            warn!("Request to create state when already exists");
            return;
        }
        let Some(ref render_target) = self.render_target else {
            debug!("Window is none, don't create state");
            return;
        };
        let Some(size) = self.window_size.as_ref() else {
            debug!("Window size is none, don't create state");
            return;
        };
        if size.width == 0 || size.height == 0 {
            debug!("Size is zero, don't create state");
            return;
        }
        debug!("Creating state");

        let event_handler = Arc::new(Mutex::new(WindowEventHandler::new(
            render_target.window.clone(),
        )));
        self.event_handler = Some(event_handler.clone());

        let size = (size.width, size.height);
        let state = State::new(
            render_target.clone(),
            size,
            event_handler,
            self.model_loader.clone(),
            self.viewer_config.clone(),
        );

        #[cfg(not(target_family = "wasm"))]
        {
            use pollster::FutureExt;

            let mut state = state.block_on();
            state.load_default_model();
            self.state = Some(state);
        }
        #[cfg(target_family = "wasm")]
        {
            self.creating_state = true;
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = state.await;
                if proxy.send_event(CreatedState(state)).is_err() {
                    warn!("Event loop closed before the state was created");
                }
            });
        }
    }

    fn key_released(event: &winit::event::KeyEvent, code: KeyCode) -> bool {
        event.physical_key == PhysicalKey::Code(code)
            && !event.repeat
            && event.state == ElementState::Released
    }
}

impl<Callback: AppCallback> ApplicationHandler<CreatedState> for App<Callback> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        debug!("Resumed");
        let render_target = self.render_target.get_or_insert_with(|| {
            let param = WindowAttributes::default();
            let param = self.callback.window_creating(param);
            let window = event_loop
                .create_window(param)
                .expect("Failed to create window");
            debug!("Window created, reported size: {:?}", window.inner_size());
            Arc::new(WindowRenderTarget::new(window))
        });
        let size = render_target.window.inner_size();
        match &mut self.state {
            Some(state) => {
                debug!("Recreating state");
                state.recreate_surface(render_target.clone());
            }
            None => {
                self.window_size = Some(size);
                self.create_state();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: CreatedState) {
        let CreatedState(mut state) = event;
        debug!("State created");
        self.creating_state = false;
        if let Some(size) = self.window_size {
            state.resize((size.width, size.height));
        }
        state.load_default_model();
        self.state = Some(state);
        if let Some(render_target) = &self.render_target {
            render_target.request_redraw();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        debug!("Suspended");
        if let Some(state) = &mut self.state {
            state.destroy_surface();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(render_target) = self.render_target.as_mut() else {
            debug!("Event received when window is none, event: {:?}", event);
            return;
        };
        let state = match &mut self.state {
            Some(state) => state,
            None => {
                if let WindowEvent::Resized(new_size) = event {
                    debug!(
                        "Resized event received when state is none, new size: {:?}",
                        new_size
                    );
                    self.window_size = Some(new_size);
                    self.create_state();
                } else {
                    debug!("Event received when state is none: {:?}", event);
                }
                return;
            }
        };

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::RedrawRequested => {
                match state.render(render_target.as_ref()) {
                    RenderResult::Succeed => (),
                    RenderResult::NoSurface | RenderResult::SurfaceLost => {
                        state.recreate_surface(render_target.clone());
                        render_target.request_redraw();
                    }
                }
                return;
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width == 0 || new_size.height == 0 {
                    debug!("Resize to zero size: {:?}", new_size);
                    return;
                }
                self.window_size = Some(*new_size);
                state.resize((new_size.width, new_size.height));
            }
            _ => (),
        }

        let consumed = match self.event_handler.as_ref() {
            Some(event_handler) => {
                let mut event_handler = event_handler
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                event_handler
                    .egui_state
                    .on_window_event(&render_target.window, &event)
                    .consumed
            }
            None => false,
        };
        let scene_pointer = state.is_dragging() || !state.egui_wants_pointer();

        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                state.set_shift_pressed(modifiers.state().shift_key());
            }
            WindowEvent::DroppedFile(path) => {
                state.load(ByteSource::File(path));
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if Self::key_released(&event, KeyCode::F11) {
                    if render_target.window.fullscreen().is_some() {
                        render_target.window.set_fullscreen(None)
                    } else {
                        render_target
                            .window
                            .set_fullscreen(Some(Fullscreen::Borderless(None)))
                    }
                } else if !consumed && Self::key_released(&event, KeyCode::Escape) {
                    state.dismiss();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if scene_pointer {
                    state.pointer_moved(position);
                } else {
                    state.pointer_left();
                }
            }
            WindowEvent::CursorLeft { .. } => {
                state.pointer_left();
            }
            WindowEvent::MouseInput {
                state: element_state,
                button,
                ..
            } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return,
                };
                if scene_pointer {
                    state.pointer_button(button, element_state.is_pressed());
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if !scene_pointer {
                    return;
                }
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y_delta) => y_delta,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                state.scroll(lines);
            }
            _ => (),
        }
    }
}
