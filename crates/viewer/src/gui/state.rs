use std::sync::{
    mpsc::{self, TryRecvError},
    Arc, Mutex, PoisonError,
};

use egui::FullOutput;
use egui_wgpu::Renderer as EguiRenderer;
use wgpu::{Device, TextureFormat};

use crate::{renderer::DEPTH_TEXTURE_FORMAT, session::ViewSession, treatment::Treatment};

use super::{
    event::GuiEventHandler, gui_main, load::ModelLoaderGui, GuiAction, GuiParam, GuiState,
    LoadIndicator,
};

pub(crate) struct EguiState<EventHandler: GuiEventHandler> {
    pub renderer: EguiRenderer,
    pub event_handler: Arc<Mutex<EventHandler>>,
    pub state: GuiState,
    pub gui_actions_tx: mpsc::Sender<GuiAction>,
    pub gui_actions_rx: mpsc::Receiver<GuiAction>,
    model_loader: Arc<dyn ModelLoaderGui>,
}

impl<EventHandler: GuiEventHandler> EguiState<EventHandler> {
    pub fn new(
        device: &Device,
        format: TextureFormat,
        event_handler: Arc<Mutex<EventHandler>>,
        model_loader: Arc<dyn ModelLoaderGui>,
    ) -> Self {
        let egui_renderer = EguiRenderer::new(device, format, Some(DEPTH_TEXTURE_FORMAT), 1, false);

        let (gui_actions_tx, gui_actions_rx) = mpsc::channel();
        Self {
            renderer: egui_renderer,
            event_handler,
            state: GuiState::default(),
            gui_actions_tx,
            gui_actions_rx,
            model_loader,
        }
    }

    pub fn recv_events(&mut self) -> Result<GuiAction, TryRecvError> {
        self.gui_actions_rx.try_recv()
    }

    /// Whether egui wants the pointer, so the scene should ignore it.
    pub fn wants_pointer(&self) -> bool {
        let event_handler = self
            .event_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let ctx = event_handler.egui_context();
        ctx.is_pointer_over_area() || ctx.is_using_pointer()
    }

    pub fn run(
        &mut self,
        session: &ViewSession,
        palette: &[Treatment],
        load_indicator: LoadIndicator,
        native_pixels_per_point: f32,
    ) -> FullOutput {
        let mut event_handler = self
            .event_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let input = event_handler.take_egui_input();
        let ctx = event_handler.egui_context();
        let pixels_per_point = ctx.zoom_factor() * native_pixels_per_point;
        ctx.run(input, |ctx| {
            gui_main(
                ctx,
                GuiParam {
                    session,
                    palette,
                    load_indicator,
                    pixels_per_point,
                    model_loader: self.model_loader.as_ref(),
                    gui_actions_tx: &mut self.gui_actions_tx,
                },
                &mut self.state,
            );
        })
    }
}
