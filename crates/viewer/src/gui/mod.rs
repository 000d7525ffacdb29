use std::sync::mpsc::Sender;

use context_menu::context_menu;
use egui::{vec2, Color32, Context, Sense, Ui};
use error::error_dialog;
use inspector::inspector_panel;
use status::status_panel;

use crate::{loader::ByteSource, session::ViewSession, treatment::Treatment};

mod context_menu;
mod error;
pub mod event;
mod inspector;
pub mod load;
pub(crate) mod state;
mod status;

pub use load::{ModelLoaderGui, NotSupportedModelLoaderGui};

#[derive(Default)]
pub struct GuiState {
    errors: Vec<String>,
    location: String,
}

impl GuiState {
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error)
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

#[derive(Debug, Clone)]
pub enum GuiAction {
    Load(ByteSource),
    /// Index into the palette.
    ApplyOverride(usize),
    ClearOverride,
    CloseMenu,
    CloseInspector,
    ResetCamera,
}

/// Loading indicator contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadIndicator<'a> {
    Idle,
    Loading {
        display_name: &'a str,
        fraction: Option<f32>,
    },
}

pub struct GuiParam<'a> {
    pub session: &'a ViewSession,
    pub palette: &'a [Treatment],
    pub load_indicator: LoadIndicator<'a>,
    /// Physical pixels per egui point.
    pub pixels_per_point: f32,
    pub model_loader: &'a dyn ModelLoaderGui,
    pub gui_actions_tx: &'a mut Sender<GuiAction>,
}

pub(crate) fn swatch(ui: &mut Ui, treatment: &Treatment) {
    let [red, green, blue] = treatment.srgb_u8();
    let (rect, _) = ui.allocate_exact_size(vec2(14.0, 14.0), Sense::hover());
    ui.painter()
        .rect_filled(rect, 2.0, Color32::from_rgb(red, green, blue));
}

pub fn gui_main(ctx: &Context, mut param: GuiParam, state: &mut GuiState) {
    status_panel(ctx, &mut param, &mut state.location);
    inspector_panel(ctx, &mut param);
    context_menu(ctx, &mut param);

    let mut remove_index = Vec::new();
    for (index, error) in state.errors.iter().enumerate() {
        error_dialog(ctx, index, error, || {
            remove_index.push(index);
        });
    }
    for index in remove_index.into_iter().rev() {
        state.errors.remove(index);
    }
}
