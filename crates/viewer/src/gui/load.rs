use std::sync::mpsc::Sender;

use egui::Ui;

use super::GuiAction;

/// Platform file picking. Implementations send [`GuiAction::Load`] once the
/// user has chosen a file.
pub trait ModelLoaderGui {
    fn ui(&self, ui: &mut Ui, gui_actions_tx: &mut Sender<GuiAction>);
}

#[derive(Default)]
pub struct NotSupportedModelLoaderGui {}

impl ModelLoaderGui for NotSupportedModelLoaderGui {
    fn ui(&self, ui: &mut Ui, _gui_actions_tx: &mut Sender<GuiAction>) {
        ui.label("Opening local files is not supported here.");
    }
}
