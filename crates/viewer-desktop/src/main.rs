use std::sync::Arc;

use log::info;
use viewer::{
    config::ViewerConfig,
    gui::ModelLoaderGui,
    winit::{App, NoOpAppCallback},
};

#[cfg(feature = "gui")]
#[derive(Default)]
struct DesktopModelLoaderGui {}

#[cfg(feature = "gui")]
impl ModelLoaderGui for DesktopModelLoaderGui {
    fn ui(
        &self,
        ui: &mut viewer::egui::Ui,
        gui_actions_tx: &mut std::sync::mpsc::Sender<viewer::gui::GuiAction>,
    ) {
        use rfd::FileDialog;
        use std::thread;
        use viewer::{gui::GuiAction, loader::ByteSource};

        if ui.button("Open .glb…").clicked() {
            let tx = gui_actions_tx.clone();
            thread::spawn(move || {
                if let Some(file) = FileDialog::new()
                    .add_filter("GLTF binary file", &["glb"])
                    .pick_file()
                {
                    let _ = tx.send(GuiAction::Load(ByteSource::File(file)));
                }
            });
        }
    }
}

fn model_loader() -> Arc<dyn ModelLoaderGui> {
    #[cfg(feature = "gui")]
    {
        Arc::new(DesktopModelLoaderGui::default())
    }
    #[cfg(not(feature = "gui"))]
    {
        Arc::new(viewer::gui::NotSupportedModelLoaderGui::default())
    }
}

fn main() {
    env_logger::init();

    let config = ViewerConfig::from_env();
    info!("Starting viewer, default model: {:?}", config.default_model);
    App::<NoOpAppCallback>::run(NoOpAppCallback::default(), model_loader(), config);
}
