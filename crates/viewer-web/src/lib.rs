#![cfg(any(target_arch = "wasm32", target_arch = "wasm64"))]

use std::sync::{mpsc::Sender, Arc};

use log::Level;
use rfd::AsyncFileDialog;
use viewer::{
    config::ViewerConfig,
    egui::Ui,
    gui::{GuiAction, ModelLoaderGui},
    loader::ByteSource,
    winit::{
        winit::{platform::web::WindowAttributesExtWebSys, window::WindowAttributes},
        App, AppCallback,
    },
};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, UrlSearchParams};

const CANVAS_ID: &str = "viewer-canvas";
/// Query parameter overriding the startup model. An empty value disables it.
const MODEL_PARAM: &str = "model";

struct WebAppCallback {
    canvas: HtmlCanvasElement,
}

impl AppCallback for WebAppCallback {
    fn window_creating(&mut self, param: WindowAttributes) -> WindowAttributes {
        param.with_canvas(Some(self.canvas.clone()))
    }
}

#[derive(Default)]
struct WebModelLoaderGui;

impl ModelLoaderGui for WebModelLoaderGui {
    fn ui(&self, ui: &mut Ui, gui_actions_tx: &mut Sender<GuiAction>) {
        if ui.button("Open .glb…").clicked() {
            let tx = gui_actions_tx.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Some(file) = AsyncFileDialog::new()
                    .add_filter("GLTF binary file", &["glb"])
                    .pick_file()
                    .await
                {
                    let name = file.file_name();
                    let bytes = file.read().await;
                    let _ = tx.send(GuiAction::Load(ByteSource::Data { name, bytes }));
                }
            });
        }
    }
}

fn viewer_config(window: &web_sys::Window) -> ViewerConfig {
    let mut config = ViewerConfig::default();
    let model = window
        .location()
        .search()
        .ok()
        .and_then(|search| UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get(MODEL_PARAM));
    if let Some(model) = model {
        config.default_model = Some(model).filter(|model| !model.trim().is_empty());
    }
    config
}

#[wasm_bindgen]
pub fn run() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(Level::Warn).expect("Failed to setup logger");
    let window = web_sys::window().expect("Failed to get window object");
    let config = viewer_config(&window);
    let canvas: HtmlCanvasElement = window
        .document()
        .and_then(|doc| doc.get_element_by_id(CANVAS_ID))
        .expect("Canvas not found")
        .dyn_into()
        .expect("#viewer-canvas is not a <canvas>");
    App::<WebAppCallback>::run(
        WebAppCallback { canvas },
        Arc::new(WebModelLoaderGui),
        config,
    );
}
