use egui::{Align2, Context, ProgressBar, TextEdit, Window};

use crate::loader::ByteSource;

use super::{GuiAction, GuiParam, LoadIndicator};

pub fn status_panel(ctx: &Context, param: &mut GuiParam, location: &mut String) {
    Window::new("Model")
        .resizable([false, false])
        .anchor(Align2::LEFT_TOP, [8.0, 8.0])
        .show(ctx, |ui| {
            match param.session.scene() {
                Some(scene) => {
                    ui.label(scene.display_name());
                    ui.label(format!("{} components", scene.len()));
                }
                None => {
                    ui.label("No model loaded");
                }
            }
            if let LoadIndicator::Loading {
                display_name,
                fraction,
            } = param.load_indicator
            {
                ui.separator();
                match fraction {
                    Some(fraction) => {
                        ui.add(
                            ProgressBar::new(fraction)
                                .text(format!("Loading {}", display_name))
                                .show_percentage(),
                        );
                    }
                    None => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(format!("Loading {}", display_name));
                        });
                    }
                }
            }

            ui.separator();
            param.model_loader.ui(ui, param.gui_actions_tx);
            ui.horizontal(|ui| {
                let edit = ui.add(
                    TextEdit::singleline(location)
                        .hint_text("URL or path")
                        .desired_width(180.0),
                );
                let submitted =
                    edit.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
                let clicked = ui
                    .add_enabled(!location.trim().is_empty(), egui::Button::new("Load"))
                    .clicked();
                if (submitted || clicked) && !location.trim().is_empty() {
                    let _ = param
                        .gui_actions_tx
                        .send(GuiAction::Load(ByteSource::from_location(location.trim())));
                }
            });

            ui.separator();
            if ui.button("Reset camera").clicked() {
                let _ = param.gui_actions_tx.send(GuiAction::ResetCamera);
            }
            ui.small("Drag to orbit, shift-drag to pan, scroll to zoom.");
            ui.small("Click a part to inspect it, right-click to recolor.");
            ui.small("Draco-compressed meshes are not supported.");
        });
}
