use egui::{pos2, Area, Context, Frame, Id, Order};

use super::{swatch, GuiAction, GuiParam};

pub fn context_menu(ctx: &Context, param: &mut GuiParam) {
    let Some(anchor) = param.session.menu().anchor() else {
        return;
    };
    let target_name = param
        .session
        .scene()
        .and_then(|scene| scene.node(anchor.target))
        .map(|node| node.name().to_string())
        .unwrap_or_default();
    let position = pos2(
        anchor.position.x / param.pixels_per_point,
        anchor.position.y / param.pixels_per_point,
    );
    Area::new(Id::new("context_menu"))
        .order(Order::Foreground)
        .fixed_pos(position)
        .show(ctx, |ui| {
            Frame::menu(ui.style()).show(ui, |ui| {
                ui.set_min_width(140.0);
                ui.strong(target_name);
                ui.separator();
                for (index, treatment) in param.palette.iter().enumerate() {
                    ui.horizontal(|ui| {
                        swatch(ui, treatment);
                        if ui.button(treatment.name.as_str()).clicked() {
                            let _ = param.gui_actions_tx.send(GuiAction::ApplyOverride(index));
                        }
                    });
                }
                ui.separator();
                if ui.button("Remove Color").clicked() {
                    let _ = param.gui_actions_tx.send(GuiAction::ClearOverride);
                }
                if ui.button("Cancel").clicked() {
                    let _ = param.gui_actions_tx.send(GuiAction::CloseMenu);
                }
            });
        });
}
