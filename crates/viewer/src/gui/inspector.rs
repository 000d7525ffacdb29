use egui::{Align2, Context, Grid, Window};

use super::{swatch, GuiAction, GuiParam};

pub fn inspector_panel(ctx: &Context, param: &mut GuiParam) {
    let Some(info) = param.session.inspector() else {
        return;
    };
    let mut open = true;
    Window::new("Inspector")
        .open(&mut open)
        .resizable([false, false])
        .anchor(Align2::RIGHT_TOP, [-8.0, 8.0])
        .show(ctx, |ui| {
            Grid::new("inspector_grid")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    ui.label("Name");
                    ui.label(info.name.as_str());
                    ui.end_row();

                    ui.label("Dimensions");
                    ui.label(info.dimensions_label());
                    ui.end_row();

                    ui.label("Center");
                    ui.label(info.center_label());
                    ui.end_row();

                    ui.label("Triangles");
                    ui.label(info.triangle_count.to_string());
                    ui.end_row();

                    ui.label("Material");
                    ui.horizontal(|ui| {
                        swatch(ui, &info.material);
                        ui.label(info.material.to_string());
                    });
                    ui.end_row();

                    ui.label("Override");
                    ui.label(if info.overridden { "Yes" } else { "No" });
                    ui.end_row();
                });
        });
    if !open {
        let _ = param.gui_actions_tx.send(GuiAction::CloseInspector);
    }
}
