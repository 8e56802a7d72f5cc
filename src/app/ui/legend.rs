use eframe::egui::{Sense, Ui, vec2};

use super::super::ViewModel;
use super::super::render_utils::group_color;

impl ViewModel {
    /// Lists every group with its territory color. Hovering a row
    /// highlights that group in the canvas; clicking centers the view on it.
    pub(in crate::app) fn draw_legend(&mut self, ui: &mut Ui) {
        ui.heading("Groups");
        ui.add_space(4.0);

        if self.layout.groups().is_empty() {
            ui.label("No groups in the current selection.");
            self.hovered_group = None;
            return;
        }

        let mut hovered = None;
        let mut focus = None;
        for (index, group) in self.layout.groups().iter().enumerate() {
            ui.horizontal(|ui| {
                let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                ui.painter().rect_filled(swatch, 2.0, group_color(index));

                let label = format!("{} ({})", group.name, group.members.len());
                let row = ui.selectable_label(self.hovered_group == Some(index), label);
                let row = if group.territory.is_none() {
                    row.on_hover_text("No territory: too few distinct positions")
                } else {
                    row
                };
                if row.hovered() {
                    hovered = Some(index);
                }
                if row.clicked() {
                    focus = group.centroid();
                }
            });
        }

        self.hovered_group = hovered;
        if let Some(centroid) = focus {
            self.pan = -centroid * self.zoom;
        }
    }
}
