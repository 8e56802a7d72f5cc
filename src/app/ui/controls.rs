use eframe::egui::{self, Ui};

use super::super::ViewModel;

fn choice_label(choice: Option<&str>, none_label: &'static str) -> String {
    choice.map_or_else(|| none_label.to_owned(), str::to_owned)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.add_space(4.0);

        ui.label("Search");
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Fuzzy match node labels")
                .desired_width(f32::INFINITY),
        );

        ui.separator();

        let mut group_by = self.selection.group_by.clone();
        egui::ComboBox::from_label("Group by")
            .selected_text(choice_label(group_by.as_deref(), "file groups"))
            .show_ui(ui, |ui| {
                for choice in &self.group_by_choices {
                    ui.selectable_value(
                        &mut group_by,
                        choice.clone(),
                        choice_label(choice.as_deref(), "file groups"),
                    );
                }
            });
        if group_by != self.selection.group_by {
            self.selection.group_by = group_by;
            self.rebuild_layout();
        }

        let mut filter_attribute = self.filter_attribute.clone();
        egui::ComboBox::from_label("Filter by")
            .selected_text(choice_label(filter_attribute.as_deref(), "no filter"))
            .show_ui(ui, |ui| {
                for choice in &self.group_by_choices {
                    ui.selectable_value(
                        &mut filter_attribute,
                        choice.clone(),
                        choice_label(choice.as_deref(), "no filter"),
                    );
                }
            });
        if filter_attribute != self.filter_attribute {
            self.set_filter_attribute(filter_attribute);
        }

        if !self.filter_values.is_empty() {
            let mut changed = false;
            ui.horizontal(|ui| {
                if ui.small_button("All").clicked() {
                    self.filter_values.iter_mut().for_each(|entry| entry.enabled = true);
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    self.filter_values.iter_mut().for_each(|entry| entry.enabled = false);
                    changed = true;
                }
            });
            for entry in &mut self.filter_values {
                changed |= ui.checkbox(&mut entry.enabled, entry.value.as_str()).changed();
            }
            if changed {
                self.apply_filter();
            }
        }

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep ticking the layout while it is still warm.");
        if ui
            .button("Reheat")
            .on_hover_text("Raise the temperature so the layout settles again.")
            .clicked()
        {
            self.layout.reheat();
        }

        ui.separator();

        let undefined = self
            .layout
            .groups()
            .iter()
            .filter(|group| group.territory.is_none())
            .count();
        egui::Grid::new("layout_stats").num_columns(2).show(ui, |ui| {
            ui.label("Nodes");
            ui.label(self.layout.nodes().len().to_string());
            ui.end_row();
            ui.label("Groups");
            ui.label(self.layout.groups().len().to_string());
            ui.end_row();
            ui.label("Without territory");
            ui.label(undefined.to_string());
            ui.end_row();
            ui.label("Alpha");
            ui.label(format!("{:.4}", self.layout.alpha()));
            ui.end_row();
            ui.label("Forces");
            ui.label(
                self.layout
                    .forces()
                    .iter()
                    .map(|term| term.label())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            ui.end_row();
            ui.label("State");
            ui.label(if self.layout.is_running() { "running" } else { "at rest" });
            ui.end_row();
        });
    }
}
