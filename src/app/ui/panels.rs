use std::collections::HashMap;
use std::path::Path;

use eframe::egui::{self, Align, Context, Layout as UiLayout, Vec2};

use hullgraph::dataset::{Dataset, Filter};
use hullgraph::layout::Layout;

use super::super::{DataSource, FilterValue, ViewModel, ViewScratch};

impl ViewModel {
    pub(in crate::app) fn new(dataset: Dataset, source: &DataSource) -> Self {
        let selection = source.selection.clone();
        let (nodes, groups) = dataset.select(&selection, &HashMap::new());
        let layout = Layout::new(nodes, groups, source.config);

        let mut view = Self {
            dataset,
            layout,
            filter_attribute: selection.filter.as_ref().map(|filter| filter.attribute.clone()),
            selection,
            group_by_choices: Vec::new(),
            filter_values: Vec::new(),
            search: String::new(),
            search_cache: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: true,
            dragging: None,
            hovered_group: None,
            layout_revision: 0,
            view_scratch: ViewScratch::default(),
        };
        view.refresh_choices();
        view
    }

    /// Swaps in a freshly loaded dataset, keeping the viewer's selection,
    /// camera and node positions.
    pub(in crate::app) fn reloaded(dataset: Dataset, previous: &ViewModel) -> Self {
        let prior = previous.positions_by_id();
        let (nodes, groups) = dataset.select(&previous.selection, &prior);
        let layout = Layout::new(nodes, groups, *previous.layout.config());

        let mut view = Self {
            dataset,
            layout,
            selection: previous.selection.clone(),
            group_by_choices: Vec::new(),
            filter_attribute: previous.filter_attribute.clone(),
            filter_values: Vec::new(),
            search: previous.search.clone(),
            search_cache: None,
            pan: previous.pan,
            zoom: previous.zoom,
            live_physics: previous.live_physics,
            dragging: None,
            hovered_group: None,
            layout_revision: previous.layout_revision + 1,
            view_scratch: ViewScratch::default(),
        };
        view.refresh_choices();
        view
    }

    fn positions_by_id(&self) -> HashMap<String, Vec2> {
        self.layout
            .nodes()
            .iter()
            .map(|node| (node.id.clone(), node.position))
            .collect()
    }

    fn refresh_choices(&mut self) {
        self.group_by_choices = std::iter::once(None)
            .chain(self.dataset.attribute_names().into_iter().map(Some))
            .collect();

        let Some(attribute) = self.filter_attribute.as_deref() else {
            self.filter_values.clear();
            return;
        };
        let active = self
            .selection
            .filter
            .as_ref()
            .filter(|filter| filter.attribute == attribute);
        self.filter_values = self
            .dataset
            .distinct_values(attribute)
            .into_iter()
            .map(|value| FilterValue {
                enabled: active.is_none_or(|filter| filter.values.contains(&value)),
                value,
            })
            .collect();
    }

    /// Switches the filter attribute and enables all of its values.
    pub(in crate::app) fn set_filter_attribute(&mut self, attribute: Option<String>) {
        self.filter_attribute = attribute;
        self.selection.filter = None;
        self.refresh_choices();
        self.apply_filter();
    }

    pub(in crate::app) fn apply_filter(&mut self) {
        self.selection.filter = self.filter_attribute.as_ref().map(|attribute| {
            Filter::new(
                attribute.clone(),
                self.filter_values
                    .iter()
                    .filter(|entry| entry.enabled)
                    .map(|entry| entry.value.clone()),
            )
        });
        self.rebuild_layout();
    }

    /// Feeds the current selection back into the engine. Surviving nodes
    /// keep their positions.
    pub(in crate::app) fn rebuild_layout(&mut self) {
        let prior = self.positions_by_id();
        let (nodes, groups) = self.dataset.select(&self.selection, &prior);
        self.layout.load(nodes, groups);
        self.dragging = None;
        self.hovered_group = None;
        self.layout_revision += 1;
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        dataset_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("hullgraph");
                    ui.separator();
                    ui.label(format!("dataset: {}", dataset_path.display()));
                    ui.label(format!("records: {}", self.dataset.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload dataset"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(UiLayout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "alpha {:.3}  |  tick {}",
                            self.layout.alpha(),
                            self.layout.ticks()
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_controls(ui);
                    ui.separator();
                    self.draw_legend(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }
}
