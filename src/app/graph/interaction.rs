use eframe::egui::{self, PointerButton, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::{screen_to_world, territory_under, world_to_screen};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Pins the node under the pointer for the length of a primary drag.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        if response.drag_started_by(PointerButton::Primary)
            && let Some(node) = hovered.and_then(|index| self.layout.nodes().get(index))
        {
            let id = node.id.clone();
            let position = node.position;
            if self.layout.start_pin(&id, position) {
                self.dragging = Some(id);
            }
        } else if response.dragged_by(PointerButton::Primary)
            && let Some(id) = self.dragging.as_deref()
            && let Some(pin) = self.layout.store().node(id).and_then(|node| node.pin)
        {
            self.layout.move_pin(id, pin + response.drag_delta() / self.zoom);
        }

        if response.drag_stopped()
            && let Some(id) = self.dragging.take()
        {
            self.layout.end_pin(&id);
        }
    }

    pub(in crate::app) fn update_screen_space(&mut self, rect: Rect) {
        let scratch = &mut self.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();

        for node in self.layout.nodes() {
            scratch
                .screen_positions
                .push(world_to_screen(rect, self.pan, self.zoom, node.position));
            scratch.screen_radii.push((node.radius * self.zoom).max(1.5));
        }
    }

    /// Topmost node under the pointer. Later nodes are drawn on top.
    pub(in crate::app) fn hovered_index(&self, ui: &Ui) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        let scratch = &self.view_scratch;

        (0..scratch.screen_positions.len())
            .rev()
            .find(|&index| scratch.screen_positions[index].distance(pointer) <= scratch.screen_radii[index])
    }

    /// Last-drawn group whose territory covers the pointer.
    pub(in crate::app) fn hovered_territory(&self, ui: &Ui, rect: Rect) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }
        let world = screen_to_world(rect, self.pan, self.zoom, pointer);

        self.layout
            .groups()
            .iter()
            .enumerate()
            .rev()
            .find(|(_, group)| {
                group
                    .territory
                    .as_ref()
                    .is_some_and(|territory| territory_under(territory, world))
            })
            .map(|(index, _)| index)
    }
}
