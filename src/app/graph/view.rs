use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use hullgraph::layout::{GroupState, TerritoryShape};

use super::super::render_utils::{
    UNGROUPED_COLOR, blend_color, circle_visible, draw_background, group_color, with_opacity,
    world_to_screen,
};
use super::super::{SearchMatchCache, ViewModel};

const TOOLTIP_ATTRIBUTE_ROWS: usize = 8;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn group_summary(group: &GroupState) -> String {
    let placed = group.members.len();
    let listed = group.member_ids.len();
    if placed == listed {
        format!("{}\n{placed} members", group.name)
    } else {
        format!("{}\n{placed} of {listed} members shown", group.name)
    }
}

fn draw_tooltip(painter: &Painter, rect: Rect, anchor: Pos2, text: String) {
    let galley = painter.layout_no_wrap(text, FontId::proportional(13.0), Color32::from_gray(235));
    let mut frame = Rect::from_min_size(anchor + vec2(14.0, 14.0), galley.size()).expand(6.0);
    if frame.right() > rect.right() {
        frame = frame.translate(vec2(rect.right() - frame.right(), 0.0));
    }
    if frame.bottom() > rect.bottom() {
        frame = frame.translate(vec2(0.0, rect.bottom() - frame.bottom()));
    }

    painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(12, 14, 18, 235));
    painter.galley(frame.min + vec2(6.0, 6.0), galley, Color32::from_gray(235));
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_cache
            && cached.layout_revision == self.layout_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .layout
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| fuzzy_match_score(&matcher, &node.id, query).is_some())
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            layout_revision: self.layout_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        self.update_screen_space(rect);
        let hovered = self.hovered_index(ui);
        self.handle_node_drag(&response, hovered);

        if self.live_physics && self.layout.is_running() {
            self.layout.tick();
            self.update_screen_space(rect);
            ui.ctx().request_repaint();
        } else if response.dragged() {
            ui.ctx().request_repaint();
        }

        if self.layout.store().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No records match the current selection.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        let search_matches = self.cached_search_matches();
        self.draw_territories(&painter, rect);
        self.draw_nodes(&painter, rect, hovered, search_matches.as_deref());

        let pointer = ui.input(|input| input.pointer.hover_pos());
        if let Some(pointer) = pointer {
            if let Some(index) = hovered.or_else(|| {
                self.dragging
                    .as_deref()
                    .and_then(|id| self.layout.store().index_of(id))
            }) {
                draw_tooltip(&painter, rect, pointer, self.node_tooltip(index));
            } else if let Some(group) = self.hovered_territory(ui, rect) {
                let summary = group_summary(&self.layout.groups()[group]);
                draw_tooltip(&painter, rect, pointer, summary);
            }
        }
    }

    fn draw_territories(&self, painter: &Painter, rect: Rect) {
        for (index, group) in self.layout.groups().iter().enumerate() {
            let Some(territory) = &group.territory else {
                continue;
            };

            let (fill_opacity, stroke_opacity) = match self.hovered_group {
                Some(hovered) if hovered == index => (0.25, 0.6),
                Some(_) => (0.05, 0.1),
                None => (0.2, 0.5),
            };
            let color = group_color(index);
            let fill = with_opacity(color, fill_opacity);
            let stroke = Stroke::new(1.5, with_opacity(color, stroke_opacity));

            match territory.shape {
                TerritoryShape::Diamond { radius } => {
                    let center = world_to_screen(rect, self.pan, self.zoom, territory.centroid);
                    let radius = radius * self.zoom;
                    if circle_visible(rect, center, radius) {
                        painter.circle(center, radius, fill, stroke);
                    }
                }
                TerritoryShape::Hull => {
                    let points = territory
                        .outline
                        .iter()
                        .map(|&point| world_to_screen(rect, self.pan, self.zoom, point))
                        .collect::<Vec<_>>();
                    if Rect::from_points(&points).intersects(rect) {
                        painter.add(Shape::convex_polygon(points, fill, stroke));
                    }
                }
            }
        }
    }

    fn draw_nodes(
        &self,
        painter: &Painter,
        rect: Rect,
        hovered: Option<usize>,
        search_matches: Option<&HashSet<usize>>,
    ) {
        let scratch = &self.view_scratch;
        let highlight = Color32::from_rgb(103, 196, 255);

        for (index, node) in self.layout.nodes().iter().enumerate() {
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];
            if !circle_visible(rect, position, radius + 24.0) {
                continue;
            }

            let base = node
                .groups
                .first()
                .map_or(UNGROUPED_COLOR, |&group| group_color(group));
            let in_focus = self
                .hovered_group
                .is_none_or(|group| node.is_member_of(group));
            let is_match = search_matches.is_some_and(|matches| matches.contains(&index));

            let color = if hovered == Some(index) {
                Color32::from_rgb(255, 164, 101)
            } else if is_match {
                blend_color(base, highlight, 0.68)
            } else if !in_focus {
                with_opacity(base, 0.1)
            } else if search_matches.is_some() {
                with_opacity(base, 0.35)
            } else {
                base
            };

            painter.circle_filled(position, radius, color);
            let outline = if node.is_pinned() {
                Stroke::new(2.0, Color32::WHITE)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, outline);

            let should_draw_label =
                in_focus && (hovered == Some(index) || is_match || self.zoom > 0.35);
            if should_draw_label {
                painter.text(
                    position - vec2(0.0, radius + 5.0),
                    Align2::CENTER_BOTTOM,
                    &node.id,
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }
    }

    fn node_tooltip(&self, index: usize) -> String {
        let Some(node) = self.layout.nodes().get(index) else {
            return String::new();
        };

        let mut lines = vec![node.id.clone()];
        if let Some(record) = self.dataset.record(&node.id) {
            lines.extend(
                record
                    .display_attributes()
                    .filter(|(_, value)| *value != node.id)
                    .take(TOOLTIP_ATTRIBUTE_ROWS)
                    .map(|(key, value)| format!("{key}: {value}")),
            );
        }
        let groups = node
            .groups
            .iter()
            .filter_map(|&group| self.layout.groups().get(group))
            .map(|group| group.name.as_str())
            .collect::<Vec<_>>();
        if !groups.is_empty() {
            lines.push(format!("groups: {}", groups.join(", ")));
        }

        lines.join("\n")
    }
}
