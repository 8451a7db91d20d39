use std::collections::HashMap;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, Vec2, vec2};
use tracing::debug;

use taxonomy_network::util::truncate_label;

use super::super::ViewModel;
use super::super::render_utils::{
    blend_color, circle_visible, draw_background, edge_style, edge_visible, layout_to_world,
    node_color, node_opacity, node_radius, with_opacity, world_to_screen,
};

const LABEL_MAX_CHARS: usize = 32;

impl ViewModel {
    /// Lays the current graph out for `size` when the graph or canvas changed.
    fn ensure_layout(&mut self, size: Vec2) {
        let size_changed = self
            .requested_size
            .is_none_or(|previous| (previous - size).abs().max_elem() > 0.5);
        if !self.layout_dirty && !size_changed {
            return;
        }
        self.requested_size = Some(size);
        self.layout_dirty = false;

        let state = self.session.state_mut();
        if state.is_empty() {
            return;
        }
        let center_id = state.center_node_id.clone();
        let mut completed = 0usize;
        let status = self.engine.layout(
            &mut state.nodes,
            &state.edges,
            size.x,
            size.y,
            &center_id,
            || completed += 1,
        );

        if status.pass.executed() {
            self.layout_size = Some(size);
            self.layout_passes += completed;
        }
        self.last_pass = Some(status.pass);
        debug!(pass = status.pass.label(), width = size.x, height = size.y, "canvas layout");
    }

    pub(in crate::app) fn reheat_layout(&mut self) {
        let state = self.session.state_mut();
        let mut completed = 0usize;
        let status = self
            .engine
            .reheat(&mut state.nodes, &state.edges, || completed += 1);
        self.layout_passes += completed;
        self.last_pass = Some(status.pass);
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        if self.session.state().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Search for an occupation or skill to explore its network.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.ensure_layout(rect.size());
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let Some(layout_size) = self.layout_size else {
            return;
        };
        let pan = self.pan;
        let zoom = self.zoom;
        let radius_scale = zoom.powf(0.5).clamp(0.6, 2.2);

        let state = self.session.state();
        let screen_positions = state
            .nodes
            .iter()
            .map(|node| {
                let (x, y) = node.position()?;
                Some(world_to_screen(rect, pan, zoom, layout_to_world(layout_size, x, y)))
            })
            .collect::<Vec<_>>();
        let screen_radii = state
            .nodes
            .iter()
            .map(|node| node_radius(node.distance) * radius_scale)
            .collect::<Vec<_>>();
        let index_by_id = state
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index))
            .collect::<HashMap<_, _>>();

        let hovered = Self::hovered_index(ui, &screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }
        let hovered_id = hovered.map(|index| state.nodes[index].id.as_str());

        for edge in &state.edges {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(edge.source.as_str()),
                index_by_id.get(edge.target.as_str()),
            ) else {
                continue;
            };
            let (Some(start), Some(end)) = (screen_positions[source], screen_positions[target])
            else {
                continue;
            };
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let max_distance = state.nodes[source].distance.max(state.nodes[target].distance);
            let (width, mut color) = edge_style(edge.relation_type, max_distance);
            let touches_hover = hovered_id
                .is_some_and(|id| id == edge.source.as_str() || id == edge.target.as_str());
            if touches_hover {
                color = with_opacity(color, 0.9);
            }
            painter.line_segment(
                [start, end],
                Stroke::new(width * zoom.sqrt().clamp(0.6, 2.0), color),
            );
        }

        // Outer rings first so the center stays on top.
        let mut draw_order = (0..state.nodes.len()).collect::<Vec<_>>();
        draw_order.sort_by(|a, b| state.nodes[*b].distance.cmp(&state.nodes[*a].distance));

        let selected_color = Color32::from_rgb(245, 206, 93);
        for index in draw_order {
            let node = &state.nodes[index];
            let Some(position) = screen_positions[index] else {
                continue;
            };
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius + 4.0) {
                continue;
            }

            let is_hovered = hovered == Some(index);
            let is_selected = self.selected.as_deref() == Some(node.id.as_str());
            let mut color = with_opacity(node_color(node.kind, node.distance), node_opacity(node.distance));
            if is_hovered {
                color = blend_color(color, Color32::from_rgb(255, 164, 101), 0.55);
            }
            if is_selected {
                color = blend_color(color, selected_color, 0.7);
            }

            painter.circle_filled(position, radius, color);
            let border = if node.distance == 0 { 3.0 } else { 1.0 };
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(border, Color32::from_rgba_unmultiplied(13, 61, 56, 220)),
            );

            let show_label = node.distance == 0
                || is_hovered
                || is_selected
                || (node.distance == 1 && zoom > 0.8)
                || zoom > 1.8;
            if show_label {
                let text_color = if node.distance >= 2 {
                    Color32::from_gray(170)
                } else {
                    Color32::from_gray(238)
                };
                let size = if node.distance == 0 { 14.0 } else { 12.0 };
                painter.text(
                    position + vec2(0.0, radius + 3.0),
                    Align2::CENTER_TOP,
                    truncate_label(&node.label, LABEL_MAX_CHARS),
                    FontId::proportional(size),
                    text_color,
                );
            }
        }

        if let Some(index) = hovered {
            let node = &state.nodes[index];
            let mut text = format!("{}  |  {}  |  {}", node.label, node.kind, node.code);
            if let Some(degree) = node.degree {
                text.push_str(&format!("  |  degree {degree}"));
            }
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        let clicked = response
            .clicked_by(egui::PointerButton::Primary)
            .then(|| hovered.map(|index| state.nodes[index].id.clone()));
        if let Some(clicked) = clicked {
            self.apply_graph_click(clicked);
        }

        if response.dragged() {
            ui.ctx().request_repaint();
        }
    }

    fn apply_graph_click(&mut self, clicked: Option<String>) {
        let Some(node_id) = clicked else {
            self.set_selected(None);
            return;
        };

        let is_center = self
            .session
            .state()
            .node(&node_id)
            .is_some_and(|node| node.distance == 0);
        if is_center {
            self.set_selected(Some(node_id));
        } else {
            self.recenter(&node_id);
        }
    }
}
