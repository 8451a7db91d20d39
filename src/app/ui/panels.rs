use std::path::Path;
use std::sync::Arc;

use eframe::egui::{self, Align, Context, Layout, Vec2};
use tracing::info;

use taxonomy_network::layout::LayoutEngine;
use taxonomy_network::network::NetworkSession;
use taxonomy_network::taxonomy::{EntityKind, TaxonomyData};

use super::super::{ViewModel, ViewerSource};

impl ViewModel {
    pub(in crate::app) fn new(data: Arc<TaxonomyData>, source: &ViewerSource) -> Self {
        let mut model = Self {
            data,
            session: NetworkSession::new(source.config.limits),
            engine: LayoutEngine::new(source.config.layout.clone()),
            search: String::new(),
            search_cache: None,
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            layout_dirty: false,
            requested_size: None,
            layout_size: None,
            last_pass: None,
            layout_passes: 0,
            centrality_pending: true,
        };

        if let Some((id, kind)) = &source.initial_center {
            model.open_entity(id, *kind);
        }
        model
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, data_path: &Path) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("taxonomy-network");
                    ui.separator();
                    ui.label(format!("data: {}", data_path.display()));
                    ui.label(format!("occupations: {}", self.data.occupation_count()));
                    ui.label(format!("skills: {}", self.data.skill_count()));
                    ui.label(format!("relations: {}", self.data.relations().len()));
                    if self.centrality_pending {
                        ui.spinner();
                        ui.label("ranking...");
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let state = self.session.state();
                        if !state.is_empty() {
                            ui.label(format!(
                                "nodes: {}  edges: {}",
                                state.nodes.len(),
                                state.edges.len()
                            ));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_navigation(ui);
            ui.add_space(4.0);
            self.draw_graph(ui);
        });
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        self.selected = selected;
    }

    fn after_navigation(&mut self) {
        self.layout_dirty = true;
        self.selected = Some(self.session.state().center_node_id.clone());
    }

    pub(in crate::app) fn open_entity(&mut self, id: &str, kind: EntityKind) {
        self.session.open(&self.data, id, kind);
        self.engine.invalidate();
        self.layout_size = None;
        self.reset_view();
        self.after_navigation();
        info!(center = id, %kind, "explore");
    }

    pub(in crate::app) fn recenter(&mut self, node_id: &str) {
        if self.session.recenter(&self.data, node_id) {
            self.after_navigation();
        }
    }

    pub(in crate::app) fn go_back(&mut self) {
        if self.session.go_back(&self.data) {
            self.after_navigation();
        }
    }

    pub(in crate::app) fn go_to_history(&mut self, index: usize) {
        if self.session.go_to_history(&self.data, index) {
            self.after_navigation();
        }
    }
}
