use eframe::egui::{self, RichText, Ui};

use taxonomy_network::taxonomy::EntityKind;
use taxonomy_network::util::truncate_label;

use super::super::render_utils::kind_color;
use super::super::{SearchCache, SearchHit, ViewModel};

const SEARCH_LIMIT: usize = 40;
const BREADCRUMB_MAX_CHARS: usize = 28;

impl ViewModel {
    fn search_results(&mut self) -> &[SearchHit] {
        let query = self.search.trim();
        let stale = self
            .search_cache
            .as_ref()
            .is_none_or(|cached| cached.query != query);
        if stale {
            let results = self
                .data
                .search(query, SEARCH_LIMIT)
                .into_iter()
                .map(SearchHit::from)
                .collect::<Vec<_>>();
            self.search_cache = Some(SearchCache {
                query: query.to_owned(),
                results,
            });
        }

        self.search_cache
            .as_ref()
            .map(|cached| cached.results.as_slice())
            .unwrap_or_default()
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Search");
        ui.add_space(4.0);
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("occupation or skill")
                .desired_width(f32::INFINITY),
        );
        ui.add_space(4.0);

        let mut picked = None;
        let has_query = !self.search.trim().is_empty();
        let results = self.search_results().to_vec();
        if results.is_empty() && has_query {
            ui.label("No matches.");
        }
        egui::ScrollArea::vertical()
            .id_salt("search_results_scroll")
            .max_height(320.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for hit in &results {
                    ui.horizontal(|ui| {
                        let tag = match hit.kind {
                            EntityKind::Occupation => "Occ",
                            EntityKind::Skill => "Skill",
                        };
                        ui.label(RichText::new(tag).small().color(kind_color(hit.kind)));
                        if ui
                            .link(truncate_label(&hit.label, 44).into_owned())
                            .on_hover_text(format!("{} ({})", hit.label, hit.code))
                            .clicked()
                        {
                            picked = Some((hit.id.clone(), hit.kind));
                        }
                    });
                }
            });
        if let Some((id, kind)) = picked {
            self.open_entity(&id, kind);
        }

        ui.separator();
        self.draw_truncation(ui);

        ui.separator();
        ui.label(RichText::new("Layout").strong());
        ui.horizontal(|ui| {
            let has_graph = !self.session.state().is_empty();
            if ui
                .add_enabled(has_graph, egui::Button::new("Reheat"))
                .clicked()
            {
                self.reheat_layout();
            }
            if ui.button("Reset view").clicked() {
                self.reset_view();
            }
        });
        if let Some(pass) = self.last_pass {
            ui.label(format!(
                "last pass: {}  |  completed passes: {}",
                pass.label(),
                self.layout_passes
            ));
        }
        ui.small(format!("zoom {:.2}x", self.zoom));
    }

    fn draw_truncation(&self, ui: &mut Ui) {
        ui.label(RichText::new("Neighbourhood").strong());
        let state = self.session.state();
        if state.is_empty() {
            ui.label("Nothing selected.");
            return;
        }
        if !state.has_connections() {
            ui.label("This entity has no related entries.");
            return;
        }

        let limits = self.session.limits();
        for (distance, limit) in [(1u8, limits.dist1), (2, limits.dist2), (3, limits.dist3)] {
            let Some(stats) = state.truncation_stats.level(distance) else {
                continue;
            };
            let text = format!(
                "hop {distance}: {} nodes, {} of {} links shown (top {limit})",
                state.count_at_distance(distance),
                stats.shown,
                stats.total
            );
            if stats.is_truncated() {
                ui.label(RichText::new(text).color(egui::Color32::from_rgb(241, 146, 94)));
            } else {
                ui.label(text);
            }
        }
        if state.is_truncated {
            ui.small("Showing the most central connections at each hop.");
        }
    }

    pub(in crate::app) fn draw_navigation(&mut self, ui: &mut Ui) {
        let mut back = false;
        let mut jump = None;
        let history = self.session.history();
        if history.is_empty() {
            return;
        }

        ui.horizontal_wrapped(|ui| {
            if ui
                .add_enabled(self.session.can_go_back(), egui::Button::new("< Previous"))
                .clicked()
            {
                back = true;
            }
            ui.separator();

            let last = history.len() - 1;
            for (index, entry) in history.iter().enumerate() {
                if index > 0 {
                    ui.label(">");
                }
                let text = truncate_label(&entry.label, BREADCRUMB_MAX_CHARS).into_owned();
                if index == last {
                    ui.label(RichText::new(text).strong())
                        .on_hover_text(entry.label.as_str());
                } else if ui.link(text).on_hover_text(entry.label.as_str()).clicked() {
                    jump = Some(index);
                }
            }
        });

        if back {
            self.go_back();
        } else if let Some(index) = jump {
            self.go_to_history(index);
        }
    }
}
