use eframe::egui::{self, Color32, RichText, Ui};

use taxonomy_network::taxonomy::{EntityKind, RelationKind};

use super::super::ViewModel;
use super::super::render_utils::{
    ESSENTIAL_EDGE_COLOR, OCCUPATION_COLOR, OPTIONAL_EDGE_COLOR, OUTER_COLOR, SKILL_COLOR,
};

const RELATED_ROWS: usize = 60;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node to see its details.");
            ui.separator();
            draw_legend(ui);
            return;
        };
        let Some(node) = self.session.state().node(&selected_id).cloned() else {
            ui.label("Selected node is no longer part of the graph.");
            ui.separator();
            draw_legend(ui);
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(format!("{}  ·  {}", node.kind, node.code));
        ui.add_space(6.0);

        ui.label(format!("Hop distance: {}", node.distance));
        if let Some(degree) = node.degree {
            ui.label(format!("Degree: {degree}"));
        }
        if let Some(centrality) = node.centrality {
            ui.label(format!("Centrality: {centrality:.2}"));
        }
        if let Some(value) = node.signalling_value {
            ui.label(format!("Signalling value: {value:.2}"));
        }
        let entity = self.data.entity_by_id(&node.id, node.kind);
        if entity.is_some_and(|entity| entity.is_unseen_economy()) {
            ui.label(RichText::new("Unseen economy occupation").color(Color32::from_rgb(246, 206, 104)));
        }

        let related = self
            .data
            .partners(&node.id, node.kind)
            .into_iter()
            .map(|related| {
                (
                    related.entity.id.clone(),
                    related.entity.label.clone(),
                    related.entity.kind,
                    related.relation.relation_type,
                )
            })
            .collect::<Vec<_>>();

        ui.separator();
        let heading = match node.kind {
            EntityKind::Occupation => "Skills",
            EntityKind::Skill => "Occupations",
        };
        ui.label(RichText::new(format!("{heading} ({})", related.len())).strong());

        let mut open = None;
        egui::ScrollArea::vertical()
            .id_salt("related_entities_scroll")
            .max_height(360.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (id, label, kind, relation) in related.iter().take(RELATED_ROWS) {
                    let marker = match relation {
                        RelationKind::Essential => RichText::new("●").color(ESSENTIAL_EDGE_COLOR),
                        RelationKind::Optional => RichText::new("○").color(OPTIONAL_EDGE_COLOR),
                    };
                    ui.horizontal(|ui| {
                        ui.label(marker);
                        if ui.link(label.as_str()).clicked() {
                            open = Some((id.clone(), *kind));
                        }
                    });
                }
                if related.len() > RELATED_ROWS {
                    ui.small(format!("and {} more", related.len() - RELATED_ROWS));
                }
            });

        if let Some((id, kind)) = open {
            if self.session.state().node(&id).is_some() {
                self.recenter(&id);
            } else {
                self.open_entity(&id, kind);
            }
        }

        ui.separator();
        draw_legend(ui);
    }
}

fn legend_swatch(ui: &mut Ui, color: Color32, text: &str) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("●").color(color));
        ui.label(text);
    });
}

fn draw_legend(ui: &mut Ui) {
    ui.label(RichText::new("Legend").strong());
    legend_swatch(ui, OCCUPATION_COLOR, "Occupation");
    legend_swatch(ui, SKILL_COLOR, "Skill");
    legend_swatch(ui, OUTER_COLOR, "Two or more hops away");
    legend_swatch(ui, ESSENTIAL_EDGE_COLOR, "Essential relation");
    legend_swatch(ui, OPTIONAL_EDGE_COLOR, "Optional relation");
    ui.small("Larger nodes are closer to the center. Click a node to explore it.");
}
