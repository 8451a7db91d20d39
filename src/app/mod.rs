use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use taxonomy_network::config::ExplorerConfig;
use taxonomy_network::layout::{LayoutEngine, LayoutPass};
use taxonomy_network::network::NetworkSession;
use taxonomy_network::taxonomy::{
    CentralityIndex, Entity, EntityKind, TaxonomyData, load_centrality, load_taxonomy,
};

mod graph;
mod render_utils;
mod ui;

/// Where the viewer reads its inputs from.
pub struct ViewerSource {
    pub data_path: PathBuf,
    pub centrality_path: Option<PathBuf>,
    pub initial_center: Option<(String, EntityKind)>,
    pub config: ExplorerConfig,
}

pub struct ExplorerApp {
    source: Arc<ViewerSource>,
    state: AppState,
    centrality_rx: Option<Receiver<Result<CentralityIndex, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<TaxonomyData, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    data: Arc<TaxonomyData>,
    session: NetworkSession,
    engine: LayoutEngine,
    search: String,
    search_cache: Option<SearchCache>,
    selected: Option<String>,
    pan: Vec2,
    zoom: f32,
    layout_dirty: bool,
    requested_size: Option<Vec2>,
    layout_size: Option<Vec2>,
    last_pass: Option<LayoutPass>,
    layout_passes: usize,
    centrality_pending: bool,
}

struct SearchCache {
    query: String,
    results: Vec<SearchHit>,
}

#[derive(Clone)]
struct SearchHit {
    id: String,
    code: String,
    label: String,
    kind: EntityKind,
}

impl From<&Entity> for SearchHit {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            code: entity.code.clone(),
            label: entity.label.clone(),
            kind: entity.kind,
        }
    }
}

impl ExplorerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: ViewerSource) -> Self {
        let source = Arc::new(source);
        let state = Self::start_load(&source);
        Self {
            source,
            state,
            centrality_rx: None,
        }
    }

    fn start_load(source: &Arc<ViewerSource>) -> AppState {
        let (tx, rx) = mpsc::channel();
        let path = source.data_path.clone();

        thread::spawn(move || {
            let result = load_taxonomy(&path).map_err(|error| error.to_string());
            let _ = tx.send(result);
        });

        AppState::Loading { rx }
    }

    fn spawn_centrality(
        source: &ViewerSource,
        data: Arc<TaxonomyData>,
    ) -> Receiver<Result<CentralityIndex, String>> {
        let (tx, rx) = mpsc::channel();
        let path = source.centrality_path.clone();

        thread::spawn(move || {
            let result = match path {
                Some(path) => load_centrality(&path).map_err(|error| error.to_string()),
                None => Ok(CentralityIndex::from_taxonomy(&data)),
            };
            let _ = tx.send(result);
        });

        rx
    }

    fn poll_centrality(&mut self) {
        let AppState::Ready(model) = &mut self.state else {
            return;
        };
        let Some(rx) = self.centrality_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(Ok(index)) => {
                info!(
                    skills = index.metadata().skill_count,
                    occupations = index.metadata().occupation_count,
                    "centrality index ready"
                );
                if model.session.attach_centrality(&model.data, Arc::new(index)) {
                    model.layout_dirty = true;
                }
                model.centrality_pending = false;
            }
            Ok(Err(error)) => {
                warn!(%error, "centrality index unavailable, ranking by relation order");
                model.centrality_pending = false;
            }
            Err(TryRecvError::Empty) => {
                self.centrality_rx = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                warn!("centrality worker disconnected");
                model.centrality_pending = false;
            }
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(data) => {
                                let data = Arc::new(data);
                                self.centrality_rx =
                                    Some(Self::spawn_centrality(&self.source, Arc::clone(&data)));
                                AppState::Ready(Box::new(ViewModel::new(data, &self.source)))
                            }
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading taxonomy...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the taxonomy");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.source));
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(ctx, &self.source.data_path);
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }

        self.poll_centrality();
        if self.centrality_rx.is_some() {
            ctx.request_repaint();
        }
    }
}
