use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};

use hullgraph::dataset::{Dataset, DatasetOptions, Selection, load_dataset};
use hullgraph::layout::{Layout, LayoutConfig};

mod graph;
mod render_utils;
mod ui;

/// Where the viewer reads its dataset from and how it lays it out.
#[derive(Clone, Debug)]
pub struct DataSource {
    pub path: PathBuf,
    pub options: DatasetOptions,
    pub selection: Selection,
    pub config: LayoutConfig,
}

pub struct HullGraphApp {
    source: DataSource,
    state: AppState,
    reload_rx: Option<Receiver<Result<Dataset, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dataset, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    dataset: Dataset,
    layout: Layout,
    selection: Selection,
    /// `None` groups by the file's own group list.
    group_by_choices: Vec<Option<String>>,
    filter_attribute: Option<String>,
    filter_values: Vec<FilterValue>,
    search: String,
    search_cache: Option<SearchMatchCache>,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    dragging: Option<String>,
    hovered_group: Option<usize>,
    layout_revision: u64,
    view_scratch: ViewScratch,
}

struct FilterValue {
    value: String,
    enabled: bool,
}

struct SearchMatchCache {
    query: String,
    layout_revision: u64,
    matches: Arc<HashSet<usize>>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
}

impl HullGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: DataSource) -> Self {
        let state = Self::start_load(&source);
        Self {
            source,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: &DataSource) -> Receiver<Result<Dataset, String>> {
        let (tx, rx) = mpsc::channel();
        let path = source.path.clone();
        let options = source.options.clone();

        thread::spawn(move || {
            let result = load_dataset(&path, &options).map_err(|error| {
                let error = anyhow::Error::from(error);
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: &DataSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }
}

impl eframe::App for HullGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(dataset) => {
                            AppState::Ready(Box::new(ViewModel::new(dataset, &self.source)))
                        }
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading {}...", self.source.path.display()));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load dataset");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.source));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source.path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.source));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(dataset)) => {
                            transition = Some(AppState::Ready(Box::new(ViewModel::reloaded(
                                dataset, model,
                            ))));
                        }
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
