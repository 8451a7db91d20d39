mod app;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use taxonomy_network::config::ExplorerConfig;
use taxonomy_network::layout::LayoutEngine;
use taxonomy_network::network::build_graph;
use taxonomy_network::taxonomy::{
    CentralityIndex, EntityKind, TaxonomyData, load_centrality, load_taxonomy, write_centrality,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Converted taxonomy dataset (JSON).
    #[arg(long, global = true, default_value = "public/data/taxonomy.json")]
    data: PathBuf,

    /// Precomputed centrality index; derived from the dataset when omitted.
    #[arg(long, global = true)]
    centrality: Option<PathBuf>,

    /// TOML file with `[limits]` and `[layout]` tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the network viewer.
    View(ViewArgs),
    /// Build and lay out one neighbourhood, printing it as JSON.
    Graph(GraphArgs),
    /// Derive the centrality index and write it as JSON.
    Centrality {
        #[arg(long, short, default_value = "centrality.json")]
        output: PathBuf,
    },
}

#[derive(Debug, Default, Args)]
struct ViewArgs {
    /// Entity to open on start.
    #[arg(long)]
    center: Option<String>,

    /// `occupation` or `skill`; defaults to occupation.
    #[arg(long)]
    kind: Option<EntityKind>,
}

#[derive(Debug, Args)]
struct GraphArgs {
    /// Id of the center entity.
    #[arg(long)]
    center: String,

    #[arg(long, default_value = "occupation")]
    kind: EntityKind,

    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    #[arg(long, default_value_t = 800.0)]
    height: f32,

    /// Overrides `layout.seed` from the config.
    #[arg(long)]
    seed: Option<u64>,

    /// Rank neighbours by relation order only.
    #[arg(long)]
    no_centrality: bool,

    #[arg(long)]
    pretty: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = ExplorerConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::View(ViewArgs::default())) {
        Command::View(args) => run_view(cli.data, cli.centrality, config, args),
        Command::Graph(args) => run_graph(&cli.data, cli.centrality.as_deref(), config, &args),
        Command::Centrality { output } => run_centrality(&cli.data, &output),
    }
}

fn run_view(
    data_path: PathBuf,
    centrality_path: Option<PathBuf>,
    config: ExplorerConfig,
    args: ViewArgs,
) -> Result<()> {
    let initial_center = args
        .center
        .map(|id| (id, args.kind.unwrap_or(EntityKind::Occupation)));
    let source = app::ViewerSource {
        data_path,
        centrality_path,
        initial_center,
        config,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "taxonomy-network",
        options,
        Box::new(move |cc| Ok(Box::new(app::ExplorerApp::new(cc, source)))),
    )
    .map_err(|error| anyhow::anyhow!("viewer failed: {error}"))
}

fn load_or_derive_centrality(path: Option<&Path>, data: &TaxonomyData) -> Result<CentralityIndex> {
    match path {
        Some(path) => load_centrality(path)
            .with_context(|| format!("failed to load centrality index {}", path.display())),
        None => Ok(CentralityIndex::from_taxonomy(data)),
    }
}

fn run_graph(
    data_path: &Path,
    centrality_path: Option<&Path>,
    mut config: ExplorerConfig,
    args: &GraphArgs,
) -> Result<()> {
    let data = load_taxonomy(data_path)
        .with_context(|| format!("failed to load taxonomy {}", data_path.display()))?;
    let centrality = if args.no_centrality {
        None
    } else {
        Some(load_or_derive_centrality(centrality_path, &data)?)
    };

    let mut state = build_graph(
        &args.center,
        args.kind,
        &data,
        centrality.as_ref(),
        config.limits,
    );
    if state.is_empty() {
        if let Some(entity) = data.find_entity(&args.center) {
            bail!(
                "`{}` is a {}, not a {}; pass `--kind {}`",
                args.center,
                entity.kind,
                args.kind,
                entity.kind
            );
        }
        bail!("no {} with id `{}` in {}", args.kind, args.center, data_path.display());
    }
    if !state.has_connections() {
        warn!(center = args.center.as_str(), "entity has no related entries");
    }

    if let Some(seed) = args.seed {
        config.layout.seed = seed;
    }
    let mut engine = LayoutEngine::new(config.layout);
    let center_id = state.center_node_id.clone();
    let status = engine.layout(
        &mut state.nodes,
        &state.edges,
        args.width,
        args.height,
        &center_id,
        || {},
    );
    info!(
        pass = status.pass.label(),
        nodes = state.nodes.len(),
        edges = state.edges.len(),
        truncated = state.is_truncated,
        "graph ready"
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&state)
    } else {
        serde_json::to_string(&state)
    }
    .context("failed to serialize graph")?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write graph")?;
    Ok(())
}

fn run_centrality(data_path: &Path, output: &Path) -> Result<()> {
    let data = load_taxonomy(data_path)
        .with_context(|| format!("failed to load taxonomy {}", data_path.display()))?;
    let index = CentralityIndex::from_taxonomy(&data);
    write_centrality(&index, output)
        .with_context(|| format!("failed to write centrality index {}", output.display()))?;

    let metadata = index.metadata();
    info!(
        output = %output.display(),
        skills = metadata.skill_count,
        occupations = metadata.occupation_count,
        max_skill_degree = metadata.max_skill_degree,
        "wrote centrality index"
    );
    Ok(())
}
