//! Note map CLI.
//!
//! Provides the `notemap` binary. Documents are read from a JSON array file;
//! every subcommand prints machine-readable JSON to stdout and logs to
//! stderr (`RUST_LOG`, default `info`).
//!
//! Exit codes: 0 = success, 1 = invalid input, 2 = source error,
//! 3 = computation error.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use notemap_core::{
    edge_style, style_for, BuildOutput, CancelToken, CoreError, DataQualityWarning, Dimensionality,
    EdgeStyle, EmbeddingSource, GraphSnapshot, GraphStats, JsonFileSource, MapConfig, NoteId,
    Position, SimilarityGraphBuilder, SourceError, StyleDescriptor,
};
use notemap_layout::{LayoutEngine, LayoutError, LayoutResult, PinOverlay};
use notemap_session::HighlightSet;

/// Note similarity maps from precomputed embeddings.
#[derive(Parser)]
#[command(name = "notemap", about = "Note similarity maps from precomputed embeddings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build the graph and lay it out.
    Map {
        #[command(flatten)]
        filters: Filters,

        /// Layout strategy: force, tree, radial or spiral.
        #[arg(short, long)]
        strategy: Option<String>,

        /// Number of axes: 2 or 3.
        #[arg(short, long)]
        dims: Option<u8>,

        /// Fix a node in place: `id=x,y` or `id=x,y,z`. Repeatable.
        #[arg(long = "pin", value_name = "ID=X,Y[,Z]")]
        pins: Vec<String>,
    },
    /// Print graph statistics and data-quality warnings.
    Stats {
        #[command(flatten)]
        filters: Filters,
    },
    /// Print a node's highlight set: the node, its neighbours and edges.
    Neighbors {
        #[command(flatten)]
        filters: Filters,

        /// Node id to focus.
        #[arg(short, long)]
        node: String,
    },
}

/// Input and graph-construction flags shared by every subcommand.
#[derive(Args)]
struct Filters {
    /// JSON array of documents.
    #[arg(short, long)]
    input: PathBuf,

    /// JSON configuration file; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum cosine similarity for an edge, within (0, 1).
    #[arg(long)]
    min_similarity: Option<f32>,

    /// Neighbours kept per node.
    #[arg(long)]
    top_k: Option<usize>,

    /// Maximum number of nodes.
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Drop nodes without edges.
    #[arg(long)]
    no_isolates: bool,

    /// Keep only notes with this tag. Repeatable.
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,
}

/// A failed command: message for stderr plus exit code.
#[derive(Debug)]
struct Failure {
    code: i32,
    message: String,
}

impl Failure {
    fn input(message: impl Into<String>) -> Self {
        Failure {
            code: 1,
            message: message.into(),
        }
    }
}

impl From<CoreError> for Failure {
    fn from(err: CoreError) -> Self {
        Failure {
            code: if err.is_input_error() { 1 } else { 3 },
            message: err.to_string(),
        }
    }
}

impl From<SourceError> for Failure {
    fn from(err: SourceError) -> Self {
        Failure {
            code: 2,
            message: err.to_string(),
        }
    }
}

impl From<LayoutError> for Failure {
    fn from(err: LayoutError) -> Self {
        Failure {
            code: if err.is_input_error() { 1 } else { 3 },
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct MapOutput {
    graph: GraphSnapshot,
    layout: LayoutResult,
    styles: BTreeMap<NoteId, StyleDescriptor>,
    edge_styles: Vec<EdgeStyle>,
    warnings: Vec<DataQualityWarning>,
}

#[derive(Serialize)]
struct StatsOutput {
    stats: GraphStats,
    warnings: Vec<DataQualityWarning>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Map {
            filters,
            strategy,
            dims,
            pins,
        } => run_map(&filters, strategy.as_deref(), dims, &pins),
        Commands::Stats { filters } => run_stats(&filters),
        Commands::Neighbors { filters, node } => run_neighbors(&filters, &node),
    };

    match result {
        Ok(json) => println!("{}", json),
        Err(failure) => {
            eprintln!("Error: {}", failure.message);
            process::exit(failure.code);
        }
    }
}

/// Execute the map subcommand.
fn run_map(
    filters: &Filters,
    strategy: Option<&str>,
    dims: Option<u8>,
    pins: &[String],
) -> Result<String, Failure> {
    let mut config = load_config(filters)?;
    if let Some(name) = strategy {
        config.strategy = name.parse()?;
    }
    if let Some(axes) = dims {
        config.dimensionality = Dimensionality::try_from(axes)?;
    }
    let overlay = PinOverlay::new();
    for arg in pins {
        let (id, position) = parse_pin(arg, config.dimensionality)?;
        overlay.pin(id, position);
    }

    let BuildOutput { mut graph, warnings } = build(filters, &config)?;
    for id in overlay.retain(|id| graph.contains(id)) {
        tracing::warn!(%id, "pinned note is not in the graph");
    }

    let layout = LayoutEngine::with_seed(config.seed).layout_with(
        &graph,
        config.strategy,
        config.dimensionality,
        None,
        &overlay,
        &CancelToken::new(),
    )?;
    graph.apply_positions(|id| layout.get(id).map(|p| (p.position, p.pinned)));
    tracing::info!(
        nodes = layout.len(),
        iterations = layout.iterations,
        strategy = %layout.strategy,
        "layout settled"
    );

    let styles = graph
        .nodes()
        .map(|node| (node.id.clone(), style_for(node, false)))
        .collect();
    let edge_styles = graph.edges().map(|edge| edge_style(edge, false)).collect();
    to_json(&MapOutput {
        graph: graph.snapshot(),
        layout,
        styles,
        edge_styles,
        warnings,
    })
}

/// Execute the stats subcommand.
fn run_stats(filters: &Filters) -> Result<String, Failure> {
    let config = load_config(filters)?;
    let BuildOutput { graph, warnings } = build(filters, &config)?;
    to_json(&StatsOutput {
        stats: graph.stats().clone(),
        warnings,
    })
}

/// Execute the neighbors subcommand.
fn run_neighbors(filters: &Filters, node: &str) -> Result<String, Failure> {
    let config = load_config(filters)?;
    let BuildOutput { graph, .. } = build(filters, &config)?;
    let id = NoteId::new(node);
    let set = HighlightSet::compute(&graph, &id)
        .ok_or_else(|| Failure::input(format!("node '{}' is not in the graph", node)))?;
    to_json(&set)
}

/// Reads the config file (if any) and applies flag overrides.
fn load_config(filters: &Filters) -> Result<MapConfig, Failure> {
    let mut config = match &filters.config {
        Some(path) => MapConfig::from_json_file(path).map_err(|e| {
            Failure::input(format!("failed to read config '{}': {}", path.display(), e))
        })?,
        None => MapConfig::default(),
    };
    let params = &mut config.graph;
    if let Some(min_similarity) = filters.min_similarity {
        params.min_similarity = min_similarity;
    }
    if let Some(top_k) = filters.top_k {
        params.top_k = top_k;
    }
    if let Some(max_nodes) = filters.max_nodes {
        params.max_nodes = max_nodes;
    }
    if filters.no_isolates {
        params.include_isolates = false;
    }
    if !filters.tags.is_empty() {
        params.tag_filter = Some(filters.tags.clone());
    }
    config.validate()?;
    Ok(config)
}

fn build(filters: &Filters, config: &MapConfig) -> Result<BuildOutput, Failure> {
    let source = JsonFileSource::new(&filters.input);
    let documents = source.list_documents(config.graph.tags()).map_err(|e| Failure {
        code: 2,
        message: format!("failed to read documents '{}': {}", filters.input.display(), e),
    })?;
    let output = SimilarityGraphBuilder::new(config.graph.clone())?.build(&documents)?;
    for warning in &output.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!(
        nodes = output.graph.node_count(),
        edges = output.graph.edge_count(),
        coverage = output.graph.stats().coverage,
        "graph built"
    );
    Ok(output)
}

/// Parses `id=x,y` or `id=x,y,z`. A 2-D layout ignores any z value.
fn parse_pin(arg: &str, dims: Dimensionality) -> Result<(NoteId, Position), Failure> {
    let invalid = || Failure::input(format!("invalid pin '{}', expected ID=X,Y[,Z]", arg));
    let (id, coords) = arg.rsplit_once('=').ok_or_else(invalid)?;
    if id.is_empty() {
        return Err(invalid());
    }
    let values = coords
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    let position = match values.as_slice() {
        [x, y] => Position::planar(*x, *y),
        [x, y, z] if dims.is_3d() => Position::new(*x, *y, *z),
        [x, y, _] => Position::planar(*x, *y),
        _ => return Err(invalid()),
    };
    if !position.is_finite() {
        return Err(invalid());
    }
    Ok((NoteId::new(id), position))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Failure> {
    serde_json::to_string_pretty(value).map_err(|e| Failure {
        code: 3,
        message: format!("failed to serialize result: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pins() {
        let (id, pos) = parse_pin("a=1.5,-2", Dimensionality::Two).unwrap();
        assert_eq!(id, NoteId::from("a"));
        assert_eq!(pos, Position::planar(1.5, -2.0));

        let (_, pos) = parse_pin("b=1,2,3", Dimensionality::Three).unwrap();
        assert_eq!(pos, Position::new(1.0, 2.0, 3.0));
        let (_, pos) = parse_pin("b=1,2,3", Dimensionality::Two).unwrap();
        assert_eq!(pos.z, 0.0);

        for bad in ["a", "=1,2", "a=1", "a=x,2", "a=1,2,3,4", "a=inf,0"] {
            let err = parse_pin(bad, Dimensionality::Two).err().unwrap();
            assert_eq!(err.code, 1, "{bad}");
        }
    }

    #[test]
    fn error_exit_codes() {
        assert_eq!(Failure::from(CoreError::UnknownStrategy { name: "x".into() }).code, 1);
        assert_eq!(Failure::from(CoreError::Cancelled).code, 3);
        let source = SourceError::Unavailable { reason: "down".into() };
        assert_eq!(Failure::from(source).code, 2);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
