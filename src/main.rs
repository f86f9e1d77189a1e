use anyhow::{Context, Result};
use biokg::{Config, NodeNormalizer, Pipeline, QueryContext, QueryKind};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "biokg")]
#[command(about = "Turn biomedical knowledge-graph triples into a cleaned graph and report")]
struct Args {
    /// JSON file holding the upstream triple list
    input: PathBuf,

    /// Query kind that produced the triples
    #[arg(short, long, default_value = "run-query")]
    kind: QueryKind,

    /// Entity the query was issued for
    #[arg(short, long)]
    entity: Option<String>,

    /// Predicate used by the query
    #[arg(short, long)]
    predicate: Option<String>,

    /// Anchor id (repeatable)
    #[arg(short, long = "anchor")]
    anchors: Vec<String>,

    /// Do not call the node normalization service
    #[arg(long)]
    skip_normalization: bool,

    /// Write graph JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the markdown report here
    #[arg(short, long)]
    report: Option<PathBuf>,
}

fn load_config() -> Result<Config> {
    let explicit = std::env::var("BIOKG_CONFIG").is_ok();
    if explicit || Path::new("config.toml").exists() {
        Config::load()
    } else {
        let _ = dotenv::dotenv();
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.biokg.log_level.as_str()),
    )
    .init();

    let args = Args::parse();
    let started = Instant::now();

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let triples: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.input.display()))?;

    let mut context = QueryContext::new(args.kind);
    context.query_entity_id = args.entity;
    context.predicate_used = args.predicate;
    context.anchor_ids = args.anchors.into_iter().collect();

    let pipeline = Pipeline::new(&config)?;
    let normalizer = if args.skip_normalization {
        log::info!("Normalization disabled; raw ids are kept");
        None
    } else {
        log::info!("Normalizer: {}", config.normalizer.base_url);
        Some(NodeNormalizer::from_config(&config.normalizer)?)
    };

    let artifact = pipeline.run(&triples, &context, normalizer.as_ref()).await?;

    let graph_json = serde_json::to_string_pretty(&artifact.graph_json)?;
    match &args.output {
        Some(path) => std::fs::write(path, &graph_json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", graph_json),
    }

    match &args.report {
        Some(path) => std::fs::write(path, &artifact.report)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => eprintln!("{}", artifact.report),
    }

    let c = artifact.counters;
    log::info!(
        "Done in {:.2?}: {} triples in, {} filtered ({} entities), {} nodes / {} links out",
        started.elapsed(),
        c.original_triples,
        c.filtered_triples,
        c.filtered_nodes,
        c.final_nodes,
        c.final_links
    );

    Ok(())
}
