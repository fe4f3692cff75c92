//! lcoach-an - Lecture Analysis Service
//!
//! Command-line entry point over the analysis pipeline: score
//! precomputed analyzer summaries against the rubric, run the full
//! pipeline with events and persistence, or build a growth report from
//! stored history.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lcoach_an::config::RubricConfig;
use lcoach_an::db::{init_database_pool, SqliteResultStore};
use lcoach_an::growth::GrowthAnalyzer;
use lcoach_an::pipeline::agents::{
    AgentId, AgentOutput, AnalyzerAgent, FileProbeExtractor, PrecomputedAgent,
    TranscriptDiscourseAnalyzer,
};
use lcoach_an::pipeline::{PipelineOrchestrator, ResultStore};
use lcoach_an::scoring::RubricEngine;
use lcoach_an::types::{EvaluationInput, SummaryBundle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lcoach-an", version, about = "Lecture coaching analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline over precomputed analyzer summaries
    Analyze {
        /// JSON file with the analyzer summaries
        #[arg(long)]
        input: PathBuf,
        /// Source video the summaries were computed from
        #[arg(long)]
        video: PathBuf,
        /// SQLite database for result persistence; defaults to
        /// lcoach.db under the resolved data root
        #[arg(long)]
        db: Option<PathBuf>,
        /// Rubric configuration TOML; defaults to the platform config
        /// file when one exists
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Score a summary bundle directly, without the pipeline
    Score {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Growth report over stored evaluations
    Growth {
        #[arg(long)]
        db: Option<PathBuf>,
        /// Video path prefix identifying the teacher
        #[arg(long)]
        prefix: String,
        #[arg(long, default_value_t = 52)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting lcoach-an");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze {
            input,
            video,
            db,
            config,
        } => analyze(input, video, db, config).await,
        Command::Score { input, config } => score(input, config),
        Command::Growth { db, prefix, limit } => growth(db, prefix, limit).await,
    }
}

fn load_bundle(path: &PathBuf) -> Result<SummaryBundle> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn load_engine(config: Option<PathBuf>) -> Result<RubricEngine> {
    let path = config.or_else(lcoach_an::config::discover_config_file);
    Ok(RubricEngine::new(RubricConfig::load_or_default(
        path.as_deref(),
    ))?)
}

fn resolve_db_path(db: Option<PathBuf>) -> Result<PathBuf> {
    match db {
        Some(path) => Ok(path),
        None => Ok(lcoach_an::config::default_db_path(None)?),
    }
}

async fn analyze(
    input: PathBuf,
    video: PathBuf,
    db: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let bundle = load_bundle(&input)?;
    let engine = load_engine(config)?;

    let analyzers: Vec<Arc<dyn AnalyzerAgent>> = vec![
        Arc::new(PrecomputedAgent::new(
            AgentId::Vision,
            bundle.vision.clone().map(AgentOutput::Vision),
        )),
        Arc::new(PrecomputedAgent::new(
            AgentId::Stt,
            bundle.stt.clone().map(AgentOutput::Stt),
        )),
        Arc::new(PrecomputedAgent::new(
            AgentId::Content,
            bundle.content.clone().map(AgentOutput::Content),
        )),
        Arc::new(PrecomputedAgent::new(
            AgentId::Vibe,
            bundle.vibe.clone().map(AgentOutput::Vibe),
        )),
    ];

    let db_path = resolve_db_path(db)?;
    let pool = init_database_pool(&db_path).await?;
    let store: Option<Arc<dyn ResultStore>> = Some(Arc::new(SqliteResultStore::new(pool)));

    let orchestrator = PipelineOrchestrator::new(
        Arc::new(FileProbeExtractor),
        analyzers,
        Arc::new(TranscriptDiscourseAnalyzer),
        engine,
        store,
    );

    let report = orchestrator.run(&video).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn score(input: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let bundle = load_bundle(&input)?;
    let engine = load_engine(config)?;
    let result = engine.evaluate(&EvaluationInput::from(bundle));
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn growth(db: Option<PathBuf>, prefix: String, limit: u32) -> Result<()> {
    let pool = init_database_pool(&resolve_db_path(db)?).await?;
    let store = SqliteResultStore::new(pool);
    let history = store.history(&prefix, limit).await?;
    let report = GrowthAnalyzer::analyze(&history)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
