//! Command-line front end for the analysis session controller.
//!
//! One-shot mode prints the ranked lines once the search completes;
//! `--stream` keeps an infinite analysis running and reprints the ranked
//! snapshot on every engine update until Ctrl-C.

use std::path::PathBuf;

use analysis::{AnalysisLine, AnalysisOptions, Analyzer};
use clap::Parser;
use engine::EngineConfig;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Parser)]
#[command(name = "kibitz", about = "Ranked engine analysis for a chess position")]
struct Cli {
    /// Position to analyze, as a FEN string.
    #[arg(default_value = START_FEN)]
    fen: String,

    /// Search depth limit.
    #[arg(long)]
    depth: Option<u32>,

    /// Fixed search time in milliseconds.
    #[arg(long)]
    movetime: Option<u64>,

    /// Node count limit.
    #[arg(long)]
    nodes: Option<u64>,

    /// Number of ranked lines to report.
    #[arg(long, default_value_t = 1)]
    lines: u32,

    /// Engine binary path (the KIBITZ_ENGINE env var takes precedence).
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Stream updates continuously until Ctrl-C.
    #[arg(long)]
    stream: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let analyzer = Analyzer::new(EngineConfig {
        path: cli.engine.clone(),
        label: Some("kibitz".to_string()),
    });

    let mut options = AnalysisOptions::new().with_multipv(cli.lines);
    if let Some(depth) = cli.depth {
        options = options.with_depth(depth);
    }
    if let Some(movetime) = cli.movetime {
        options = options.with_movetime(movetime);
    }
    if let Some(nodes) = cli.nodes {
        options = options.with_nodes(nodes);
    }

    if cli.stream {
        stream(&analyzer, &cli.fen, options).await
    } else {
        evaluate(&analyzer, &cli.fen, options, cli.json).await
    }
}

async fn evaluate(
    analyzer: &Analyzer,
    fen: &str,
    options: AnalysisOptions,
    json: bool,
) -> anyhow::Result<()> {
    let lines = analyzer.evaluate_position(fen, options).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        print_lines(&lines);
    }
    Ok(())
}

async fn stream(analyzer: &Analyzer, fen: &str, options: AnalysisOptions) -> anyhow::Result<()> {
    let mut updates = analyzer.subscribe().await?;
    analyzer.start_analysis(fen, options).await;

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(lines) => {
                        println!();
                        print_lines(&lines);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Dropped stale analysis updates");
                    }
                    Err(_) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping analysis");
                analyzer.stop_analysis().await;
                break;
            }
        }
    }

    analyzer.terminate().await;
    Ok(())
}

fn print_lines(lines: &[AnalysisLine]) {
    for line in lines {
        println!(
            "{:>2}. {:>7}  {}",
            line.rank,
            line.evaluation.display(),
            line.moves.join(" ")
        );
    }
}
