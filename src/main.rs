mod api;
mod server;

use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use trend_scout::backtest::{run_backtest_job, BacktestStatus};
use trend_scout::{
    format_float, format_number, format_percent, ChannelProfile, EngineConfig,
    RecommendationRanker, TrendSignal, VideoRecord,
};

#[derive(Parser)]
#[command(name = "trend-scout", about = "Trend-to-channel recommendations and view backtests")]
struct Cli {
    /// Config file (defaults to $TREND_SCOUT_CONFIG or config/trend-scout.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Recommend(RecommendArgs),
    Backtest(BacktestArgs),
    Serve(ServeArgs),
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct RecommendArgs {
    /// Channel profile JSON file
    #[arg(long)]
    channel: PathBuf,
    /// JSON array of trend signals
    #[arg(long)]
    trends: PathBuf,
    #[arg(long)]
    max: Option<usize>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct BacktestArgs {
    #[arg(long)]
    channel: PathBuf,
    /// JSON array of historical videos
    #[arg(long)]
    videos: PathBuf,
    #[arg(long)]
    ml: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/trend-scout.toml")]
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (config, config_path) = EngineConfig::load(cli.config)?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Recommend(args) => run_recommend(args, &config),
        Command::Backtest(args) => run_backtest(args, &config).await,
        Command::Serve(args) => server::serve(args, config).await,
        Command::InitConfig(args) => {
            config.write(&args.path)?;
            println!("Wrote {}", args.path.display());
            Ok(())
        }
    }
}

fn run_recommend(args: RecommendArgs, config: &EngineConfig) -> Result<(), String> {
    let channel: ChannelProfile = read_json(&args.channel)?;
    let trends: Vec<TrendSignal> = read_json(&args.trends)?;
    let ranker = RecommendationRanker::new(config.ranker.clone());
    let max_count = args.max.unwrap_or(config.ranker.max_recommendations);

    let recommendations = ranker
        .rank(&trends, &channel, max_count)
        .map_err(|err| err.to_string())?;

    if args.json {
        return print_json(&recommendations);
    }

    if recommendations.is_empty() {
        println!(
            "No trends reached the minimum match score of {}",
            format_float(config.ranker.min_match_score, 0)
        );
        return Ok(());
    }

    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} | match {} | {} urgency",
            rank + 1,
            rec.keyword,
            format_float(rec.match_score, 1),
            rec.urgency.label()
        );
        println!(
            "   viral {} | relevance {} | performance {}",
            format_float(rec.viral_potential, 1),
            format_float(rec.relevance_score, 1),
            format_float(rec.performance_score, 1)
        );
        println!(
            "   predicted {} views ({}, confidence {})",
            format_number(rec.predicted_performance.predicted_views as f64),
            rec.predicted_performance.tier.label(),
            format_float(rec.predicted_performance.confidence, 0)
        );
        println!("   angle: {}", rec.content_angle);
        println!("   format: {}", rec.suggested_format);
        println!("   why: {}", rec.reasoning);
    }

    Ok(())
}

async fn run_backtest(args: BacktestArgs, config: &EngineConfig) -> Result<(), String> {
    let channel: ChannelProfile = read_json(&args.channel)?;
    let videos: Vec<VideoRecord> = read_json(&args.videos)?;

    let outcome = run_backtest_job(config.backtest.clone(), videos, channel, args.ml).await;
    if args.json {
        return print_json(&outcome);
    }

    let report = match (outcome.status, outcome.report) {
        (BacktestStatus::Success, Some(report)) => report,
        (status, _) => {
            return Err(format!(
                "backtest {:?}: {}",
                status,
                outcome.error.unwrap_or_default()
            ))
        }
    };

    let metrics = &report.accuracy_metrics;
    println!(
        "Tested {} videos with the {} predictor ({} excluded, {} without views)",
        report.total_videos_tested,
        report.predictor,
        report.excluded.len(),
        report.excluded_from_metrics
    );
    println!(
        "MAE {} | MAPE {} | RMSE {} | R2 {} | correlation {}",
        format_number(metrics.mae),
        format_percent(metrics.mape),
        format_number(metrics.rmse),
        format_float(metrics.r2, 3),
        format_float(metrics.correlation, 3)
    );
    if let Some(ml) = &report.ml {
        println!(
            "Model: {} on {} samples (in-sample evaluation)",
            ml.best_model, ml.sample_count
        );
    }

    if !report.top_outliers.is_empty() {
        println!("\nTop outliers:");
        for outlier in &report.top_outliers {
            println!(
                "- {} | {} views vs {} predicted | {}x period average",
                outlier.record.title,
                format_number(outlier.record.actual_views as f64),
                format_number(outlier.record.predicted_views as f64),
                format_float(outlier.record.outlier_ratio, 2)
            );
            println!("  {}", outlier.explanation.summary);
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    serde_json::from_str(&contents)
        .map_err(|err| format!("failed to parse {}: {}", path.display(), err))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| format!("failed to serialize output: {}", err))?;
    println!("{}", payload);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
