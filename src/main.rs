use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ancestor::{
    AnalysisError, AnalysisReport, AnalysisRequest, AncestorModel, Config, Gender, InferenceMode,
    LoadOutcome, ModelInfo,
};

#[derive(Parser)]
#[command(name = "ancestor")]
#[command(about = "Estimate a (mock) ancestry breakdown from a face photo")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a face photo
    Analyze(AnalyzeArgs),
    /// Show model metadata
    Info,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Gender of the person in the photo (female or male)
    #[arg(short, long)]
    gender: Option<Gender>,

    /// Configuration file (defaults to ./ancestor.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Label vocabulary JSON document
    #[arg(long, value_name = "FILE")]
    labels: Option<PathBuf>,

    /// Computation backend (cpu or rten)
    #[arg(long)]
    backend: Option<String>,

    /// Trained .rten model file (used with --backend rten)
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Skip the network and use random scores
    #[arg(long)]
    fallback: bool,

    /// Seed for weight initialization and random scores
    #[arg(long)]
    seed: Option<u64>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Analyze(args) => analyze(args).await,
        Command::Info => {
            print_info(&ModelInfo::published());
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(args: &AnalyzeArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None if Path::new(Config::default_path()).exists() => Config::load(Config::default_path())?,
        None => Config::default(),
    };

    if let Some(labels) = &args.labels {
        config.labels_path = labels.clone();
    }
    if let Some(backend) = &args.backend {
        config.backend = backend.clone();
    }
    if let Some(model) = &args.model {
        config.model_path = Some(model.clone());
    }
    if args.fallback {
        config.mode = InferenceMode::Fallback;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    Ok(config)
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    debug!("Using configuration: {:?}", config);

    let mut model = AncestorModel::new(config);
    if let Some(debug_dir) = args.debug_out.clone() {
        model = model.with_debug(debug_dir)?;
    }

    // Validate before loading so a missing gender fails fast
    if args.gender.is_none() {
        exit_with(&AnalysisError::MissingInput("gender"));
    }

    if let LoadOutcome::Degraded(reason) = model.load().await {
        if !args.json {
            println!("Note: using fallback model ({})\n", reason);
        }
    }

    let image = tokio::fs::read(&args.image_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.image_path.display(), e))?;

    let request = AnalysisRequest {
        image: Some(image),
        gender: args.gender,
    };

    match model.analyze(request).await {
        Ok(report) if args.json => println!("{}", serde_json::to_string_pretty(&report)?),
        Ok(report) => print_report(&report),
        Err(err) => exit_with(&err),
    }

    Ok(())
}

fn exit_with(err: &AnalysisError) -> ! {
    debug!("Analysis failed: {:?}", err);
    eprintln!("{}", err.user_message());
    std::process::exit(1);
}

fn print_report(report: &AnalysisReport) {
    println!("=== Ancestry Analysis Results ===");
    println!("Gender: {}", report.gender.display_name());
    println!("Face detected: {}", if report.face_detected { "yes" } else { "no" });
    println!(
        "Backend: {} ({} ms)\n",
        report.backend, report.inference_time_ms
    );

    if report.results.is_empty() {
        println!("No results.");
        return;
    }

    for (rank, entry) in report.results.iter().enumerate() {
        println!(
            "  {}. {} ({}) - {}% [{}]",
            rank + 1,
            entry.country,
            entry.gender,
            entry.probability,
            entry.confidence.display_name()
        );
    }
}

fn print_info(info: &ModelInfo) {
    println!("=== Model Information ===");
    println!("Accuracy:      {}", info.accuracy);
    println!("Training data: {}", info.training_data);
    println!("Countries:     {}", info.countries);
    println!("Model type:    {}", info.model_type);
    println!("Input size:    {}", info.input_size);
    println!("Last updated:  {}", info.last_updated);
}
