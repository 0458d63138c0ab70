//! Moodscope CLI - Command-line interface for Moodscope
//!
//! Commands:
//! - detect: Flag anomalous dates in a journal batch
//! - recommend: Rank coping activities/resources for a user
//! - rate: Append a like/dislike to a feedback file
//! - analyze: Score free text with the reference sentiment scorer

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use moodscope::api::{handle_analyze, ApiResponse};
use moodscope::pipeline::{AnalyticsConfig, AnalyticsService};
use moodscope::sentiment::LexiconScorer;
use moodscope::store::{MemoryStore, MoodStore};
use moodscope::types::{FeedbackRecord, JournalRecord};
use moodscope::MOODSCOPE_VERSION;

/// Moodscope - mood journal anomaly detection and coping recommendations
#[derive(Parser)]
#[command(name = "moodscope")]
#[command(version = MOODSCOPE_VERSION)]
#[command(about = "Analyze mood journals and recommend coping activities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flag anomalous dates in a journal batch
    Detect {
        /// Journal batch JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum)]
        output_format: Option<OutputFormat>,

        /// Expected outlier fraction
        #[arg(long, default_value = "0.1")]
        contamination: f64,

        /// Trees in the ensemble
        #[arg(long, default_value = "100")]
        trees: usize,

        /// Model seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Rank coping activities/resources for a user
    Recommend {
        /// User to recommend for
        #[arg(long)]
        user_id: String,

        /// Catalog JSON file
        #[arg(long)]
        catalog: PathBuf,

        /// Feedback records JSON file
        #[arg(long)]
        feedback: Option<PathBuf>,

        /// Journal records JSON file (for mood lookup)
        #[arg(long)]
        journals: Option<PathBuf>,

        /// Factorization rank
        #[arg(long, default_value = "5")]
        rank: usize,

        /// Model seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output format
        #[arg(long, value_enum)]
        output_format: Option<OutputFormat>,
    },

    /// Append a like/dislike to a feedback file
    Rate {
        /// Feedback records JSON file (created when missing)
        #[arg(long)]
        feedback: PathBuf,

        /// Catalog JSON file (resolves item titles)
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[arg(long)]
        user_id: String,

        /// Catalog item id
        #[arg(long)]
        id: String,

        /// Item kind: activity or resource
        #[arg(long = "type")]
        kind: String,

        /// Like (true) or dislike (false)
        #[arg(long, action = clap::ArgAction::Set)]
        like: bool,
    },

    /// Score free text with the reference sentiment scorer
    Analyze {
        /// Text to score (use - to read stdin)
        text: String,

        /// Emotion label to blend into the text
        #[arg(long, default_value = "")]
        emotion: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Detect {
            input,
            output_format,
            contamination,
            trees,
            seed,
        } => cmd_detect(&input, output_format, contamination, trees, seed),

        Commands::Recommend {
            user_id,
            catalog,
            feedback,
            journals,
            rank,
            seed,
            output_format,
        } => cmd_recommend(
            &user_id,
            &catalog,
            feedback.as_deref(),
            journals.as_deref(),
            rank,
            seed,
            output_format,
        ),

        Commands::Rate {
            feedback,
            catalog,
            user_id,
            id,
            kind,
            like,
        } => cmd_rate(&feedback, catalog.as_deref(), &user_id, &id, &kind, like),

        Commands::Analyze { text, emotion } => cmd_analyze(&text, &emotion),
    }
}

/// Read a file, or stdin when the path is `-`
fn read_input(path: &Path) -> io::Result<String> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
    }
}

/// Pretty output on a terminal unless the caller asked for a format
fn emit(value: &serde_json::Value, format: Option<OutputFormat>) -> Result<(), Box<dyn std::error::Error>> {
    let pretty = match format {
        Some(OutputFormat::Json) => false,
        Some(OutputFormat::JsonPretty) => true,
        None => atty::is(atty::Stream::Stdout),
    };
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

fn fail_on_error(response: &ApiResponse) -> Result<(), Box<dyn std::error::Error>> {
    if response.status >= 400 {
        return Err(response.body["error"]
            .as_str()
            .unwrap_or("request failed")
            .into());
    }
    Ok(())
}

fn cmd_detect(
    input: &Path,
    output_format: Option<OutputFormat>,
    contamination: f64,
    trees: usize,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = read_input(input)?;

    let config = AnalyticsConfig {
        contamination,
        tree_count: trees,
        seed,
        ..AnalyticsConfig::default()
    };
    let service = AnalyticsService::with_config(MemoryStore::new(), config);

    let response = moodscope::api::handle_detect_anomalies(&service, &body);
    fail_on_error(&response)?;
    emit(&response.body, output_format)
}

fn cmd_recommend(
    user_id: &str,
    catalog: &Path,
    feedback: Option<&Path>,
    journals: Option<&Path>,
    rank: usize,
    seed: u64,
    output_format: Option<OutputFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = MemoryStore::load_catalog_json(&read_input(catalog)?)?;

    if let Some(path) = feedback {
        let records: Vec<FeedbackRecord> = serde_json::from_str(&read_input(path)?)?;
        for record in records {
            store.add_feedback(record)?;
        }
    }
    if let Some(path) = journals {
        let records: Vec<JournalRecord> = serde_json::from_str(&read_input(path)?)?;
        for record in records {
            store.add_journal(record)?;
        }
    }

    let config = AnalyticsConfig {
        rank,
        seed,
        ..AnalyticsConfig::default()
    };
    let service = AnalyticsService::with_config(store, config);

    let body = serde_json::json!({ "userId": user_id }).to_string();
    let response = moodscope::api::handle_recommend(&service, &body);
    fail_on_error(&response)?;
    emit(&response.body, output_format)
}

fn cmd_rate(
    feedback_path: &Path,
    catalog: Option<&Path>,
    user_id: &str,
    id: &str,
    kind: &str,
    like: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = match catalog {
        Some(path) => MemoryStore::load_catalog_json(&read_input(path)?)?,
        None => MemoryStore::new(),
    };

    if feedback_path.exists() {
        let records: Vec<FeedbackRecord> =
            serde_json::from_str(&fs::read_to_string(feedback_path)?)?;
        for record in records {
            store.add_feedback(record)?;
        }
    }

    let service = AnalyticsService::new(store);
    let body = serde_json::json!({
        "userId": user_id,
        "id": id,
        "type": kind,
        "isLike": like,
    })
    .to_string();
    let response = moodscope::api::handle_rate(&service, &body);
    fail_on_error(&response)?;

    let records = service.store().list_feedback()?;
    fs::write(feedback_path, serde_json::to_string_pretty(&records)?)?;
    println!("{}", response.body);
    Ok(())
}

fn cmd_analyze(text: &str, emotion: &str) -> Result<(), Box<dyn std::error::Error>> {
    let text = if text == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        text.to_string()
    };

    let body = serde_json::json!({ "text": text, "emotion": emotion }).to_string();
    let response = handle_analyze(&LexiconScorer::new(), &body);
    fail_on_error(&response)?;
    emit(&response.body, None)
}
