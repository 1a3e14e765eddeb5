use clap::{Parser, Subcommand};
use quackhub_core::config::{
    archive_dir_from_env_value, database_path_from_env_value, gemini_api_url_from_env_value,
    gemini_model_from_env_value,
};
use quackhub_core::constants::{HISTORY_LIMIT, RECENT_QUERIES_LIMIT, SYMPTOM_PREVIEW_CHARS};
use quackhub_core::timefmt::{history_timestamp, stats_timestamp};
use quackhub_core::{
    symptom_preview, FileResponseArchive, GeminiClient, GeminiConfig, ModelClient, RecordId,
    RecordsService, SqliteQueryStore,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "quackhub")]
#[command(about = "QuackHub symptom desk operator CLI")]
struct Cli {
    /// SQLite primary store (defaults to QUACKHUB_DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    /// Response archive root (defaults to QUACKHUB_ARCHIVE_DIR)
    #[arg(long, global = true)]
    archive: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the stores and the model connection
    Check,
    /// List recent queries
    History {
        /// Number of queries to show
        #[arg(long, default_value_t = HISTORY_LIMIT)]
        limit: usize,
    },
    /// Show aggregate statistics
    Stats,
    /// Show the archived response for a query
    Show {
        /// Query id as returned by /analyze
        query_id: String,
    },
}

#[derive(Debug, PartialEq)]
enum CheckOutcome {
    Passed(String),
    Failed(String),
    Skipped(String),
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Passed(detail) => write!(f, "PASSED  {}", detail),
            CheckOutcome::Failed(detail) => write!(f, "FAILED  {}", detail),
            CheckOutcome::Skipped(detail) => write!(f, "SKIPPED {}", detail),
        }
    }
}

fn check_primary_store(path: &Path) -> CheckOutcome {
    match SqliteQueryStore::open(path).and_then(|store| store.schema_version()) {
        Ok(version) => CheckOutcome::Passed(format!(
            "{} (schema v{})",
            path.display(),
            version
        )),
        Err(e) => CheckOutcome::Failed(format!("{}: {}", path.display(), e)),
    }
}

/// Writes and removes a marker file under the archive root.
fn check_archive_writable(root: &Path) -> CheckOutcome {
    let marker = root.join(".quackhub-check");
    let result = fs::create_dir_all(root)
        .and_then(|()| fs::write(&marker, b"ok"))
        .and_then(|()| fs::remove_file(&marker));

    match result {
        Ok(()) => CheckOutcome::Passed(format!("{} is writable", root.display())),
        Err(e) => CheckOutcome::Failed(format!("{}: {}", root.display(), e)),
    }
}

async fn check_model(api_key: Option<String>) -> CheckOutcome {
    let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) else {
        return CheckOutcome::Skipped("GEMINI_API_KEY not set".into());
    };

    let cfg = match GeminiConfig::new(
        api_key,
        gemini_model_from_env_value(std::env::var("GEMINI_MODEL").ok()),
        gemini_api_url_from_env_value(std::env::var("GEMINI_API_URL").ok()),
    ) {
        Ok(cfg) => cfg,
        Err(e) => return CheckOutcome::Failed(e.to_string()),
    };

    let client = GeminiClient::new(Arc::new(cfg));
    match client.generate("Say hello").await {
        Ok(text) => CheckOutcome::Passed(format!(
            "{} replied: {}",
            client.name(),
            symptom_preview(text.trim(), 60)
        )),
        Err(e) => CheckOutcome::Failed(format!("{}: {}", client.name(), e)),
    }
}

fn records_service(
    database: &Path,
    archive: &Path,
) -> Result<RecordsService, Box<dyn std::error::Error>> {
    let queries = Arc::new(SqliteQueryStore::open(database)?);
    let archive = Arc::new(FileResponseArchive::new(archive));
    Ok(RecordsService::new(queries, archive))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let database = cli.database.unwrap_or_else(|| {
        database_path_from_env_value(std::env::var("QUACKHUB_DATABASE_PATH").ok())
    });
    let archive = cli
        .archive
        .unwrap_or_else(|| archive_dir_from_env_value(std::env::var("QUACKHUB_ARCHIVE_DIR").ok()));

    match cli.command {
        Some(Commands::Check) => {
            let checks = [
                ("primary store", check_primary_store(&database)),
                ("response archive", check_archive_writable(&archive)),
                (
                    "model",
                    check_model(std::env::var("GEMINI_API_KEY").ok()).await,
                ),
            ];

            let mut failed = false;
            for (name, outcome) in &checks {
                println!("{:<18}{}", name, outcome);
                failed |= matches!(outcome, CheckOutcome::Failed(_));
            }

            if failed {
                eprintln!("One or more checks failed.");
                std::process::exit(1);
            }
        }
        Some(Commands::History { limit }) => {
            let records = records_service(&database, &archive)?.history(limit)?;
            if records.is_empty() {
                println!("No queries found.");
            }
            for record in records {
                println!(
                    "{}  {}  {}{}",
                    history_timestamp(&record.created_at),
                    record.id,
                    if record.is_emergency { "[EMERGENCY] " } else { "" },
                    symptom_preview(&record.symptoms, SYMPTOM_PREVIEW_CHARS)
                );
            }
        }
        Some(Commands::Stats) => {
            let stats = records_service(&database, &archive)?.stats(RECENT_QUERIES_LIMIT)?;
            println!("Total queries:      {}", stats.total_queries);
            println!("Emergency cases:    {}", stats.emergency_cases);
            println!("Archived responses: {}", stats.archived_responses);
            if !stats.recent.is_empty() {
                println!("Recent:");
            }
            for record in &stats.recent {
                println!(
                    "  {}  severity {}  {}",
                    stats_timestamp(&record.created_at),
                    record
                        .severity
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".into()),
                    symptom_preview(&record.symptoms, SYMPTOM_PREVIEW_CHARS)
                );
            }
        }
        Some(Commands::Show { query_id }) => {
            let query_id = RecordId::parse(&query_id)?;
            match records_service(&database, &archive)?.response_for(&query_id)? {
                Some(doc) => {
                    println!("Query:     {}", doc.query_id);
                    println!("Document:  {}", doc.document_id);
                    println!("Stored:    {}", history_timestamp(&doc.created_at));
                    println!("Emergency: {}", doc.is_emergency);
                    println!("Symptoms:  {}", doc.symptoms);
                    println!();
                    println!("{}", doc.ai_response);
                }
                None => {
                    eprintln!("Response not found for {}", query_id);
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("No command given. Run with --help for usage.");
        }
    }

    Ok(())
}
