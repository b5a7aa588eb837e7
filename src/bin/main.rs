//! Dugout CLI - Resolve baseball questions to SQL
//!
//! Usage:
//!   dugout ask "top 10 home run hitters in 2022" [--db stats.db]
//!   dugout lint "most hr in 2019" "SELECT ..."
//!   dugout catalog [--db stats.db]
//!
//! Examples:
//!   dugout ask "top 10 home run hitters in 2022"
//!   dugout ask "best era in 2005" --top-n 5
//!   dugout lint "most hr in 2024" "SELECT * FROM batting WHERE yearid = 2024"

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dugout::catalog::{build_catalog, SchemaProvider, SqliteSchema, StatCatalog, StaticSchema};
use dugout::config::Settings;
use dugout::lint::question::lint_question_sql;
use dugout::router::{Pipeline, Resolution};
use dugout::season::SeasonContext;
use dugout::templates::TemplateSet;

#[derive(Parser)]
#[command(name = "dugout")]
#[command(about = "Dugout - natural-language leaderboard queries over baseball statistics")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (otherwise DUGOUT_CONFIG / ./dugout.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a question to SQL
    Ask {
        /// The question, in plain English
        question: String,

        /// SQLite database to introspect (bundled schema if not given)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Override the leaderboard size
        #[arg(long)]
        top_n: Option<i64>,
    },

    /// Lint a candidate SQL string against the question that produced it
    Lint {
        /// The original question
        question: String,

        /// The candidate SQL
        sql: String,
    },

    /// List the resolvable stats in the catalog
    Catalog {
        /// SQLite database to introspect (bundled schema if not given)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Ask { question, db, top_n } => cmd_ask(settings, question, db, top_n).await,
        Commands::Lint { question, sql } => cmd_lint(question, sql),
        Commands::Catalog { db } => cmd_catalog(db),
    }
}

fn load_catalog(db: Option<PathBuf>) -> Result<StatCatalog, String> {
    let provider: Box<dyn SchemaProvider> = match db {
        Some(path) => Box::new(
            SqliteSchema::open(&path)
                .map_err(|e| format!("opening '{}': {}", path.display(), e))?,
        ),
        None => Box::new(StaticSchema::bundled()),
    };
    build_catalog(provider.as_ref()).map_err(|e| e.to_string())
}

async fn cmd_ask(
    settings: Settings,
    question: String,
    db: Option<PathBuf>,
    top_n: Option<i64>,
) -> ExitCode {
    let mut settings = settings;
    if let Some(n) = top_n {
        settings.leaderboard.default_top_n = n;
    }

    let templates = match TemplateSet::from_path(&settings.assets.templates) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error loading templates: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let catalog = match load_catalog(db) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error building stat catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let schema_description = fs::read_to_string(&settings.assets.schema_description)
        .unwrap_or_else(|e| {
            tracing::warn!(path = %settings.assets.schema_description.display(), error = %e,
                "schema description missing, prompts will be ungrounded");
            String::new()
        });
    let prompt_skeleton = fs::read_to_string(&settings.assets.prompt).unwrap_or_else(|e| {
        tracing::warn!(path = %settings.assets.prompt.display(), error = %e,
            "prompt skeleton missing, a minimal prompt will be synthesized");
        String::new()
    });

    let pipeline = Pipeline::new(settings, templates)
        .with_catalog(catalog)
        .with_prompt(schema_description, prompt_skeleton);

    match pipeline.resolve(&question).await {
        Resolution::Query(resolved) => {
            println!("-- source: {}", resolved.source);
            for (name, value) in &resolved.bound_params {
                println!("-- param {} = {}", name, value);
            }
            println!("{}", resolved.sql_text);
            ExitCode::SUCCESS
        }
        Resolution::Refusal { reasons } => {
            eprintln!("Refused:");
            for reason in reasons {
                eprintln!("  - {}", reason);
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_lint(question: String, sql: String) -> ExitCode {
    let current_year = SeasonContext::from_today().current_year;
    let report = lint_question_sql(&question, &sql, current_year);
    if report.ok {
        println!("OK");
        ExitCode::SUCCESS
    } else {
        eprintln!("Rejected:");
        for reason in &report.reasons {
            eprintln!("  - {}", reason);
        }
        ExitCode::FAILURE
    }
}

fn cmd_catalog(db: Option<PathBuf>) -> ExitCode {
    let catalog = match load_catalog(db) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error building stat catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Stats ({}):", catalog.len());
    for entry in catalog.iter() {
        println!(
            "  - {} ({:?}, {} {}, {})",
            entry.stat_key,
            entry.domain,
            entry.default_aggregation.as_sql(),
            entry.source_table,
            entry.sort_direction.as_sql(),
        );
    }
    ExitCode::SUCCESS
}
