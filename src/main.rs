//! SQL Guard command-line entry point.
//!
//! Validates one statement and prints a JSON report on stdout. Logs go to
//! stderr so the report can be piped.
//!
//! Exit codes:
//! - 0: statement is valid (SAFE, WARNING or DANGEROUS)
//! - 1: statement is BLOCKED
//! - 2: usage, configuration or IO error

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use sql_guard::{
    complexity_view, injection_view, security_report, GuardConfig, SqlGuard, TableCatalog,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sql-guard",
    version,
    about = "Validate SQL statements for security and complexity before execution"
)]
struct Cli {
    /// SQL statement to validate (read from stdin when omitted)
    sql: Option<String>,

    /// JSON file mapping table names to column lists
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Override the maximum number of table references
    #[arg(long)]
    max_table_count: Option<usize>,

    /// Override the maximum number of joins
    #[arg(long)]
    max_join_count: Option<usize>,

    /// Override the maximum number of subqueries
    #[arg(long)]
    max_subquery_count: Option<usize>,

    /// Override the maximum complexity score
    #[arg(long)]
    max_complexity_score: Option<f64>,

    /// Report shape to print
    #[arg(long, value_enum, default_value_t = View::Full)]
    view: View,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    /// Full security report
    Full,
    /// Complexity metrics and limit violations
    Complexity,
    /// Injection and dangerous-operation findings
    Injection,
    /// Comment-stripped, whitespace-normalized SQL
    Sanitize,
    /// Active guard configuration
    Config,
}

#[derive(Serialize)]
struct SanitizedOutput {
    sanitized_sql: String,
}

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = GuardConfig::from_env()?;
    if let Some(n) = cli.max_table_count {
        config.limits.max_table_count = n;
    }
    if let Some(n) = cli.max_join_count {
        config.limits.max_join_count = n;
    }
    if let Some(n) = cli.max_subquery_count {
        config.limits.max_subquery_count = n;
    }
    if let Some(score) = cli.max_complexity_score {
        config.limits.max_complexity_score = score;
    }

    let guard = SqlGuard::new(config)?;

    if cli.view == View::Config {
        print_json(&guard.security_config())?;
        return Ok(ExitCode::SUCCESS);
    }

    let sql = match cli.sql {
        Some(sql) => sql,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read SQL from stdin")?;
            buf
        }
    };

    if cli.view == View::Sanitize {
        print_json(&SanitizedOutput {
            sanitized_sql: guard.sanitize(&sql),
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    let schema = cli.schema.as_deref().map(load_schema).transpose()?;
    let result = guard.validate(&sql, schema.as_ref(), None);

    match cli.view {
        View::Complexity => print_json(&complexity_view(&result))?,
        View::Injection => print_json(&injection_view(&result))?,
        _ => print_json(&security_report(&result))?,
    }

    Ok(if result.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn load_schema(path: &Path) -> Result<TableCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid schema JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize tracing subscriber with stderr output.
fn init_logging() {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn,sql_guard=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
