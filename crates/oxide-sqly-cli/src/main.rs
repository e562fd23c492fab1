//! oxide-sqly CLI
//!
//! Formats statements for a dialect and runs them against SQLite.

mod args;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oxide_sqly_core::{
    build_batch, format_statement, AnyDialect, DbValue, Dialect, Options, Session,
};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::args::{parse_args, parse_rows};

/// Placeholder statement formatting and SQLite queries.
#[derive(Parser)]
#[command(name = "oxide-sqly")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite::memory:")]
    database: String,

    /// Driver name, which selects the dialect.
    #[arg(long, default_value = "sqlite")]
    driver: String,

    /// JSON options file; overrides `--database` and `--driver`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Substitute arguments into a template and print the statement.
    Format {
        /// Statement template with `?` placeholders.
        template: String,

        /// Arguments as a JSON array.
        #[arg(short, long, default_value = "[]")]
        args: String,
    },

    /// Build a multi-row INSERT from a single value group.
    Batch {
        /// INSERT template with one `(?, ...)` group.
        template: String,

        /// Rows as a JSON array of arrays.
        #[arg(short, long)]
        rows: String,
    },

    /// Run a query and print the rows as JSON.
    Query {
        /// Statement template with `?` placeholders.
        template: String,

        /// Arguments as a JSON array.
        #[arg(short, long, default_value = "[]")]
        args: String,
    },

    /// Run statements that return no rows.
    Exec {
        /// Statement templates, run in one transaction when more than one.
        #[arg(required = true)]
        statements: Vec<String>,

        /// Arguments as a JSON array, applied to a single statement.
        #[arg(short, long, default_value = "[]")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = match &cli.config {
        Some(path) => Options::from_file(path)?,
        None => Options::new(cli.driver.clone(), cli.database.clone()),
    };
    let dialect = options.dialect()?;
    debug!(dialect = dialect.name(), "resolved dialect");

    match cli.command {
        Commands::Format { template, args } => {
            let args = parse_args(&args)?;
            println!("{}", format_statement(&dialect, &template, &args)?);
        }

        Commands::Batch { template, rows } => {
            let rows = parse_rows(&rows)?;
            println!("{}", build_batch(&dialect, &template, &rows)?);
        }

        Commands::Query { template, args } => {
            require_sqlite(dialect)?;
            let args = parse_args(&args)?;
            let mut db = oxide_sqly_sqlite::connect(&options).await?;
            let rows: Vec<HashMap<String, DbValue>> = db.query(&template, &args).await?;
            let rows: Vec<BTreeMap<String, DbValue>> = rows
                .into_iter()
                .map(|row| row.into_iter().collect())
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            info!(rows = rows.len(), "query finished");
        }

        Commands::Exec { statements, args } => {
            require_sqlite(dialect)?;
            let mut db = oxide_sqly_sqlite::connect(&options).await?;
            if let [template] = statements.as_slice() {
                let args = parse_args(&args)?;
                let affected = db.exec(template, &args).await?;
                affected.rows_affected().map_or_else(
                    |e| println!("rows affected: unknown ({e})"),
                    |n| println!("rows affected: {n}"),
                );
                if let Ok(id) = affected.last_insert_id() {
                    println!("last insert id: {id}");
                }
            } else {
                if args != "[]" {
                    anyhow::bail!("--args applies to a single statement only");
                }
                db.exec_many(statements.as_slice()).await?;
                info!(statements = statements.len(), "statements executed");
            }
        }
    }

    Ok(())
}

fn require_sqlite(dialect: AnyDialect) -> anyhow::Result<()> {
    if dialect == AnyDialect::Sqlite {
        Ok(())
    } else {
        anyhow::bail!(
            "only SQLite databases can be queried, `{}` is format-only",
            dialect.name()
        )
    }
}
