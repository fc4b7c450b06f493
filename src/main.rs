use facetql::config::{CompilerSettings, ProjectConfig};
use facetql::sqon::{remove, replace_field, toggle, SqonNode};
use facetql::SchemaCompiler;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facetql")]
#[command(about = "GraphQL schema compiler and SQON filter toolkit")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile project config directories into one SDL document
    Compile {
        /// Project config directories (comma separated in the env var)
        #[arg(short, long = "config-dir", env = "FACETQL_CONFIG_DIR", value_delimiter = ',', required = true)]
        config_dirs: Vec<PathBuf>,

        /// Write SDL to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the aggregation fragment map as JSON
        #[arg(long)]
        fragments: bool,

        /// Mapping types left out of aggregations (default: id,text)
        #[arg(long, env = "FACETQL_EXCLUDED_TYPES", value_delimiter = ',')]
        excluded_types: Option<Vec<String>>,
    },
    /// Apply a SQON operation and print the resulting tree
    Sqon {
        #[command(subcommand)]
        op: SqonCommand,
    },
}

#[derive(Subcommand)]
enum SqonCommand {
    /// Add a filter clause, or remove it if already present
    Toggle {
        /// Filter clause as JSON
        clause: String,

        /// Current tree as JSON
        #[arg(long)]
        sqon: Option<String>,
    },
    /// Remove every clause on a field
    Remove {
        field: String,

        #[arg(long)]
        sqon: Option<String>,
    },
    /// Replace every clause on a field with a new one
    Replace {
        field: String,

        /// Replacement clause as JSON, or `null` to clear
        clause: String,

        #[arg(long)]
        sqon: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Compile { config_dirs, output, fragments, excluded_types } => {
            compile(config_dirs, output, fragments, excluded_types)
        }
        Commands::Sqon { op } => run_sqon(op),
    }
}

fn compile(
    config_dirs: Vec<PathBuf>,
    output: Option<PathBuf>,
    fragments: bool,
    excluded_types: Option<Vec<String>>,
) -> Result<()> {
    let projects = config_dirs
        .iter()
        .map(|dir| {
            ProjectConfig::load(dir).with_context(|| format!("Failed to load project from {}", dir.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let settings = match excluded_types {
        Some(types) => CompilerSettings::with_excluded_types(types),
        None => CompilerSettings::default(),
    };
    let schema = SchemaCompiler::new(settings).compile(&projects)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &schema.sdl).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote SDL to {}", path.display());
        }
        None => println!("{}", schema.sdl),
    }

    if fragments {
        let map: BTreeMap<&str, &BTreeMap<String, String>> = schema
            .documents
            .iter()
            .map(|d| (d.document_type.as_str(), &d.aggregation_fragments))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
    }

    Ok(())
}

fn run_sqon(op: SqonCommand) -> Result<()> {
    let result = match op {
        SqonCommand::Toggle { clause, sqon } => {
            let tree = parse_tree(sqon.as_deref())?;
            let clause = parse_tree(Some(&clause))?.ok_or_else(|| anyhow!("toggle needs a clause"))?;
            let filter = clause
                .as_filter()
                .ok_or_else(|| anyhow!("toggle needs a single filter clause, got {}", clause))?;
            toggle(filter, tree.as_ref())?
        }
        SqonCommand::Remove { field, sqon } => {
            let tree = parse_tree(sqon.as_deref())?;
            remove(&field, tree.as_ref())?
        }
        SqonCommand::Replace { field, clause, sqon } => {
            let tree = parse_tree(sqon.as_deref())?;
            let clause = parse_tree(Some(&clause))?;
            replace_field(&field, clause.as_ref(), tree.as_ref())?
        }
    };

    println!("{}", serde_json::to_string_pretty(&SqonNode::to_value(result.as_ref()))?);
    Ok(())
}

fn parse_tree(raw: Option<&str>) -> Result<Option<SqonNode>> {
    match raw {
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(raw).context("SQON is not valid JSON")?;
            Ok(SqonNode::from_value(&value)?)
        }
        None => Ok(None),
    }
}
