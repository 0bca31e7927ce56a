use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pfsense_toolgen::config::{ClassificationTables, EnvironmentOverrides};
use pfsense_toolgen::generator::output::{
    check_name_maps, load_name_map, render_name_map, tool_name_map, write_output,
    DescriptorDocument, GenerationSummary, OutputFormat,
};
use pfsense_toolgen::generator::{ContextBuilder, SpecDocument, ToolDescriptor};
use pfsense_toolgen::{DEFAULT_OUTPUT_FILE, DEFAULT_SPEC_FILE};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every tool descriptor and write the descriptor document
    Generate {
        /// OpenAPI document (JSON or YAML)
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Classification tables (YAML); built-in tables when omitted
        #[arg(short, long)]
        tables: Option<PathBuf>,

        /// Descriptor document path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format; inferred from the output extension when omitted
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Also write the operation identifier to tool name map here
        #[arg(long)]
        names_output: Option<PathBuf>,
    },

    /// Print or write the operation identifier to tool name map
    Names {
        #[arg(short, long)]
        spec: Option<PathBuf>,

        #[arg(short, long)]
        tables: Option<PathBuf>,

        /// Write the map here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare generated tool names against a golden name map
    Check {
        #[arg(short, long)]
        spec: Option<PathBuf>,

        #[arg(short, long)]
        tables: Option<PathBuf>,

        /// Golden name map (JSON object of identifier to tool name)
        #[arg(short, long)]
        golden: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = EnvironmentOverrides::load()?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| env.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level, cli.log_format)?;

    run(cli.command, &env).map_err(|e| {
        error!(category = e.category(), "{}", e);
        anyhow::Error::from(e)
    })
}

fn run(command: Commands, env: &EnvironmentOverrides) -> pfsense_toolgen::Result<()> {
    match command {
        Commands::Generate {
            spec,
            tables,
            output,
            format,
            names_output,
        } => {
            let (document, tables) = load_inputs(spec, tables, env)?;
            let descriptors = ContextBuilder::new(&tables)?.build_all(&document)?;

            let module_order = tables.module_order();
            let summary = GenerationSummary::from_descriptors(&descriptors, &module_order);
            summary.log();

            let output = output
                .or_else(|| env.output_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
            let format = format
                .or_else(|| OutputFormat::from_path(&output))
                .unwrap_or_default();
            let rendered =
                DescriptorDocument::new(document.title(), &summary, &descriptors, &module_order)
                    .render(format)?;
            write_output(&rendered, &output)?;

            if let Some(names_path) = names_output {
                write_names(&descriptors, Some(names_path.as_path()))?;
            }

            info!(
                "Done! Descriptors: {} ({} tools)",
                output.display(),
                descriptors.len()
            );
            Ok(())
        }
        Commands::Names {
            spec,
            tables,
            output,
        } => {
            let (document, tables) = load_inputs(spec, tables, env)?;
            let descriptors = ContextBuilder::new(&tables)?.build_all(&document)?;
            write_names(&descriptors, output.as_deref())
        }
        Commands::Check {
            spec,
            tables,
            golden,
        } => {
            let (document, tables) = load_inputs(spec, tables, env)?;
            let descriptors = ContextBuilder::new(&tables)?.build_all(&document)?;
            let expected = load_name_map(&golden)?;
            check_name_maps(&expected, &tool_name_map(&descriptors))
        }
    }
}

/// Flag, then environment, then default
fn load_inputs(
    spec: Option<PathBuf>,
    tables: Option<PathBuf>,
    env: &EnvironmentOverrides,
) -> pfsense_toolgen::Result<(SpecDocument, ClassificationTables)> {
    let spec_path = spec
        .or_else(|| env.spec_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SPEC_FILE));

    let tables = match tables.or_else(|| env.tables_path.clone()) {
        Some(path) => ClassificationTables::from_file(&path)?,
        None => ClassificationTables::default(),
    };

    info!("Loading spec from {}", spec_path.display());
    let document = SpecDocument::from_file(&spec_path)?;
    Ok((document, tables))
}

fn write_names(descriptors: &[ToolDescriptor], output: Option<&Path>) -> pfsense_toolgen::Result<()> {
    let rendered = render_name_map(&tool_name_map(descriptors))?;
    match output {
        Some(path) => {
            write_output(&rendered, path)?;
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout is reserved for the `names` output
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
