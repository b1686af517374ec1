use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use inlist_bootstrap::{AppConfig, AppConfigProvider, CliArgs, ConfigProvider};
use inlist_handler::{InlistHandlerConfig, InlistHandlerModule, InlistRenderer, InlistService};
use mimalloc::MiMalloc;

use std::path::PathBuf;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "inlist_handler";

/// Inlist CLI - load custom-style and TOML inlists into typed values
#[derive(Parser)]
#[command(name = "inlist-cli")]
#[command(about = "Inlist CLI - load custom-style and TOML inlists into typed values")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse an inlist and print its typed values
    Parse {
        path: PathBuf,
        /// Backend to use; `auto` picks it from the file extension
        #[arg(long, value_enum, default_value_t = Format::Auto)]
        format: Format,
        #[arg(long, value_enum, default_value_t = Output::Json)]
        output: Output,
    },
    /// Parse an inlist and report how many keys it defines
    Check { path: PathBuf },
    /// List the available backends and their extensions
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Auto,
    Inlist,
    Toml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    Json,
    Yaml,
    Inlist,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (INLIST__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    inlist_bootstrap::logging::init_logging(&logging_config, &config.resolve_log_dir()?);

    let service = init_service(config)?;

    let Some(command) = cli.command else {
        tracing::warn!("No command given");
        println!("Nothing to do, see --help");
        return Ok(());
    };

    let output = run_command(&service, command).await?;
    println!("{output}");
    Ok(())
}

fn init_service(config: AppConfig) -> Result<std::sync::Arc<InlistService>> {
    let provider = AppConfigProvider::new(config);
    let module_cfg: InlistHandlerConfig = provider.module_config(MODULE_NAME)?;

    let module = InlistHandlerModule::new();
    module.init(&module_cfg)?;
    module.service()
}

async fn run_command(service: &InlistService, command: Commands) -> Result<String> {
    tracing::debug!(?command, "Dispatching command");

    match command {
        Commands::Parse {
            path,
            format,
            output,
        } => {
            let document = match format {
                Format::Auto => service.parse_local(&path).await?,
                Format::Inlist => service.parse_local_as("inlist", &path).await?,
                Format::Toml => service.parse_local_as("toml", &path).await?,
            };
            let rendered = match output {
                Output::Json => serde_json::to_string_pretty(&document.values)?,
                Output::Yaml => serde_yaml::to_string(&document.values)?,
                Output::Inlist => InlistRenderer::render(&document.values)?,
            };
            Ok(rendered.trim_end().to_string())
        }
        Commands::Check { path } => {
            let document = service.parse_local(&path).await?;
            tracing::info!(keys = document.values.len(), "Inlist is valid");
            Ok(format!(
                "{}: OK ({} keys, {})",
                path.display(),
                document.values.len(),
                document.meta.format
            ))
        }
        Commands::Info => {
            let mut backends: Vec<_> = service.info().supported_extensions.into_iter().collect();
            backends.sort();
            Ok(backends
                .into_iter()
                .map(|(id, extensions)| format!("{id}: {}", extensions.join(", ")))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}
