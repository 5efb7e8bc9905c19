//! # Voxforge CLI
//!
//! Command-line interface for the voxel forge.
//!
//! Usage:
//!   voxforge serve [--bind ADDR]
//!   voxforge forge <prompt> [--morph model.json] [--out model.json]
//!   voxforge prompt <prompt> [--morph model.json]
//!   voxforge inspect <model.json>
//!
//! Examples:
//!   GOOGLE_API_KEY=... voxforge serve
//!   voxforge forge "a small red dragon" --out dragon.json
//!   voxforge forge "give it wings" --morph dragon.json --out dragon2.json
//!   voxforge inspect dragon2.json

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use voxforge_core::{Forge, ForgeConfig, ForgeRequest, ModelReport, ProviderType, Voxel};
use voxforge_server::AppState;

#[derive(Parser)]
#[command(name = "voxforge")]
#[command(author, version, about = "Voxforge - forge voxel models from text prompts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider backend (gemini, openai)
    #[arg(long, global = true)]
    provider: Option<ProviderType>,

    /// Model name (defaults to the provider's default)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Seconds to wait for the provider
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only warnings and the result
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP forge endpoint
    Serve {
        /// Address to bind (default: 0.0.0.0:3001)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Forge one model and print it
    Forge {
        /// What to build, or how to evolve the --morph model
        #[arg(required = true)]
        prompt: Vec<String>,

        /// Evolve the model in this JSON file instead of starting fresh
        #[arg(short, long)]
        morph: Option<PathBuf>,

        /// Write the model here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the prompts a forge request would send, without sending them
    Prompt {
        #[arg(required = true)]
        prompt: Vec<String>,

        #[arg(short, long)]
        morph: Option<PathBuf>,
    },
    /// Summarize a saved model
    Inspect {
        file: PathBuf,
    },
}

impl Cli {
    /// Flag values that stand in for environment variables
    fn env_overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(provider) = self.provider {
            overrides.push(("VOXFORGE_PROVIDER", provider.to_string()));
        }
        if let Some(model) = &self.model {
            overrides.push(("VOXFORGE_MODEL", model.clone()));
        }
        if let Some(timeout) = self.timeout {
            overrides.push(("VOXFORGE_TIMEOUT_SECS", timeout.to_string()));
        }
        if let Commands::Serve { bind: Some(bind) } = &self.command {
            overrides.push(("VOXFORGE_BIND", bind.clone()));
        }
        overrides
    }

    fn load_config(&self) -> anyhow::Result<ForgeConfig> {
        let overrides = self.env_overrides();
        let config = ForgeConfig::from_lookup(|key| {
            overrides
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .or_else(|| std::env::var(key).ok())
        })?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_model(path: &Path) -> anyhow::Result<Vec<Voxel>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not JSON", path.display()))?;
    match Voxel::model_from_value(&value) {
        Some(voxels) => Ok(voxels),
        None => bail!("{} is not a voxel array", path.display()),
    }
}

fn build_request(prompt: &[String], morph: Option<&Path>) -> anyhow::Result<ForgeRequest> {
    let prompt = prompt.join(" ");
    Ok(match morph {
        Some(path) => ForgeRequest::morph(prompt, read_model(path)?),
        None => ForgeRequest::create(prompt),
    })
}

fn print_report(report: &ModelReport) {
    println!("{}", report.summary());
    if let Some(bounds) = report.bounds {
        println!("  bounds: {:?} .. {:?}", bounds.min, bounds.max);
    }
    println!("  grounded:  {}", if report.is_grounded() { "yes" } else { "no" });
    println!("  connected: {}", if report.is_connected() { "yes" } else { "no" });
}

async fn run_forge(
    config: ForgeConfig,
    prompt: &[String],
    morph: Option<&Path>,
    out: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let request = build_request(prompt, morph)?;
    let forge = Forge::new(config);
    let forged = forge.forge(request).await?;

    let json = serde_json::to_string_pretty(&forged.model)?;
    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            if !quiet {
                eprintln!("Model written to {}", path.display());
            }
        }
        None => println!("{}", json),
    }

    if !quiet {
        match &forged.report {
            Some(report) => eprintln!(
                "{} ({} via {}, {} tokens)",
                report.summary(),
                forged.mode.as_str(),
                forged.provider_model,
                forged.usage.total_tokens
            ),
            None => eprintln!("Reply was JSON but not a voxel array"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Serve { .. } => {
            let config = cli.load_config()?;
            let bind = config.bind_address.clone();
            voxforge_server::serve(AppState::new(config), &bind).await?;
        }
        Commands::Forge { prompt, morph, out } => {
            let config = cli.load_config()?;
            run_forge(config, prompt, morph.as_deref(), out.as_deref(), cli.quiet).await?;
        }
        Commands::Prompt { prompt, morph } => {
            let config = cli.load_config()?;
            let request = build_request(prompt, morph.as_deref())?;
            let prompts = Forge::new(config).prompts(&request)?;
            println!("=== SYSTEM PROMPT ===\n{}\n", prompts.system);
            println!("=== USER PROMPT ===\n{}", prompts.user);
        }
        Commands::Inspect { file } => {
            let voxels = read_model(file)?;
            print_report(&ModelReport::analyze(&voxels));
        }
    }

    Ok(())
}
