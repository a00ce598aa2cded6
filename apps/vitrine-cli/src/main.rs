use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vitrine_assets::{EnvironmentLoader, LoadEvent};
use vitrine_common::Viewport;
use vitrine_render::{DebugTextRenderer, Renderer};
use vitrine_stage::{Stage, StageConfig};

#[derive(Parser)]
#[command(name = "vitrine-cli", about = "CLI tool for the card showcase viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Asset directory (overrides the config file)
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Assemble the scene and print it
    Describe {
        /// Print the object list as JSON
        #[arg(long)]
        json: bool,
        /// Viewport width in logical pixels
        #[arg(long, default_value = "1280")]
        width: f32,
        /// Viewport height in logical pixels
        #[arg(long, default_value = "720")]
        height: f32,
        /// Device pixel ratio
        #[arg(long, default_value = "1")]
        pixel_ratio: f32,
    },
    /// Decode an environment map with progress logging
    Probe {
        /// Environment file; defaults to the configured one
        path: Option<PathBuf>,
        /// Frames to run once the environment is in
        #[arg(short, long, default_value = "0")]
        frames: u32,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<StageConfig> {
    let mut config = match &cli.config {
        Some(path) => StageConfig::load(path)?,
        None => StageConfig::default(),
    };
    if let Some(assets) = &cli.assets {
        config = config.with_asset_dir(assets);
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Info => {
            println!("vitrine-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", vitrine_assets::crate_info());
            println!("render: {}", vitrine_render::crate_info());
            println!("stage: {}", vitrine_stage::crate_info());
            println!("asset dir: {}", config.asset_dir.display());
            println!("environment: {}", config.environment_path().display());
        }
        Commands::Describe {
            json,
            width,
            height,
            pixel_ratio,
        } => {
            let stage = Stage::from_config(&config, Viewport::new(width, height, pixel_ratio));
            if json {
                println!("{}", serde_json::to_string_pretty(stage.scene().objects())?);
            } else {
                let mut renderer = DebugTextRenderer::new();
                print!("{}", renderer.render(stage.scene(), stage.camera()));
            }
        }
        Commands::Probe { path, frames } => {
            let path = path.unwrap_or_else(|| config.environment_path());
            tracing::info!(path = %path.display(), "probing environment");
            let mut stage = Stage::from_config(&config, Viewport::default());
            let mut failure = None;

            EnvironmentLoader::new(&path).load_blocking(|event| match event {
                LoadEvent::Loaded(environment) => {
                    println!(
                        "{}: {}x{} ({:?}, {} bytes)",
                        path.display(),
                        environment.width,
                        environment.height,
                        environment.mapping,
                        environment.byte_len()
                    );
                    stage.handle_event(LoadEvent::Loaded(environment));
                }
                LoadEvent::Failed(error) => {
                    failure = Some(error.to_string());
                    stage.handle_event(LoadEvent::Failed(error));
                }
                progress => stage.handle_event(progress),
            });

            if let Some(error) = failure {
                bail!("probe failed: {error}");
            }

            let mut renderer = DebugTextRenderer::new();
            for _ in 0..frames {
                if let Some(output) = stage.frame(&mut renderer) {
                    print!("{output}");
                }
            }
            println!(
                "loaded={} frames={} card_yaw={:.4}",
                stage.is_loaded(),
                stage.frames_rendered(),
                stage.card_yaw()
            );
        }
    }

    Ok(())
}
