use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fusionnet_burn::{FusionNetConfig, ModelConfig};
use fusionnet_demos::{
    default_device, run_fuse, run_profile, FuseConfig, FusionBackend, ProfileConfig, BACKEND_NAME,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fusionnet")]
#[command(about = "FusionNet: visible/infrared image fusion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuse an image pair, or two directories of same-named pairs
    Fuse {
        /// Visible image or directory
        #[arg(long)]
        visible: PathBuf,

        /// Infrared image or directory
        #[arg(long)]
        infrared: PathBuf,

        /// Output image (single pair) or directory
        #[arg(short, long)]
        output: PathBuf,

        /// Model weights (.mpk, or .pth with the `pretrained` feature)
        #[arg(short, long)]
        weights: Option<PathBuf>,

        /// Keep the visible image's colours
        #[arg(long)]
        color: bool,

        /// Model configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run one forward pass on random input and report cost per layer
    Profile {
        #[arg(long, default_value_t = 2)]
        batch: usize,

        #[arg(long, default_value_t = 640)]
        height: usize,

        #[arg(long, default_value_t = 480)]
        width: usize,
    },

    /// Show backend and model information
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let device = default_device();
    tracing::info!(backend = BACKEND_NAME, "using backend");

    match cli.command {
        Commands::Fuse {
            visible,
            infrared,
            output,
            weights,
            color,
            config,
        } => {
            let fuse_config = FuseConfig {
                visible,
                infrared,
                output,
                weights,
                color,
                model_config: config,
            };
            run_fuse::<FusionBackend>(&fuse_config, &device)
        }

        Commands::Profile {
            batch,
            height,
            width,
        } => {
            let config = ProfileConfig {
                batch,
                height,
                width,
                ..ProfileConfig::default()
            };
            let report = run_profile::<FusionBackend>(config, &device)?;

            println!("{}", report.summary);
            println!();
            println!("output: {:?}, range [{:.4}, {:.4}]", report.output_dims, report.min, report.max);
            println!("{:<28} {:>16}", "layer", "MACs");
            for (name, macs) in report.summary.macs(height, width) {
                println!("{name:<28} {:>16}", macs * batch as u64);
            }
            println!("total MACs: {}", report.total_macs);
            Ok(())
        }

        Commands::Info => {
            let model = FusionNetConfig::new(ModelConfig::new()).init::<FusionBackend>(&device)?;
            let summary = model.summary();
            println!("FusionNet Information:");
            println!("  Backend: {BACKEND_NAME}");
            println!("  Device: {device:?}");
            println!("  Learned parameters: {}", summary.total_params());
            println!("  Running statistics: {}", summary.total_buffers());
            println!("  MACs per pixel: {}", summary.total_macs(1, 1));
            Ok(())
        }
    }
}
