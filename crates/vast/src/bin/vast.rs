//! Vast CLI - rent and manage GPU instances on vast.ai.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vast::config::DEFAULT_API_URL;
use vast::{GpuMarketplace, InstanceCreateOptions, OfferFilter, Vast, VastConfig};

/// Vast CLI - Rent GPU instances from the vast.ai marketplace.
#[derive(Parser)]
#[command(name = "vast")]
#[command(about = "Search, rent and tear down GPU instances on vast.ai")]
struct Cli {
    /// vast.ai API key (or set `VAST_API_KEY` env var).
    #[arg(long, env = "VAST_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// API root URL.
    #[arg(long, env = "VAST_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search available offers.
    Offers {
        /// Minimum number of GPUs.
        #[arg(long, default_value_t = vast::providers::traits::DEFAULT_MIN_GPU_COUNT)]
        min_gpus: u32,

        /// Minimum disk space in GB.
        #[arg(long, default_value_t = vast::providers::traits::DEFAULT_MIN_DISK_GB)]
        min_disk: f64,

        /// Maximum price per hour in USD.
        #[arg(long)]
        max_price: Option<f64>,

        /// Minimum upload bandwidth in Mbps.
        #[arg(long)]
        min_upload: Option<f64>,

        /// Minimum download bandwidth in Mbps.
        #[arg(long)]
        min_download: Option<f64>,

        /// Show at most this many offers.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Rent an offer.
    Create {
        /// Offer ID (from `offers` command).
        #[arg(long)]
        offer: u64,

        /// Docker image.
        #[arg(long, default_value = vast::providers::traits::DEFAULT_DOCKER_IMAGE)]
        image: String,

        /// Docker option (repeatable), e.g. `-p 8081:8081`.
        #[arg(long = "docker-option", allow_hyphen_values = true)]
        docker_options: Vec<String>,

        /// Disk size in GB.
        #[arg(long, default_value = "10")]
        disk: u32,
    },

    /// List running instances.
    List,

    /// Delete an instance.
    Delete {
        /// Instance ID.
        #[arg(long)]
        id: u64,

        /// Skip confirmation prompt.
        #[arg(long, short = 'y', default_value = "false")]
        yes: bool,
    },

    /// Delete every running instance.
    StopAll {
        /// Skip confirmation prompt.
        #[arg(long, short = 'y', default_value = "false")]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up API_KEY / VAST_API_KEY from a local .env before clap reads env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = resolve_config(&cli)?;
    let market = Vast::new(config).context("Failed to create vast.ai client")?;

    match cli.command {
        Commands::Offers {
            min_gpus,
            min_disk,
            max_price,
            min_upload,
            min_download,
            limit,
        } => {
            let filter = OfferFilter {
                min_gpu_count: min_gpus,
                min_disk_gb: min_disk,
                max_hourly_price: max_price,
                min_upload_mbps: min_upload,
                min_download_mbps: min_download,
            };
            let offers = market.list_offers(&filter).await?;

            println!(
                "\n{:<12} {:>5} {:>10} {:>10} {:>10} {:>10}",
                "ID", "GPUS", "$/HR", "SCORE", "DISK GB", "GPU RAM"
            );
            println!("{}", "-".repeat(62));

            let shown = offers.len().min(limit.unwrap_or(usize::MAX));
            for offer in &offers[..shown] {
                println!(
                    "{:<12} {:>5} {:>10.3} {:>10.1} {:>10.1} {:>10.0}",
                    offer.id,
                    offer.gpu_count,
                    offer.hourly_price,
                    offer.score,
                    offer.disk_gb,
                    offer.gpu_ram
                );
            }
            println!("\n{}\n", offers_footer(shown, offers.len()));
        }

        Commands::Create {
            offer,
            image,
            docker_options,
            disk,
        } => {
            let options = docker_options.into_iter().fold(
                InstanceCreateOptions::default()
                    .docker_image(image)
                    .disk_space_gb(disk),
                |options, flag| options.docker_option(flag),
            );

            let created = market.create_instance(offer, options).await?;

            println!("\n✅ Instance requested from offer {offer}");
            if let Some(id) = created.contract_id {
                println!("   Contract: {id}");
            }
            println!("\n💡 Run `vast list` to see its SSH endpoint once it starts");
        }

        Commands::List => {
            let instances = market.list_instances().await?;

            println!("\n{:<12} {:<20} {:<40}", "ID", "STATUS", "SSH");
            println!("{}", "-".repeat(72));

            for instance in instances {
                println!(
                    "{:<12} {:<20} {:<40}",
                    instance.id,
                    instance.status.as_deref().unwrap_or("-"),
                    instance.ssh_command.as_deref().unwrap_or("-")
                );
                for port in &instance.forwarded_ports {
                    println!("{:<12} {:<20} {port}", "", "");
                }
            }
            println!();
        }

        Commands::Delete { id, yes } => {
            if !yes {
                println!("⚠️  Are you sure you want to delete instance {id}?");
                println!("   This action cannot be undone.");
                println!("   Use --yes to skip this prompt.");
                return Ok(());
            }

            market.delete_instance(id).await?;
            println!("\n✅ Instance {id} deleted");
        }

        Commands::StopAll { yes } => {
            if !yes {
                println!("⚠️  Are you sure you want to delete ALL running instances?");
                println!("   This action cannot be undone.");
                println!("   Use --yes to skip this prompt.");
                return Ok(());
            }

            let deleted = market
                .stop_all()
                .await
                .context("Stopping instances failed; earlier deletions were not rolled back")?;
            info!(count = deleted.len(), "Stop-all finished");
            println!("\n✅ Deleted {} instance(s)", deleted.len());
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<VastConfig> {
    let config = if cli.api_key.trim().is_empty() {
        VastConfig::from_env()
    } else {
        VastConfig::new(&cli.api_key)
    }
    .context("vast.ai credentials are missing. Provide --api-key or set VAST_API_KEY.")?;

    Ok(config.with_base_url(&cli.api_url))
}

fn offers_footer(shown: usize, total: usize) -> String {
    if shown == total {
        format!("{total} offer(s)")
    } else {
        format!("showing {shown} of {total} offer(s)")
    }
}
