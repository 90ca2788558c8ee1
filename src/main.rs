use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use travel_directory::config::{DataBackend, DirectoryConfig};
use travel_directory::sitemap::{SitemapBuilder, render_xml};
use travel_directory::{seed, telemetry, web};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "travel-directory")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web server
    Serve {
        /// Listen port, overrides `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Import a scraped agency export into the configured store
    Seed {
        /// Export file, defaults to `data.seed_file`
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Write sitemap.xml for the current directory contents
    Sitemap {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

async fn run_seed(config: &DirectoryConfig, file: Option<PathBuf>) -> Result<()> {
    if config.data.backend != DataBackend::Hosted {
        bail!("Seeding writes to the hosted data service; set data.backend = \"hosted\"");
    }
    let file = file.unwrap_or_else(|| PathBuf::from(&config.data.seed_file));
    let store = web::open_store(config).await?;

    let report = seed::seed_from_file(store.as_ref(), &file, config.seed.batch_size as usize, |_| {
        print!(".");
        let _ = std::io::stdout().flush();
    })
    .await
    .with_context(|| format!("Failed to seed from {}", file.display()))?;

    println!();
    println!("Seeding complete!");
    info!(
        "Read {}, prepared {}, inserted {}, failed batches {}",
        report.read, report.prepared, report.inserted, report.failed_batches
    );
    Ok(())
}

async fn write_sitemap(config: &DirectoryConfig, output: Option<PathBuf>) -> Result<()> {
    let store = web::open_store(config).await?;
    let agencies = store.list_public_agencies().await?;
    let entries = SitemapBuilder::new(&config.server.public_base_url).build(&agencies);
    let xml = render_xml(&entries)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, xml)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Sitemap with {} URLs written to {}", entries.len(), path.display());
        }
        None => println!("{xml}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = DirectoryConfig::load_from_path(args.config).context("Failed to load configuration")?;
    let _telemetry = telemetry::init(&config.logging)?;

    match args.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run(config).await
        }
        Command::Seed { file } => run_seed(&config, file).await,
        Command::Sitemap { output } => write_sitemap(&config, output).await,
    }
}
