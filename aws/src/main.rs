use aws::sweep::{self, SweepOptions};
use aws::{AwsProvider, ProviderConfig};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "aws-sweeper")]
#[command(about = "Delete leftover Route53 Resolver test resources from a region")]
struct Cli {
    /// Region to sweep
    #[arg(long)]
    region: String,

    /// Sweeper to run (repeatable); runs every sweeper when omitted
    #[arg(long = "sweeper")]
    sweepers: Vec<String>,

    /// Control-plane endpoint, defaults to AWS_ENDPOINT_URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Deletions in flight per sweeper
    #[arg(long, default_value_t = sweep::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Print the sweepers in run order and exit
    #[arg(long)]
    list: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let registry = sweep::default_registry();
    let order = registry.run_order(&cli.sweepers)?;

    if cli.list {
        for name in &order {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut config = ProviderConfig::new().with_region(cli.region);
    if let Some(endpoint) = cli.endpoint {
        config = config.with_endpoint(endpoint);
    }

    let mut provider = AwsProvider::new();
    provider.configure(config)?;
    let client = provider.provider_data()?.client.clone();

    let options = SweepOptions {
        concurrency: cli.concurrency,
        ..Default::default()
    };

    let mut failed = Vec::new();
    for name in order {
        info!(sweeper = name, "Running sweeper");
        match sweep::run_sweeper(&client, name, &options).await {
            Ok(report) if report.skipped => info!(sweeper = name, "Sweeper skipped"),
            Ok(report) => info!(sweeper = name, deleted = report.deleted, "Sweeper finished"),
            Err(e) => {
                error!(sweeper = name, "Sweeper failed: {}", e);
                failed.push(name);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("sweepers failed: {}", failed.join(", ")).into())
    }
}
