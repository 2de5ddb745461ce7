use std::sync::Arc;

use clap::Parser;
use tracing::info;

use en2pl::cache::MemoStore;
use en2pl::config::Config;
use en2pl::lookup::{Limits, Lookup, format_report};
use en2pl::transport::HttpTransport;

/// Look up Polish translations of an English term or Wikipedia URL.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// English term, phrase, or en.wikipedia.org article URL
    query: String,
    /// Maximum Diki results (0 = unlimited)
    #[arg(long, default_value_t = 5)]
    diki_limit: usize,
    /// Maximum ProZ results (0 = unlimited)
    #[arg(long, default_value_t = 5)]
    proz_limit: usize,
    /// Maximum ProZ term pairs (0 = skip pair extraction)
    #[arg(long, default_value_t = 0)]
    pairs: usize,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("en2pl=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let store = Arc::new(MemoStore::new(config.cache_ttl));
    let lookup = Lookup::new(HttpTransport::new(&config)?, store, &config);

    info!(query = %cli.query, "starting lookup");
    let limits = Limits {
        diki: cli.diki_limit,
        proz: cli.proz_limit,
        pairs: cli.pairs,
    };
    let report = lookup.run(&cli.query, limits).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}
