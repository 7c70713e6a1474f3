use anyhow::{Context, Result};
use std::io::{IsTerminal, Write};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ec2_prices::cache::CacheStore;
use ec2_prices::catalog::CatalogFetcher;
use ec2_prices::cli::Args;
use ec2_prices::display::{render, render_regions};
use ec2_prices::pipeline::{self, to_rows};

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_env("EC2_PRICES_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut stdout = std::io::stdout().lock();

    if args.list_regions {
        stdout.write_all(render_regions().as_bytes())?;
        return Ok(());
    }

    let cache = CacheStore::new(&args.cache_dir);
    if args.clear_cache {
        let removed = cache
            .clear()
            .with_context(|| format!("clear cache in {}", args.cache_dir.display()))?;
        info!(removed, dir = %args.cache_dir.display(), "Cleared cache");
        return Ok(());
    }

    let fetcher =
        CatalogFetcher::new(cache, Duration::from_secs(args.timeout)).ttl(args.ttl());
    let options = args.pipeline_options();

    let entries = pipeline::run(&fetcher, &options).context("collect on-demand prices")?;
    info!(rows = entries.len(), "Collected prices");

    let color = !args.no_color && stdout.is_terminal();
    let out = render(args.format.into(), &to_rows(&entries), color).context("render output")?;
    stdout.write_all(out.as_bytes())?;
    if !out.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
