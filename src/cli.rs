use clap::builder::FalseyValueParser;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_DIR;
use crate::display::OutputFormat;
use crate::pipeline::PipelineOptions;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Pivoted CSV (instance × region)
    Csv,
    /// Pivoted HTML table with a price gradient
    Html,
    /// Flat JSON array of {region, instance, price}
    Json,
    /// Aligned text table for terminals
    Table,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Table => OutputFormat::Table,
        }
    }
}

#[derive(clap::Parser, Debug)]
#[command(name = "ec2-prices", version, about = "Compare EC2 on-demand prices across regions")]
pub struct Args {
    /// Region names or wildcard patterns (repeatable), e.g. -r 'eu-*'
    #[arg(
        short = 'r',
        long = "region",
        value_name = "PATTERN",
        required_unless_present_any = ["list_regions", "clear_cache"]
    )]
    pub regions: Vec<String>,

    /// Instance types or wildcard patterns (repeatable), e.g. -t 'm5.*'
    #[arg(short = 't', long = "type", value_name = "PATTERN")]
    pub instance_types: Vec<String>,

    /// Current-generation instance types only (default)
    #[arg(long, overrides_with = "no_current_only")]
    pub current_only: bool,

    /// Include previous-generation instance types
    #[arg(long, overrides_with = "current_only")]
    pub no_current_only: bool,

    /// Output format: csv|html|json|table
    #[arg(long, value_enum, default_value_t = FormatArg::Csv, env = "EC2_PRICES_FORMAT")]
    pub format: FormatArg,

    /// Directory holding downloaded price lists
    #[arg(long, env = "EC2_PRICES_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Maximum age of a cached price list, in seconds
    #[arg(long, env = "EC2_PRICES_CACHE_TTL", default_value_t = 86_400)]
    pub cache_ttl: u64,

    /// Ignore cached price lists and download again
    #[arg(long)]
    pub refresh: bool,

    /// Delete cached price lists and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// HTTP timeout for a single price list download, in seconds
    #[arg(long, env = "EC2_PRICES_TIMEOUT", default_value_t = 300)]
    pub timeout: u64,

    /// Regions to download and parse concurrently (each holds a full catalog in memory)
    #[arg(short = 'j', long, env = "EC2_PRICES_JOBS", default_value_t = 1)]
    pub jobs: usize,

    /// Print the known regions and exit
    #[arg(long)]
    pub list_regions: bool,

    /// Disable colored output in the table format (or set NO_COLOR)
    #[arg(long, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,

    /// Debug logging (EC2_PRICES_LOG takes precedence)
    #[arg(long, env = "EC2_PRICES_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }

    pub fn current_generation_only(&self) -> bool {
        !self.no_current_only
    }

    /// Effective cache TTL; `--refresh` makes every entry stale
    pub fn ttl(&self) -> Duration {
        if self.refresh {
            Duration::ZERO
        } else {
            Duration::from_secs(self.cache_ttl)
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            region_patterns: self.regions.clone(),
            instance_type_patterns: self.instance_types.clone(),
            current_generation_only: self.current_generation_only(),
            jobs: self.jobs,
            ..PipelineOptions::default()
        }
    }
}
