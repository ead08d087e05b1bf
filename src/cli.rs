use clap::Parser;
use std::path::PathBuf;

/// Scan a saved container image archive for installed packages and known CVEs
#[derive(Parser, Debug)]
#[command(name = "layerscan")]
#[command(version)]
#[command(
    about = "Static package inventory and CVE correlation for saved container images",
    long_about = None
)]
pub struct Args {
    /// Path to the saved image archive (e.g. produced by `docker save`)
    pub archive: PathBuf,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Skip CVE correlation and emit the inventory alone
    #[arg(long)]
    pub skip_correlation: bool,

    /// Subjects grouped into one unit of correlation work; each subject
    /// still gets its own feed query
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Concurrent vulnerability feed queries
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Wall-clock budget for the correlation stage, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Vulnerability feed endpoint (defaults to the public NVD API)
    #[arg(long, value_name = "URL")]
    pub feed_url: Option<String>,

    /// Explicit configuration file path
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
