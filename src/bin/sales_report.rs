// Executive report over a sales_data.csv written by an earlier run.

use anyhow::Result;
use salesframe::{
    config::Config,
    reports::executive::{analyze, load, SALES_DATA_FILE},
};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    // usage: sales_report [SALES_CSV]
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output(SALES_DATA_FILE));
    info!(path = %path.display(), "loading sales data");

    let sales = load(&path)?;
    analyze(&sales)?.print(&config.money())
}
