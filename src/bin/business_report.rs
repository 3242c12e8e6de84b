use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use salesframe::{config::Config, generate::business_data, reports::business};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let df = business_data(config.rows.business, &mut rng)?;

    let report = business::analyze(&df)?;
    report.print(&config.money())?;
    let written = report.write(&config.output_dir)?;
    info!(files = written.len(), dir = %config.output_dir.display(), "business reports saved");
    Ok(())
}
