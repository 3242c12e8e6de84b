use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use salesframe::{config::Config, generate::raw_orders, reports::transformation};
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
    let raw = raw_orders(config.rows.raw_orders, &mut rng)?;

    let report = transformation::run(&raw)?;
    report.print(&config.money())?;
    let path = report.write(&config.output_dir)?;
    info!(path = %path.display(), "clean orders saved");
    Ok(())
}
