use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use salesframe::{
    config::Config,
    generate::{customer_ids, customers, transactions},
    reports::ecommerce,
};
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
    let people = customers(config.rows.customers, &mut rng)?;
    let txns = transactions(config.rows.transactions, &customer_ids(config.rows.customers), &mut rng)?;

    let report = ecommerce::analyze(&people, &txns)?;
    report.print(&config.money())?;
    for path in report.write(&config.output_dir)? {
        info!("saved {}", path.display());
    }
    Ok(())
}
