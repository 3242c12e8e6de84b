use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use salesframe::{chart::gallery, config::Config, generate::sales_data};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let sales = sales_data(config.rows.sales, &mut rng)?;

    let written = gallery::write_all(&config.output("charts"), &sales, &mut rng)?;
    println!("Chart specifications created:");
    for path in &written {
        println!("  {}", path.display());
    }
    Ok(())
}
