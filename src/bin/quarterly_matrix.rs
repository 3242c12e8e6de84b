use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use salesframe::{
    config::Config,
    reports::quarterly::{analyze, analyze_cube, sample_cube, sample_matrix},
};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let report = analyze(&sample_matrix()?, config.quarterly_target)?;
    report.print(&config.money())?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    analyze_cube(&sample_cube(&mut rng))?.print();
    Ok(())
}
