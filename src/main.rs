use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use salesframe::{
    chart::gallery,
    config::Config,
    export::{list_outputs, write_csv},
    generate::{business_data, customer_ids, customers, raw_orders, sales_data, transactions},
    reports::{business, ecommerce, executive, quarterly, transformation},
};
use std::{fs, time::Instant};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) config and output dir ────────────────────────────────────
    let config = Config::load()?;
    let money = config.money();
    let out = config.output_dir.clone();
    fs::create_dir_all(&out)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let start = Instant::now();

    // ─── 3) sales data → csv → executive report ──────────────────────
    let sales = sales_data(config.rows.sales, &mut rng)?;
    let sales_csv = config.output(executive::SALES_DATA_FILE);
    write_csv(&sales, &sales_csv)?;
    executive::analyze(&executive::load(&sales_csv)?)?.print(&money)?;

    // ─── 4) raw orders → clean orders ────────────────────────────────
    let cleaned = transformation::run(&raw_orders(config.rows.raw_orders, &mut rng)?)?;
    cleaned.print(&money)?;
    if !cleaned.validation.is_clean() {
        warn!(validation = ?cleaned.validation, "clean orders break a business rule");
    }
    cleaned.write(&out)?;

    // ─── 5) business report ──────────────────────────────────────────
    let biz = business::analyze(&business_data(config.rows.business, &mut rng)?)?;
    biz.print(&money)?;
    biz.write(&out)?;

    // ─── 6) e-commerce report ────────────────────────────────────────
    let ids = customer_ids(config.rows.customers);
    let shop = ecommerce::analyze(
        &customers(config.rows.customers, &mut rng)?,
        &transactions(config.rows.transactions, &ids, &mut rng)?,
    )?;
    shop.print(&money)?;
    shop.write(&out)?;

    // ─── 7) quarterly matrix and cube ────────────────────────────────
    quarterly::analyze(&quarterly::sample_matrix()?, config.quarterly_target)?.print(&money)?;
    quarterly::analyze_cube(&quarterly::sample_cube(&mut rng))?.print();

    // ─── 8) charts ───────────────────────────────────────────────────
    let charts = gallery::write_all(&config.output("charts"), &sales, &mut rng)?;
    info!(charts = charts.len(), "chart specifications written");

    // ─── 9) list what was produced ───────────────────────────────────
    println!("\nFiles in {}:", out.display());
    for ext in ["csv", "parquet"] {
        for path in list_outputs(&out, ext)? {
            println!("  {}", path.display());
        }
    }
    info!(elapsed = ?start.elapsed(), "all done");
    Ok(())
}
