use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use salesframe::{
    config::Config,
    generate::sales_data,
    orders::{
        analyze_orders, calculate_bonus, calculate_growth_rate, categorize_performance, clean_values,
        high_performers, sales_by_department, sample_employees, sample_orders, top_performer, SalesAnalyzer,
    },
    report::{banner, opt_percent, section},
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
    let money = config.money();

    println!("{}", banner("E-COMMERCE ORDER ANALYSIS"));
    let orders = sample_orders();
    let a = analyze_orders(&orders);
    println!("Total Revenue (delivered): {}", money.fmt(a.delivered_revenue, 0));
    println!(
        "Cancellation Rate: {} ({}/{})",
        opt_percent(a.cancellation_rate, 1),
        a.cancelled_orders,
        a.total_orders
    );
    if let Some((customer, spent)) = &a.top_customer {
        println!("Top Customer: {} ({})", customer, money.fmt(*spent, 0));
    }
    println!("Average Order Value: {}", money.opt(a.avg_delivered_order, 2));
    println!("{}", section("Customer Summary"));
    for c in &a.customers {
        println!(
            "  {}: {} orders, {} delivered, revenue {}, avg {}",
            c.customer,
            c.orders,
            c.delivered_orders,
            money.fmt(c.revenue, 0),
            money.fmt(c.avg_order, 2)
        );
    }

    println!("\n{}", banner("EMPLOYEE PERFORMANCE"));
    let staff = sample_employees();
    for (dept, total) in sales_by_department(&staff) {
        println!("  {}: {}", dept, money.fmt(total, 0));
    }
    if let Some(best) = top_performer(&staff) {
        println!("Top Performer: {} ({})", best.name, money.fmt(best.sales, 0));
    }
    let strong: Vec<&str> = high_performers(&staff, 30000.0).iter().map(|e| e.name.as_str()).collect();
    println!("Above {}: {}", money.fmt(30000.0, 0), strong.join(", "));
    println!("{}", section("Bonuses"));
    for e in &staff {
        println!(
            "  {:<6} {:>10} -> bonus {} ({})",
            e.name,
            money.fmt(e.sales, 0),
            money.fmt(calculate_bonus(e.sales), 0),
            categorize_performance(e.sales, 30000.0, 50000.0)
        );
    }

    println!("\n{}", banner("HELPER FUNCTIONS"));
    println!(
        "Growth 1000 -> 1500: {}",
        opt_percent(calculate_growth_rate(1000.0, 1500.0), 1)
    );
    let cleaned = clean_values(&[Some(100.0), None, Some(-5.0), Some(250.0), Some(0.0)]);
    println!("Cleaned values: {:?}", cleaned);

    println!("\n{}", banner("SALES ANALYZER"));
    let mut rng = StdRng::seed_from_u64(config.seed);
    let analyzer = SalesAnalyzer::from_batch(&sales_data(config.rows.sales, &mut rng)?)?;
    let summary = analyzer.summary_report();
    println!("Total Revenue: {}", money.fmt(summary.total_revenue, 2));
    println!("Transactions: {}", summary.total_transactions);
    println!("Average Order Value: {}", money.opt(summary.average_order_value, 2));
    if let Some((product, revenue)) = &summary.top_product {
        println!("Top Product: {} ({})", product, money.fmt(*revenue, 2));
        let rows = analyzer.filter_by_product(product);
        println!("{} transactions of {}", rows.len(), product);
    }

    info!(orders = orders.len(), sales = analyzer.sales().len(), "order analysis done");
    Ok(())
}
