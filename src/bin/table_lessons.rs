// Selection, grouping, pivoting, missing data and time-series walkthrough on
// the generated tables.

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use salesframe::{
    config::Config,
    derive::{bucket_column, round_all},
    generate::{daily_sales, grouping_data, product_catalog, raw_orders},
    group::{Agg, AggFunc, GroupBy},
    missing::{dropna, ffill, fillna, null_percentages, total_nulls, DropNa, Fill},
    pivot::{crosstab, pivot_table, CrosstabSpec, Normalize, PivotSpec},
    report::{banner, print_table, section},
    select::{col, filter, query, Value},
    series::{add_series, Transform},
    sort::{nlargest, top_n_per_group, with_rank},
    stats,
    table::{describe, f64_values, head, with_column},
};
use std::collections::HashMap;
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
    let mut rng = StdRng::seed_from_u64(config.seed);

    // ── selection ─────────────────────────────────────────────────────
    println!("{}", banner("SELECTING DATA"));
    let catalog = product_catalog()?;
    print_table(&catalog)?;
    println!("{}", section("Accessories under 2000"));
    print_table(&filter(
        &catalog,
        &col("Category").eq("Accessory").and(col("Price").lt(2000)),
    )?)?;
    println!("{}", section("Laptop or Monitor"));
    print_table(&filter(&catalog, &col("Product").is_in(["Laptop", "Monitor"]))?)?;
    println!("{}", section("Two most expensive"));
    print_table(&nlargest(&catalog, 2, "Price")?)?;

    // ── grouping ──────────────────────────────────────────────────────
    println!("\n{}", banner("GROUPBY AND AGGREGATIONS"));
    let sales = grouping_data(config.rows.sales, &mut rng)?;
    let by_product = GroupBy::new(&sales, &["Product"])?;
    print_table(&by_product.size()?)?;
    print_table(&round_all(
        &by_product.agg(&[
            Agg::new("Revenue", AggFunc::Sum),
            Agg::new("Revenue", AggFunc::Mean),
            Agg::new("Revenue", AggFunc::Std),
            Agg::new("Quantity", AggFunc::Median),
            Agg::new("Revenue", AggFunc::Range),
        ])?,
        2,
    )?)?;

    println!("{}", section("Share of product revenue per row"));
    let product_total = by_product.transform("Revenue", AggFunc::Sum)?;
    let sales = with_column(&sales, "Product_Total", product_total)?;
    let ranked = with_column(&sales, "Rank_In_Product", by_product.rank("Revenue", true)?)?;
    print_table(&head(&ranked, 5))?;

    println!("{}", section("Products averaging above 80,000"));
    let strong = by_product.filter(|g| {
        let revenue: Vec<f64> = f64_values(g, "Revenue")?.into_iter().flatten().collect();
        Ok(stats::mean(&revenue) > 80000.0)
    })?;
    println!("{} of {} rows kept", strong.num_rows(), sales.num_rows());

    println!("{}", section("Best two sales per region"));
    print_table(&top_n_per_group(&sales, "Region", 2, "Revenue")?)?;
    let north = GroupBy::new(&sales, &["Region"])?.get_group(&["North"])?;
    println!("North has {} transactions", north.num_rows());

    // ── pivot and crosstab ────────────────────────────────────────────
    println!("\n{}", banner("PIVOT TABLES AND CROSSTAB"));
    print_table(&pivot_table(
        &sales,
        &PivotSpec::new("Region", "Product", "Revenue", AggFunc::Sum)
            .fill(0.0)
            .margins("Total"),
    )?)?;
    print_table(&crosstab(
        &sales,
        "Region",
        "Category",
        &CrosstabSpec {
            normalize: Normalize::Index,
            ..CrosstabSpec::default()
        },
    )?)?;

    let vars = HashMap::from([("min".to_string(), Value::Number(50000.0))]);
    let big_north = query(&sales, "Revenue > @min and Region == 'North'", &vars)?;
    println!("North sales above {}: {}", money.fmt(50000.0, 0), big_north.num_rows());
    print_table(&describe(&sales)?)?;

    // ── missing data ──────────────────────────────────────────────────
    println!("\n{}", banner("HANDLING MISSING DATA"));
    let raw = raw_orders(config.rows.raw_orders, &mut rng)?;
    println!("Missing cells: {}", total_nulls(&raw));
    print_table(&null_percentages(&raw)?)?;
    let complete = dropna(&raw, &DropNa::default())?;
    let rated = dropna(&raw, &DropNa::subset(&["customer_rating"]))?;
    println!(
        "Rows: {} raw, {} complete, {} with a rating",
        raw.num_rows(),
        complete.num_rows(),
        rated.num_rows()
    );
    let filled = fillna(&raw, "customer_rating", &Fill::Mean)?;
    let filled = ffill(&filled, "region")?;
    println!("After filling rating and region: {} missing cells", total_nulls(&filled));

    // ── time series ───────────────────────────────────────────────────
    println!("\n{}", banner("TIME SERIES"));
    let daily = daily_sales(30, &mut rng)?;
    let daily = add_series(&daily, "Sales", Transform::CumSum, "Cumulative")?;
    let daily = add_series(&daily, "Sales", Transform::Rolling(7), "Rolling_7")?;
    let daily = add_series(&daily, "Sales", Transform::PctChange, "Change")?;
    let daily = with_rank(&daily, "Sales", "Rank", true, false)?;
    let daily = bucket_column(&daily, "Sales", "Level", &[(40000.0, "High"), (25000.0, "Medium")], "Low")?;
    print_table(&round_all(&head(&daily, 10), 2)?)?;

    let values: Vec<f64> = f64_values(&daily, "Sales")?.into_iter().flatten().collect();
    let (outliers, _) = stats::zscore_outliers(&values, 2.0);
    println!("Outliers beyond 2 sigma: {:?}", outliers);
    if let (Some(&first), Some(&last)) = (values.first(), values.last()) {
        if let Some(rate) = stats::growth_rate(first, last) {
            let next: Vec<String> = stats::forecast(last, rate / values.len() as f64, 3)
                .into_iter()
                .map(|v| money.fmt(v, 0))
                .collect();
            println!("Next three days at the average daily growth: {}", next.join(", "));
        }
    }

    info!("lessons complete");
    Ok(())
}
