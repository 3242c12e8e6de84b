//! Executive sales report over the `Date, Product, Region, Quantity,
//! Unit_Price, Revenue` table.

use super::{leader, number_at, trailer};
use crate::group::{group_agg, Agg, AggFunc};
use crate::report::{banner, percent, print_table, share_table, thousands, with_share, Money};
use crate::sort::{sort_values, SortKey};
use crate::stats;
use crate::table::{column, drop_columns, f64_values, head, nunique, tail};
use crate::temporal::{date_part, date_parts, naive_datetimes, DatePart};
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// The generated sales table as handed to this report.
pub const SALES_DATA_FILE: &str = "sales_data.csv";

/// Read a sales CSV, failing on any column that does not match the sales
/// layout.
pub fn load(path: &Path) -> Result<RecordBatch> {
    crate::load::load_csv_with_schema(path, &crate::schema::sales_schema())
        .with_context(|| format!("{} is not a sales table", path.display()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueDistribution {
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub q25: f64,
    pub q75: f64,
    pub max: f64,
}

/// Transactions at or above the 90th revenue percentile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighValue {
    pub threshold: f64,
    pub count: usize,
    pub count_pct: f64,
    pub revenue: f64,
    pub revenue_pct: f64,
}

#[derive(Debug, Clone)]
pub struct ExecutiveReport {
    pub transactions: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub products: usize,
    pub regions: usize,
    pub distribution: RevenueDistribution,
    pub high_value: HighValue,
    /// Product, Total_Revenue, Avg_Revenue, Transactions, Total_Quantity.
    pub product_summary: RecordBatch,
    /// Region, Total_Revenue, Avg_Revenue, Transactions, Market_Share_%.
    pub region_summary: RecordBatch,
    /// Product, Region, Revenue; largest first.
    pub combinations: RecordBatch,
    /// Week, Revenue in week order.
    pub weekly: RecordBatch,
    /// DayOfWeek, Revenue_sum, Revenue_mean, Revenue_count; Monday first.
    pub day_of_week: RecordBatch,
}

fn distribution(revenue: &[f64]) -> RevenueDistribution {
    RevenueDistribution {
        total: stats::sum(revenue),
        mean: stats::mean(revenue),
        median: stats::median(revenue),
        min: stats::min(revenue).unwrap_or(f64::NAN),
        q25: stats::quantile(revenue, 0.25),
        q75: stats::quantile(revenue, 0.75),
        max: stats::max(revenue).unwrap_or(f64::NAN),
    }
}

fn high_value(revenue: &[f64]) -> HighValue {
    let threshold = stats::quantile(revenue, 0.90);
    let top: Vec<f64> = revenue.iter().copied().filter(|&r| r >= threshold).collect();
    let total = stats::sum(revenue);
    let top_revenue = stats::sum(&top);
    HighValue {
        threshold,
        count: top.len(),
        count_pct: stats::conversion_rate(top.len(), revenue.len()).unwrap_or(0.0),
        revenue: top_revenue,
        revenue_pct: if total == 0.0 { 0.0 } else { top_revenue / total * 100.0 },
    }
}

fn revenue_summary(sales: &RecordBatch, key: &str) -> Result<RecordBatch> {
    let t = group_agg(
        sales,
        &[key],
        &[
            Agg::new("Revenue", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("Revenue", AggFunc::Mean).alias("Avg_Revenue"),
            Agg::new("Revenue", AggFunc::Count).alias("Transactions"),
        ],
    )?;
    sort_values(&t, &[SortKey::desc("Total_Revenue")])
}

pub fn analyze(sales: &RecordBatch) -> Result<ExecutiveReport> {
    let revenue: Vec<f64> = f64_values(sales, "Revenue")?.into_iter().flatten().collect();

    let dates: Vec<NaiveDate> = naive_datetimes(column(sales, "Date")?)?
        .into_iter()
        .flatten()
        .map(|dt| dt.date())
        .collect();
    let date_range = dates.iter().min().copied().zip(dates.iter().max().copied());

    let product_summary = {
        let t = group_agg(
            sales,
            &["Product"],
            &[
                Agg::new("Revenue", AggFunc::Sum).alias("Total_Revenue"),
                Agg::new("Revenue", AggFunc::Mean).alias("Avg_Revenue"),
                Agg::new("Revenue", AggFunc::Count).alias("Transactions"),
                Agg::new("Quantity", AggFunc::Sum).alias("Total_Quantity"),
            ],
        )?;
        sort_values(&t, &[SortKey::desc("Total_Revenue")])?
    };
    let region_summary = with_share(
        &revenue_summary(sales, "Region")?,
        "Total_Revenue",
        "Market_Share_%",
    )?;

    let combinations = {
        let t = group_agg(
            sales,
            &["Product", "Region"],
            &[Agg::new("Revenue", AggFunc::Sum).alias("Revenue")],
        )?;
        sort_values(&t, &[SortKey::desc("Revenue")])?
    };

    let weekly = {
        let with_week = date_part(sales, "Date", DatePart::IsoWeek, "Week")?;
        group_agg(&with_week, &["Week"], &[Agg::new("Revenue", AggFunc::Sum).alias("Revenue")])?
    };

    let day_of_week = {
        let with_day = date_parts(
            sales,
            "Date",
            &[(DatePart::DayOfWeek, "Weekday"), (DatePart::DayName, "DayOfWeek")],
        )?;
        // grouping on the weekday number first keeps Monday..Sunday order
        let t = group_agg(
            &with_day,
            &["Weekday", "DayOfWeek"],
            &[
                Agg::new("Revenue", AggFunc::Sum),
                Agg::new("Revenue", AggFunc::Mean),
                Agg::new("Revenue", AggFunc::Count),
            ],
        )?;
        drop_columns(&t, &["Weekday"])?
    };

    info!(
        transactions = sales.num_rows(),
        products = product_summary.num_rows(),
        regions = region_summary.num_rows(),
        "executive report ready"
    );
    Ok(ExecutiveReport {
        transactions: sales.num_rows(),
        date_range,
        products: nunique(sales, "Product")?,
        regions: nunique(sales, "Region")?,
        distribution: distribution(&revenue),
        high_value: high_value(&revenue),
        product_summary,
        region_summary,
        combinations,
        weekly,
        day_of_week,
    })
}

impl ExecutiveReport {
    /// Best and worst week by revenue.
    pub fn week_extremes(&self) -> Result<Option<((i64, f64), (i64, f64))>> {
        let totals: Vec<f64> = f64_values(&self.weekly, "Revenue")?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        let (Some(best), Some(worst)) = (stats::argmax(&totals), stats::argmin(&totals)) else {
            return Ok(None);
        };
        let week = |i: usize| -> Result<i64> {
            Ok(number_at(&self.weekly, "Week", i)?.unwrap_or_default() as i64)
        };
        Ok(Some(((week(best)?, totals[best]), (week(worst)?, totals[worst]))))
    }

    pub fn print(&self, money: &Money) -> Result<()> {
        println!("{}", banner("SALES PERFORMANCE ANALYSIS - EXECUTIVE REPORT"));
        println!("\nDataset Overview:");
        println!("Total Transactions: {}", thousands(self.transactions as f64, 0));
        if let Some((from, to)) = self.date_range {
            println!("Date Range: {} to {}", from, to);
        }
        println!("Products: {}", self.products);
        println!("Regions: {}", self.regions);

        let d = &self.distribution;
        println!("\n{}", banner("SECTION 1: REVENUE ANALYSIS"));
        println!("Total Revenue: {}", money.fmt(d.total, 2));
        println!("Average Transaction Value: {}", money.fmt(d.mean, 2));
        println!("Median Transaction Value: {}", money.fmt(d.median, 2));
        println!("\nRevenue Distribution:");
        println!("Min: {}", money.fmt(d.min, 2));
        println!("25th Percentile: {}", money.fmt(d.q25, 2));
        println!("50th Percentile (Median): {}", money.fmt(d.median, 2));
        println!("75th Percentile: {}", money.fmt(d.q75, 2));
        println!("Max: {}", money.fmt(d.max, 2));

        let h = &self.high_value;
        println!("\nHigh-Value Transactions (Top 10%):");
        println!("Threshold: {}", money.fmt(h.threshold, 2));
        println!("Count: {} ({} of transactions)", h.count, percent(h.count_pct, 1));
        println!("Revenue: {} ({} of total)", money.fmt(h.revenue, 2), percent(h.revenue_pct, 1));

        println!("\n{}", banner("SECTION 2: PRODUCT ANALYSIS"));
        println!("Product Performance Summary:");
        print_table(&self.product_summary)?;
        let best_product = leader(&self.product_summary, "Product", "Total_Revenue")?;
        let worst_product = trailer(&self.product_summary, "Product", "Total_Revenue")?;
        if let Some((name, total)) = &best_product {
            println!("\nBest Product: {} ({})", name, money.fmt(*total, 2));
        }
        if let Some((name, total)) = &worst_product {
            println!("Worst Product: {} ({})", name, money.fmt(*total, 2));
        }

        println!("\n{}", banner("SECTION 3: REGIONAL ANALYSIS"));
        print_table(&self.region_summary)?;
        let best_region = leader(&self.region_summary, "Region", "Market_Share_%")?;
        let worst_region = trailer(&self.region_summary, "Region", "Market_Share_%")?;
        if let Some((name, share)) = &best_region {
            println!("\nBest Region: {} ({} market share)", name, percent(*share, 1));
        }
        if let Some((name, share)) = &worst_region {
            println!("Worst Region: {} ({} market share)", name, percent(*share, 1));
        }

        println!("\n{}", banner("SECTION 4: PRODUCT-REGION COMBINATION ANALYSIS"));
        println!("Top 10 Product-Region Combinations:");
        print_table(&head(&self.combinations, 10))?;
        println!("\nWorst 5 Product-Region Combinations:");
        print_table(&tail(&self.combinations, 5))?;

        println!("\n{}", banner("SECTION 5: TIME-BASED ANALYSIS"));
        println!("Weekly Revenue Trend:");
        print_table(&self.weekly)?;
        if let Some(((best, best_total), (worst, worst_total))) = self.week_extremes()? {
            println!("\nBest Week: Week {} ({})", best, money.fmt(best_total, 2));
            println!("Worst Week: Week {} ({})", worst, money.fmt(worst_total, 2));
        }
        println!("\nDay of Week Analysis:");
        print_table(&self.day_of_week)?;

        println!("\n{}", banner("SECTION 6: KEY INSIGHTS"));
        println!(
            "1. Top 10% of transactions generate {} of revenue",
            percent(h.revenue_pct, 1)
        );
        if let (Some((best, _)), Some((worst, _))) = (&best_product, &worst_product) {
            println!("2. {} leads the catalogue; {} needs attention", best, worst);
        }
        if let Some((region, share)) = &best_region {
            println!("3. {} leads with {} market share", region, percent(*share, 1));
        }
        let combo = super::text_at(&self.combinations, "Product", 0)?
            .zip(super::text_at(&self.combinations, "Region", 0)?);
        if let (Some((product, region)), Some(value)) = (combo, number_at(&self.combinations, "Revenue", 0)?) {
            println!("4. Winning combination: {} in {} ({})", product, region, money.fmt(value, 2));
        }
        println!("\n{}", banner("ANALYSIS COMPLETE"));
        Ok(())
    }
}

/// Share of total revenue per product, largest first.
pub fn product_shares(sales: &RecordBatch) -> Result<RecordBatch> {
    share_table(sales, "Product", "Revenue").context("product revenue shares")
}
