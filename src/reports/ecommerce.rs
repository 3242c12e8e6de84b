//! Customer analytics over merged customer and transaction tables.

use super::{best_per_column, leader, ranked};
use crate::derive::{binary, round_all, row_f64, BinaryOp};
use crate::export::{write_csv, write_parquet};
use crate::group::{group_agg, Agg, AggFunc};
use crate::pivot::{column_sum, pivot_table, PivotSpec};
use crate::report::{banner, percent, print_table, thousands, Money};
use crate::schema::{ecommerce_schema, validate};
use crate::select::{col, count, filter};
use crate::sort::{sort_values, SortKey};
use crate::stats;
use crate::table::{drop_columns, f64_values, head, i64_values, left_join, nunique, str_values, value_counts};
use crate::temporal::{date_parts, diff_days, DatePart};
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CLEAN_DATA_CSV: &str = "clean_ecommerce_data.csv";
pub const CLEAN_DATA_PARQUET: &str = "clean_ecommerce_data.parquet";
pub const SEGMENT_FILE: &str = "customer_segment_report.csv";
pub const CATEGORY_FILE: &str = "product_category_report.csv";
pub const CITY_FILE: &str = "geographic_analysis.csv";
pub const TOP_CUSTOMERS_FILE: &str = "top_100_customers.csv";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub transactions: usize,
    pub revenue: f64,
    pub customers: usize,
    pub avg_order_value: f64,
    pub avg_items: f64,
    /// Percent of transactions.
    pub delivery_rate: f64,
    pub cancellation_rate: f64,
    pub weekend_revenue: f64,
    pub weekday_revenue: f64,
}

/// Customers at or above the 90th percentile of lifetime spend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VipSummary {
    pub threshold: f64,
    pub count: usize,
    pub revenue: f64,
    pub share: f64,
}

#[derive(Debug, Clone)]
pub struct EcommerceReport {
    /// Transactions with amounts, calendar features and customer details.
    pub merged: RecordBatch,
    pub overview: Overview,
    pub delivery: RecordBatch,
    pub segments: RecordBatch,
    pub categories: RecordBatch,
    pub cities: RecordBatch,
    pub monthly: RecordBatch,
    pub day_of_week: RecordBatch,
    /// hour, Revenue; busiest first.
    pub hours: RecordBatch,
    /// One row per customer, highest spend first.
    pub lifetime_value: RecordBatch,
    pub vip: VipSummary,
    pub payments: RecordBatch,
    /// product_category × customer_segment net revenue.
    pub cross_sell: RecordBatch,
    /// Segment, its best category, that revenue.
    pub best_category_per_segment: Vec<(String, String, f64)>,
}

/// Amounts, calendar features and the customer join.
pub fn prepare(customers: &RecordBatch, transactions: &RecordBatch) -> Result<RecordBatch> {
    let out = binary(transactions, "quantity", BinaryOp::Mul, "unit_price", "gross_amount")?;
    let out = row_f64(&out, &["gross_amount", "discount_percent"], "discount_amount", |r| {
        Some(r[0]? * r[1]? / 100.0)
    })?;
    let out = binary(&out, "gross_amount", BinaryOp::Sub, "discount_amount", "net_amount")?;
    let out = date_parts(
        &out,
        "transaction_date",
        &[
            (DatePart::Year, "year"),
            (DatePart::Month, "month"),
            (DatePart::MonthName, "month_name"),
            (DatePart::DayOfWeek, "weekday"),
            (DatePart::DayName, "day_of_week"),
            (DatePart::Hour, "hour"),
            (DatePart::IsWeekend, "is_weekend"),
        ],
    )?;
    let merged = left_join(&out, customers, "customer_id").context("joining customers")?;
    validate(&merged, &ecommerce_schema()).context("merged e-commerce table")?;
    Ok(merged)
}

fn lifetime_value(df: &RecordBatch) -> Result<RecordBatch> {
    let t = group_agg(
        df,
        &["customer_id"],
        &[
            Agg::new("net_amount", AggFunc::Sum).alias("Total_Spent"),
            Agg::new("transaction_id", AggFunc::Count).alias("Total_Transactions"),
            Agg::new("net_amount", AggFunc::Mean).alias("Avg_Order_Value"),
            Agg::new("transaction_date", AggFunc::Min).alias("First_Purchase"),
            Agg::new("transaction_date", AggFunc::Max).alias("Last_Purchase"),
        ],
    )?;
    let t = diff_days(&t, "First_Purchase", "Last_Purchase", "Days_Active")?;
    round_all(&sort_values(&t, &[SortKey::desc("Total_Spent")])?, 2)
}

fn vip_summary(ltv: &RecordBatch, total_revenue: f64) -> Result<VipSummary> {
    let spent: Vec<f64> = f64_values(ltv, "Total_Spent")?.into_iter().flatten().collect();
    let threshold = stats::quantile(&spent, 0.90);
    let vip: Vec<f64> = spent.iter().copied().filter(|&s| s >= threshold).collect();
    let revenue = stats::sum(&vip);
    Ok(VipSummary {
        threshold,
        count: vip.len(),
        revenue,
        share: if total_revenue == 0.0 { 0.0 } else { revenue / total_revenue * 100.0 },
    })
}

/// Group on a number and its label together so the label rows come out in
/// numeric order, then drop the number.
fn ordered_by(df: &RecordBatch, number: &str, label: &str, aggs: &[Agg]) -> Result<RecordBatch> {
    let t = group_agg(df, &[number, label], aggs)?;
    round_all(&drop_columns(&t, &[number])?, 2)
}

pub fn analyze(customers: &RecordBatch, transactions: &RecordBatch) -> Result<EcommerceReport> {
    let df = prepare(customers, transactions)?;
    let n = df.num_rows();

    let revenue = column_sum(&df, "net_amount")?;
    let weekend_revenue = column_sum(&filter(&df, &col("is_weekend").eq(true))?, "net_amount")?;
    let net: Vec<f64> = f64_values(&df, "net_amount")?.into_iter().flatten().collect();
    let items: Vec<f64> = f64_values(&df, "quantity")?.into_iter().flatten().collect();
    let overview = Overview {
        transactions: n,
        revenue,
        customers: nunique(&df, "customer_id")?,
        avg_order_value: stats::mean(&net),
        avg_items: stats::mean(&items),
        delivery_rate: stats::conversion_rate(count(&df, &col("delivery_status").eq("Delivered"))?, n)
            .unwrap_or(0.0),
        cancellation_rate: stats::conversion_rate(count(&df, &col("delivery_status").eq("Cancelled"))?, n)
            .unwrap_or(0.0),
        weekend_revenue,
        weekday_revenue: revenue - weekend_revenue,
    };

    let segments = ranked(
        &df,
        "customer_segment",
        &[
            Agg::new("net_amount", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("net_amount", AggFunc::Mean).alias("Avg_Order_Value"),
            Agg::new("transaction_id", AggFunc::Count).alias("Total_Transactions"),
            Agg::new("customer_id", AggFunc::NUnique).alias("Unique_Customers"),
            Agg::new("discount_percent", AggFunc::Mean).alias("Avg_Discount"),
        ],
        "Revenue_Share_%",
    )?;
    let categories = ranked(
        &df,
        "product_category",
        &[
            Agg::new("net_amount", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("quantity", AggFunc::Sum).alias("Total_Quantity"),
            Agg::new("unit_price", AggFunc::Mean).alias("Avg_Price"),
            Agg::new("transaction_id", AggFunc::Count).alias("Transaction_Count"),
        ],
        "Revenue_Share_%",
    )?;
    let cities = ranked(
        &df,
        "city",
        &[
            Agg::new("net_amount", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("customer_id", AggFunc::NUnique).alias("Customer_Count"),
            Agg::new("transaction_id", AggFunc::Count).alias("Transaction_Count"),
            Agg::new("net_amount", AggFunc::Mean).alias("Avg_Order_Value"),
        ],
        "Revenue_Share_%",
    )?;
    let payments = ranked(
        &df,
        "payment_method",
        &[
            Agg::new("net_amount", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("transaction_id", AggFunc::Count).alias("Transaction_Count"),
            Agg::new("net_amount", AggFunc::Mean).alias("Avg_Transaction"),
        ],
        "Revenue_Share_%",
    )?;
    let payments = round_all(
        &crate::report::with_share(&payments, "Transaction_Count", "Usage_%")?,
        2,
    )?;

    let monthly = ordered_by(
        &df,
        "month",
        "month_name",
        &[
            Agg::new("net_amount", AggFunc::Sum).alias("Revenue"),
            Agg::new("transaction_id", AggFunc::Count).alias("Transactions"),
            Agg::new("net_amount", AggFunc::Mean).alias("Avg_Order_Value"),
        ],
    )?;
    let day_of_week = ordered_by(
        &df,
        "weekday",
        "day_of_week",
        &[
            Agg::new("net_amount", AggFunc::Sum).alias("Revenue"),
            Agg::new("transaction_id", AggFunc::Count).alias("Transactions"),
        ],
    )?;
    let hours = {
        let t = group_agg(&df, &["hour"], &[Agg::new("net_amount", AggFunc::Sum).alias("Revenue")])?;
        sort_values(&t, &[SortKey::desc("Revenue")])?
    };

    let lifetime_value = lifetime_value(&df)?;
    let vip = vip_summary(&lifetime_value, revenue)?;

    let cross_sell = round_all(
        &pivot_table(
            &df,
            &PivotSpec::new("product_category", "customer_segment", "net_amount", AggFunc::Sum).fill(0.0),
        )?,
        0,
    )?;
    let best_category_per_segment = best_per_column(&cross_sell, "product_category")?;

    info!(
        transactions = n,
        customers = overview.customers,
        vip = vip.count,
        "e-commerce report ready"
    );
    Ok(EcommerceReport {
        delivery: value_counts(&df, "delivery_status")?,
        merged: df,
        overview,
        segments,
        categories,
        cities,
        monthly,
        day_of_week,
        hours,
        lifetime_value,
        vip,
        payments,
        cross_sell,
        best_category_per_segment,
    })
}

impl EcommerceReport {
    /// Clean data as CSV and Parquet plus the four report tables.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let csv = dir.join(CLEAN_DATA_CSV);
        write_csv(&self.merged, &csv)?;
        written.push(csv);
        let parquet = dir.join(CLEAN_DATA_PARQUET);
        write_parquet(&self.merged, &parquet)?;
        written.push(parquet);

        let top = head(&self.lifetime_value, 100);
        let tables = [
            (SEGMENT_FILE, &self.segments),
            (CATEGORY_FILE, &self.categories),
            (CITY_FILE, &self.cities),
            (TOP_CUSTOMERS_FILE, &top),
        ];
        for (name, table) in tables {
            let path = dir.join(name);
            write_csv(table, &path)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Hour with the most revenue.
    pub fn peak_hour(&self) -> Result<Option<i64>> {
        Ok(i64_values(&self.hours, "hour")?.first().copied().flatten())
    }

    pub fn print(&self, money: &Money) -> Result<()> {
        let o = &self.overview;
        println!("{}", banner("E-COMMERCE CUSTOMER ANALYTICS PLATFORM"));
        println!("Final dataset: {} rows x {} columns", self.merged.num_rows(), self.merged.num_columns());

        println!("\n{}", banner("BUSINESS OVERVIEW"));
        println!("Total Transactions: {}", thousands(o.transactions as f64, 0));
        println!("Total Revenue: {}", money.fmt(o.revenue, 2));
        println!("Total Customers: {}", thousands(o.customers as f64, 0));
        println!("Average Order Value: {}", money.fmt(o.avg_order_value, 2));
        println!("Average Items/Order: {:.2}", o.avg_items);
        println!("\nDelivery Rate: {}", percent(o.delivery_rate, 2));
        println!("Cancellation Rate: {}", percent(o.cancellation_rate, 2));
        print_table(&self.delivery)?;

        println!("\n{}", banner("CUSTOMER SEGMENTATION ANALYSIS"));
        print_table(&self.segments)?;
        if let Some((segment, revenue)) = leader(&self.segments, "customer_segment", "Total_Revenue")? {
            println!("Most Valuable Segment: {} ({})", segment, money.fmt(revenue, 2));
        }

        println!("\n{}", banner("PRODUCT CATEGORY ANALYSIS"));
        print_table(&self.categories)?;

        println!("\n{}", banner("GEOGRAPHIC ANALYSIS"));
        print_table(&self.cities)?;

        println!("\n{}", banner("TIME-BASED ANALYSIS"));
        print_table(&self.monthly)?;
        print_table(&self.day_of_week)?;
        let share = |v: f64| if o.revenue == 0.0 { 0.0 } else { v / o.revenue * 100.0 };
        println!(
            "Weekend Revenue: {} ({})",
            money.fmt(o.weekend_revenue, 2),
            percent(share(o.weekend_revenue), 1)
        );
        println!(
            "Weekday Revenue: {} ({})",
            money.fmt(o.weekday_revenue, 2),
            percent(share(o.weekday_revenue), 1)
        );
        println!("\nPeak Shopping Hours (Top 5):");
        let hours = i64_values(&self.hours, "hour")?;
        let revenue = f64_values(&self.hours, "Revenue")?;
        for (h, r) in hours.iter().zip(&revenue).take(5) {
            println!("  {:02}:00 - {}", h.unwrap_or_default(), money.fmt(r.unwrap_or_default(), 2));
        }

        println!("\n{}", banner("CUSTOMER LIFETIME VALUE ANALYSIS"));
        print_table(&head(&self.lifetime_value, 10))?;
        let v = &self.vip;
        println!("\nVIP Customers (Top 10%):");
        println!("   Count: {}", v.count);
        println!("   Threshold: {}", money.fmt(v.threshold, 2));
        println!("   Total Revenue: {}", money.fmt(v.revenue, 2));
        println!("   Share of Total: {}", percent(v.share, 1));

        println!("\n{}", banner("PAYMENT METHOD ANALYSIS"));
        print_table(&self.payments)?;

        println!("\n{}", banner("CROSS-SELL ANALYSIS"));
        print_table(&self.cross_sell)?;
        println!("\nBest Category per Segment:");
        for (segment, category, revenue) in &self.best_category_per_segment {
            println!("  {}: {} ({})", segment, category, money.fmt(*revenue, 0));
        }

        let names = str_values(&head(&self.cities, 3), "city")?;
        let top_cities: Vec<&str> = names.iter().filter_map(|c| c.as_deref()).collect();
        println!("\nTop 3 cities: {}", top_cities.join(", "));
        if let Some(hour) = self.peak_hour()? {
            println!("Peak shopping: {:02}:00 hours", hour);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{customer_ids, customers, transactions};
    use crate::load::date_parser::datetime_to_millis;
    use crate::table::{column_names, from_columns};
    use arrow::array::{ArrayRef, Int64Array, StringArray, TimestampMillisecondArray};
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn at(day: u32, hour: u32) -> i64 {
        datetime_to_millis(NaiveDate::from_ymd_opt(2025, 1, day).unwrap().and_hms_opt(hour, 0, 0).unwrap())
    }

    fn small() -> Result<(RecordBatch, RecordBatch)> {
        let text = |v: Vec<&str>| Arc::new(StringArray::from(v)) as ArrayRef;
        let customers = from_columns(vec![
            ("customer_id", text(vec!["CUST0001", "CUST0002"])),
            ("customer_name", text(vec!["Customer_1", "Customer_2"])),
            ("city", text(vec!["Mumbai", "Pune"])),
            ("customer_segment", text(vec!["Gold", "Bronze"])),
        ])?;
        let transactions = from_columns(vec![
            ("transaction_id", text(vec!["TXN000001", "TXN000002", "TXN000003", "TXN000004"])),
            (
                "transaction_date",
                // Wed, Thu, Sat, Sun
                Arc::new(TimestampMillisecondArray::from(vec![at(1, 0), at(2, 12), at(4, 12), at(5, 0)])) as ArrayRef,
            ),
            ("customer_id", text(vec!["CUST0001", "CUST0002", "CUST0001", "CUST0001"])),
            ("product_category", text(vec!["Electronics", "Books", "Electronics", "Fashion"])),
            ("product_name", text(vec!["Laptop", "Novel", "Smartphone", "Shirt"])),
            ("quantity", Arc::new(Int64Array::from(vec![1, 2, 1, 3])) as ArrayRef),
            ("unit_price", Arc::new(Int64Array::from(vec![49999, 499, 19999, 999])) as ArrayRef),
            ("discount_percent", Arc::new(Int64Array::from(vec![0, 10, 20, 0])) as ArrayRef),
            ("payment_method", text(vec!["UPI", "COD", "UPI", "Credit Card"])),
            ("delivery_status", text(vec!["Delivered", "Cancelled", "Delivered", "Returned"])),
        ])?;
        Ok((customers, transactions))
    }

    #[test]
    fn merge_and_metrics() -> Result<()> {
        let (c, t) = small()?;
        let r = analyze(&c, &t)?;
        assert!(column_names(&r.merged).contains(&"customer_segment".to_string()));
        assert_eq!(r.overview.customers, 2);
        assert_eq!(r.overview.delivery_rate, 50.0);
        assert_eq!(r.overview.cancellation_rate, 25.0);
        // 49999 + 898.2 + 15999.2 + 2997
        let total = 49999.0 + 898.2 + 15999.2 + 2997.0;
        assert!((r.overview.revenue - total).abs() < 1e-6);
        assert!((r.overview.weekend_revenue - (15999.2 + 2997.0)).abs() < 1e-6);

        assert_eq!(str_values(&r.lifetime_value, "customer_id")?[0].as_deref(), Some("CUST0001"));
        assert_eq!(i64_values(&r.lifetime_value, "Days_Active")?, vec![Some(4), Some(0)]);
        assert_eq!(r.vip.count, 1);

        assert_eq!(
            str_values(&r.day_of_week, "day_of_week")?,
            vec![
                Some("Wednesday".into()),
                Some("Thursday".into()),
                Some("Saturday".into()),
                Some("Sunday".into())
            ]
        );
        assert_eq!(r.peak_hour()?, Some(0));
        assert_eq!(
            r.best_category_per_segment,
            vec![
                ("Bronze".to_string(), "Books".to_string(), 898.0),
                ("Gold".to_string(), "Electronics".to_string(), 65998.0),
            ]
        );
        Ok(())
    }

    #[test]
    fn generated_pipeline_writes_outputs() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let c = customers(200, &mut rng)?;
        let t = transactions(1000, &customer_ids(200), &mut rng)?;
        let r = analyze(&c, &t)?;
        assert_eq!(r.merged.num_rows(), 1000);

        let seg_total: f64 = f64_values(&r.segments, "Total_Revenue")?.into_iter().flatten().sum();
        assert!((seg_total - r.overview.revenue).abs() < 1.0);
        let usage: f64 = f64_values(&r.payments, "Usage_%")?.into_iter().flatten().sum();
        assert!((usage - 100.0).abs() < 0.05);
        assert!(r.vip.count >= r.lifetime_value.num_rows() / 10);

        let dir = tempdir()?;
        let written = r.write(dir.path())?;
        assert_eq!(written.len(), 6);
        let back = crate::export::read_parquet(&dir.path().join(CLEAN_DATA_PARQUET))?;
        assert_eq!(back.num_rows(), 1000);
        Ok(())
    }
}
