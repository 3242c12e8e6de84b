//! Quarterly business review over the wider sales table (cities, customer
//! types, salespeople, discounts).

use super::{best_per_row, leader, ranked, trailer};
use crate::derive::{binary, round_all, row_f64, BinaryOp};
use crate::export::write_csv;
use crate::group::{group_agg, Agg, AggFunc};
use crate::pivot::{pivot_table, PivotSpec};
use crate::report::{banner, pareto, print_table, signed_percent, thousands, Money};
use crate::series::pct_change;
use crate::stats;
use crate::table::{column, f64_values, head, i64_values, str_values, with_column};
use crate::temporal::{date_parts, naive_datetimes, DatePart};
use anyhow::Result;
use arrow::{array::Float64Array, record_batch::RecordBatch};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const REGIONAL_FILE: &str = "regional_performance.csv";
pub const PRODUCT_FILE: &str = "product_performance.csv";
pub const SALESPERSON_FILE: &str = "salesperson_rankings.csv";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub transactions: usize,
    pub avg_order_value: f64,
    pub total_quantity: i64,
    /// First to last month, percent.
    pub growth: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct BusinessReport {
    pub kpis: Kpis,
    pub date_range: Option<(String, String)>,
    pub regions: RecordBatch,
    pub products: RecordBatch,
    /// Leading products whose running revenue share stays within 80%.
    pub pareto_products: RecordBatch,
    pub customer_types: RecordBatch,
    /// Month, Revenue, Transactions, Avg_Order, Growth_%.
    pub monthly: RecordBatch,
    /// Region × Product net revenue, 0 where a pair never sold.
    pub region_product: RecordBatch,
    /// Region, best product, its revenue.
    pub best_product_per_region: Vec<(String, String, f64)>,
    pub salespeople: RecordBatch,
}

/// Gross and net revenue plus month, quarter and week periods.
pub fn with_net_revenue(df: &RecordBatch) -> Result<RecordBatch> {
    let out = binary(df, "Quantity", BinaryOp::Mul, "Unit_Price", "Gross_Revenue")?;
    let out = row_f64(&out, &["Gross_Revenue", "Discount_Pct"], "Discount_Amount", |r| {
        Some(r[0]? * r[1]? / 100.0)
    })?;
    let out = binary(&out, "Gross_Revenue", BinaryOp::Sub, "Discount_Amount", "Net_Revenue")?;
    date_parts(
        &out,
        "Date",
        &[
            (DatePart::MonthPeriod, "Month"),
            (DatePart::QuarterPeriod, "Quarter"),
            (DatePart::IsoWeek, "Week"),
        ],
    )
}

fn monthly_trend(df: &RecordBatch) -> Result<RecordBatch> {
    let t = group_agg(
        df,
        &["Month"],
        &[
            Agg::new("Net_Revenue", AggFunc::Sum).alias("Revenue"),
            Agg::new("Net_Revenue", AggFunc::Count).alias("Transactions"),
            Agg::new("Net_Revenue", AggFunc::Mean).alias("Avg_Order"),
        ],
    )?;
    let growth: Float64Array = pct_change(&f64_values(&t, "Revenue")?)
        .into_iter()
        .map(|g| g.map(|g| g * 100.0))
        .collect();
    round_all(&with_column(&t, "Growth_%", Arc::new(growth))?, 2)
}

/// Run every section over the raw business table (see
/// [`crate::generate::business_data`]).
pub fn analyze(df: &RecordBatch) -> Result<BusinessReport> {
    let df = with_net_revenue(df)?;

    let regions = ranked(
        &df,
        "Region",
        &[
            Agg::new("Net_Revenue", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("Net_Revenue", AggFunc::Mean).alias("Avg_Order_Value"),
            Agg::new("Net_Revenue", AggFunc::Count).alias("Total_Transactions"),
            Agg::new("Quantity", AggFunc::Sum).alias("Total_Quantity"),
            Agg::new("Discount_Pct", AggFunc::Mean).alias("Avg_Discount"),
            Agg::new("Customer_Type", AggFunc::NUnique).alias("Unique_Customers"),
        ],
        "Market_Share_%",
    )?;
    let products = ranked(
        &df,
        "Product",
        &[
            Agg::new("Net_Revenue", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("Quantity", AggFunc::Sum).alias("Total_Quantity"),
            Agg::new("Unit_Price", AggFunc::Mean).alias("Avg_Price"),
            Agg::new("Net_Revenue", AggFunc::Count).alias("Transaction_Count"),
            Agg::new("Discount_Pct", AggFunc::Mean).alias("Avg_Discount"),
        ],
        "Revenue_Share_%",
    )?;
    let pareto_products = pareto(&products, "Revenue_Share_%", 80.0)?;
    let customer_types = ranked(
        &df,
        "Customer_Type",
        &[
            Agg::new("Net_Revenue", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("Net_Revenue", AggFunc::Mean).alias("Avg_Order_Value"),
            Agg::new("Net_Revenue", AggFunc::Count).alias("Transaction_Count"),
            Agg::new("Quantity", AggFunc::Mean).alias("Avg_Quantity"),
        ],
        "Revenue_Share_%",
    )?;
    let salespeople = ranked(
        &df,
        "Salesperson",
        &[
            Agg::new("Net_Revenue", AggFunc::Sum).alias("Total_Revenue"),
            Agg::new("Net_Revenue", AggFunc::Count).alias("Transactions"),
            Agg::new("Net_Revenue", AggFunc::Mean).alias("Avg_Deal_Size"),
            Agg::new("Customer_Type", AggFunc::Count).alias("Total_Customers"),
        ],
        "Revenue_Share_%",
    )?;
    let monthly = monthly_trend(&df)?;

    let region_product = round_all(
        &pivot_table(
            &df,
            &PivotSpec::new("Region", "Product", "Net_Revenue", AggFunc::Sum).fill(0.0),
        )?,
        0,
    )?;
    let best_product_per_region = best_per_row(&region_product, "Region", &[])?;

    let net: Vec<f64> = f64_values(&df, "Net_Revenue")?.into_iter().flatten().collect();
    let month_revenue: Vec<f64> = f64_values(&monthly, "Revenue")?.into_iter().flatten().collect();
    let kpis = Kpis {
        total_revenue: stats::sum(&net),
        transactions: df.num_rows(),
        avg_order_value: stats::mean(&net),
        total_quantity: i64_values(&df, "Quantity")?.into_iter().flatten().sum(),
        growth: month_revenue
            .first()
            .zip(month_revenue.last())
            .and_then(|(first, last)| stats::growth_rate(*first, *last)),
    };

    info!(
        transactions = kpis.transactions,
        regions = regions.num_rows(),
        products = products.num_rows(),
        "business report ready"
    );
    Ok(BusinessReport {
        kpis,
        date_range: date_span(&df)?,
        regions,
        products,
        pareto_products,
        customer_types,
        monthly,
        region_product,
        best_product_per_region,
        salespeople,
    })
}

impl BusinessReport {
    /// Write the regional, product and salesperson tables under `dir`.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let outputs = [
            (REGIONAL_FILE, &self.regions),
            (PRODUCT_FILE, &self.products),
            (SALESPERSON_FILE, &self.salespeople),
        ];
        let mut written = Vec::with_capacity(outputs.len());
        for (name, table) in outputs {
            let path = dir.join(name);
            write_csv(table, &path)?;
            written.push(path);
        }
        Ok(written)
    }

    pub fn print(&self, money: &Money) -> Result<()> {
        let k = &self.kpis;
        println!("{}", banner("EXECUTIVE BUSINESS ANALYTICS REPORT"));
        println!("\nDataset Overview:");
        println!("Total Transactions: {}", thousands(k.transactions as f64, 0));
        if let Some((from, to)) = &self.date_range {
            println!("Date Range: {} to {}", from, to);
        }
        println!("Total Revenue: {}", money.fmt(k.total_revenue, 2));

        println!("\n{}", banner("SECTION 1: REGIONAL PERFORMANCE ANALYSIS"));
        print_table(&self.regions)?;
        if let Some((region, revenue)) = leader(&self.regions, "Region", "Total_Revenue")? {
            println!("\nBest Region: {} ({})", region, money.fmt(revenue, 2));
        }
        if let Some((region, revenue)) = trailer(&self.regions, "Region", "Total_Revenue")? {
            println!("Weakest Region: {} ({})", region, money.fmt(revenue, 2));
        }

        println!("\n{}", banner("SECTION 2: PRODUCT PERFORMANCE ANALYSIS"));
        print_table(&self.products)?;
        println!(
            "\n80/20 Analysis: top {} products generate 80% of revenue",
            self.pareto_products.num_rows()
        );
        let names = str_values(&self.pareto_products, "Product")?;
        let totals = f64_values(&self.pareto_products, "Total_Revenue")?;
        let shares = f64_values(&self.pareto_products, "Revenue_Share_%")?;
        for i in 0..names.len() {
            println!(
                "  {}: {} ({:.1}%)",
                names[i].as_deref().unwrap_or_default(),
                money.fmt(totals[i].unwrap_or_default(), 2),
                shares[i].unwrap_or_default()
            );
        }

        println!("\n{}", banner("SECTION 3: CUSTOMER SEGMENTATION ANALYSIS"));
        print_table(&self.customer_types)?;

        println!("\n{}", banner("SECTION 4: TIME-BASED TRENDS"));
        print_table(&self.monthly)?;

        println!("\n{}", banner("SECTION 5: REGIONAL PRODUCT MATRIX"));
        print_table(&self.region_product)?;
        println!("\nBest product in each region:");
        for (region, product, revenue) in &self.best_product_per_region {
            println!("  {}: {} ({})", region, product, money.fmt(*revenue, 0));
        }

        println!("\n{}", banner("SECTION 6: SALESPERSON PERFORMANCE"));
        print_table(&self.salespeople)?;
        println!("\nTop 3 Performers:");
        print_table(&head(&self.salespeople, 3))?;

        println!("\n{}", banner("SECTION 7: KEY PERFORMANCE INDICATORS"));
        println!("Total Revenue: {}", money.fmt(k.total_revenue, 2));
        println!("Total Transactions: {}", thousands(k.transactions as f64, 0));
        println!("Average Order Value: {}", money.fmt(k.avg_order_value, 2));
        println!("Total Units Sold: {}", thousands(k.total_quantity as f64, 0));
        match k.growth {
            Some(g) => println!("Growth (First to Last Month): {}", signed_percent(g, 2)),
            None => println!("Growth (First to Last Month): N/A"),
        }
        Ok(())
    }
}

/// First and last date of a table's `Date` column as text.
pub fn date_span(df: &RecordBatch) -> Result<Option<(String, String)>> {
    let dates: Vec<_> = naive_datetimes(column(df, "Date")?)?
        .into_iter()
        .flatten()
        .map(|d| d.date())
        .collect();
    Ok(dates
        .iter()
        .min()
        .zip(dates.iter().max())
        .map(|(a, b)| (a.to_string(), b.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::business_data;
    use crate::load::date_parser::date_to_days;
    use crate::table::{column_names, from_columns};
    use arrow::array::{ArrayRef, Date32Array, Int64Array, StringArray};
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::tempdir;

    fn day(m: u32, d: u32) -> i32 {
        date_to_days(NaiveDate::from_ymd_opt(2026, m, d).unwrap())
    }

    fn four_rows() -> Result<RecordBatch> {
        let text = |v: Vec<&str>| Arc::new(StringArray::from(v)) as ArrayRef;
        from_columns(vec![
            (
                "Date",
                Arc::new(Date32Array::from(vec![day(1, 5), day(1, 20), day(2, 3), day(2, 10)])) as ArrayRef,
            ),
            ("Product", text(vec!["Laptop", "Mouse", "Laptop", "Webcam"])),
            ("Category", text(vec!["Computing", "Accessories", "Computing", "Accessories"])),
            ("Region", text(vec!["North", "North", "South", "South"])),
            ("City", text(vec!["Mumbai", "Delhi", "Chennai", "Chennai"])),
            ("Salesperson", text(vec!["Rahul", "Priya", "Rahul", "Amit"])),
            ("Customer_Type", text(vec!["VIP", "New", "VIP", "Returning"])),
            ("Quantity", Arc::new(Int64Array::from(vec![2, 10, 1, 4])) as ArrayRef),
            ("Unit_Price", Arc::new(Int64Array::from(vec![45000, 500, 45000, 2500])) as ArrayRef),
            ("Discount_Pct", Arc::new(Int64Array::from(vec![10, 0, 20, 5])) as ArrayRef),
        ])
    }

    #[test]
    fn net_revenue_and_kpis() -> Result<()> {
        let r = analyze(&four_rows()?)?;
        // 81000 + 5000 + 36000 + 9500
        assert_eq!(r.kpis.total_revenue, 131500.0);
        assert_eq!(r.kpis.total_quantity, 17);
        // January 86000, February 45500
        assert_eq!(
            f64_values(&r.monthly, "Revenue")?,
            vec![Some(86000.0), Some(45500.0)]
        );
        let growth = (45500.0 - 86000.0) / 86000.0 * 100.0;
        assert!((r.kpis.growth.unwrap() - growth).abs() < 1e-9);
        assert_eq!(f64_values(&r.monthly, "Growth_%")?[0], None);
        Ok(())
    }

    #[test]
    fn rankings_and_matrix() -> Result<()> {
        let r = analyze(&four_rows()?)?;
        assert_eq!(str_values(&r.regions, "Region")?[0].as_deref(), Some("North"));
        assert_eq!(i64_values(&r.regions, "Unique_Customers")?, vec![Some(2), Some(2)]);
        assert_eq!(str_values(&r.salespeople, "Salesperson")?[0].as_deref(), Some("Rahul"));
        // Laptop alone is 117000 / 131500 = 89%, so nothing fits under 80%
        assert_eq!(r.pareto_products.num_rows(), 0);

        assert_eq!(column_names(&r.region_product), vec!["Region", "Laptop", "Mouse", "Webcam"]);
        assert_eq!(
            r.best_product_per_region,
            vec![
                ("North".to_string(), "Laptop".to_string(), 81000.0),
                ("South".to_string(), "Laptop".to_string(), 36000.0),
            ]
        );
        Ok(())
    }

    #[test]
    fn generated_data_writes_reports() -> Result<()> {
        let df = business_data(500, &mut StdRng::seed_from_u64(42))?;
        let r = analyze(&df)?;
        let region_total: f64 = f64_values(&r.regions, "Total_Revenue")?.into_iter().flatten().sum();
        assert!((region_total - r.kpis.total_revenue).abs() < 1.0);
        let shares: f64 = f64_values(&r.products, "Revenue_Share_%")?.into_iter().flatten().sum();
        assert!((shares - 100.0).abs() < 0.05);
        assert!(r.pareto_products.num_rows() < r.products.num_rows());

        let dir = tempdir()?;
        let written = r.write(dir.path())?;
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|p| p.exists()));
        assert!(r.date_range.is_some());
        Ok(())
    }
}
