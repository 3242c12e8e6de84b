//! Raw order export → analytics-ready table: text clean-up, type
//! conversion, gap filling, derived revenue and calendar features, segment
//! labels and business-rule validation.

use crate::derive::{binary, bucket_column, grade_column, map_str, prefix, row_f64, title_case, BinaryOp};
use crate::export::write_csv;
use crate::group::{group_agg, Agg, AggFunc};
use crate::load::{to_date, to_numeric};
use crate::missing::{fillna, null_counts, total_nulls, Fill};
use crate::report::{banner, percent, print_table, share_table, with_share, Money, SHARE, TOTAL};
use crate::schema::{clean_orders_schema, validate};
use crate::select::{col, count};
use crate::sort::{sort_values, SortKey};
use crate::table::{head, i64_values, select_columns, str_values, value_counts, with_column};
use crate::temporal::{date_parts, DatePart};
use anyhow::{Context, Result};
use arrow::{array::StringArray, record_batch::RecordBatch};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const CLEAN_ORDERS_FILE: &str = "clean_orders.csv";

/// Rows breaking a business rule after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub negative_revenue: usize,
    pub excessive_discount: usize,
    pub invalid_rating: usize,
}

impl Validation {
    pub fn is_clean(&self) -> bool {
        self.negative_revenue == 0 && self.excessive_discount == 0 && self.invalid_rating == 0
    }
}

#[derive(Debug, Clone)]
pub struct TransformationReport {
    pub raw_rows: usize,
    /// Null count per raw column.
    pub raw_nulls: RecordBatch,
    pub clean: RecordBatch,
    pub remaining_nulls: usize,
    pub validation: Validation,
    pub product_revenue: RecordBatch,
    pub region_revenue: RecordBatch,
    /// customer_segment, orders, revenue, Share_% (of orders).
    pub segments: RecordBatch,
    pub payment_methods: RecordBatch,
    pub avg_discount: RecordBatch,
}

fn standardize_text(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut out = batch.clone();
    for name in ["customer_name", "product", "region"] {
        out = map_str(&out, name, name, title_case)?;
    }
    Ok(out)
}

fn convert_types(batch: &RecordBatch) -> Result<RecordBatch> {
    let out = to_date(batch, "order_date")?;
    to_numeric(&out, "unit_price")
}

fn fill_gaps(batch: &RecordBatch) -> Result<RecordBatch> {
    let out = fillna(batch, "payment_method", &Fill::Text("Unknown".into()))?;
    let out = fillna(&out, "discount_pct", &Fill::Value(0.0))?;
    fillna(&out, "customer_rating", &Fill::Median)
}

fn revenue_features(batch: &RecordBatch) -> Result<RecordBatch> {
    let out = binary(batch, "quantity", BinaryOp::Mul, "unit_price", "gross_revenue")?;
    let out = row_f64(&out, &["gross_revenue", "discount_pct"], "discount_amount", |r| {
        Some(r[0]? * r[1]? / 100.0)
    })?;
    binary(&out, "gross_revenue", BinaryOp::Sub, "discount_amount", "net_revenue")
}

fn calendar_features(batch: &RecordBatch) -> Result<RecordBatch> {
    date_parts(
        batch,
        "order_date",
        &[
            (DatePart::Year, "year"),
            (DatePart::Month, "month"),
            (DatePart::MonthName, "month_name"),
            (DatePart::DayName, "day_of_week"),
            (DatePart::IsoWeek, "week_number"),
            (DatePart::IsWeekend, "is_weekend"),
        ],
    )
}

fn labels(batch: &RecordBatch) -> Result<RecordBatch> {
    let out = bucket_column(
        batch,
        "net_revenue",
        "customer_segment",
        &[(30000.0, "Premium"), (10000.0, "Standard")],
        "Basic",
    )?;
    let out = grade_column(
        &out,
        "customer_rating",
        "rating_category",
        &[(4.5, "Excellent"), (3.5, "Good"), (2.5, "Average")],
        "Poor",
    )?;

    // first three letters of the product, upper-cased, then the order id
    let products = str_values(&out, "product")?;
    let ids = i64_values(&out, "order_id")?;
    let codes: StringArray = products
        .iter()
        .zip(&ids)
        .map(|(p, id)| Some(format!("{}-{}", prefix(p.as_deref()?, 3).to_uppercase(), (*id)?)))
        .collect();
    with_column(&out, "product_code", Arc::new(codes))
}

fn validate_rules(clean: &RecordBatch) -> Result<Validation> {
    Ok(Validation {
        negative_revenue: count(clean, &col("net_revenue").lt(0.0))?,
        excessive_discount: count(clean, &col("discount_pct").gt(50.0))?,
        invalid_rating: count(
            clean,
            &col("customer_rating").lt(1.0).or(col("customer_rating").gt(5.0)),
        )?,
    })
}

/// Clean `raw` (the layout of [`crate::generate::raw_orders`]) and summarise
/// the result.
pub fn run(raw: &RecordBatch) -> Result<TransformationReport> {
    let raw_nulls = null_counts(raw)?;

    let clean = standardize_text(raw).context("standardising text")?;
    let clean = convert_types(&clean).context("converting types")?;
    let clean = fill_gaps(&clean).context("filling missing values")?;
    let clean = revenue_features(&clean)?;
    let clean = calendar_features(&clean)?;
    let clean = labels(&clean)?;
    validate(&clean, &clean_orders_schema()).context("cleaned orders")?;

    let validation = validate_rules(&clean)?;
    if !validation.is_clean() {
        warn!(?validation, "cleaned orders break business rules");
    }

    let segments = {
        let t = group_agg(
            &clean,
            &["customer_segment"],
            &[
                Agg::new("net_revenue", AggFunc::Count).alias("orders"),
                Agg::new("net_revenue", AggFunc::Sum).alias("revenue"),
            ],
        )?;
        sort_values(&with_share(&t, "orders", SHARE)?, &[SortKey::desc("orders")])?
    };
    let avg_discount = group_agg(
        &clean,
        &["product"],
        &[Agg::new("discount_pct", AggFunc::Mean).alias("avg_discount_pct")],
    )?;

    info!(rows = clean.num_rows(), columns = clean.num_columns(), "orders transformed");
    Ok(TransformationReport {
        raw_rows: raw.num_rows(),
        raw_nulls,
        remaining_nulls: total_nulls(&clean),
        validation,
        product_revenue: share_table(&clean, "product", "net_revenue")?,
        region_revenue: share_table(&clean, "region", "net_revenue")?,
        segments,
        payment_methods: value_counts(&clean, "payment_method")?,
        avg_discount: crate::derive::round(&avg_discount, "avg_discount_pct", 2)?,
        clean,
    })
}

impl TransformationReport {
    /// Write the cleaned table to `clean_orders.csv` under `dir`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(CLEAN_ORDERS_FILE);
        write_csv(&self.clean, &path)?;
        Ok(path)
    }

    pub fn print(&self, money: &Money) -> Result<()> {
        println!("{}", banner("BUSINESS DATA TRANSFORMATION PROJECT"));
        println!("Raw orders: {}", self.raw_rows);
        println!("\nMissing values in raw data:");
        print_table(&self.raw_nulls)?;

        println!("\n{}", banner("STEP 1: DATA CLEANING"));
        println!("Text standardized (Title Case)");
        println!("Data types converted");
        println!("Missing values handled, remaining: {}", self.remaining_nulls);

        println!("\n{}", banner("STEP 2: FEATURE ENGINEERING"));
        println!("  - gross_revenue, discount_amount, net_revenue");
        println!("  - year, month, month_name, day_of_week, week_number, is_weekend");
        println!("  - customer_segment, rating_category, product_code");

        println!("\n{}", banner("STEP 3: DATA VALIDATION"));
        let v = &self.validation;
        println!("Orders with negative revenue: {}", v.negative_revenue);
        println!("Orders with > 50% discount: {}", v.excessive_discount);
        println!("Orders with invalid rating: {}", v.invalid_rating);

        println!("\n{}", banner("STEP 4: FINAL CLEAN DATASET"));
        print_table(&head(
            &select_columns(
                &self.clean,
                &[
                    "order_id",
                    "customer_name",
                    "order_date",
                    "product",
                    "region",
                    "quantity",
                    "unit_price",
                    "net_revenue",
                    "customer_segment",
                ],
            )?,
            10,
        ))?;
        println!(
            "Total orders: {} | Columns: {} | Missing values: {}",
            self.clean.num_rows(),
            self.clean.num_columns(),
            self.remaining_nulls
        );

        println!("\n{}", banner("STEP 5: BUSINESS INSIGHTS FROM CLEAN DATA"));
        println!("Revenue by Product:");
        print_totals(&self.product_revenue, "product", money)?;
        println!("\nRevenue by Region:");
        print_totals(&self.region_revenue, "region", money)?;

        println!("\nCustomer Segments:");
        let names = str_values(&self.segments, "customer_segment")?;
        let orders = i64_values(&self.segments, "orders")?;
        let revenue = crate::table::f64_values(&self.segments, "revenue")?;
        let shares = crate::table::f64_values(&self.segments, SHARE)?;
        for i in 0..self.segments.num_rows() {
            println!(
                "  {}: {} orders ({}) | Revenue: {}",
                names[i].as_deref().unwrap_or_default(),
                orders[i].unwrap_or_default(),
                percent(shares[i].unwrap_or_default(), 1),
                money.fmt(revenue[i].unwrap_or_default(), 2)
            );
        }

        println!("\nPayment Methods:");
        print_table(&self.payment_methods)?;
        println!("\nAverage Discount by Product:");
        print_table(&self.avg_discount)?;
        Ok(())
    }
}

fn print_totals(table: &RecordBatch, key: &str, money: &Money) -> Result<()> {
    let keys = str_values(table, key)?;
    let totals = crate::table::f64_values(table, TOTAL)?;
    for (k, t) in keys.iter().zip(totals) {
        println!("  {}: {}", k.as_deref().unwrap_or_default(), money.fmt(t.unwrap_or_default(), 2));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::raw_orders;
    use crate::table::{f64_values, from_columns};
    use arrow::array::{ArrayRef, Float64Array, Int64Array};
    use arrow::datatypes::DataType;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::tempdir;

    fn tiny() -> Result<RecordBatch> {
        from_columns(vec![
            ("order_id", Arc::new(Int64Array::from(vec![1001, 1002, 1003])) as ArrayRef),
            (
                "customer_name",
                Arc::new(StringArray::from(vec!["rahul sharma", "PRIYA SINGH", "Amit Kumar"])) as ArrayRef,
            ),
            (
                "order_date",
                Arc::new(StringArray::from(vec!["2026-01-01", "2026-01-03", "2026-01-05"])) as ArrayRef,
            ),
            (
                "product",
                Arc::new(StringArray::from(vec!["Laptop", "mouse", "KEYBOARD"])) as ArrayRef,
            ),
            ("quantity", Arc::new(Int64Array::from(vec![1, 4, 10])) as ArrayRef),
            (
                "unit_price",
                Arc::new(StringArray::from(vec!["45000", "500", "1200"])) as ArrayRef,
            ),
            ("region", Arc::new(StringArray::from(vec!["north", "SOUTH", "west"])) as ArrayRef),
            (
                "payment_method",
                Arc::new(StringArray::from(vec![Some("UPI"), None, Some("Credit Card")])) as ArrayRef,
            ),
            (
                "discount_pct",
                Arc::new(Float64Array::from(vec![Some(10.0), Some(5.0), None])) as ArrayRef,
            ),
            (
                "customer_rating",
                Arc::new(Float64Array::from(vec![Some(5.0), None, Some(2.0)])) as ArrayRef,
            ),
        ])
    }

    #[test]
    fn cleans_and_derives() -> Result<()> {
        let r = run(&tiny()?)?;
        let clean = &r.clean;
        assert_eq!(r.remaining_nulls, 0);
        assert_eq!(
            str_values(clean, "customer_name")?[0].as_deref(),
            Some("Rahul Sharma")
        );
        assert_eq!(str_values(clean, "product")?[2].as_deref(), Some("Keyboard"));
        assert_eq!(str_values(clean, "payment_method")?[1].as_deref(), Some("Unknown"));
        assert_eq!(crate::table::column(clean, "order_date")?.data_type(), &DataType::Date32);

        // 45000 less 10%; 2000 less 5%; 12000 with no discount
        assert_eq!(
            f64_values(clean, "net_revenue")?,
            vec![Some(40500.0), Some(1900.0), Some(12000.0)]
        );
        assert_eq!(
            str_values(clean, "customer_segment")?,
            vec![Some("Premium".into()), Some("Basic".into()), Some("Standard".into())]
        );
        // median of 5 and 2
        assert_eq!(f64_values(clean, "customer_rating")?[1], Some(3.5));
        assert_eq!(str_values(clean, "rating_category")?[1].as_deref(), Some("Good"));
        assert_eq!(str_values(clean, "product_code")?[1].as_deref(), Some("MOU-1002"));
        assert_eq!(str_values(clean, "day_of_week")?[1].as_deref(), Some("Saturday"));
        assert!(r.validation.is_clean());
        Ok(())
    }

    #[test]
    fn generated_orders_round_trip() -> Result<()> {
        let raw = raw_orders(50, &mut StdRng::seed_from_u64(42))?;
        let r = run(&raw)?;
        assert_eq!(r.clean.num_rows(), 50);
        assert_eq!(r.remaining_nulls, 0);
        let shares: f64 = f64_values(&r.product_revenue, SHARE)?.into_iter().flatten().sum();
        assert!((shares - 100.0).abs() < 1e-6);
        let orders: i64 = i64_values(&r.segments, "orders")?.into_iter().flatten().sum();
        assert_eq!(orders, 50);

        let dir = tempdir()?;
        let path = r.write(dir.path())?;
        assert!(path.ends_with(CLEAN_ORDERS_FILE));
        assert!(path.exists());
        Ok(())
    }
}
