//! Seeded synthetic datasets. Every generator takes the row count and a
//! `StdRng`, so a fixed seed reproduces the same table.

use crate::load::date_parser::date_to_days;
use crate::table::from_columns;
use crate::temporal::{date_range, datetime_range};
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray},
    record_batch::RecordBatch,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{
    distr::{weighted::WeightedIndex, Distribution},
    rngs::StdRng,
    Rng,
};
use std::sync::Arc;
use tracing::debug;

pub const PRODUCTS: [&str; 5] = ["Laptop", "Mouse", "Keyboard", "Monitor", "Headphones"];
pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
pub const SALESPEOPLE: [&str; 5] = ["Rahul", "Priya", "Amit", "Sneha", "Raj"];
pub const PRICE_POINTS: [i64; 5] = [500, 1200, 15000, 45000, 2500];

pub const DELIVERY_STATUSES: [&str; 4] = ["Delivered", "In Transit", "Cancelled", "Returned"];
pub const DELIVERY_WEIGHTS: [f64; 4] = [0.75, 0.15, 0.07, 0.03];
pub const SEGMENTS: [&str; 4] = ["Bronze", "Silver", "Gold", "Platinum"];
pub const SEGMENT_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default()
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

fn pick_str(rng: &mut StdRng, items: &[&str], n: usize) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(
        (0..n).map(|_| *pick(rng, items)),
    ))
}

fn pick_int(rng: &mut StdRng, items: &[i64], n: usize) -> Vec<i64> {
    (0..n).map(|_| *pick(rng, items)).collect()
}

fn ints(rng: &mut StdRng, low: i64, high: i64, n: usize) -> Vec<i64> {
    (0..n).map(|_| rng.random_range(low..high)).collect()
}

/// Categorical draw with the given probabilities.
pub fn pick_weighted(rng: &mut StdRng, items: &[&str], weights: &[f64], n: usize) -> Result<ArrayRef> {
    let dist = WeightedIndex::new(weights).context("building weighted choice")?;
    Ok(Arc::new(StringArray::from_iter_values(
        (0..n).map(|_| items[dist.sample(rng)]),
    )))
}

fn product(a: &[i64], b: &[i64]) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(a.iter().zip(b).map(|(x, y)| x * y)))
}

/// Daily sales from 2026-01-01: `Date, Product, Region, Quantity,
/// Unit_Price, Revenue`. Matches [`crate::schema::sales_schema`].
pub fn sales_data(n: usize, rng: &mut StdRng) -> Result<RecordBatch> {
    let product_col = pick_str(rng, &PRODUCTS, n);
    let region = pick_str(rng, &REGIONS, n);
    let quantity = ints(rng, 1, 20, n);
    let price = ints(rng, 500, 50000, n);
    let revenue = product(&quantity, &price);
    debug!(rows = n, "generated sales data");
    from_columns(vec![
        ("Date", date_range(start_date(), n)),
        ("Product", product_col),
        ("Region", region),
        ("Quantity", Arc::new(Int64Array::from(quantity)) as ArrayRef),
        ("Unit_Price", Arc::new(Int64Array::from(price)) as ArrayRef),
        ("Revenue", revenue),
    ])
}

/// Sales with `Category` and `Salesperson`, prices from [`PRICE_POINTS`].
pub fn grouping_data(n: usize, rng: &mut StdRng) -> Result<RecordBatch> {
    let product_col = pick_str(rng, &PRODUCTS, n);
    let region = pick_str(rng, &REGIONS, n);
    let category = pick_str(rng, &["Electronics", "Accessories"], n);
    let salesperson = pick_str(rng, &SALESPEOPLE, n);
    let quantity = ints(rng, 1, 20, n);
    let price = pick_int(rng, &PRICE_POINTS, n);
    let revenue = product(&quantity, &price);
    from_columns(vec![
        ("Date", date_range(start_date(), n)),
        ("Product", product_col),
        ("Region", region),
        ("Category", category),
        ("Salesperson", salesperson),
        ("Quantity", Arc::new(Int64Array::from(quantity)) as ArrayRef),
        ("Unit_Price", Arc::new(Int64Array::from(price)) as ArrayRef),
        ("Revenue", revenue),
    ])
}

/// The wider business dataset: cities, customer types and discounts.
pub fn business_data(n: usize, rng: &mut StdRng) -> Result<RecordBatch> {
    let product_col = pick_str(
        rng,
        &["Laptop", "Mouse", "Keyboard", "Monitor", "Headphones", "Webcam"],
        n,
    );
    let category = pick_str(rng, &["Computing", "Accessories"], n);
    let region = pick_str(rng, &["North", "South", "East", "West", "Central"], n);
    let city = pick_str(
        rng,
        &["Mumbai", "Delhi", "Bangalore", "Hyderabad", "Chennai", "Kolkata"],
        n,
    );
    let salesperson = pick_str(
        rng,
        &["Rahul", "Priya", "Amit", "Sneha", "Raj", "Anita", "Vikram"],
        n,
    );
    let customer_type = pick_str(rng, &["New", "Returning", "VIP"], n);
    let quantity = ints(rng, 1, 25, n);
    let price = pick_int(rng, &[500, 800, 1200, 2500, 15000, 45000], n);
    let discount = pick_int(rng, &[0, 5, 10, 15, 20], n);
    debug!(rows = n, "generated business data");
    from_columns(vec![
        ("Date", date_range(start_date(), n)),
        ("Product", product_col),
        ("Category", category),
        ("Region", region),
        ("City", city),
        ("Salesperson", salesperson),
        ("Customer_Type", customer_type),
        ("Quantity", Arc::new(Int64Array::from(quantity)) as ArrayRef),
        ("Unit_Price", Arc::new(Int64Array::from(price)) as ArrayRef),
        ("Discount_Pct", Arc::new(Int64Array::from(discount)) as ArrayRef),
    ])
}

const RAW_NAMES: [&str; 10] = [
    "rahul sharma",
    "PRIYA SINGH",
    "Amit Kumar",
    "sneha patel",
    "RAJ VERMA",
    "anita gupta",
    "VIKRAM RAO",
    "pooja mehta",
    "arjun kapoor",
    "NISHA JOSHI",
];

/// Orders as they arrive from an export: inconsistent casing, prices as
/// text, dates as text and gaps in payment, discount and rating.
pub fn raw_orders(n: usize, rng: &mut StdRng) -> Result<RecordBatch> {
    let ids: Vec<i64> = (0..n as i64).map(|i| 1001 + i).collect();
    let names: Vec<&str> = (0..n).map(|i| RAW_NAMES[i % RAW_NAMES.len()]).collect();
    let dates: Vec<String> = (0..n as i64)
        .map(|i| (start_date() + Duration::days(i)).format("%Y-%m-%d").to_string())
        .collect();
    let product_col = pick_str(rng, &["Laptop", "mouse", "KEYBOARD", "Monitor", "headphones"], n);
    let quantity = ints(rng, 1, 10, n);
    let price = pick_str(rng, &["45000", "500", "1200", "15000", "2500"], n);
    let region = pick_str(rng, &["north", "SOUTH", "East", "west"], n);
    let payment: StringArray = (0..n)
        .map(|_| *pick(rng, &[Some("Credit Card"), Some("UPI"), None, Some("Net Banking"), Some("Debit Card")]))
        .collect();
    let discount: Float64Array = (0..n)
        .map(|_| *pick(rng, &[Some(0.0), Some(5.0), Some(10.0), None, Some(15.0), Some(20.0)]))
        .collect();
    let rating: Float64Array = (0..n)
        .map(|_| *pick(rng, &[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), None]))
        .collect();
    debug!(rows = n, "generated raw orders");
    from_columns(vec![
        ("order_id", Arc::new(Int64Array::from(ids)) as ArrayRef),
        ("customer_name", Arc::new(StringArray::from(names)) as ArrayRef),
        ("order_date", Arc::new(StringArray::from(dates)) as ArrayRef),
        ("product", product_col),
        ("quantity", Arc::new(Int64Array::from(quantity)) as ArrayRef),
        ("unit_price", price),
        ("region", region),
        ("payment_method", Arc::new(payment) as ArrayRef),
        ("discount_pct", Arc::new(discount) as ArrayRef),
        ("customer_rating", Arc::new(rating) as ArrayRef),
    ])
}

/// `customer_id` values `CUST0001..`.
pub fn customer_ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("CUST{:04}", i)).collect()
}

/// Customers signing up daily from 2025-01-01, with weighted segments.
pub fn customers(n: usize, rng: &mut StdRng) -> Result<RecordBatch> {
    let signup = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
    let city = pick_str(
        rng,
        &["Mumbai", "Delhi", "Bangalore", "Hyderabad", "Chennai", "Pune", "Kolkata"],
        n,
    );
    let segment = pick_weighted(rng, &SEGMENTS, &SEGMENT_WEIGHTS, n)?;
    let names: Vec<String> = (1..=n).map(|i| format!("Customer_{}", i)).collect();
    from_columns(vec![
        ("customer_id", Arc::new(StringArray::from(customer_ids(n))) as ArrayRef),
        ("customer_name", Arc::new(StringArray::from(names)) as ArrayRef),
        (
            "signup_date",
            Arc::new(Date32Array::from_iter_values(
                (0..n as i32).map(|i| date_to_days(signup) + i),
            )) as ArrayRef,
        ),
        ("city", city),
        ("customer_segment", segment),
    ])
}

/// Transactions every 12 hours from 2025-01-01 against `customer_ids`, with
/// weighted delivery outcomes.
pub fn transactions(n: usize, customer_ids: &[String], rng: &mut StdRng) -> Result<RecordBatch> {
    anyhow::ensure!(!customer_ids.is_empty(), "transactions need at least one customer");
    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let ids: Vec<String> = (1..=n).map(|i| format!("TXN{:06}", i)).collect();
    let customer: StringArray = (0..n)
        .map(|_| Some(pick(rng, customer_ids).as_str()))
        .collect();
    let category = pick_str(
        rng,
        &["Electronics", "Fashion", "Home & Kitchen", "Books", "Sports", "Beauty"],
        n,
    );
    let name = pick_str(
        rng,
        &[
            "Laptop",
            "Smartphone",
            "Headphones",
            "Shirt",
            "Jeans",
            "Watch",
            "Mixer",
            "Bedsheet",
            "Novel",
            "Textbook",
            "Football",
            "Cricket Bat",
            "Perfume",
            "Lipstick",
        ],
        n,
    );
    let quantity = ints(rng, 1, 5, n);
    let price = pick_int(rng, &[299, 499, 999, 1499, 2999, 4999, 9999, 19999, 49999], n);
    let discount = pick_int(rng, &[0, 5, 10, 15, 20, 25, 30], n);
    let payment = pick_str(rng, &["Credit Card", "Debit Card", "UPI", "Net Banking", "COD"], n);
    let status = pick_weighted(rng, &DELIVERY_STATUSES, &DELIVERY_WEIGHTS, n)?;
    debug!(rows = n, customers = customer_ids.len(), "generated transactions");
    from_columns(vec![
        ("transaction_id", Arc::new(StringArray::from(ids)) as ArrayRef),
        ("transaction_date", datetime_range(start, n, Duration::hours(12))),
        ("customer_id", Arc::new(customer) as ArrayRef),
        ("product_category", category),
        ("product_name", name),
        ("quantity", Arc::new(Int64Array::from(quantity)) as ArrayRef),
        ("unit_price", Arc::new(Int64Array::from(price)) as ArrayRef),
        ("discount_percent", Arc::new(Int64Array::from(discount)) as ArrayRef),
        ("payment_method", payment),
        ("delivery_status", status),
    ])
}

/// `Date` from 2026-01-01 with a `Sales` figure in `10000..50000`.
pub fn daily_sales(n: usize, rng: &mut StdRng) -> Result<RecordBatch> {
    let sales = ints(rng, 10000, 50000, n);
    from_columns(vec![
        ("Date", date_range(start_date(), n)),
        ("Sales", Arc::new(Int64Array::from(sales)) as ArrayRef),
    ])
}

/// The five-product catalogue used by the selection examples.
pub fn product_catalog() -> Result<RecordBatch> {
    from_columns(vec![
        ("Product", Arc::new(StringArray::from(PRODUCTS.to_vec())) as ArrayRef),
        (
            "Price",
            Arc::new(Int64Array::from(vec![45000, 500, 1200, 15000, 2500])) as ArrayRef,
        ),
        (
            "Stock",
            Arc::new(Int64Array::from(vec![50, 200, 150, 75, 120])) as ArrayRef,
        ),
        (
            "Category",
            Arc::new(StringArray::from(vec![
                "Computer",
                "Accessory",
                "Accessory",
                "Computer",
                "Accessory",
            ])) as ArrayRef,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{sales_schema, validate};
    use crate::table::{i64_values, nunique, str_values, value_counts};
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn sales_match_declared_schema() -> Result<()> {
        let batch = sales_data(100, &mut rng())?;
        validate(&batch, &sales_schema())?;
        let q = i64_values(&batch, "Quantity")?;
        let p = i64_values(&batch, "Unit_Price")?;
        let r = i64_values(&batch, "Revenue")?;
        for i in 0..batch.num_rows() {
            assert_eq!(r[i], Some(q[i].unwrap() * p[i].unwrap()));
            assert!((1..20).contains(&q[i].unwrap()));
        }
        Ok(())
    }

    #[test]
    fn same_seed_same_table() -> Result<()> {
        let a = grouping_data(50, &mut rng())?;
        let b = grouping_data(50, &mut rng())?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn raw_orders_are_messy() -> Result<()> {
        let batch = raw_orders(50, &mut rng())?;
        assert_eq!(batch.num_rows(), 50);
        assert_eq!(str_values(&batch, "customer_name")?[10].as_deref(), Some("rahul sharma"));
        assert_eq!(str_values(&batch, "order_date")?[49].as_deref(), Some("2026-02-19"));
        assert!(nunique(&batch, "product")? <= 5);
        Ok(())
    }

    #[test]
    fn customers_and_transactions_link() -> Result<()> {
        let cust = customers(200, &mut rng())?;
        let ids = customer_ids(200);
        assert_eq!(str_values(&cust, "customer_id")?[0].as_deref(), Some("CUST0001"));
        let tx = transactions(1000, &ids, &mut rng())?;
        assert_eq!(str_values(&tx, "transaction_id")?[999].as_deref(), Some("TXN001000"));
        assert!(str_values(&tx, "customer_id")?
            .iter()
            .all(|c| c.as_ref().is_some_and(|c| ids.contains(c))));

        // with 1000 draws "Delivered" dominates
        let counts = value_counts(&tx, "delivery_status")?;
        assert_eq!(str_values(&counts, "delivery_status")?[0].as_deref(), Some("Delivered"));
        assert!(transactions(10, &[], &mut rng()).is_err());
        Ok(())
    }
}
