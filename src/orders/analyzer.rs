use crate::load::date_parser::days_to_date;
use crate::table::{column, f64_values, i64_values, str_values};
use anyhow::{anyhow, Context, Result};
use arrow::{array::{Array, Date32Array}, compute::cast, datatypes::DataType, record_batch::RecordBatch};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sale {
    pub date: NaiveDate,
    pub product: String,
    pub quantity: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub total_revenue: f64,
    pub total_transactions: usize,
    pub average_order_value: Option<f64>,
    pub top_product: Option<(String, f64)>,
}

/// Transaction list with the usual roll-ups.
#[derive(Debug, Clone, Default)]
pub struct SalesAnalyzer {
    sales: Vec<Sale>,
}

impl SalesAnalyzer {
    pub fn new(sales: Vec<Sale>) -> Self {
        SalesAnalyzer { sales }
    }

    /// Build from a table with `Date`, `Product`, `Quantity` and `Revenue`
    /// columns. Rows missing any of them are skipped.
    pub fn from_batch(batch: &RecordBatch) -> Result<Self> {
        let dates = cast(column(batch, "Date")?, &DataType::Date32).context("reading `Date`")?;
        let dates: Vec<Option<i32>> = dates
            .as_any()
            .downcast_ref::<Date32Array>()
            .ok_or_else(|| anyhow!("`Date` is not a date column"))?
            .iter()
            .collect();
        let products = str_values(batch, "Product")?;
        let quantities = i64_values(batch, "Quantity")?;
        let revenues = f64_values(batch, "Revenue")?;

        let sales = (0..batch.num_rows())
            .filter_map(|i| {
                Some(Sale {
                    date: dates[i].and_then(days_to_date)?,
                    product: products[i].clone()?,
                    quantity: quantities[i]?,
                    revenue: revenues[i]?,
                })
            })
            .collect();
        Ok(SalesAnalyzer { sales })
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn total_revenue(&self) -> f64 {
        self.sales.iter().map(|s| s.revenue).sum()
    }

    /// Product with the highest revenue; the first product seen wins ties.
    pub fn top_product(&self) -> Option<(String, f64)> {
        let mut totals: Vec<(&str, f64)> = Vec::new();
        for s in &self.sales {
            match totals.iter_mut().find(|(p, _)| *p == s.product) {
                Some((_, total)) => *total += s.revenue,
                None => totals.push((s.product.as_str(), s.revenue)),
            }
        }
        totals
            .into_iter()
            .fold(None::<(&str, f64)>, |best, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            })
            .map(|(p, r)| (p.to_string(), r))
    }

    pub fn average_order_value(&self) -> Option<f64> {
        (!self.sales.is_empty()).then(|| self.total_revenue() / self.sales.len() as f64)
    }

    pub fn filter_by_product(&self, product: &str) -> Vec<&Sale> {
        self.sales.iter().filter(|s| s.product == product).collect()
    }

    pub fn summary_report(&self) -> SalesSummary {
        SalesSummary {
            total_revenue: self.total_revenue(),
            total_transactions: self.sales.len(),
            average_order_value: self.average_order_value(),
            top_product: self.top_product(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::from_columns;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    fn sale(day: u32, product: &str, quantity: i64, revenue: f64) -> Sale {
        Sale {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            product: product.to_string(),
            quantity,
            revenue,
        }
    }

    fn analyzer() -> SalesAnalyzer {
        SalesAnalyzer::new(vec![
            sale(1, "Laptop", 2, 80000.0),
            sale(2, "Mouse", 15, 7500.0),
            sale(3, "Laptop", 1, 40000.0),
            sale(4, "Keyboard", 8, 12000.0),
        ])
    }

    #[test]
    fn summary() {
        let report = analyzer().summary_report();
        assert_eq!(report.total_revenue, 139500.0);
        assert_eq!(report.total_transactions, 4);
        assert_eq!(report.average_order_value, Some(34875.0));
        assert_eq!(report.top_product, Some(("Laptop".to_string(), 120000.0)));
    }

    #[test]
    fn filtering() {
        let a = analyzer();
        assert_eq!(a.filter_by_product("Laptop").len(), 2);
        assert!(a.filter_by_product("Tablet").is_empty());
        assert_eq!(SalesAnalyzer::default().average_order_value(), None);
    }

    #[test]
    fn from_table() -> Result<()> {
        let batch = from_columns(vec![
            (
                "Date",
                Arc::new(StringArray::from(vec!["2025-01-01", "2025-01-02"])) as ArrayRef,
            ),
            (
                "Product",
                Arc::new(StringArray::from(vec![Some("Laptop"), None])) as ArrayRef,
            ),
            ("Quantity", Arc::new(Int64Array::from(vec![2, 15])) as ArrayRef),
            ("Revenue", Arc::new(Int64Array::from(vec![80000, 7500])) as ArrayRef),
        ])?;
        let a = SalesAnalyzer::from_batch(&batch)?;
        assert_eq!(a.sales(), &[sale(1, "Laptop", 2, 80000.0)]);
        Ok(())
    }
}
