//! Record-list analytics over plain Rust values: order analysis, employee
//! roll-ups and the small scoring helpers the reports share.

pub mod analyzer;

pub use analyzer::{Sale, SalesAnalyzer, SalesSummary};

use crate::stats;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u32,
    pub customer: String,
    pub amount: f64,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(id: u32, customer: &str, amount: f64, status: OrderStatus) -> Self {
        Order {
            id,
            customer: customer.to_string(),
            amount,
            status,
        }
    }

    pub fn delivered(&self) -> bool {
        self.status == OrderStatus::Delivered
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub customer: String,
    pub orders: usize,
    pub delivered_orders: usize,
    /// Delivered revenue only.
    pub revenue: f64,
    /// `revenue / delivered_orders`, 0 without deliveries.
    pub avg_order: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAnalysis {
    pub delivered_revenue: f64,
    pub total_orders: usize,
    pub cancelled_orders: usize,
    /// Percent of all orders.
    pub cancellation_rate: Option<f64>,
    /// Highest delivered spend; the first customer wins ties.
    pub top_customer: Option<(String, f64)>,
    pub avg_delivered_order: Option<f64>,
    /// In order of first appearance.
    pub customers: Vec<CustomerSummary>,
}

pub fn analyze_orders(orders: &[Order]) -> OrderAnalysis {
    let delivered: Vec<&Order> = orders.iter().filter(|o| o.delivered()).collect();
    let delivered_revenue: f64 = delivered.iter().map(|o| o.amount).sum();
    let cancelled_orders = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Cancelled)
        .count();

    let mut customers: Vec<CustomerSummary> = Vec::new();
    for order in orders {
        let idx = match customers.iter().position(|c| c.customer == order.customer) {
            Some(i) => i,
            None => {
                customers.push(CustomerSummary {
                    customer: order.customer.clone(),
                    orders: 0,
                    delivered_orders: 0,
                    revenue: 0.0,
                    avg_order: 0.0,
                });
                customers.len() - 1
            }
        };
        let summary = &mut customers[idx];
        summary.orders += 1;
        if order.delivered() {
            summary.revenue += order.amount;
            summary.delivered_orders += 1;
        }
    }
    for c in customers.iter_mut() {
        if c.delivered_orders > 0 {
            c.avg_order = c.revenue / c.delivered_orders as f64;
        }
    }

    let top_customer = customers
        .iter()
        .filter(|c| c.delivered_orders > 0)
        .fold(None::<&CustomerSummary>, |best, c| match best {
            Some(b) if b.revenue >= c.revenue => Some(b),
            _ => Some(c),
        })
        .map(|c| (c.customer.clone(), c.revenue));

    debug!(
        orders = orders.len(),
        delivered = delivered.len(),
        cancelled = cancelled_orders,
        "analyzed orders"
    );
    OrderAnalysis {
        delivered_revenue,
        total_orders: orders.len(),
        cancelled_orders,
        cancellation_rate: stats::conversion_rate(cancelled_orders, orders.len()),
        top_customer,
        avg_delivered_order: (!delivered.is_empty())
            .then(|| delivered_revenue / delivered.len() as f64),
        customers,
    }
}

/// The six-order e-commerce example.
pub fn sample_orders() -> Vec<Order> {
    use OrderStatus::*;
    vec![
        Order::new(1, "A", 1200.0, Delivered),
        Order::new(2, "B", 800.0, Cancelled),
        Order::new(3, "A", 1500.0, Delivered),
        Order::new(4, "C", 2000.0, Delivered),
        Order::new(5, "B", 600.0, Delivered),
        Order::new(6, "A", 900.0, Cancelled),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub dept: String,
    pub sales: f64,
}

impl Employee {
    pub fn new(name: &str, dept: &str, sales: f64) -> Self {
        Employee {
            name: name.to_string(),
            dept: dept.to_string(),
            sales,
        }
    }
}

/// Four staff across two departments.
pub fn sample_employees() -> Vec<Employee> {
    vec![
        Employee::new("Rahul", "Sales", 45000.0),
        Employee::new("Priya", "Marketing", 32000.0),
        Employee::new("Amit", "Sales", 51000.0),
        Employee::new("Sneha", "Marketing", 28000.0),
    ]
}

/// Sales per department in order of first appearance.
pub fn sales_by_department(employees: &[Employee]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for e in employees {
        match totals.iter_mut().find(|(d, _)| *d == e.dept) {
            Some((_, total)) => *total += e.sales,
            None => totals.push((e.dept.clone(), e.sales)),
        }
    }
    totals
}

pub fn top_performer(employees: &[Employee]) -> Option<&Employee> {
    employees.iter().fold(None, |best: Option<&Employee>, e| match best {
        Some(b) if b.sales >= e.sales => Some(b),
        _ => Some(e),
    })
}

pub fn high_performers(employees: &[Employee], threshold: f64) -> Vec<&Employee> {
    employees.iter().filter(|e| e.sales > threshold).collect()
}

/// Percent change; `None` when `old` is zero.
pub fn calculate_growth_rate(old: f64, new: f64) -> Option<f64> {
    stats::growth_rate(old, new)
}

/// `Low` below `low`, `Medium` below `high`, otherwise `High`.
pub fn categorize_performance(value: f64, low: f64, high: f64) -> &'static str {
    if value < low {
        "Low"
    } else if value < high {
        "Medium"
    } else {
        "High"
    }
}

/// Drop missing, zero and negative values.
pub fn clean_values(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().filter(|v| *v > 0.0).collect()
}

/// Tiered bonus rate: nothing below 20k, then 5%, 8% and 12% from 60k.
pub fn bonus_rate(sales: f64) -> f64 {
    if sales < 20000.0 {
        0.0
    } else if sales < 40000.0 {
        0.05
    } else if sales < 60000.0 {
        0.08
    } else {
        0.12
    }
}

pub fn calculate_bonus(sales: f64) -> f64 {
    sales * bonus_rate(sales)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_example() {
        let a = analyze_orders(&sample_orders());
        assert_eq!(a.delivered_revenue, 5300.0);
        assert_eq!(a.cancelled_orders, 2);
        assert_eq!(format!("{:.1}", a.cancellation_rate.unwrap()), "33.3");
        assert_eq!(format!("{:.2}", a.avg_delivered_order.unwrap()), "1325.00");
        assert_eq!(a.top_customer, Some(("A".to_string(), 2700.0)));
    }

    #[test]
    fn customer_summary_keeps_first_appearance_order() {
        let a = analyze_orders(&sample_orders());
        let names: Vec<&str> = a.customers.iter().map(|c| c.customer.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        let b = &a.customers[1];
        assert_eq!((b.orders, b.delivered_orders, b.revenue, b.avg_order), (2, 1, 600.0, 600.0));
        let total: f64 = a.customers.iter().map(|c| c.revenue).sum();
        assert_eq!(total, a.delivered_revenue);
    }

    #[test]
    fn no_orders() {
        let a = analyze_orders(&[]);
        assert_eq!(a.cancellation_rate, None);
        assert_eq!(a.avg_delivered_order, None);
        assert_eq!(a.top_customer, None);
    }

    #[test]
    fn employees() {
        let staff = sample_employees();
        assert_eq!(
            sales_by_department(&staff),
            vec![("Sales".to_string(), 96000.0), ("Marketing".to_string(), 60000.0)]
        );
        assert_eq!(top_performer(&staff).map(|e| e.name.as_str()), Some("Amit"));
        assert_eq!(high_performers(&staff, 30000.0).len(), 3);
    }

    #[test]
    fn helpers() {
        assert_eq!(calculate_growth_rate(1000.0, 1500.0), Some(50.0));
        assert_eq!(calculate_growth_rate(0.0, 10.0), None);
        assert_eq!(categorize_performance(35000.0, 20000.0, 50000.0), "Medium");
        assert_eq!(
            clean_values(&[Some(100.0), Some(200.0), None, Some(0.0), Some(-50.0), Some(300.0)]),
            vec![100.0, 200.0, 300.0]
        );
        assert_eq!(calculate_bonus(15000.0), 0.0);
        assert_eq!(calculate_bonus(25000.0), 1250.0);
        assert_eq!(calculate_bonus(45000.0), 3600.0);
        assert_eq!(calculate_bonus(75000.0), 9000.0);
    }
}
