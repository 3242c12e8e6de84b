//! Products × quarters matrix analysis and the region × product × month cube.

use crate::array::{
    argmax_cell, consistency_label, first_last_growth, mean_last_axis, random_cube, totals_along,
    OverallMetrics, QuarterlyMatrix, RowExtremes, SalesCube,
};
use crate::report::{banner, print_table, signed_percent, Money};
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::info;

/// Total sales a product must exceed, in thousands.
pub const DEFAULT_TARGET: f64 = 400.0;

/// Five products over four quarters, in thousands.
pub fn sample_matrix() -> Result<QuarterlyMatrix> {
    QuarterlyMatrix::new(
        &["Laptop", "Mouse", "Keyboard", "Monitor", "Headphones"],
        &["Q1", "Q2", "Q3", "Q4"],
        &[
            &[450.0, 480.0, 520.0, 550.0],
            &[120.0, 135.0, 128.0, 142.0],
            &[85.0, 92.0, 88.0, 95.0],
            &[320.0, 310.0, 340.0, 360.0],
            &[95.0, 105.0, 110.0, 120.0],
        ],
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consistency {
    pub label: String,
    pub std: f64,
    pub rating: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AboveTarget {
    pub label: String,
    pub total: f64,
    pub margin: f64,
}

#[derive(Debug, Clone)]
pub struct QuarterlyReport {
    pub table: RecordBatch,
    pub row_totals: Vec<(String, f64)>,
    pub top: Option<(String, f64)>,
    pub period_totals: Vec<(String, f64)>,
    /// `("Q1 → Q2", growth)` for each consecutive pair.
    pub growth: Vec<(String, Option<f64>)>,
    pub averages: Vec<(String, f64)>,
    pub consistency: Vec<Consistency>,
    pub most_consistent: Option<String>,
    pub target: f64,
    pub above_target: Vec<AboveTarget>,
    pub extremes: Vec<RowExtremes>,
    pub overall: Option<OverallMetrics>,
}

fn labelled(labels: &[String], values: &Array1<f64>) -> Vec<(String, f64)> {
    labels.iter().cloned().zip(values.iter().copied()).collect()
}

pub fn analyze(m: &QuarterlyMatrix, target: f64) -> Result<QuarterlyReport> {
    let totals = m.row_totals();
    let std = m.row_std();
    let growth = m
        .periods
        .windows(2)
        .map(|w| format!("{} → {}", w[0], w[1]))
        .zip(m.qoq_growth())
        .collect();
    let consistency = m
        .labels
        .iter()
        .zip(std.iter())
        .map(|(label, &s)| Consistency {
            label: label.clone(),
            std: s,
            rating: consistency_label(s),
        })
        .collect();
    let above_target = m
        .rows_above(target)
        .into_iter()
        .map(|(label, total, margin)| AboveTarget { label, total, margin })
        .collect();
    let report = QuarterlyReport {
        table: m.to_batch("Product").context("matrix table")?,
        row_totals: labelled(&m.labels, &totals),
        top: m.best_row().map(|i| (m.labels[i].clone(), totals[i])),
        period_totals: labelled(&m.periods, &m.period_totals()),
        growth,
        averages: labelled(&m.labels, &m.row_means()),
        consistency,
        most_consistent: m.most_consistent().map(|i| m.labels[i].clone()),
        target,
        above_target,
        extremes: m.extremes(),
        overall: m.overall(),
    };
    info!(rows = m.labels.len(), periods = m.periods.len(), "quarterly matrix analysed");
    Ok(report)
}

impl QuarterlyReport {
    pub fn print(&self, money: &Money) -> Result<()> {
        let k = |v: f64, d: usize| format!("{}k", money.fmt(v, d));
        println!("{}", banner("SALES ANALYTICS - QUARTERLY PERFORMANCE ANALYSIS"));
        println!("\nSales Data (in thousands):");
        print_table(&self.table)?;

        println!("\n{}", banner("ANALYSIS 1: TOTAL SALES PER PRODUCT"));
        for (label, total) in &self.row_totals {
            println!("{:<12}: {}", label, k(*total, 0));
        }
        if let Some((label, total)) = &self.top {
            println!("\nTop Product: {} ({})", label, k(*total, 0));
        }

        println!("\n{}", banner("ANALYSIS 2: TOTAL SALES PER QUARTER"));
        for (period, total) in &self.period_totals {
            println!("{}: {}", period, k(*total, 0));
        }
        println!("\nQuarter-over-Quarter Growth:");
        for (step, g) in &self.growth {
            match g {
                Some(g) => println!("{}: {}", step, signed_percent(*g, 2)),
                None => println!("{}: N/A", step),
            }
        }

        println!("\n{}", banner("ANALYSIS 3: AVERAGE QUARTERLY SALES"));
        for (label, avg) in &self.averages {
            println!("{:<12}: {} per quarter", label, k(*avg, 2));
        }

        println!("\n{}", banner("ANALYSIS 4: SALES CONSISTENCY (Lower is more consistent)"));
        for c in &self.consistency {
            println!("{:<12}: Std Dev = {:6.2} ({} consistency)", c.label, c.std, c.rating);
        }
        if let Some(label) = &self.most_consistent {
            println!("\nMost Consistent: {}", label);
        }

        println!(
            "\n{}",
            banner(&format!("ANALYSIS 5: PRODUCTS EXCEEDING {:.0}K TARGET", self.target))
        );
        for a in &self.above_target {
            println!("{}: {} (+{} above target)", a.label, k(a.total, 0), k(a.margin, 0));
        }

        println!("\n{}", banner("ANALYSIS 6: BEST & WORST QUARTERS PER PRODUCT"));
        for e in &self.extremes {
            println!("\n{}:", e.label);
            println!("  Best:  {} - {}", e.best, k(e.best_value, 0));
            println!("  Worst: {} - {}", e.worst, k(e.worst_value, 0));
            println!("  Range: {}", k(e.range, 0));
        }

        if let Some(o) = &self.overall {
            println!("\n{}", banner("ANALYSIS 7: OVERALL BUSINESS METRICS"));
            println!("Total Annual Revenue: {}", k(o.total, 0));
            println!("Average Quarterly Revenue: {}", k(o.mean_period_total, 2));
            if let Some(g) = o.growth {
                println!("First to Last Quarter Growth: {}", signed_percent(g, 2));
            }
            println!("Best Quarter: {} ({})", o.best_period, k(o.best_period_total, 0));
            println!("Worst Quarter: {} ({})", o.worst_period, k(o.worst_period_total, 0));
        }
        Ok(())
    }
}

/// Reductions over a region × product × month cube.
#[derive(Debug, Clone)]
pub struct CubeReport {
    pub shape: Vec<usize>,
    pub region_totals: Array1<f64>,
    pub product_totals: Array1<f64>,
    pub month_totals: Array1<f64>,
    /// Region × product average over months.
    pub averages: Option<Array2<f64>>,
    /// Region × product growth from first to last month, percent.
    pub growth: Option<Array2<f64>>,
    /// `[region, product, month]` and value of the best single cell.
    pub best: Option<(Vec<usize>, f64)>,
}

pub fn analyze_cube(cube: &SalesCube) -> Result<CubeReport> {
    Ok(CubeReport {
        shape: cube.shape().to_vec(),
        region_totals: totals_along(cube, 0)?,
        product_totals: totals_along(cube, 1)?,
        month_totals: totals_along(cube, 2)?,
        averages: mean_last_axis(cube),
        growth: first_last_growth(cube),
        best: argmax_cell(cube),
    })
}

/// Three regions, four products, six months of sales in `80..200`.
pub fn sample_cube(rng: &mut StdRng) -> SalesCube {
    random_cube((3, 4, 6), 80, 200, rng)
}

impl CubeReport {
    pub fn print(&self) {
        println!("\n{}", banner("REGIONAL SALES CUBE"));
        println!("Sales data shape: {:?}", self.shape);
        println!("\nTotal sales per region: {}", self.region_totals);
        println!("Total sales per product: {}", self.product_totals);
        println!("Monthly totals: {}", self.month_totals);
        if let Some(avg) = &self.averages {
            println!("\nAverage monthly sales per product/region:\n{:.1}", avg);
        }
        if let Some(growth) = &self.growth {
            println!("\nFirst to last month growth (%):\n{:.1}", growth);
        }
        if let Some((pos, value)) = &self.best {
            println!("\nBest sale: {}", value);
            println!("Region {}, Product {}, Month {}", pos[0], pos[1], pos[2]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn sample_matrix_report() -> Result<()> {
        let r = analyze(&sample_matrix()?, DEFAULT_TARGET)?;
        assert_eq!(r.top, Some(("Laptop".to_string(), 2000.0)));
        assert_eq!(r.most_consistent.as_deref(), Some("Keyboard"));
        assert_eq!(r.growth[0].0, "Q1 → Q2");
        assert_eq!(r.growth.len(), 3);

        let above: Vec<&str> = r.above_target.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(above, vec!["Laptop", "Mouse", "Monitor", "Headphones"]);
        assert_eq!(r.above_target[1].margin, 125.0);

        assert_eq!(r.consistency[0].rating, "Medium");
        let overall = r.overall.as_ref().map(|o| o.total);
        assert_eq!(overall, Some(4645.0));
        assert_eq!(r.table.num_rows(), 5);
        Ok(())
    }

    #[test]
    fn cube_reductions_agree() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let cube = sample_cube(&mut rng);
        let r = analyze_cube(&cube)?;
        assert_eq!(r.shape, vec![3, 4, 6]);
        let total = cube.sum();
        assert_eq!(r.region_totals.sum(), total);
        assert_eq!(r.product_totals.sum(), total);
        assert_eq!(r.month_totals.sum(), total);

        let (pos, value) = r.best.clone().unwrap_or_default();
        assert_eq!(cube[[pos[0], pos[1], pos[2]]], value);
        assert!(cube.iter().all(|&v| v <= value && (80.0..200.0).contains(&v)));
        Ok(())
    }
}
