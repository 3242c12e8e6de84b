//! The concrete charts: basic line/bar/scatter views, styled comparisons and
//! the regional dashboard.

use super::{
    average_line, dashboard, gradient, peak_and_low, target_colors, ChartKind, ChartSpec, Dashboard, ReferenceLine,
    Series, BLUE, CORPORATE, PROFESSIONAL, RED,
};
use crate::report::share_table;
use anyhow::Result;
use arrow::record_batch::RecordBatch;
use rand::{rngs::StdRng, Rng};
use std::path::{Path, PathBuf};
use tracing::info;

pub const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];
pub const REVENUE_2024: [f64; 4] = [450.0, 520.0, 580.0, 640.0];
pub const REVENUE_2025: [f64; 4] = [480.0, 550.0, 620.0, 680.0];

pub const MONTHS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
pub const MONTHLY_SALES: [f64; 12] = [420.0, 450.0, 480.0, 520.0, 490.0, 560.0, 590.0, 610.0, 580.0, 640.0, 680.0, 720.0];

pub const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];
pub const REGION_REVENUE: [f64; 5] = [850.0, 720.0, 680.0, 590.0, 450.0];
pub const REGION_GROWTH: [f64; 5] = [12.5, 8.3, 15.7, 6.2, 10.1];
pub const REGION_CUSTOMERS: [f64; 5] = [1250.0, 980.0, 1100.0, 750.0, 620.0];
pub const GROWTH_TARGET: f64 = 10.0;

fn thousands_k(v: f64) -> String {
    format!("₹{}K", (v / 1000.0) as i64)
}

fn lakhs(v: f64) -> String {
    format!("₹{}L", v as i64)
}

/// Half-year monthly sales as a line.
pub fn sales_trend() -> ChartSpec {
    let sales = vec![45000.0, 52000.0, 48000.0, 61000.0, 58000.0, 67000.0];
    ChartSpec::new(ChartKind::Line, "Monthly Sales Trend Analysis")
        .axes("Month", "Sales (₹)")
        .categories(&MONTHS[..6])
        .series(Series::new("Sales", sales).color(BLUE))
}

/// The same months as bars with a value label on each.
pub fn sales_comparison() -> ChartSpec {
    let sales = vec![45000.0, 52000.0, 48000.0, 61000.0, 58000.0, 67000.0];
    ChartSpec::new(ChartKind::Bar, "Monthly Sales Comparison")
        .axes("Month", "Sales (₹)")
        .categories(&MONTHS[..6])
        .series(Series::new("Sales", sales).labelled(thousands_k))
}

/// Fifty stores: customer count against revenue, with noise.
pub fn customer_scatter(rng: &mut StdRng) -> ChartSpec {
    let customers: Vec<f64> = (0..50).map(|_| rng.random_range(50..150) as f64).collect();
    let revenue: Vec<f64> = customers
        .iter()
        .map(|c| c * rng.random_range(300..800) as f64 + rng.random_range(-5000..5000) as f64)
        .collect();
    ChartSpec::new(ChartKind::Scatter, "Customer Count vs Revenue Analysis")
        .axes("Number of Customers", "Revenue (₹)")
        .x_values(customers)
        .series(Series::new("Revenue", revenue))
}

/// The same quarters drawn in each palette, keyed by file name.
pub fn palette_comparison() -> Result<Vec<(&'static str, ChartSpec)>> {
    let palettes: [(&str, &str, Vec<String>); 4] = [
        ("palette_default", "Default Colors", Vec::new()),
        ("palette_professional", "Professional Palette", PROFESSIONAL.iter().map(|c| c.to_string()).collect()),
        ("palette_corporate", "Corporate Palette", CORPORATE.iter().map(|c| c.to_string()).collect()),
        ("palette_gradient", "Gradient Palette", gradient("#3b528b", "#b5de2b", QUARTERS.len())?),
    ];
    Ok(palettes
        .into_iter()
        .map(|(name, title, colors)| {
            let chart = ChartSpec::new(ChartKind::Bar, title)
                .axes("Quarter", "Revenue (₹ Lakhs)")
                .categories(&QUARTERS)
                .series(Series::new("Revenue", REVENUE_2024.to_vec()).point_colors(colors));
            (name, chart)
        })
        .collect())
}

/// Two years side by side, each bar labelled.
pub fn yearly_comparison() -> ChartSpec {
    ChartSpec::new(ChartKind::GroupedBar, "Quarterly Revenue Comparison: 2024 vs 2025")
        .axes("Quarter", "Revenue (₹ Lakhs)")
        .categories(&QUARTERS)
        .series(Series::new("2024", REVENUE_2024.to_vec()).color(PROFESSIONAL[0]).labelled(lakhs))
        .series(Series::new("2025", REVENUE_2025.to_vec()).color(PROFESSIONAL[2]).labelled(lakhs))
}

/// Monthly line with peak, low and average marked.
pub fn annotated_trend(months: &[&str], sales: &[f64]) -> ChartSpec {
    let mut chart = ChartSpec::new(ChartKind::Line, "Sales Performance - Monthly Analysis")
        .axes("Month", "Sales (₹ Lakhs)")
        .categories(months)
        .series(Series::new("Monthly Sales", sales.to_vec()).color(BLUE))
        .highlights(peak_and_low(sales, lakhs));
    if let Some(avg) = average_line(sales, |v| format!("₹{:.0}L", v)) {
        chart = chart.reference(avg);
    }
    chart
}

/// Revenue, growth against target, customer split and revenue vs customers.
pub fn regional_dashboard() -> Result<Dashboard> {
    let revenue = ChartSpec::new(ChartKind::HorizontalBar, "Regional Revenue Distribution")
        .axes("Revenue (₹ Lakhs)", "Region")
        .categories(&REGIONS)
        .series(
            Series::new("Revenue", REGION_REVENUE.to_vec())
                .point_colors(gradient("#fdae61", "#1a9850", REGIONS.len())?)
                .labelled(lakhs),
        );
    let growth = ChartSpec::new(ChartKind::Bar, "Year-over-Year Growth Rate")
        .axes("Region", "Growth Rate (%)")
        .categories(&REGIONS)
        .series(
            Series::new("Growth", REGION_GROWTH.to_vec())
                .point_colors(target_colors(&REGION_GROWTH, GROWTH_TARGET))
                .labelled(|v| format!("{}%", v)),
        )
        .reference(ReferenceLine {
            value: GROWTH_TARGET,
            label: format!("Target: {}%", GROWTH_TARGET),
            color: RED.to_string(),
        });
    let customers = ChartSpec::new(ChartKind::Pie, "Customer Distribution by Region")
        .categories(&REGIONS)
        .series(Series::new("Customers", REGION_CUSTOMERS.to_vec()).labelled({
            let total: f64 = REGION_CUSTOMERS.iter().sum();
            move |v| format!("{:.1}%", v / total * 100.0)
        }));
    let scatter = ChartSpec::new(ChartKind::Scatter, "Revenue vs Customer Base")
        .axes("Number of Customers", "Revenue (₹ Lakhs)")
        .x_values(REGION_CUSTOMERS.to_vec())
        .series(
            Series::new("Revenue", REGION_REVENUE.to_vec())
                .point_colors(target_colors(&REGION_GROWTH, GROWTH_TARGET))
                .labels(&REGIONS),
        );
    dashboard(
        "Regional Performance Dashboard - Q4 2025",
        vec![revenue, growth, customers, scatter],
    )
}

/// Plain and styled versions of the same product bars.
pub fn before_after() -> Result<Dashboard> {
    let products = ["Product A", "Product B", "Product C", "Product D"];
    let sales = vec![450.0, 380.0, 520.0, 290.0];
    let before = ChartSpec::new(ChartKind::Bar, "Before: Basic Chart")
        .axes("", "Sales")
        .categories(&products)
        .series(Series::new("Sales", sales.clone()));
    let after = ChartSpec::new(ChartKind::Bar, "After: Professional Styling")
        .axes("", "Sales (₹ Lakhs)")
        .categories(&products)
        .series(
            Series::new("Sales", sales)
                .point_colors(vec![
                    PROFESSIONAL[0].to_string(),
                    PROFESSIONAL[1].to_string(),
                    PROFESSIONAL[2].to_string(),
                    super::GREEN.to_string(),
                ])
                .labelled(lakhs),
        );
    dashboard("Impact of Professional Styling", vec![before, after])
}

/// Revenue per region from a sales table, highest first, with shares as labels.
pub fn region_revenue(sales: &RecordBatch) -> Result<ChartSpec> {
    let table = share_table(sales, "Region", "Revenue")?;
    let mut chart = ChartSpec::from_table(&table, ChartKind::Bar, "Revenue by Region", "Region", "Total")?;
    let shares = crate::table::f64_values(&table, "Share_%")?;
    if let Some(series) = chart.series.first_mut() {
        series.value_labels = shares.iter().map(|s| format!("{:.1}%", s.unwrap_or(0.0))).collect();
    }
    Ok(chart)
}

/// Write every chart as `<dir>/NN_<name>.json`.
pub fn write_all(dir: &Path, sales: &RecordBatch, rng: &mut StdRng) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut charts: Vec<(&str, ChartSpec)> = vec![
        ("sales_trend_line", sales_trend()),
        ("sales_comparison_bar", sales_comparison()),
        ("customer_revenue_scatter", customer_scatter(rng)),
        ("professional_bar_chart", yearly_comparison()),
        ("annotated_line_chart", annotated_trend(&MONTHS, &MONTHLY_SALES)),
        ("region_revenue", region_revenue(sales)?),
    ];
    charts.extend(palette_comparison()?);
    for (i, (name, chart)) in charts.iter().enumerate() {
        let path = dir.join(format!("{:02}_{}.json", i + 1, name));
        chart.write(&path)?;
        written.push(path);
    }

    let combined = dashboard(
        "Sales Dashboard",
        vec![sales_trend(), sales_comparison(), customer_scatter(rng)],
    )?;
    let dashboards = [
        ("combined_dashboard", combined),
        ("professional_dashboard", regional_dashboard()?),
        ("before_after", before_after()?),
    ];
    for (name, d) in dashboards {
        let path = dir.join(format!("{}.json", name));
        d.write(&path)?;
        written.push(path);
    }
    info!(charts = written.len(), dir = %dir.display(), "chart specs written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::GREEN;
    use crate::export::list_outputs;
    use crate::generate::sales_data;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn annotated_trend_marks_extremes() -> Result<()> {
        let chart = annotated_trend(&MONTHS, &MONTHLY_SALES);
        chart.validate()?;
        assert_eq!(chart.highlights[0].label, "Peak: ₹720L");
        assert_eq!(chart.highlights[1].label, "Low: ₹420L");
        assert_eq!(chart.reference_lines[0].label, "Average: ₹562L");
        Ok(())
    }

    #[test]
    fn dashboard_growth_colours() -> Result<()> {
        let d = regional_dashboard()?;
        assert_eq!((d.rows, d.cols), (2, 2));
        let growth = &d.panels[1].series[0];
        assert_eq!(growth.point_colors[4], GREEN);
        assert_eq!(growth.point_colors[1], RED);
        assert_eq!(d.panels[2].series[0].value_labels[0], "26.6%");
        Ok(())
    }

    #[test]
    fn writes_every_chart() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let sales = sales_data(100, &mut rng)?;
        let dir = tempdir()?;
        let written = write_all(dir.path(), &sales, &mut rng)?;
        assert_eq!(written.len(), 13);
        assert_eq!(list_outputs(dir.path(), "json")?.len(), 13);

        let yearly = yearly_comparison();
        assert_eq!(yearly.series[1].value_labels[3], "₹680L");
        let scatter = customer_scatter(&mut rng);
        assert!(scatter.x_values.iter().all(|c| (50.0..150.0).contains(c)));
        Ok(())
    }
}
