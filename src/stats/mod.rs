//! Statistics over plain `f64` slices.
//!
//! These mirror the numeric-array reductions used throughout the reports.
//! Conventions: `mean`, `median` and `percentile` of an empty slice are NaN;
//! `min`/`max`/`argmax`/`argmin` return `None`; `sum` of nothing is 0.

use serde::Serialize;

/// Plain total; the empty total is `+0.0`.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc + v)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    sum(values) / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    ss / (values.len() - ddof) as f64
}

pub fn std(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

/// Percentile `p` in `0..=100` with linear interpolation between ranks.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Quantile `q` in `0..=1`.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    percentile(values, q * 100.0)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(f64::total_cmp)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(f64::total_cmp)
}

/// Peak to peak: `max - min`.
pub fn ptp(values: &[f64]) -> Option<f64> {
    Some(max(values)? - min(values)?)
}

/// Index of the first maximum.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first minimum.
pub fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

pub fn count_where<F: Fn(f64) -> bool>(values: &[f64], pred: F) -> usize {
    values.iter().filter(|&&v| pred(v)).count()
}

/// Percentage change from `old` to `new`; `None` when `old` is zero.
pub fn growth_rate(old: f64, new: f64) -> Option<f64> {
    if old == 0.0 {
        return None;
    }
    Some((new - old) / old * 100.0)
}

/// Period-over-period change in percent (`len - 1` values).
pub fn pct_changes(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| growth_rate(w[0], w[1]).unwrap_or(f64::NAN))
        .collect()
}

pub fn cumsum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Compound `last` forward by `rate_pct` percent for each of `periods`.
pub fn forecast(last: f64, rate_pct: f64, periods: usize) -> Vec<f64> {
    let factor = 1.0 + rate_pct / 100.0;
    (1..=periods)
        .map(|k| last * factor.powi(k as i32))
        .collect()
}

/// Split values into `(outliers, inliers)` by `|z| > k` (population std).
pub fn zscore_outliers(values: &[f64], k: f64) -> (Vec<f64>, Vec<f64>) {
    let m = mean(values);
    let s = std(values, 0);
    if !s.is_finite() || s == 0.0 {
        return (Vec::new(), values.to_vec());
    }
    values.iter().copied().partition(|&v| ((v - m) / s).abs() > k)
}

/// `successes / total * 100`; `None` for an empty denominator.
pub fn conversion_rate(successes: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(successes as f64 / total as f64 * 100.0)
}

/// Most frequent value; ties go to the smallest.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let run = j - i;
        if best.map_or(true, |(_, n)| run > n) {
            best = Some((sorted[i], run));
        }
        i = j.max(i + 1);
    }
    best.map(|(v, _)| v)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Summary over the positive, finite values only (missing and non-positive
/// entries are cleaned out first). `None` if nothing survives.
pub fn summary_stats(values: &[Option<f64>]) -> Option<SummaryStats> {
    let clean: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    Some(SummaryStats {
        count: clean.len(),
        total: sum(&clean),
        mean: mean(&clean),
        median: median(&clean),
        std: std(&clean, 0),
        min: min(&clean)?,
        max: max(&clean)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHLY: [f64; 12] = [
        420.0, 450.0, 480.0, 520.0, 490.0, 560.0, 590.0, 610.0, 580.0, 640.0, 680.0, 720.0,
    ];

    #[test]
    fn empty_inputs() {
        assert!(mean(&[]).is_nan());
        assert!(median(&[]).is_nan());
        assert_eq!(sum(&[]), 0.0);
        assert!(sum(&[]).is_sign_positive());
        assert_eq!(max(&[]), None);
        assert_eq!(argmax(&[]), None);
        assert!(std(&[5.0], 1).is_nan());
    }

    #[test]
    fn percentiles_interpolate() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 50.0), 2.5);
        assert_eq!(percentile(&v, 25.0), 1.75);
        assert_eq!(quantile(&v, 1.0), 4.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn std_respects_ddof() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(std(&v, 0), 2.0);
        assert!((std(&v, 1) - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn arg_extremes_take_first_occurrence() {
        assert_eq!(argmax(&[1.0, 5.0, 5.0]), Some(1));
        assert_eq!(argmin(&[3.0, 1.0, 1.0]), Some(1));
        assert_eq!(argmax(&MONTHLY), Some(11));
        assert_eq!(ptp(&MONTHLY), Some(300.0));
    }

    #[test]
    fn growth_and_forecast() {
        assert_eq!(growth_rate(100.0, 120.0), Some(20.0));
        assert_eq!(growth_rate(0.0, 120.0), None);
        let changes = pct_changes(&[100.0, 110.0, 99.0]);
        assert!((changes[0] - 10.0).abs() < 1e-9);
        assert!((changes[1] + 10.0).abs() < 1e-9);
        let f = forecast(100.0, 10.0, 2);
        assert!((f[1] - 121.0).abs() < 1e-9);
        assert_eq!(cumsum(&[1.0, 2.0, 3.0]), vec![1.0, 3.0, 6.0]);
    }

    #[test]
    fn outliers_split_by_zscore() {
        let mut v = vec![10.0; 20];
        v.push(1000.0);
        let (out, keep) = zscore_outliers(&v, 3.0);
        assert_eq!(out, vec![1000.0]);
        assert_eq!(keep.len(), 20);
    }

    #[test]
    fn mode_prefers_smallest_on_ties() {
        assert_eq!(mode(&[3.0, 1.0, 3.0, 1.0, 2.0]), Some(1.0));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn summary_drops_invalid_entries() {
        let s = summary_stats(&[Some(100.0), None, Some(-5.0), Some(300.0), Some(0.0)])
            .unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.total, 400.0);
        assert_eq!(s.mean, 200.0);
        assert_eq!(summary_stats(&[None]), None);
        assert_eq!(conversion_rate(1, 4), Some(25.0));
    }
}
