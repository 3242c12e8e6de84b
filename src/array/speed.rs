//! Three ways to apply one discount to every price.

use anyhow::Result;
use arrow::{
    array::{ArrayRef, Float64Array, Scalar},
    compute::kernels::numeric,
};
use rayon::prelude::*;

/// One element at a time.
pub fn discount_loop(prices: &[f64], factor: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len());
    for p in prices {
        out.push(p * factor);
    }
    out
}

/// Arrow's vectorised multiply against a scalar.
pub fn discount_kernel(prices: &Float64Array, factor: f64) -> Result<ArrayRef> {
    Ok(numeric::mul(prices, &Scalar::new(Float64Array::from(vec![factor])))?)
}

/// Split across the rayon pool.
pub fn discount_parallel(prices: &[f64], factor: f64) -> Vec<f64> {
    prices.par_iter().map(|p| p * factor).collect()
}
