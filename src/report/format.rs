//! Number formatting for report text.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "₹";
const RULE_WIDTH: usize = 70;

/// `v` with `decimals` places and comma-grouped thousands. NaN stays `NaN`.
pub fn thousands(v: f64, decimals: usize) -> String {
    if !v.is_finite() {
        return format!("{}", v);
    }
    let fixed = format!("{:.*}", decimals, v.abs());
    let (int_part, frac) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }
    if let Some(f) = frac {
        grouped.push('.');
        grouped.push_str(f);
    }
    // -0.00 reads as 0.00
    if v < 0.0 && grouped.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        grouped.insert(0, '-');
    }
    grouped
}

/// Money amounts in one currency symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub symbol: String,
}

impl Default for Money {
    fn default() -> Self {
        Money::new(DEFAULT_CURRENCY)
    }
}

impl Money {
    pub fn new(symbol: &str) -> Self {
        Money {
            symbol: symbol.to_string(),
        }
    }

    /// `₹1,234.50`; negatives as `-₹1,234.50`.
    pub fn fmt(&self, v: f64, decimals: usize) -> String {
        let body = thousands(v, decimals);
        match body.strip_prefix('-') {
            Some(rest) => format!("-{}{}", self.symbol, rest),
            None => format!("{}{}", self.symbol, body),
        }
    }

    /// Like `fmt` but `N/A` for a missing value.
    pub fn opt(&self, v: Option<f64>, decimals: usize) -> String {
        v.map_or_else(|| "N/A".to_string(), |v| self.fmt(v, decimals))
    }
}

/// Amount in the default currency.
pub fn currency(v: f64, decimals: usize) -> String {
    Money::default().fmt(v, decimals)
}

pub fn percent(v: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, v)
}

/// Percent with an explicit sign: `+18.41%`, `-3.20%`.
pub fn signed_percent(v: f64, decimals: usize) -> String {
    format!("{:+.*}%", decimals, v)
}

pub fn opt_percent(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| "N/A".to_string(), |v| percent(v, decimals))
}

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Title framed by two rules.
pub fn banner(title: &str) -> String {
    format!("{}\n{}\n{}", rule(), title, rule())
}

/// Section heading with a dashed underline.
pub fn section(title: &str) -> String {
    format!("\n{}\n{}", title, "-".repeat(title.chars().count().min(RULE_WIDTH)))
}
