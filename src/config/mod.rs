//! Run configuration, read from YAML.
//!
//! Looked up at `$SALESFRAME_CONFIG`, else `salesframe.yaml` in the working
//! directory. A missing file means defaults; every field may be omitted.

use crate::report::{format::DEFAULT_CURRENCY, Money};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "SALESFRAME_CONFIG";
pub const CONFIG_FILE: &str = "salesframe.yaml";

/// Row counts for each generated dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rows {
    pub sales: usize,
    pub business: usize,
    pub raw_orders: usize,
    pub customers: usize,
    pub transactions: usize,
    /// Elements in the speed comparison.
    pub speed_test: usize,
}

impl Default for Rows {
    fn default() -> Self {
        Rows {
            sales: 100,
            business: 500,
            raw_orders: 50,
            customers: 200,
            transactions: 1000,
            speed_test: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub seed: u64,
    pub rows: Rows,
    pub currency: String,
    /// Quarterly matrix target, in thousands.
    pub quarterly_target: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: PathBuf::from("output"),
            seed: 42,
            rows: Rows::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            quarterly_target: 400.0,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing configuration YAML")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// `$SALESFRAME_CONFIG` (which must exist) or `salesframe.yaml` (which
    /// may not).
    pub fn load() -> Result<Self> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            return Self::from_path(local);
        }
        debug!("no {} found, using defaults", CONFIG_FILE);
        Ok(Self::default())
    }

    pub fn money(&self) -> Money {
        Money::new(&self.currency)
    }

    /// `name` under the output directory.
    pub fn output(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let config = Config::from_yaml("seed: 7\nrows:\n  sales: 30\ncurrency: \"$\"\n")?;
        assert_eq!(config.seed, 7);
        assert_eq!(config.rows.sales, 30);
        assert_eq!(config.rows.transactions, 1000);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.money().fmt(-1200.0, 0), "-$1,200");
        Ok(())
    }

    #[test]
    fn file_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.output_dir = dir.path().join("reports");
        fs::write(&path, serde_yaml::to_string(&config)?)?;
        assert_eq!(Config::from_path(&path)?, config);
        assert!(Config::from_path(&dir.path().join("missing.yaml")).is_err());
        assert!(Config::from_yaml("rows: [1, 2]").is_err());
        Ok(())
    }
}
