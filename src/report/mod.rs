//! Equity curve reporting
//!
//! Append-only CSV, one row per closed trade. Header is written once when
//! the file is created.

use anyhow::Context;
use rust_decimal::Decimal;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const HEADER: [&str; 4] = ["ts_ms", "realized_pnl", "cum_fees", "position_qty"];

/// Append-only equity curve writer
#[derive(Debug, Clone)]
pub struct EquityWriter {
    path: PathBuf,
}

impl EquityWriter {
    /// Create a writer for the given report path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Report file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one equity record, creating the file and header on first use
    pub fn append(
        &self,
        ts_ms: i64,
        realized_pnl: Decimal,
        cum_fees: Decimal,
        position_qty: Decimal,
    ) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating report directory {}", dir.display()))?;
        }
        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening equity report {}", self.path.display()))?;

        let mut writer = csv::Writer::from_writer(file);
        if write_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record(&[
            ts_ms.to_string(),
            realized_pnl.to_string(),
            cum_fees.to_string(),
            position_qty.to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
