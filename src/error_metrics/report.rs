use crate::error_metrics::metrics::ErrorMetric;
use crate::error_metrics::table::{DirectiveMetrics, MetricRows};
use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Path of the table written for `suffix`, e.g. `out.error_by_cycle`.
pub fn output_path(prefix: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", prefix, suffix))
}

/// Writes one tab-separated file per directive and returns their paths.
pub fn write_all(prefix: &str, tables: &[DirectiveMetrics], command_line: &str) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = output_path(prefix, &table.suffix());
        write_directive_metrics(&path, table, command_line)?;
        info!("Wrote {} rows to {}", table.rows.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn write_directive_metrics(path: &Path, table: &DirectiveMetrics, command_line: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "## {}", command_line)?;
    writeln!(writer, "## Started on: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(writer, "## Directive: {}", table.directive)?;

    let written = match &table.rows {
        MetricRows::Error(rows) => write_rows(&mut writer, rows),
        MetricRows::Overlapping(rows) => write_rows(&mut writer, rows),
        MetricRows::Indel(rows) => write_rows(&mut writer, rows),
    };
    written.with_context(|| format!("Failed to write metrics: {}", path.display()))?;

    writer.flush()?;
    Ok(())
}

fn write_rows<W: Write, M: ErrorMetric + Serialize>(writer: &mut W, rows: &[M]) -> Result<()> {
    writeln!(writer, "## Metric: {}", M::metric_name())?;
    let mut tsv = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    for row in rows {
        tsv.serialize(row)?;
    }
    tsv.flush()?;
    Ok(())
}
