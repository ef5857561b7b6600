//! Run output: the per-chunk CSV and the JSON run summary.

use crate::config::BenchConfig;
use crate::dataset::Distribution;
use crate::runner::{RunReport, Strategy};
use crate::timing::ChunkTimingInfo;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the timing CSV to `path`, truncating any previous file.
pub fn write_csv(path: impl AsRef<Path>, timings: &[ChunkTimingInfo]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_csv_to(&mut writer, timings)?;
    writer.flush()
}

/// Writes one header row, then one row per chunk.
///
/// Columns are `work_i,idle_i,heavy_i` for each worker followed by
/// `chunktime,total_idle,total_heavy`. Times are in seconds.
pub fn write_csv_to<W: Write>(writer: &mut W, timings: &[ChunkTimingInfo]) -> std::io::Result<()> {
    let worker_count = timings.first().map_or(0, ChunkTimingInfo::worker_count);

    for i in 0..worker_count {
        write!(writer, "work_{i},idle_{i},heavy_{i},")?;
    }
    writeln!(writer, "chunktime,total_idle,total_heavy")?;

    for chunk in timings {
        for i in 0..chunk.worker_count() {
            write!(
                writer,
                "{},{},{},",
                chunk.time_spent_working[i].as_secs_f64(),
                chunk.idle_seconds(i),
                chunk.heavy_items[i]
            )?;
        }
        writeln!(
            writer,
            "{},{},{}",
            chunk.total_chunk_time.as_secs_f64(),
            chunk.total_idle_seconds(),
            chunk.total_heavy()
        )?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub cpu_cores: usize,
    pub physical_cores: usize,
}

impl SystemInfo {
    pub fn collect() -> Self {
        SystemInfo {
            cpu_cores: num_cpus::get(),
            physical_cores: num_cpus::get_physical(),
        }
    }
}

/// Serializable summary of one strategy's run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub strategy: Strategy,
    pub distribution: Distribution,
    pub worker_count: usize,
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub elapsed_seconds: f64,
    pub result: u32,
    pub per_worker_results: Vec<u32>,
    /// Present only when chunk measurement was enabled.
    pub total_idle_seconds: Option<f64>,
    pub total_heavy: Option<usize>,
    pub system_info: SystemInfo,
}

impl RunSummary {
    pub fn new(report: &RunReport, config: &BenchConfig) -> Self {
        let measured = !report.timings.is_empty();
        RunSummary {
            strategy: report.strategy,
            distribution: config.distribution,
            worker_count: config.worker_count,
            chunk_size: config.chunk_size,
            chunk_count: report.chunk_count,
            elapsed_seconds: report.elapsed.as_secs_f64(),
            result: report.result,
            per_worker_results: report.per_worker_results.clone(),
            total_idle_seconds: measured.then(|| {
                report
                    .timings
                    .iter()
                    .map(ChunkTimingInfo::total_idle_seconds)
                    .sum()
            }),
            total_heavy: measured.then(|| report.timings.iter().map(ChunkTimingInfo::total_heavy).sum()),
            system_info: SystemInfo::collect(),
        }
    }
}
