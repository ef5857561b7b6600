use chunkbench::report::{RunSummary, write_csv};
use chunkbench::{
    BenchConfig, BenchError, Dataset, Distribution, PinningStrategy, Strategy, run_strategy,
};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Preassigned,
    Queued,
    Both,
}

impl StrategyArg {
    fn strategies(self) -> Vec<Strategy> {
        match self {
            StrategyArg::Preassigned => vec![Strategy::Preassigned],
            StrategyArg::Queued => vec![Strategy::Queued],
            StrategyArg::Both => Strategy::ALL.to_vec(),
        }
    }
}

/// Compare preassigned and queued work distribution over a persistent worker pool.
#[derive(Debug, Parser)]
#[command(name = "chunkbench", version)]
struct Cli {
    /// Distribution strategy to run.
    #[arg(long, value_enum, default_value_t = StrategyArg::Both)]
    strategy: StrategyArg,

    /// JSON config file; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    chunk_size: Option<usize>,

    #[arg(long)]
    chunk_count: Option<usize>,

    #[arg(long)]
    light_iterations: Option<usize>,

    #[arg(long)]
    heavy_iterations: Option<usize>,

    #[arg(long)]
    probability_heavy: Option<f64>,

    #[arg(long, value_enum)]
    distribution: Option<Distribution>,

    #[arg(long)]
    seed: Option<u64>,

    /// Collect per-chunk timings and write the CSV report.
    #[arg(long)]
    measure: bool,

    #[arg(long, value_enum)]
    pin: Option<PinningStrategy>,

    /// CSV output path (used with --measure).
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print a JSON summary line per strategy on stdout.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> Result<(BenchConfig, StrategyArg, bool), BenchError> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::from_json_file(path)?,
            None => BenchConfig::default(),
        };

        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(chunk_count) = self.chunk_count {
            config.chunk_count = chunk_count;
        }
        if let Some(light) = self.light_iterations {
            config.light_iterations = light;
        }
        if let Some(heavy) = self.heavy_iterations {
            config.heavy_iterations = heavy;
        }
        if let Some(probability) = self.probability_heavy {
            config.probability_heavy = probability;
        }
        if let Some(distribution) = self.distribution {
            config.distribution = distribution;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(pin) = self.pin {
            config.pinning = pin;
        }
        if let Some(csv) = self.csv {
            config.csv_path = csv;
        }
        config.measure_chunks |= self.measure;

        config.validate()?;
        Ok((config, self.strategy, self.json))
    }
}

/// `timings.csv` becomes `timings_queued.csv` when several strategies share one run.
fn csv_path_for(base: &Path, strategy: Strategy, suffixed: bool) -> PathBuf {
    if !suffixed {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "timings".to_string());
    let file_name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, strategy, ext.to_string_lossy()),
        None => format!("{}_{}", stem, strategy),
    };
    base.with_file_name(file_name)
}

fn run(cli: Cli) -> Result<(), BenchError> {
    let (config, strategy_arg, json) = cli.into_config()?;
    let strategies = strategy_arg.strategies();

    info!(
        workers = config.worker_count,
        chunk_size = config.chunk_size,
        chunk_count = config.chunk_count,
        distribution = %config.distribution,
        probability_heavy = config.probability_heavy,
        "generating dataset"
    );
    let generate_start = Instant::now();
    let dataset = Dataset::generate(&config)?;
    info!(
        seconds = generate_start.elapsed().as_secs_f64(),
        heavy = dataset.heavy_count(),
        "dataset ready"
    );

    for &strategy in &strategies {
        let report = run_strategy(strategy, &dataset, &config)?;

        println!("[{}]", strategy);
        println!("Processing took {} seconds", report.elapsed.as_secs_f64());
        println!("Result is {}", report.result);

        if config.measure_chunks {
            let path = csv_path_for(&config.csv_path, strategy, strategies.len() > 1);
            write_csv(&path, &report.timings)?;
            info!(path = %path.display(), chunks = report.timings.len(), "wrote timings");
        }

        if json {
            println!("{}", serde_json::to_string(&RunSummary::new(&report, &config))?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
