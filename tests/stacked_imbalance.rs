use chunkbench::{BenchConfig, Dataset, Distribution, Strategy, run_strategy};
use std::time::Duration;

fn stacked_config() -> BenchConfig {
    BenchConfig {
        worker_count: 4,
        chunk_size: 8_000,
        chunk_count: 2,
        probability_heavy: 0.15,
        distribution: Distribution::Stacked,
        measure_chunks: true,
        ..BenchConfig::default()
    }
}

#[test]
fn test_preassigned_last_subset_gets_every_heavy_task() {
    let config = stacked_config();
    let dataset = Dataset::generate(&config).unwrap();
    let report = run_strategy(Strategy::Preassigned, &dataset, &config).unwrap();

    assert_eq!(report.timings.len(), config.chunk_count);
    for (timing, chunk) in report.timings.iter().zip(dataset.chunks()) {
        let chunk_heavy = chunk.iter().filter(|t| t.is_heavy).count();
        assert!(chunk_heavy > 0);
        assert_eq!(timing.heavy_items, vec![0, 0, 0, chunk_heavy]);

        let last = timing.time_spent_working[3];
        for &other in &timing.time_spent_working[..3] {
            assert!(
                last > other,
                "heavy subset took {:?}, light subset took {:?}",
                last,
                other
            );
        }
    }
}

#[test]
fn test_queued_accounts_for_every_heavy_task() {
    let config = stacked_config();
    let dataset = Dataset::generate(&config).unwrap();
    let report = run_strategy(Strategy::Queued, &dataset, &config).unwrap();

    for (timing, chunk) in report.timings.iter().zip(dataset.chunks()) {
        let chunk_heavy = chunk.iter().filter(|t| t.is_heavy).count();
        assert_eq!(timing.total_heavy(), chunk_heavy);
    }
}

fn work_spread(timing: &chunkbench::ChunkTimingInfo) -> Duration {
    let max = timing.time_spent_working.iter().max().copied().unwrap_or_default();
    let min = timing.time_spent_working.iter().min().copied().unwrap_or_default();
    max - min
}

#[test]
fn test_queued_spreads_heavy_tasks_across_workers() {
    let config = stacked_config();
    let dataset = Dataset::generate(&config).unwrap();
    let preassigned = run_strategy(Strategy::Preassigned, &dataset, &config).unwrap();
    let queued = run_strategy(Strategy::Queued, &dataset, &config).unwrap();

    for timing in &queued.timings {
        let busy = timing.heavy_items.iter().filter(|&&h| h > 0).count();
        assert!(busy > 1, "heavy tasks went to one worker: {:?}", timing.heavy_items);
    }

    // Summed over chunks so one noisy chunk cannot flip the comparison.
    let preassigned_spread: Duration = preassigned.timings.iter().map(work_spread).sum();
    let queued_spread: Duration = queued.timings.iter().map(work_spread).sum();
    assert!(
        queued_spread < preassigned_spread,
        "queued spread {:?} not below preassigned spread {:?}",
        queued_spread,
        preassigned_spread
    );
}

#[test]
fn test_work_plus_idle_equals_pool_time() {
    let config = BenchConfig {
        chunk_count: 5,
        light_iterations: 20,
        heavy_iterations: 200,
        ..stacked_config()
    };
    let dataset = Dataset::generate(&config).unwrap();

    for strategy in Strategy::ALL {
        let report = run_strategy(strategy, &dataset, &config).unwrap();
        for timing in &report.timings {
            let pool_time = config.worker_count as f64 * timing.total_chunk_time.as_secs_f64();
            let accounted = timing.total_work_seconds() + timing.total_idle_seconds();
            assert!((accounted - pool_time).abs() < 1e-9);

            // Active time is measured inside the owner's dispatch-to-barrier window.
            for &work in &timing.time_spent_working {
                assert!(work <= timing.total_chunk_time);
            }
        }
    }
}
