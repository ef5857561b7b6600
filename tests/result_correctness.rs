use chunkbench::{BenchConfig, Dataset, Distribution, Strategy, run_strategy};

fn config(distribution: Distribution) -> BenchConfig {
    BenchConfig {
        worker_count: 4,
        chunk_size: 400,
        chunk_count: 6,
        light_iterations: 10,
        heavy_iterations: 100,
        distribution,
        seed: 7,
        ..BenchConfig::default()
    }
}

#[test]
fn test_pool_total_matches_serial_sum_for_every_distribution() {
    for distribution in [Distribution::Random, Distribution::Even, Distribution::Stacked] {
        let config = config(distribution);
        let dataset = Dataset::generate(&config).unwrap();
        let expected = dataset.serial_sum(&config.workload());

        for strategy in Strategy::ALL {
            let report = run_strategy(strategy, &dataset, &config).expect("run failed");
            assert_eq!(
                report.result, expected,
                "{} over {} dataset diverged from serial sum",
                strategy, distribution
            );
        }
    }
}

#[test]
fn test_per_worker_results_sum_to_total() {
    let config = config(Distribution::Random);
    let dataset = Dataset::generate(&config).unwrap();

    for strategy in Strategy::ALL {
        let report = run_strategy(strategy, &dataset, &config).unwrap();
        let sum = report
            .per_worker_results
            .iter()
            .fold(0u32, |acc, &r| acc.wrapping_add(r));
        assert_eq!(sum, report.result);
        assert_eq!(report.per_worker_results.len(), config.worker_count);
    }
}

#[test]
fn test_single_worker_pool() {
    let config = BenchConfig {
        worker_count: 1,
        ..config(Distribution::Even)
    };
    let dataset = Dataset::generate(&config).unwrap();
    let expected = dataset.serial_sum(&config.workload());

    for strategy in Strategy::ALL {
        let report = run_strategy(strategy, &dataset, &config).unwrap();
        assert_eq!(report.per_worker_results, vec![expected]);
    }
}

#[test]
fn test_chunk_size_equal_to_worker_count() {
    let config = BenchConfig {
        worker_count: 4,
        chunk_size: 4,
        ..config(Distribution::Random)
    };
    let dataset = Dataset::generate(&config).unwrap();
    let expected = dataset.serial_sum(&config.workload());

    for strategy in Strategy::ALL {
        assert_eq!(run_strategy(strategy, &dataset, &config).unwrap().result, expected);
    }
}

#[test]
fn test_preassigned_even_runs_are_deterministic() {
    let config = config(Distribution::Even);

    let first = run_strategy(Strategy::Preassigned, &Dataset::generate(&config).unwrap(), &config).unwrap();
    let second = run_strategy(Strategy::Preassigned, &Dataset::generate(&config).unwrap(), &config).unwrap();

    assert_eq!(first.per_worker_results, second.per_worker_results);
}
