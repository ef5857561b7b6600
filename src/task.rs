//! Synthetic CPU-bound tasks.
//!
//! A task is a seed value plus a heavy/light flag. Processing it runs a fixed
//! number of iterations of a chaotic trigonometric recurrence, so its cost is
//! decided entirely by the flag. That cost asymmetry is the load imbalance the
//! benchmark measures.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Iteration counts for light tasks.
pub const DEFAULT_LIGHT_ITERATIONS: usize = 100;
/// Iteration counts for heavy tasks.
pub const DEFAULT_HEAVY_ITERATIONS: usize = 1_000;

/// One unit of synthetic work. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub value: f64,
    pub is_heavy: bool,
}

/// How many recurrence iterations light and heavy tasks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub light_iterations: usize,
    pub heavy_iterations: usize,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            light_iterations: DEFAULT_LIGHT_ITERATIONS,
            heavy_iterations: DEFAULT_HEAVY_ITERATIONS,
        }
    }
}

impl Workload {
    /// Iterations a task with the given flag runs.
    #[inline]
    pub fn iterations(&self, is_heavy: bool) -> usize {
        if is_heavy {
            self.heavy_iterations
        } else {
            self.light_iterations
        }
    }
}

impl Task {
    pub fn new(value: f64, is_heavy: bool) -> Self {
        Task { value, is_heavy }
    }

    /// Runs the recurrence and returns its truncated exponential.
    ///
    /// Pure and deterministic for a given floating-point environment, so it is
    /// safe to call from any number of threads on distinct tasks.
    pub fn process(&self, workload: &Workload) -> u32 {
        let mut intermediate = self.value;
        for _ in 0..workload.iterations(self.is_heavy) {
            let digits = ((intermediate.cos() * PI).sin() * 10_000_000.0).abs() as u32 % 100_000;
            intermediate = f64::from(digits) / 10_000.0;
        }
        // intermediate < 10, so the result always fits.
        intermediate.exp() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_is_deterministic() {
        let workload = Workload::default();
        let task = Task::new(1.234, false);
        assert_eq!(task.process(&workload), task.process(&workload));

        let heavy = Task::new(1.234, true);
        assert_eq!(heavy.process(&workload), heavy.process(&workload));
    }

    #[test]
    fn test_process_result_is_bounded() {
        let workload = Workload::default();
        for i in 0..200 {
            let task = Task::new(i as f64 * 0.031, i % 3 == 0);
            // exp of a value below 10 never exceeds e^10.
            assert!(task.process(&workload) <= 22_026);
        }
    }

    #[test]
    fn test_zero_iterations_is_exp_of_value() {
        let workload = Workload {
            light_iterations: 0,
            heavy_iterations: 1,
        };
        let task = Task::new(2.0, false);
        assert_eq!(task.process(&workload), 2.0f64.exp() as u32);
    }

    #[test]
    fn test_iterations_follow_flag() {
        let workload = Workload::default();
        assert_eq!(workload.iterations(false), 100);
        assert_eq!(workload.iterations(true), 1_000);
    }
}
