//! Plan resource requirement estimation.

use serde::{Deserialize, Serialize};

use crate::optimizer::plan::ExecutionStep;

/// Estimated resources a plan will consume while executing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// Working-set memory in MiB.
    pub estimated_memory_mb: f64,
    /// Abstract CPU units.
    pub estimated_cpu: f64,
    /// Abstract disk I/O units.
    pub estimated_io: f64,
    /// Abstract network units; everything runs in-process today.
    pub estimated_network: f64,
    /// Step ids on the critical path. Currently lists every step in order;
    /// the dependency-aware longest path lives on
    /// `QueryPlan::critical_path_time_ms`.
    pub critical_path: Vec<String>,
}

/// Estimates resource requirements from per-step estimates.
pub fn estimate_resources(steps: &[ExecutionStep]) -> ResourceRequirements {
    let estimated_memory_mb = steps
        .iter()
        .map(|step| step.estimated_rows as f64 * 0.001)
        .sum();
    let estimated_cpu = steps.iter().map(|step| step.estimated_cost * 0.1).sum();
    let uncacheable = steps.iter().filter(|step| !step.cacheable).count();
    ResourceRequirements {
        estimated_memory_mb,
        estimated_cpu,
        estimated_io: (uncacheable * 10) as f64,
        estimated_network: 0.0,
        critical_path: steps.iter().map(|step| step.step_id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::plan::StepType;

    fn step(id: &str, cost: f64, rows: u64, cacheable: bool) -> ExecutionStep {
        ExecutionStep {
            step_id: id.into(),
            step_type: StepType::Filter,
            description: String::new(),
            estimated_cost: cost,
            estimated_time_ms: cost,
            estimated_rows: rows,
            dependencies: Vec::new(),
            parallelizable: false,
            cacheable,
            index_usage: Vec::new(),
        }
    }

    #[test]
    fn estimates_follow_the_per_step_formulas() {
        let steps = [
            step("a", 10.0, 1000, true),
            step("b", 20.0, 2000, false),
            step("c", 5.0, 500, false),
        ];
        let resources = estimate_resources(&steps);
        assert!((resources.estimated_memory_mb - 3.5).abs() < 1e-9);
        assert!((resources.estimated_cpu - 3.5).abs() < 1e-9);
        assert_eq!(resources.estimated_io, 20.0);
        assert_eq!(resources.estimated_network, 0.0);
        assert_eq!(resources.critical_path, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_plan_needs_nothing() {
        let resources = estimate_resources(&[]);
        assert_eq!(resources.estimated_memory_mb, 0.0);
        assert_eq!(resources.estimated_cpu, 0.0);
        assert_eq!(resources.estimated_io, 0.0);
        assert!(resources.critical_path.is_empty());
    }
}
