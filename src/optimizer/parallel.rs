//! Advisory parallelization planning.
//!
//! The optimizer never runs steps itself; this output tells the executing
//! engine which concurrency is worth attempting and what coordination tax to
//! expect.

use serde::{Deserialize, Serialize};

use crate::context::SystemResources;
use crate::optimizer::plan::ExecutionStep;

/// Advisory concurrency plan attached to a query plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParallelizationPlan {
    /// Whether running steps concurrently is expected to pay off.
    pub enabled: bool,
    /// Upper bound on concurrently running steps.
    pub max_concurrency: u32,
    /// How work is split across workers.
    pub partition_strategy: String,
    /// How per-worker results are recombined.
    pub merge_strategy: String,
    /// Expected scheduling/merge overhead in milliseconds.
    pub coordination_overhead_ms: f64,
}

/// Decides the concurrency plan for a set of steps.
pub fn plan_parallelism(steps: &[ExecutionStep], resources: &SystemResources) -> ParallelizationPlan {
    let parallelizable = steps.iter().filter(|step| step.parallelizable).count() as u32;
    let enabled = parallelizable > 1 && resources.available_cpu > 1;
    ParallelizationPlan {
        enabled,
        max_concurrency: resources.available_cpu.min(parallelizable),
        partition_strategy: "entity_based".into(),
        merge_strategy: "ranked_merge".into(),
        coordination_overhead_ms: (parallelizable * 2) as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::plan::{ExecutionStep, StepType};

    fn step(id: &str, parallelizable: bool) -> ExecutionStep {
        ExecutionStep {
            step_id: id.into(),
            step_type: StepType::VectorSearch,
            description: String::new(),
            estimated_cost: 1.0,
            estimated_time_ms: 1.0,
            estimated_rows: 1,
            dependencies: Vec::new(),
            parallelizable,
            cacheable: false,
            index_usage: Vec::new(),
        }
    }

    fn resources(cpu: u32) -> SystemResources {
        SystemResources {
            available_memory_mb: 8192,
            available_cpu: cpu,
            disk_io_capacity: 1000,
            network_bandwidth: 1000,
            concurrent_queries: 10,
        }
    }

    #[test]
    fn single_parallelizable_step_stays_sequential() {
        let steps = [step("a", true), step("b", false)];
        let plan = plan_parallelism(&steps, &resources(4));
        assert!(!plan.enabled);
        assert_eq!(plan.max_concurrency, 1);
    }

    #[test]
    fn no_parallelizable_steps_means_zero_concurrency() {
        let steps = [step("a", false)];
        let plan = plan_parallelism(&steps, &resources(4));
        assert!(!plan.enabled);
        assert_eq!(plan.max_concurrency, 0);
    }

    #[test]
    fn single_cpu_stays_sequential() {
        let steps = [step("a", true), step("b", true)];
        let plan = plan_parallelism(&steps, &resources(1));
        assert!(!plan.enabled);
    }

    #[test]
    fn concurrency_is_bounded_by_cpu_and_step_count() {
        let steps = [step("a", true), step("b", true), step("c", true)];
        let plan = plan_parallelism(&steps, &resources(2));
        assert!(plan.enabled);
        assert_eq!(plan.max_concurrency, 2);

        let plan = plan_parallelism(&steps, &resources(16));
        assert_eq!(plan.max_concurrency, 3);
    }

    #[test]
    fn overhead_scales_with_parallelizable_steps() {
        let steps = [step("a", true), step("b", true), step("c", false)];
        let plan = plan_parallelism(&steps, &resources(4));
        assert_eq!(plan.coordination_overhead_ms, 4.0);
        assert_eq!(plan.partition_strategy, "entity_based");
        assert_eq!(plan.merge_strategy, "ranked_merge");
    }
}
