use thiserror::Error;

/// Validation failures raised while constructing a [`crate::scheme::Scheme`] or
/// [`crate::transition::ReconfigurationTable`]. Fail fast: none of these are
/// raised once a [`crate::reliability::reliability`] computation has begun.
#[derive(Debug, Error, PartialEq)]
pub enum ConstructionError {
    #[error("element count N ({all_count}) is smaller than processor count P ({processor_count})")]
    TooFewElements { all_count: usize, processor_count: usize },

    #[error("element {index} has p = {p}, which is outside [0, 1]")]
    ProbabilityOutOfRange { index: usize, p: f64 },

    #[error("element {index} has q = {q} but 1 - p = {expected} (difference exceeds 1e-9)")]
    InconsistentComplement { index: usize, q: f64, expected: f64 },

    #[error("processor {processor} has normal_load = {normal_load} greater than max_load = {max_load}")]
    LoadExceedsCapacity {
        processor: usize,
        normal_load: f64,
        max_load: f64,
    },

    #[error("processor {processor} plan {plan} targets index {target}, which is not a valid processor index (< {processor_count})")]
    TargetOutOfRange {
        processor: usize,
        plan: usize,
        target: usize,
        processor_count: usize,
    },

    #[error("processor {processor} plan {plan} targets itself")]
    PlanTargetsOwner { processor: usize, plan: usize },

    #[error("processor {processor} plan {plan} repeats target {target}")]
    DuplicateTarget {
        processor: usize,
        plan: usize,
        target: usize,
    },

    #[error("processor {processor} plan {plan} has a transition unit with non-positive load {load}")]
    NonPositiveLoad { processor: usize, plan: usize, load: f64 },

    #[error(
        "processor {processor} plan {plan} loads sum to {total}, which does not match its normal_load {normal_load}"
    )]
    PlanLoadMismatch {
        processor: usize,
        plan: usize,
        total: f64,
        normal_load: f64,
    },
}
