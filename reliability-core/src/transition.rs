use smallvec::SmallVec;

use crate::error::ConstructionError;

/// "Send `load` units of work to processor `target`."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionUnit {
    pub target: usize,
    pub load: f64,
}

impl TransitionUnit {
    pub fn new(target: usize, load: f64) -> Self {
        TransitionUnit { target, load }
    }
}

/// One self-consistent way to offload a single failed processor's entire normal
/// load: an ordered list of [`TransitionUnit`]s whose loads sum to that processor's
/// `normal_load`. Most plans touch only a handful of peers, so this stays on the
/// stack for the common case instead of heap-allocating a `Vec` per plan.
pub type Plan = SmallVec<[TransitionUnit; 3]>;

/// Per-processor load parameters and recovery plans, ordered the same way as the
/// processor prefix of a [`crate::state::StateVector`].
#[derive(Debug, Clone)]
pub struct Processor {
    pub normal_load: f64,
    pub max_load: f64,
    pub plans: Vec<Plan>,
}

impl Processor {
    pub fn new(normal_load: f64, max_load: f64, plans: Vec<Plan>) -> Self {
        Processor {
            normal_load,
            max_load,
            plans,
        }
    }
}

/// The immutable, per-processor plan catalogue consumed by [`crate::engine`].
#[derive(Debug, Clone)]
pub struct ReconfigurationTable {
    processors: Vec<Processor>,
}

impl ReconfigurationTable {
    /// Validates and wraps `processors`: every plan target is a valid,
    /// distinct-from-owner processor index, loads are strictly positive, targets
    /// within one plan are pairwise distinct, plan loads sum to the owner's
    /// `normal_load`, and `normal_load <= max_load`.
    pub fn new(processors: Vec<Processor>) -> Result<Self, ConstructionError> {
        let processor_count = processors.len();
        for (p_idx, processor) in processors.iter().enumerate() {
            if processor.normal_load > processor.max_load {
                return Err(ConstructionError::LoadExceedsCapacity {
                    processor: p_idx,
                    normal_load: processor.normal_load,
                    max_load: processor.max_load,
                });
            }
            for (plan_idx, plan) in processor.plans.iter().enumerate() {
                let mut seen_targets = Vec::with_capacity(plan.len());
                let mut total = 0.0;
                for unit in plan {
                    if unit.target >= processor_count {
                        return Err(ConstructionError::TargetOutOfRange {
                            processor: p_idx,
                            plan: plan_idx,
                            target: unit.target,
                            processor_count,
                        });
                    }
                    if unit.target == p_idx {
                        return Err(ConstructionError::PlanTargetsOwner {
                            processor: p_idx,
                            plan: plan_idx,
                        });
                    }
                    if seen_targets.contains(&unit.target) {
                        return Err(ConstructionError::DuplicateTarget {
                            processor: p_idx,
                            plan: plan_idx,
                            target: unit.target,
                        });
                    }
                    if unit.load <= 0.0 {
                        return Err(ConstructionError::NonPositiveLoad {
                            processor: p_idx,
                            plan: plan_idx,
                            load: unit.load,
                        });
                    }
                    seen_targets.push(unit.target);
                    total += unit.load;
                }
                if (total - processor.normal_load).abs() > 1e-9 {
                    return Err(ConstructionError::PlanLoadMismatch {
                        processor: p_idx,
                        plan: plan_idx,
                        total,
                        normal_load: processor.normal_load,
                    });
                }
            }
        }
        Ok(ReconfigurationTable { processors })
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    pub fn processor(&self, index: usize) -> &Processor {
        &self.processors[index]
    }

    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn canonical_4p() -> Vec<Processor> {
        vec![
            Processor::new(
                40.0,
                100.0,
                vec![
                    smallvec![TransitionUnit::new(1, 40.0)],
                    smallvec![
                        TransitionUnit::new(1, 20.0),
                        TransitionUnit::new(2, 10.0),
                        TransitionUnit::new(3, 10.0),
                    ],
                ],
            ),
            Processor::new(
                20.0,
                100.0,
                vec![
                    smallvec![TransitionUnit::new(0, 20.0)],
                    smallvec![TransitionUnit::new(0, 10.0), TransitionUnit::new(2, 10.0)],
                    smallvec![TransitionUnit::new(0, 10.0), TransitionUnit::new(3, 10.0)],
                ],
            ),
            Processor::new(
                30.0,
                50.0,
                vec![
                    smallvec![TransitionUnit::new(0, 20.0), TransitionUnit::new(1, 10.0)],
                    smallvec![TransitionUnit::new(0, 10.0), TransitionUnit::new(1, 20.0)],
                ],
            ),
            Processor::new(
                30.0,
                50.0,
                vec![
                    smallvec![TransitionUnit::new(0, 20.0), TransitionUnit::new(1, 10.0)],
                    smallvec![TransitionUnit::new(0, 10.0), TransitionUnit::new(1, 20.0)],
                ],
            ),
        ]
    }

    #[test]
    fn accepts_canonical_table() {
        assert!(ReconfigurationTable::new(canonical_4p()).is_ok());
    }

    #[test]
    fn rejects_target_out_of_range() {
        let mut processors = canonical_4p();
        processors[0].plans[0][0].target = 9;
        assert!(matches!(
            ReconfigurationTable::new(processors),
            Err(ConstructionError::TargetOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_self_target() {
        let mut processors = canonical_4p();
        processors[0].plans[0][0].target = 0;
        assert!(matches!(
            ReconfigurationTable::new(processors),
            Err(ConstructionError::PlanTargetsOwner { .. })
        ));
    }

    #[test]
    fn rejects_load_mismatch() {
        let mut processors = canonical_4p();
        processors[0].plans[0][0].load = 1.0;
        assert!(matches!(
            ReconfigurationTable::new(processors),
            Err(ConstructionError::PlanLoadMismatch { .. })
        ));
    }

    #[test]
    fn rejects_normal_load_exceeding_max_load() {
        let mut processors = canonical_4p();
        processors[0].max_load = 10.0;
        assert!(matches!(
            ReconfigurationTable::new(processors),
            Err(ConstructionError::LoadExceedsCapacity { .. })
        ));
    }
}
