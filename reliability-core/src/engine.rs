use itertools::Itertools;

use crate::state::StateVector;
use crate::transition::ReconfigurationTable;

/// Which search the reconfiguration engine runs. Modelled as a tagged variant
/// passed by value rather than a trait object: the hot loop in
/// [`crate::reliability::reliability`] dispatches once per run, not once per state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Enumerate every combination of plan-or-skip per failed processor and keep the
    /// one maximising recovered-processor count. O(∏ Kᵢ).
    Exhaustive,
    /// Scan failed processors in order, accepting the first feasible plan with no
    /// backtracking. O(|F| · max_plans_per_processor · P). May be suboptimal.
    Greedy,
}

/// Rewrites `sv_in` into a post-reconfiguration state: the "others" slice is
/// untouched, and each failed processor is recovered if the chosen strategy found a
/// feasible plan for it.
pub fn reconfigure(table: &ReconfigurationTable, strategy: Strategy, sv_in: &StateVector) -> StateVector {
    let failed: Vec<usize> = (0..table.processor_count())
        .filter(|&i| sv_in.is_failed_processor(i))
        .collect();

    if failed.is_empty() {
        return sv_in.clone();
    }

    match strategy {
        Strategy::Exhaustive => reconfigure_exhaustive(table, sv_in, &failed),
        Strategy::Greedy => reconfigure_greedy(table, sv_in, &failed),
    }
}

fn apply(sv_in: &StateVector, final_alive: &[bool]) -> StateVector {
    let mut sv_out = sv_in.clone();
    sv_out.processors_mut().copy_from_slice(final_alive);
    sv_out
}

/// Checks a candidate final-alive assignment for feasibility: every chosen plan's
/// targets must be alive in the final state, and no surviving processor's running
/// load (its own `normal_load` plus every incoming transition unit's load) may
/// exceed its `max_load`.
fn feasible(table: &ReconfigurationTable, final_alive: &[bool], failed: &[usize], choices: &[usize]) -> bool {
    let mut load = vec![0.0_f64; table.processor_count()];
    for (t, alive) in final_alive.iter().enumerate() {
        if *alive {
            load[t] = table.processor(t).normal_load;
        }
    }
    for (&proc_idx, &choice) in failed.iter().zip(choices) {
        if choice == 0 {
            continue;
        }
        let plan = &table.processor(proc_idx).plans[choice - 1];
        for unit in plan {
            if !final_alive[unit.target] {
                return false;
            }
            load[unit.target] += unit.load;
        }
    }
    for (t, alive) in final_alive.iter().enumerate() {
        if *alive && load[t] > table.processor(t).max_load + 1e-9 {
            return false;
        }
    }
    true
}

fn reconfigure_exhaustive(table: &ReconfigurationTable, sv_in: &StateVector, failed: &[usize]) -> StateVector {
    tracing::trace!(failed_count = failed.len(), "starting exhaustive reconfiguration search");

    // choice 0 means "skip"; choice k (k >= 1) means plan index k - 1.
    let combos = failed
        .iter()
        .map(|&i| 0..=table.processor(i).plans.len())
        .multi_cartesian_product();

    let mut best: Option<(usize, Vec<bool>)> = None;
    let mut combos_examined = 0usize;

    for choices in combos {
        combos_examined += 1;
        let mut final_alive: Vec<bool> = sv_in.processors().to_vec();
        for (&proc_idx, &choice) in failed.iter().zip(choices.iter()) {
            final_alive[proc_idx] = choice != 0;
        }
        let recovered = choices.iter().filter(|&&c| c != 0).count();

        if feasible(table, &final_alive, failed, &choices) {
            let is_better = best.as_ref().map_or(true, |(best_count, _)| recovered > *best_count);
            if is_better {
                best = Some((recovered, final_alive));
            }
        }
    }

    tracing::trace!(combos_examined, "exhaustive reconfiguration search finished");

    let (_, final_alive) =
        best.expect("the all-skip combination reproduces sv_in and is always feasible by construction");
    apply(sv_in, &final_alive)
}

fn reconfigure_greedy(table: &ReconfigurationTable, sv_in: &StateVector, failed: &[usize]) -> StateVector {
    let processor_count = table.processor_count();
    let mut final_alive: Vec<bool> = sv_in.processors().to_vec();
    let mut load = vec![0.0_f64; processor_count];
    for t in 0..processor_count {
        if final_alive[t] {
            load[t] = table.processor(t).normal_load;
        }
    }

    let mut recovered = 0usize;
    for &proc_idx in failed {
        let processor = table.processor(proc_idx);
        let accepted_plan = processor.plans.iter().find(|plan| {
            plan.iter().all(|unit| {
                final_alive[unit.target] && load[unit.target] + unit.load <= table.processor(unit.target).max_load + 1e-9
            })
        });

        if let Some(plan) = accepted_plan {
            final_alive[proc_idx] = true;
            load[proc_idx] = processor.normal_load;
            for unit in plan {
                load[unit.target] += unit.load;
            }
            recovered += 1;
        }
    }

    tracing::trace!(failed_count = failed.len(), recovered, "greedy reconfiguration search finished");
    apply(sv_in, &final_alive)
}
