use crate::engine::reconfigure;
use crate::scheme::{Scheme, SchemeFunction};
use crate::state::{enumerate_all, StateVector};

/// The per-state contribution that fed into a [`ReliabilitySummary`]: the
/// pre-reconfiguration state, the post-reconfiguration state, the probability of
/// the pre-reconfiguration state, and whether the scheme was judged operational in
/// the post-reconfiguration state.
#[derive(Debug, Clone)]
pub struct PerStateScore {
    pub sv1: StateVector,
    pub sv2: StateVector,
    pub probability: f64,
    pub operational: bool,
}

/// The threshold past which `|sp + sq - 1|` is reported as a [`Self::numeric_warning`]
/// rather than silently accepted.
pub const NUMERIC_WARNING_EPSILON: f64 = 1e-9;

/// Scheme-wide reliability figures produced by [`reliability`]: total success/failure
/// probability and the probability that each element contributes to a failure after
/// reconfiguration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReliabilitySummary {
    pub sp: f64,
    pub sq: f64,
    pub fail_prob_per_element: Vec<f64>,
    /// Non-fatal: set when `|sp + sq - 1|` exceeds [`NUMERIC_WARNING_EPSILON`].
    pub numeric_warning: Option<String>,
}

impl ReliabilitySummary {
    fn empty(all_count: usize) -> Self {
        ReliabilitySummary {
            sp: 0.0,
            sq: 0.0,
            fail_prob_per_element: vec![0.0; all_count],
            numeric_warning: None,
        }
    }

    fn accumulate(&mut self, score: &PerStateScore) {
        if score.operational {
            self.sp += score.probability;
        } else {
            self.sq += score.probability;
            for (j, &alive) in score.sv2.all().iter().enumerate() {
                if !alive {
                    self.fail_prob_per_element[j] += score.probability;
                }
            }
        }
    }

    fn fold(mut self, other: ReliabilitySummary) -> ReliabilitySummary {
        self.sp += other.sp;
        self.sq += other.sq;
        for (a, b) in self.fail_prob_per_element.iter_mut().zip(other.fail_prob_per_element) {
            *a += b;
        }
        self
    }

    fn finish(mut self) -> Self {
        if (self.sp + self.sq - 1.0).abs() > NUMERIC_WARNING_EPSILON {
            self.numeric_warning = Some(format!(
                "sp + sq = {} deviates from 1.0 by more than {NUMERIC_WARNING_EPSILON}",
                self.sp + self.sq
            ));
        }
        self
    }
}

fn score_state<F: SchemeFunction>(scheme: &Scheme<F>, sv1: StateVector) -> PerStateScore {
    let probability = scheme.state_probability(&sv1);
    let sv2 = reconfigure(scheme.table(), scheme.strategy(), &sv1);
    let operational = scheme.is_operational(&sv2);
    PerStateScore {
        sv1,
        sv2,
        probability,
        operational,
    }
}

/// Sweeps the full 2^N state space, weighting each state by its
/// pre-reconfiguration probability and evaluating the scheme function on its
/// post-reconfiguration state, and returns the accumulated reliability summary.
pub fn reliability<F: SchemeFunction>(scheme: &Scheme<F>) -> ReliabilitySummary {
    let span = tracing::debug_span!("reliability", all_count = scheme.all_count(), processor_count = scheme.processor_count());
    let _enter = span.enter();

    let mut summary = ReliabilitySummary::empty(scheme.all_count());
    let states = enumerate_all(scheme.all_count(), scheme.processor_count())
        .expect("Scheme::new already validated processor_count <= all_count");

    for sv1 in states {
        let score = score_state(scheme, sv1);
        summary.accumulate(&score);
    }

    tracing::debug!(sp = summary.sp, sq = summary.sq, "reliability sweep complete");
    summary.finish()
}

/// Like [`reliability`], but also returns every [`PerStateScore`] visited, for
/// inspection or testing. Keep the list only when you need to look at individual
/// states; it roughly doubles memory use over [`reliability`].
pub fn reliability_with_scores<F: SchemeFunction>(scheme: &Scheme<F>) -> (ReliabilitySummary, Vec<PerStateScore>) {
    let mut summary = ReliabilitySummary::empty(scheme.all_count());
    let states = enumerate_all(scheme.all_count(), scheme.processor_count())
        .expect("Scheme::new already validated processor_count <= all_count");

    let mut scores = Vec::with_capacity(states.len());
    for sv1 in states {
        let score = score_state(scheme, sv1);
        summary.accumulate(&score);
        scores.push(score);
    }

    (summary.finish(), scores)
}

#[cfg(feature = "parallel")]
pub fn reliability_parallel<F>(scheme: &Scheme<F>) -> ReliabilitySummary
where
    F: SchemeFunction + Sync,
{
    use rayon::prelude::*;

    let total = enumerate_all(scheme.all_count(), scheme.processor_count())
        .expect("Scheme::new already validated processor_count <= all_count")
        .total_states();
    let workers = rayon::current_num_threads().max(1) as u64;
    let chunk_size = total.div_ceil(workers).max(1);

    let chunk_starts: Vec<u64> = (0..total).step_by(chunk_size as usize).collect();

    let summary = chunk_starts
        .into_par_iter()
        .map(|start| {
            let end = (start + chunk_size).min(total);
            let mut local = ReliabilitySummary::empty(scheme.all_count());
            for index in start..end {
                let sv1 = crate::state::state_vector_at(scheme.all_count(), scheme.processor_count(), index)
                    .expect("index within [0, total) by construction");
                let score = score_state(scheme, sv1);
                local.accumulate(&score);
            }
            local
        })
        .reduce(|| ReliabilitySummary::empty(scheme.all_count()), ReliabilitySummary::fold);

    summary.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use crate::engine::Strategy;
    use crate::element::Element;
    use crate::transition::{Processor, TransitionUnit};

    fn canonical_scheme() -> Scheme<impl Fn(&StateVector) -> bool> {
        let elements = vec![
            Element::new("p1", 0.9),
            Element::new("p2", 0.9),
            Element::new("p3", 0.9),
            Element::new("p4", 0.9),
            Element::new("c1", 0.8),
            Element::new("d1", 0.8),
            Element::new("d2", 0.8),
            Element::new("c2", 0.8),
        ];
        let processors = vec![
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
        ];
        let scheme_function = |sv: &StateVector| {
            let s = sv.all();
            s[0] && s[1] && (s[2] || s[3]) && s[4] && (s[5] || s[6]) && s[7]
        };
        Scheme::new(elements, processors, Strategy::Exhaustive, scheme_function).unwrap()
    }

    #[test]
    fn canonical_4p_8e_scheme_matches_expected_scalars() {
        let scheme = canonical_scheme();
        let summary = reliability(&scheme);

        assert!((summary.sp - 0.6144).abs() < 1e-3, "sp = {}", summary.sp);
        assert!((summary.sq - 0.3856).abs() < 1e-3, "sq = {}", summary.sq);
        assert!((summary.sp + summary.sq - 1.0).abs() <= 1e-5);
        assert!(summary.numeric_warning.is_none());

        let expected = [0.0, 0.0, 0.0, 0.0, 0.2, 0.0976, 0.0976, 0.2];
        for (i, exp) in expected.iter().enumerate() {
            assert!(
                (summary.fail_prob_per_element[i] - exp).abs() < 1e-4,
                "element {i}: got {}, expected {exp}",
                summary.fail_prob_per_element[i]
            );
        }
    }

    #[test]
    fn sp_plus_sq_is_one_within_epsilon() {
        let summary = reliability(&canonical_scheme());
        assert!((summary.sp + summary.sq - 1.0).abs() <= NUMERIC_WARNING_EPSILON);
    }

    #[test]
    fn element_that_never_fails_has_zero_fail_probability() {
        let elements = vec![Element::new("always_up", 1.0), Element::new("other", 0.5)];
        let scheme = Scheme::new(elements, vec![], Strategy::Exhaustive, |_: &StateVector| true).unwrap();
        let summary = reliability(&scheme);
        assert_eq!(summary.fail_prob_per_element[0], 0.0);
    }

    #[test]
    fn all_true_state_probability_is_product_of_p() {
        let scheme = canonical_scheme();
        let (_, scores) = reliability_with_scores(&scheme);
        // enumeration index 0 is the all-true state.
        let first = &scores[0];
        assert!(first.sv1.all().iter().all(|&a| a));
        let expected: f64 = [0.9, 0.9, 0.9, 0.9, 0.8, 0.8, 0.8, 0.8].iter().product();
        assert!((first.probability - expected).abs() < 1e-9);
    }

    #[test]
    fn determinism_across_repeated_runs() {
        let scheme = canonical_scheme();
        let a = reliability(&scheme);
        let b = reliability(&scheme);
        assert_eq!(a, b);
    }

    #[test]
    fn strategies_tie_on_the_canonical_scheme() {
        let elements = vec![
            Element::new("p1", 0.9),
            Element::new("p2", 0.9),
            Element::new("p3", 0.9),
            Element::new("p4", 0.9),
            Element::new("c1", 0.8),
            Element::new("d1", 0.8),
            Element::new("d2", 0.8),
            Element::new("c2", 0.8),
        ];
        let processors = vec![
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
        ];
        let scheme_function = |sv: &StateVector| {
            let s = sv.all();
            s[0] && s[1] && (s[2] || s[3]) && s[4] && (s[5] || s[6]) && s[7]
        };

        let exhaustive = Scheme::new(
            elements.clone(),
            processors.clone(),
            Strategy::Exhaustive,
            scheme_function,
        )
        .unwrap();
        let greedy = Scheme::new(elements, processors, Strategy::Greedy, scheme_function).unwrap();

        let a = reliability(&exhaustive);
        let b = reliability(&greedy);
        assert!((a.sp - b.sp).abs() < 1e-9, "exhaustive sp = {}, greedy sp = {}", a.sp, b.sp);
    }

    #[test]
    fn all_elements_failed_state_is_never_operational() {
        let scheme = canonical_scheme();
        let (_, scores) = reliability_with_scores(&scheme);
        // enumeration index total-1 is the all-false state: reverse order from all-true.
        let last = scores.last().unwrap();
        assert!(last.sv1.all().iter().all(|&a| !a));
        assert!(!last.operational);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_matches_sequential() {
        let scheme = canonical_scheme();
        let sequential = reliability(&scheme);
        let parallel = reliability_parallel(&scheme);
        assert!((sequential.sp - parallel.sp).abs() < 1e-9);
        assert!((sequential.sq - parallel.sq).abs() < 1e-9);
        for (a, b) in sequential
            .fail_prob_per_element
            .iter()
            .zip(parallel.fail_prob_per_element.iter())
        {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
