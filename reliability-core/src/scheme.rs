use crate::element::Element;
use crate::engine::Strategy;
use crate::error::ConstructionError;
use crate::state::StateVector;
use crate::transition::{Processor, ReconfigurationTable};

/// A logical, total, pure map from a post-reconfiguration [`StateVector`] to whether
/// the scheme is operational in that configuration. Implementations are expected to
/// be cheap: the aggregator may call this millions of times.
pub trait SchemeFunction {
    fn is_operational(&self, sv: &StateVector) -> bool;
}

impl<F> SchemeFunction for F
where
    F: Fn(&StateVector) -> bool,
{
    fn is_operational(&self, sv: &StateVector) -> bool {
        self(sv)
    }
}

/// A fully validated, read-only description of a redundant scheme: its elements,
/// the reconfiguration table for its processors, the search strategy to use, and the
/// boolean function deciding operational-ness.
///
/// `F` is monomorphised at the call site rather than boxed as `dyn SchemeFunction` so
/// that the hot per-state loop in [`crate::reliability::reliability`] dispatches
/// statically instead of through a vtable.
pub struct Scheme<F: SchemeFunction> {
    pub(crate) all_count: usize,
    pub(crate) processor_count: usize,
    pub(crate) p: Vec<f64>,
    pub(crate) q: Vec<f64>,
    pub(crate) table: ReconfigurationTable,
    pub(crate) strategy: Strategy,
    pub(crate) scheme_function: F,
}

impl<F: SchemeFunction> Scheme<F> {
    /// Validates `elements`/`processors` and builds a read-only `Scheme`. The first
    /// `processors.len()` entries of `elements` must line up, index for index, with
    /// `processors`.
    pub fn new(
        elements: Vec<Element>,
        processors: Vec<Processor>,
        strategy: Strategy,
        scheme_function: F,
    ) -> Result<Self, ConstructionError> {
        let all_count = elements.len();
        let processor_count = processors.len();
        if processor_count > all_count {
            return Err(ConstructionError::TooFewElements {
                all_count,
                processor_count,
            });
        }

        let mut p = Vec::with_capacity(all_count);
        let mut q = Vec::with_capacity(all_count);
        for (index, element) in elements.iter().enumerate() {
            if !(0.0..=1.0).contains(&element.p) {
                return Err(ConstructionError::ProbabilityOutOfRange {
                    index,
                    p: element.p,
                });
            }
            let expected_q = 1.0 - element.p;
            if (element.q - expected_q).abs() > 1e-9 {
                return Err(ConstructionError::InconsistentComplement {
                    index,
                    q: element.q,
                    expected: expected_q,
                });
            }
            p.push(element.p);
            q.push(element.q);
        }

        let table = ReconfigurationTable::new(processors)?;

        Ok(Scheme {
            all_count,
            processor_count,
            p,
            q,
            table,
            strategy,
            scheme_function,
        })
    }

    pub fn all_count(&self) -> usize {
        self.all_count
    }

    pub fn processor_count(&self) -> usize {
        self.processor_count
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn table(&self) -> &ReconfigurationTable {
        &self.table
    }

    /// The pre-reconfiguration weight of a state: ∏ᵢ (alive ? pᵢ : qᵢ).
    pub(crate) fn state_probability(&self, sv: &StateVector) -> f64 {
        sv.all()
            .iter()
            .enumerate()
            .map(|(i, &alive)| if alive { self.p[i] } else { self.q[i] })
            .product()
    }

    pub(crate) fn is_operational(&self, sv: &StateVector) -> bool {
        self.scheme_function.is_operational(sv)
    }
}
