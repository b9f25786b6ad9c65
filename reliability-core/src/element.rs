/// A scheme component with a binary alive/failed state and a success probability.
///
/// The first `processor_count` elements of a scheme are its processors (see
/// [`crate::transition::Processor`]); any elements beyond that are plain, load-free
/// elements that only ever contribute their own p/q to the weighting in
/// [`crate::reliability::reliability`].
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub p: f64,
    pub q: f64,
}

impl Element {
    pub fn new(name: impl Into<String>, p: f64) -> Self {
        Element {
            name: name.into(),
            p,
            q: 1.0 - p,
        }
    }
}
