//! Reliability of a redundant computing scheme whose failed processors can be
//! reconfigured by offloading their work onto surviving peers.
//!
//! The crate sweeps the full space of element-alive/failed state vectors, asks a
//! [`engine::Strategy`] to reconfigure each state's failed processors, evaluates the
//! caller's [`scheme::SchemeFunction`] on the result, and accumulates total
//! success/failure probability plus a per-element failure-contribution breakdown.
//! See [`reliability::reliability`] for the entry point.

pub mod element;
pub mod engine;
pub mod error;
pub mod reliability;
pub mod scheme;
pub mod state;
pub mod transition;

pub use element::Element;
pub use engine::{reconfigure, Strategy};
pub use error::ConstructionError;
pub use reliability::{reliability, reliability_with_scores, PerStateScore, ReliabilitySummary};
#[cfg(feature = "parallel")]
pub use reliability::reliability_parallel;
pub use scheme::{Scheme, SchemeFunction};
pub use state::{enumerate_all, state_vector_at, StateVector, StateVectorGenerator};
pub use transition::{Processor, ReconfigurationTable, TransitionUnit};
