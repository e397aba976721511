//! Numerical machinery maximizing the acquisition surface over the domain.
mod acq_maximizer;
mod optimizer;

pub(crate) use acq_maximizer::AcqMaximizer;
pub(crate) use optimizer::{LocalOptimizer, ACQ_MAX_EVAL_DEFAULT};
