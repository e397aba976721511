//! Optional progressive domain reduction collaborator.

use crate::domain::Domain;
use crate::errors::Result;
use crate::observations::ObservationStore;

/// A pluggable policy shrinking or shifting the search domain between
/// iterations.
///
/// When attached to an engine, `transform` is invoked once per completed
/// `maximize` iteration; the returned domain applies to all subsequent
/// clipping and random sampling without retroactively altering stored
/// observations.
pub trait DomainTransform: Send {
    /// Computes the next domain from the current observation history.
    fn transform(&mut self, store: &ObservationStore) -> Result<Domain>;
}
