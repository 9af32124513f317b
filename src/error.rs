use std::error::Error;
use std::fmt;

/// Errors surfaced by the simulation core.
///
/// `CapacityExceeded` is a structural invariant violation: the population
/// size bounds how many events or ready entries can be pending at once, so
/// hitting a bound means a logic defect and the affected run must stop
/// rather than silently skip work. `EmptyQueue` is the typed result of
/// popping a drained structure when the caller still expected work to
/// remain. `InvalidConfiguration` is rejected before any run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    CapacityExceeded {
        queue: &'static str,
        capacity: usize,
    },
    EmptyQueue {
        queue: &'static str,
    },
    InvalidConfiguration(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::CapacityExceeded { queue, capacity } => {
                write!(f, "{queue} is full (capacity {capacity}); cannot insert")
            }
            SimError::EmptyQueue { queue } => {
                write!(f, "{queue} is empty but more work was expected")
            }
            SimError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl Error for SimError {}
