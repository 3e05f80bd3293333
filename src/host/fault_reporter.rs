#[cfg(test)]
use mockall::automock;
use tracing::error;

use crate::Fault;

/// Receives faults raised by completion functions and interceptors.
///
/// Called after the evaluation pass that observed the fault has finished,
/// never from inside the traversal.
#[cfg_attr(test, automock)]
pub trait FaultReporter: Send + Sync + 'static {
    fn report(
        &self,
        fault: Fault,
    );
}

/// Default reporter: logs every fault at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFaultReporter;

impl FaultReporter for TracingFaultReporter {
    fn report(
        &self,
        fault: Fault,
    ) {
        error!(key = ?fault.key, "lazyload fault: {}", fault.error);
    }
}
