//! Inbound commands for the experiment controller.

/// Commands issued by the operator surface (buttons) or a test harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Begin the reference-bath measurement phase.
    StartCoolPhase,
    /// Begin the hot-vessel measurement phase.
    StartHotPhase,
    /// Stop the active phase immediately, without waiting for the
    /// completion condition.
    StopExperiment,
}
