/// A trait for reporting progress of a batch run.
pub trait Progress: Send + Sync {
    /// Set the phase label for the current operation (e.g., "Reading", "Fetching").
    fn set_phase(&self, phase: &str);

    /// Report that `position` of `total` rows have been visited.
    fn advance(&self, position: u64, total: u64);

    /// Periodic checkpoint, called at a fixed row cadence.
    fn checkpoint(&self, processed: u64, total: u64);

    /// Print a message line without disrupting the progress indicator.
    fn println(&self, msg: &str);

    /// Finish and clear the progress indicator.
    fn done(&self);
}

/// Progress sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_phase(&self, _phase: &str) {}
    fn advance(&self, _position: u64, _total: u64) {}
    fn checkpoint(&self, _processed: u64, _total: u64) {}
    fn println(&self, _msg: &str) {}
    fn done(&self) {}
}
