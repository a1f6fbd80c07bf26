//! Conditional-code level and unreachable-code tracking.
//!
//! Leaving a conditional block always makes code reachable again. Jumps back
//! into an unreachable region through `goto` are not modelled.

use super::errors::AnalysisFault;

#[derive(Clone, Debug, Default)]
pub struct Reachability {
    cond_level: usize,
    unreachable: bool,
    reported: bool,
}

impl Reachability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_conditional(&mut self) {
        self.cond_level += 1;
    }

    pub fn leave_conditional(&mut self) -> Result<(), AnalysisFault> {
        self.cond_level = self
            .cond_level
            .checked_sub(1)
            .ok_or(AnalysisFault::ConditionalUnderflow)?;
        self.leave_unreachable();
        Ok(())
    }

    /// Whether the current code runs only under some condition.
    pub fn is_conditional(&self) -> bool {
        self.cond_level > 0
    }

    pub fn level(&self) -> usize {
        self.cond_level
    }

    /// Start an unreachable run. The next report will fire again.
    pub fn enter_unreachable(&mut self) {
        self.unreachable = true;
        self.reported = false;
    }

    pub fn leave_unreachable(&mut self) {
        self.unreachable = false;
    }

    pub fn is_unreachable(&self) -> bool {
        self.unreachable
    }

    /// Latch: `true` for the first report of the current run only.
    pub fn take_report(&mut self) -> bool {
        if self.reported {
            return false;
        }
        self.reported = true;
        true
    }
}
