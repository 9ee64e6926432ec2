//! Per-rank state: its banks, FAW tracker, and refresh governor.

use crate::bank::{Bank, BankState};
use crate::faw::FawTracker;
use crate::refresh::RefreshGovernor;
use usimm_config::Ticks;

#[derive(Debug, Clone)]
pub struct Rank {
    pub banks: Vec<Bank>,
    pub faw: FawTracker,
    pub refresh: RefreshGovernor,
    /// Idle-cycle counter used by the Power-down scheduler policy.
    pub idle_cycles: u64,
}

impl Rank {
    #[must_use]
    pub fn new(num_banks: usize, t_refi: Ticks) -> Self {
        Self {
            banks: vec![Bank::new(); num_banks],
            faw: FawTracker::new(),
            refresh: RefreshGovernor::new(t_refi),
            idle_cycles: 0,
        }
    }

    /// True iff every bank in the rank is in one of the three powerdown
    /// states simultaneously (§3 Rank derived state).
    #[must_use]
    pub fn is_powered_down(&self) -> bool {
        !self.banks.is_empty() && self.banks.iter().all(|b| b.state.is_powered_down())
    }

    /// True iff no bank currently has an open row or is mid-command.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.banks.iter().all(|b| matches!(b.state, BankState::Idle))
    }
}
