//! Four-activation-window (tFAW) tracking, one per (channel, rank).

use std::collections::VecDeque;
use usimm_config::Ticks;

/// A sliding window of recent activation timestamps for one rank.
///
/// At most 4 activations may land within any rolling `tFAW`-tick window
/// (§8 invariant 3). History older than `tFAW` is pruned lazily: on every
/// query and every record, entries that have fallen out of the window are
/// dropped from the front.
#[derive(Debug, Clone, Default)]
pub struct FawTracker {
    activations: VecDeque<Ticks>,
}

impl FawTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { activations: VecDeque::new() }
    }

    fn prune(&mut self, now: Ticks, t_faw: Ticks) {
        while let Some(&oldest) = self.activations.front() {
            if now.saturating_sub(oldest) > t_faw {
                self.activations.pop_front();
            } else {
                break;
            }
        }
    }

    /// True iff a fifth activation at `now` would not violate tFAW.
    #[must_use]
    pub fn can_activate(&mut self, now: Ticks, t_faw: Ticks) -> bool {
        self.prune(now, t_faw);
        self.activations.len() < 4
    }

    /// Records an activation at `now`. Two activations at the same cycle on
    /// the same (channel, rank) are a programming error (§8 invariant 3 /
    /// §7): the issuer is expected to have checked `can_activate` first, so
    /// this only asserts, it does not re-check eligibility.
    pub fn record_activate(&mut self, now: Ticks, t_faw: Ticks) {
        self.prune(now, t_faw);
        debug_assert!(
            self.activations.back() != Some(&now),
            "two activations recorded at the same cycle {now:?} on the same rank"
        );
        debug_assert!(
            self.activations.len() < 4,
            "FAW violation: recording a 5th activation within tFAW at {now:?}"
        );
        self.activations.push_back(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_four_then_blocks_fifth() {
        let mut faw = FawTracker::new();
        let t_faw = Ticks::new(20);
        for t in [0, 5, 10, 15] {
            let now = Ticks::new(t);
            assert!(faw.can_activate(now, t_faw));
            faw.record_activate(now, t_faw);
        }
        assert!(!faw.can_activate(Ticks::new(16), t_faw));
    }

    #[test]
    fn prunes_activations_outside_window() {
        let mut faw = FawTracker::new();
        let t_faw = Ticks::new(20);
        for t in [0, 5, 10, 15] {
            faw.record_activate(Ticks::new(t), t_faw);
        }
        // At cycle 21, the activation at 0 is exactly at the tFAW boundary
        // (21 - 0 == 21 > 20) and falls out of the window.
        assert!(faw.can_activate(Ticks::new(21), t_faw));
    }
}
