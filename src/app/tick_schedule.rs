use std::time::Duration;

use crate::constants::TIME_SETTINGS;

/// Holds at most one pending tick deadline, aligned to wall-clock second
/// boundaries so scheduling jitter does not accumulate.
#[derive(Debug, Default)]
pub(super) struct TickSchedule {
    deadline: Option<u64>,
}

impl TickSchedule {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn next_boundary(now: u64) -> u64 {
        (now / TIME_SETTINGS.tick_ms + 1) * TIME_SETTINGS.tick_ms
    }

    pub(super) fn reschedule(&mut self, now: u64) {
        self.deadline = Some(Self::next_boundary(now));
    }

    pub(super) fn cancel(&mut self) {
        self.deadline = None;
    }

    pub(super) fn take_due(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub(super) fn time_until(&self, now: u64) -> Option<Duration> {
        self.deadline
            .map(|deadline| Duration::from_millis(deadline.saturating_sub(now)))
    }
}
