// Timer provider the engine depends on. The host advances virtual time; nothing here reads a wall clock.
// Firings are handed out one at a time so a handler can cancel or arm timers before the next one is chosen.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Opaque handle to an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// What a timer is for. The engine dispatches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Recurring, one firing per slide duration.
    SlideAdvance,
    /// One-shot, hides the intro caption.
    IntroHide,
    /// Recurring, armed only once the show is ending.
    VolumeFade,
}

/// A single timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
    pub at: Timestamp,
}

/// Clock and timer provider.
pub trait Scheduler {
    /// Current time as seen by the scheduler.
    fn now(&self) -> Timestamp;

    /// Arm a timer that fires once, `delay_us` from now.
    fn schedule_once(&mut self, kind: TimerKind, delay_us: u64) -> TimerId;

    /// Arm a timer that fires every `interval_us`, first firing one interval from now.
    fn schedule_repeating(&mut self, kind: TimerKind, interval_us: u64) -> TimerId;

    /// Returns `false` if the timer had already fired (one-shot) or was cancelled.
    fn cancel(&mut self, id: TimerId) -> bool;

    fn cancel_all(&mut self);

    /// Number of armed timers.
    fn pending(&self) -> usize;

    /// Pop the earliest timer due at or before `until`, moving the clock to its deadline.
    /// When nothing is due the clock moves to `until` and `None` is returned.
    fn next_due(&mut self, until: Timestamp) -> Option<Fired>;
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    kind: TimerKind,
    deadline: Timestamp,
    interval_us: Option<u64>,
}

/// Deterministic scheduler over virtual time.
/// Ties on the deadline are broken by arm order.
#[derive(Debug, Clone, Default)]
pub struct VirtualScheduler {
    now: Timestamp,
    next_id: u64,
    timers: Vec<Timer>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler whose clock starts at `now` (e.g. the host's clock at page load).
    pub fn starting_at(now: Timestamp) -> Self {
        VirtualScheduler {
            now,
            ..Self::default()
        }
    }

    /// Kinds of the armed timers, in arm order.
    pub fn armed_kinds(&self) -> Vec<TimerKind> {
        let mut timers: Vec<&Timer> = self.timers.iter().collect();
        timers.sort_by_key(|t| t.id);
        timers.into_iter().map(|t| t.kind).collect()
    }

    fn arm(&mut self, kind: TimerKind, delay_us: u64, interval_us: Option<u64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            kind,
            deadline: self.now.after(delay_us),
            interval_us,
        });
        id
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn schedule_once(&mut self, kind: TimerKind, delay_us: u64) -> TimerId {
        self.arm(kind, delay_us, None)
    }

    fn schedule_repeating(&mut self, kind: TimerKind, interval_us: u64) -> TimerId {
        // A zero interval would fire forever without time moving.
        let interval_us = interval_us.max(1);
        self.arm(kind, interval_us, Some(interval_us))
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    fn cancel_all(&mut self) {
        self.timers.clear();
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }

    fn next_due(&mut self, until: Timestamp) -> Option<Fired> {
        let due = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= until)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i);

        let Some(index) = due else {
            self.now = self.now.max(until);
            return None;
        };

        let timer = &mut self.timers[index];
        let fired = Fired {
            id: timer.id,
            kind: timer.kind,
            at: timer.deadline,
        };
        self.now = self.now.max(timer.deadline);

        let interval_us = timer.interval_us;
        match interval_us {
            Some(interval) => timer.deadline = timer.deadline.after(interval),
            None => {
                self.timers.swap_remove(index);
            }
        }

        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut VirtualScheduler, until: Timestamp) -> Vec<(TimerKind, u64)> {
        let mut fired = Vec::new();
        while let Some(f) = scheduler.next_due(until) {
            fired.push((f.kind, f.at.as_micros()));
        }
        fired
    }

    #[test]
    fn one_shot_fires_once() {
        let mut scheduler = VirtualScheduler::new();
        scheduler.schedule_once(TimerKind::IntroHide, 4_000);

        assert!(drain(&mut scheduler, Timestamp::from_micros(3_999)).is_empty());
        assert_eq!(scheduler.now().as_micros(), 3_999);

        let fired = drain(&mut scheduler, Timestamp::from_micros(10_000));
        assert_eq!(fired, vec![(TimerKind::IntroHide, 4_000)]);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now().as_micros(), 10_000);
    }

    #[test]
    fn repeating_fires_every_interval() {
        let mut scheduler = VirtualScheduler::new();
        scheduler.schedule_repeating(TimerKind::SlideAdvance, 5_000);

        let fired = drain(&mut scheduler, Timestamp::from_micros(15_000));
        assert_eq!(
            fired,
            vec![
                (TimerKind::SlideAdvance, 5_000),
                (TimerKind::SlideAdvance, 10_000),
                (TimerKind::SlideAdvance, 15_000),
            ]
        );
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn firings_are_ordered_by_deadline_then_arm_order() {
        let mut scheduler = VirtualScheduler::new();
        scheduler.schedule_repeating(TimerKind::SlideAdvance, 4_000);
        scheduler.schedule_once(TimerKind::IntroHide, 4_000);
        scheduler.schedule_once(TimerKind::VolumeFade, 1_000);

        let fired = drain(&mut scheduler, Timestamp::from_micros(4_000));
        assert_eq!(
            fired,
            vec![
                (TimerKind::VolumeFade, 1_000),
                (TimerKind::SlideAdvance, 4_000),
                (TimerKind::IntroHide, 4_000),
            ]
        );
    }

    #[test]
    fn cancel_stops_future_firings() {
        let mut scheduler = VirtualScheduler::new();
        let id = scheduler.schedule_repeating(TimerKind::VolumeFade, 200);
        assert!(scheduler.next_due(Timestamp::from_micros(200)).is_some());
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(drain(&mut scheduler, Timestamp::from_micros(10_000)).is_empty());
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut scheduler = VirtualScheduler::starting_at(Timestamp::from_micros(1_000));
        assert!(scheduler.next_due(Timestamp::from_micros(10)).is_none());
        assert_eq!(scheduler.now().as_micros(), 1_000);

        scheduler.schedule_once(TimerKind::IntroHide, 50);
        let fired = scheduler.next_due(Timestamp::from_micros(5_000)).unwrap();
        assert_eq!(fired.at.as_micros(), 1_050);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut scheduler = VirtualScheduler::new();
        scheduler.schedule_repeating(TimerKind::VolumeFade, 0);
        assert_eq!(drain(&mut scheduler, Timestamp::from_micros(3)).len(), 3);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut scheduler = VirtualScheduler::new();
        scheduler.schedule_repeating(TimerKind::SlideAdvance, 5_000);
        scheduler.schedule_once(TimerKind::IntroHide, 4_000);
        assert_eq!(
            scheduler.armed_kinds(),
            vec![TimerKind::SlideAdvance, TimerKind::IntroHide]
        );
        scheduler.cancel_all();
        assert_eq!(scheduler.pending(), 0);
    }
}
