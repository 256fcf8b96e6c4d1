//! Virtual-clock timers for the page's timed visual sequences.
//!
//! Every sequence keeps the handle of its outstanding callback so a
//! re-trigger can cancel it before scheduling again.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

pub const ACK_REVERT: Duration = Duration::from_millis(2000);
pub const HIGHLIGHT: Duration = Duration::from_millis(2500);
pub const DEEP_LINK_DELAY: Duration = Duration::from_millis(200);
pub const FADE: Duration = Duration::from_millis(500);
pub const VIDEO_HUB_INTERVAL: Duration = Duration::from_secs(10);
pub const PLACEHOLDER_INTERVAL: Duration = Duration::from_secs(15);

pub const VIDEO_HUB_TEXTS: &[&str] = &[
    "Explore the TGR Video Training Hub",
    "Click to See More TGR Videos",
    "Watch More TGR Videos",
    "Click to Learn More",
];

pub const SEARCH_PROMPTS: &[&str] = &[
    "Search for 'password reset'...",
    "Try searching for 'buy data'...",
    "Looking for 'commissions'?",
    "Try searching 'how to activate'...",
    "Find the guide on 'upgrading'...",
    "Search for 'wallet funding'...",
    "Try searching 'cable tv'...",
    "How do I 'contact support'?",
    "Search by content or title...",
    "Find any guide instantly...",
    "Try searching 'referral link'...",
    "Type here to find what you need...",
    "Search guides by title or content...",
    "Type what you are looking for here...",
    "Try searching 'how to register'...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Pending callbacks ordered by deadline, then by scheduling order.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn schedule(&mut self, delay: Duration, event: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let deadline = self.now + delay;
        self.queue.insert((deadline, id), event);
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let deadline = self.deadlines.remove(&handle.0)?;
        self.queue.remove(&(deadline, handle.0))
    }

    /// Cancel whatever `slot` holds, then schedule `event` into it.
    pub fn reschedule(&mut self, slot: &mut Option<TimerHandle>, delay: Duration, event: T) {
        if let Some(handle) = slot.take() {
            self.cancel(handle);
        }
        *slot = Some(self.schedule(delay, event));
    }

    /// Pop the earliest callback due at or before `until`, moving the clock to
    /// its deadline. Callbacks scheduled while handling it are seen by the
    /// next call.
    pub fn next_due(&mut self, until: Duration) -> Option<(TimerHandle, T)> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline > until {
            return None;
        }
        let event = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(deadline);
        Some((TimerHandle(id), event))
    }

    /// Move the clock forward without firing anything.
    pub fn settle_at(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Fire everything due by `until`, in deadline order.
    pub fn advance_to(&mut self, until: Duration) -> Vec<T> {
        let mut fired = Vec::new();
        while let Some((_, event)) = self.next_due(until) {
            fired.push(event);
        }
        self.settle_at(until);
        fired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadePhase {
    #[default]
    Idle,
    FadingOut,
    Swapped,
    FadingIn,
}

/// Cycles through a fixed list of texts with a fade between each one.
#[derive(Debug, Clone)]
pub struct FadeRotator {
    texts: &'static [&'static str],
    current: usize,
    phase: FadePhase,
}

impl FadeRotator {
    pub fn new(texts: &'static [&'static str]) -> Self {
        Self {
            texts,
            current: 0,
            phase: FadePhase::Idle,
        }
    }

    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    pub fn current(&self) -> &'static str {
        self.texts.get(self.current).copied().unwrap_or_default()
    }

    /// The text is invisible between the start of the fade-out and the
    /// start of the fade-in.
    pub fn is_faded(&self) -> bool {
        matches!(self.phase, FadePhase::FadingOut | FadePhase::Swapped)
    }

    /// Interval tick. A fade already running is restarted from fade-out.
    pub fn start_fade(&mut self) {
        self.phase = FadePhase::FadingOut;
    }

    /// Fade-out finished: advance to the next text.
    pub fn swap(&mut self) -> &'static str {
        if self.phase == FadePhase::FadingOut && !self.texts.is_empty() {
            self.current = (self.current + 1) % self.texts.len();
            self.phase = FadePhase::Swapped;
        }
        self.current()
    }

    pub fn fade_in(&mut self) {
        if self.phase == FadePhase::Swapped {
            self.phase = FadePhase::FadingIn;
        }
    }

    pub fn settle(&mut self) {
        if self.phase == FadePhase::FadingIn {
            self.phase = FadePhase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut timers = Scheduler::new();
        timers.schedule(ms(300), "c");
        timers.schedule(ms(100), "a");
        timers.schedule(ms(200), "b");
        assert_eq!(timers.advance_to(ms(250)), vec!["a", "b"]);
        assert_eq!(timers.now(), ms(250));
        assert_eq!(timers.advance_to(ms(1000)), vec!["c"]);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn equal_deadlines_keep_scheduling_order() {
        let mut timers = Scheduler::new();
        timers.schedule(ms(10), 1);
        timers.schedule(ms(10), 2);
        assert_eq!(timers.advance_to(ms(10)), vec![1, 2]);
    }

    #[test]
    fn reschedule_cancels_outstanding_callback() {
        let mut timers = Scheduler::new();
        let mut slot = None;
        timers.reschedule(&mut slot, ACK_REVERT, "revert-1");
        timers.advance_to(ms(1500));
        timers.reschedule(&mut slot, ACK_REVERT, "revert-2");
        assert!(timers.advance_to(ms(2500)).is_empty());
        assert_eq!(timers.advance_to(ms(3500)), vec!["revert-2"]);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timers = Scheduler::new();
        let handle = timers.schedule(ms(5), ());
        assert!(timers.is_pending(handle));
        assert_eq!(timers.cancel(handle), Some(()));
        assert_eq!(timers.cancel(handle), None);
        assert!(!timers.is_pending(handle));
    }

    #[test]
    fn next_due_advances_clock_to_deadline() {
        let mut timers = Scheduler::new();
        timers.schedule(ms(200), "open");
        let (_, event) = timers.next_due(ms(5000)).unwrap();
        assert_eq!(event, "open");
        assert_eq!(timers.now(), ms(200));
        timers.schedule(HIGHLIGHT, "unhighlight");
        assert_eq!(timers.advance_to(ms(5000)), vec!["unhighlight"]);
    }

    #[test]
    fn rotator_cycles_through_phases() {
        let mut rotator = FadeRotator::new(VIDEO_HUB_TEXTS);
        assert_eq!(rotator.current(), VIDEO_HUB_TEXTS[0]);
        rotator.start_fade();
        assert!(rotator.is_faded());
        assert_eq!(rotator.swap(), VIDEO_HUB_TEXTS[1]);
        assert_eq!(rotator.phase(), FadePhase::Swapped);
        rotator.fade_in();
        assert!(!rotator.is_faded());
        rotator.settle();
        assert_eq!(rotator.phase(), FadePhase::Idle);
    }

    #[test]
    fn rotator_wraps_and_ignores_out_of_order_steps() {
        let mut rotator = FadeRotator::new(&["x", "y"]);
        assert_eq!(rotator.swap(), "x");
        for expected in ["y", "x", "y"] {
            rotator.start_fade();
            assert_eq!(rotator.swap(), expected);
            rotator.fade_in();
            rotator.settle();
        }
    }

    #[test]
    fn prompt_lists_are_complete() {
        assert_eq!(VIDEO_HUB_TEXTS.len(), 4);
        assert_eq!(SEARCH_PROMPTS.len(), 15);
    }
}
