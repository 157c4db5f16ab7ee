//! Virtual-clock timer scheduler
//!
//! Timers carry a typed event instead of a closure. The owning core advances
//! the clock and handles each fired event in due order, so a handler may
//! schedule new timers that still fire within the same advance window.
//!
//! Timers can belong to an [`OwnerToken`]. Revoking the token cancels every
//! timer it owns, and a fired timer whose owner was revoked is dropped.

use std::collections::HashSet;

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Liveness token held by an entity that owns timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerToken(u32);

/// Smallest repeat interval accepted (ms)
const MIN_INTERVAL_MS: f64 = 1.0;

#[derive(Debug, Clone)]
struct Timer<E> {
    id: TimerId,
    due_ms: f64,
    interval_ms: Option<f64>,
    owner: Option<OwnerToken>,
    event: E,
}

/// A timer that came due
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// Scheduled fire time (the clock reads this while the event is handled)
    pub at_ms: f64,
    pub event: E,
}

/// Deterministic scheduler over a millisecond clock
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now_ms: f64,
    timers: Vec<Timer<E>>,
    next_id: u64,
    next_token: u32,
    /// Issued and not yet revoked
    live: HashSet<OwnerToken>,
    shut_down: bool,
}

impl<E: Clone> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            timers: Vec::new(),
            next_id: 1,
            next_token: 0,
            live: HashSet::new(),
            shut_down: false,
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Number of live timers
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Fire `event` once after `delay_ms`
    pub fn schedule_once(&mut self, delay_ms: f64, event: E) -> TimerId {
        self.insert(delay_ms, None, None, event)
    }

    /// Fire `event` every `interval_ms`, first after one interval
    pub fn schedule_repeating(&mut self, interval_ms: f64, event: E) -> TimerId {
        let interval = interval_ms.max(MIN_INTERVAL_MS);
        self.insert(interval, Some(interval), None, event)
    }

    /// Schedule a timer that lives only as long as `owner`
    pub fn schedule_owned(
        &mut self,
        owner: OwnerToken,
        delay_ms: f64,
        repeat: bool,
        event: E,
    ) -> Option<TimerId> {
        if !self.is_live(owner) {
            return None;
        }
        let interval = repeat.then(|| delay_ms.max(MIN_INTERVAL_MS));
        let delay = interval.unwrap_or(delay_ms);
        Some(self.insert(delay, interval, Some(owner), event))
    }

    fn insert(
        &mut self,
        delay_ms: f64,
        interval_ms: Option<f64>,
        owner: Option<OwnerToken>,
        event: E,
    ) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        if self.shut_down {
            log::debug!("Timer scheduled after teardown ignored");
            return id;
        }
        self.timers.push(Timer {
            id,
            due_ms: self.now_ms + delay_ms.max(0.0),
            interval_ms,
            owner,
            event,
        });
        id
    }

    /// Cancel a timer. Returns false if it already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Issue a new liveness token
    pub fn issue_token(&mut self) -> OwnerToken {
        let token = OwnerToken(self.next_token);
        self.next_token += 1;
        if !self.shut_down {
            self.live.insert(token);
        }
        token
    }

    pub fn is_live(&self, token: OwnerToken) -> bool {
        self.live.contains(&token)
    }

    /// Revoke a token and cancel every timer it owns
    pub fn revoke(&mut self, token: OwnerToken) {
        self.live.remove(&token);
        self.timers.retain(|t| t.owner != Some(token));
    }

    /// Pop the earliest timer due at or before `until_ms`.
    ///
    /// Moves the clock to the timer's due time. Repeating timers are
    /// re-armed before returning. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<Fired<E>> {
        loop {
            let idx = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due_ms <= until_ms)
                .min_by(|(_, a), (_, b)| {
                    a.due_ms
                        .partial_cmp(&b.due_ms)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.id.0.cmp(&b.id.0))
                })
                .map(|(i, _)| i)?;

            let at_ms = self.timers[idx].due_ms;
            self.now_ms = self.now_ms.max(at_ms);

            if let Some(owner) = self.timers[idx].owner {
                if !self.is_live(owner) {
                    self.timers.swap_remove(idx);
                    continue;
                }
            }

            let fired = Fired {
                id: self.timers[idx].id,
                at_ms,
                event: self.timers[idx].event.clone(),
            };
            match self.timers[idx].interval_ms {
                Some(interval) => self.timers[idx].due_ms += interval,
                None => {
                    self.timers.swap_remove(idx);
                }
            }
            return Some(fired);
        }
    }

    /// Move the clock to `until_ms` once all due timers were handled
    pub fn settle(&mut self, until_ms: f64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Cancel everything; nothing may be scheduled or fire afterwards
    pub fn shutdown(&mut self) {
        self.timers.clear();
        self.live.clear();
        self.shut_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, until: f64) -> Vec<(f64, &'static str)> {
        let mut out = Vec::new();
        while let Some(f) = s.pop_due(until) {
            out.push((f.at_ms, f.event));
        }
        s.settle(until);
        out
    }

    #[test]
    fn test_once_and_repeating() {
        let mut s = Scheduler::new();
        s.schedule_once(250.0, "once");
        s.schedule_repeating(100.0, "tick");

        let fired = drain(&mut s, 350.0);
        assert_eq!(
            fired,
            vec![(100.0, "tick"), (200.0, "tick"), (250.0, "once"), (300.0, "tick")]
        );
        assert_eq!(s.now_ms(), 350.0);
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let id = s.schedule_repeating(100.0, "tick");
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(drain(&mut s, 1000.0).is_empty());
    }

    #[test]
    fn test_revoked_owner_timers_never_fire() {
        let mut s = Scheduler::new();
        let token = s.issue_token();
        s.schedule_owned(token, 50.0, true, "breath").unwrap();
        assert_eq!(drain(&mut s, 120.0).len(), 2);

        s.revoke(token);
        assert!(!s.is_live(token));
        assert!(drain(&mut s, 1000.0).is_empty());
        assert!(s.schedule_owned(token, 50.0, false, "late").is_none());
    }

    #[test]
    fn test_handler_can_schedule_within_window() {
        let mut s = Scheduler::new();
        s.schedule_once(100.0, "first");
        let mut seen = Vec::new();
        while let Some(f) = s.pop_due(500.0) {
            seen.push(f.event);
            if f.event == "first" {
                s.schedule_once(100.0, "second");
            }
        }
        assert_eq!(seen, vec!["first", "second"]);
    }

    #[test]
    fn test_shutdown_stops_everything() {
        let mut s = Scheduler::new();
        let token = s.issue_token();
        s.schedule_repeating(10.0, "a");
        s.schedule_owned(token, 10.0, true, "b");
        s.shutdown();
        s.schedule_once(1.0, "c");

        assert_eq!(s.pending(), 0);
        assert!(drain(&mut s, 10_000.0).is_empty());
        assert!(!s.is_live(token));
        let late = s.issue_token();
        assert!(!s.is_live(late));
    }

    #[test]
    fn test_revoked_tokens_are_forgotten() {
        let mut s: Scheduler<&'static str> = Scheduler::new();
        for _ in 0..1000 {
            let token = s.issue_token();
            s.schedule_owned(token, 500.0, true, "breath");
            s.revoke(token);
        }
        let kept = s.issue_token();

        assert_eq!(s.live.len(), 1);
        assert!(s.is_live(kept));
        assert_eq!(s.pending(), 0);
    }
}
