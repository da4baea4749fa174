/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    AutoSave,
    Dispatch,
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    due_ms: u64,
    period_ms: Option<u64>,
    kind: TimerKind,
}

/// Interval and one-shot timers over page time. Nothing fires on its own;
/// the owner drains due timers with [`TimerQueue::pop_due`].
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_interval(&mut self, now_ms: u64, period_ms: u64, kind: TimerKind) -> TimerId {
        let period = period_ms.max(1);
        self.push(now_ms + period, Some(period), kind)
    }

    pub fn set_timeout(&mut self, now_ms: u64, delay_ms: u64, kind: TimerKind) -> TimerId {
        self.push(now_ms + delay_ms, None, kind)
    }

    fn push(&mut self, due_ms: u64, period_ms: Option<u64>, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due_ms,
            period_ms,
            kind,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn active_count(&self, kind: TimerKind) -> usize {
        self.timers.iter().filter(|t| t.kind == kind).count()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Earliest timer due at `now_ms`. Intervals are re-armed to their
    /// first period boundary after `now_ms`, so a late interval fires once
    /// and skips the periods it missed; timeouts are removed.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, TimerKind)> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.id.0))
            .map(|(i, _)| i)?;

        let timer = &mut self.timers[idx];
        let fired = (timer.id, timer.kind);
        match timer.period_ms {
            Some(period) => {
                let missed = (now_ms - timer.due_ms) / period;
                timer.due_ms += period * (missed + 1);
            }
            None => {
                self.timers.remove(idx);
            }
        }
        Some(fired)
    }
}
