//! Delayed actions on the simulation clock
//!
//! Staggered ball drops, peg-removal cadence and end-of-turn checks all run
//! off this queue, so they pause with the game and replay deterministically.

/// Something the simulation does later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop a ball into the stock column
    DropBall { from_bucket: bool },
    /// Remove a hit peg from the field
    RemovePeg(u32),
    /// Decide what follows a finished shot (aim, win or game over)
    FinishTurn,
    /// Refill the stock after a restart and return to aiming
    RestockAndAim,
}

#[derive(Debug, Clone)]
struct Scheduled {
    due_ms: f64,
    seq: u64,
    action: Action,
}

/// Ordered queue of pending actions
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pending: Vec<Scheduled>,
    next_seq: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to run `delay_ms` after `now_ms`
    pub fn after(&mut self, now_ms: f64, delay_ms: f32, action: Action) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled {
            due_ms: now_ms + f64::from(delay_ms.max(0.0)),
            seq,
            action,
        });
    }

    /// Remove and return every action due at `now_ms`, earliest first
    /// (ties in the order they were queued)
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<Action> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due_ms <= now_ms);
        self.pending = rest;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|s| s.action).collect()
    }

    pub fn contains(&self, action: Action) -> bool {
        self.pending.iter().any(|s| s.action == action)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
