/// Resumable timed sequences.
///
/// Every multi-tick motion in the game (the worm's grace-period fall, a
/// block's fall, the forced retreat, the input debounce) is a small
/// state object advanced exactly once per scheduler tick. No hidden
/// suspension points: the scheduler owns the loop, these own only
/// their local progress.

/// Fixed-length countdown: `elapsed` ticks toward `total`, then stays
/// done. `tick()` reports true on the tick that completes it (exactly
/// once).
#[derive(Clone, Copy, Debug)]
pub struct Countdown {
    pub elapsed: u32,
    pub total: u32,
}

impl Countdown {
    pub fn new(total: u32) -> Self {
        Countdown { elapsed: 0, total }
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.total
    }

    /// Advance one tick. Returns true only on the completing tick.
    pub fn tick(&mut self) -> bool {
        if self.is_done() {
            return false;
        }
        self.elapsed += 1;
        self.is_done()
    }

    /// Ticks left until completion.
    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.elapsed)
    }

    /// Progress ratio 0.0..=1.0, for rendering.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        (self.elapsed as f32 / self.total as f32).min(1.0)
    }
}

/// Repeating pace timer: fires every `interval` ticks. Used to space
/// out the discrete sub-steps of fall and retreat motion.
#[derive(Clone, Copy, Debug)]
pub struct Pacer {
    interval: u32,
    since_last: u32,
}

impl Pacer {
    pub fn new(interval: u32) -> Self {
        Pacer { interval: interval.max(1), since_last: 0 }
    }

    /// Advance one tick. Returns true each time a full interval elapses.
    pub fn tick(&mut self) -> bool {
        self.since_last += 1;
        if self.since_last >= self.interval {
            self.since_last = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_completes_exactly_once() {
        let mut c = Countdown::new(3);
        assert!(!c.tick());
        assert!(!c.tick());
        assert!(c.tick());
        assert!(c.is_done());
        assert!(!c.tick()); // already done, never fires again
        assert_eq!(c.elapsed, 3);
    }

    #[test]
    fn zero_total_is_born_done() {
        let mut c = Countdown::new(0);
        assert!(c.is_done());
        assert!(!c.tick());
        assert!((c.progress() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn pacer_fires_every_interval() {
        let mut p = Pacer::new(3);
        let fired: Vec<bool> = (0..7).map(|_| p.tick()).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true, false]);
    }

    #[test]
    fn pacer_interval_floor_is_one() {
        let mut p = Pacer::new(0);
        assert!(p.tick());
        assert!(p.tick());
    }
}
