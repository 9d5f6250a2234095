use super::block::PushableBlock;
use super::grid::Pos;

/// The level exit. Locked while any pushable block is still idle on
/// the board; unlocks the moment none remain, and can re-lock if a
/// later spawn puts blocks back (level reset re-creates the gate, so
/// in practice locking only moves one way per level).
///
/// The win itself latches: `try_trigger_win` reports true at most once
/// per gate lifetime, no matter how often the head re-enters the cell.
#[derive(Clone, Debug)]
pub struct WinGate {
    pub pos: Pos,
    unlocked: bool,
    won: bool,
}

impl WinGate {
    pub fn new(pos: Pos) -> Self {
        WinGate { pos, unlocked: false, won: false }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Recompute the lock from the current block set. Returns the new
    /// state so callers can emit unlock/lock events on the edge.
    pub fn refresh(&mut self, blocks: &[PushableBlock]) -> bool {
        self.unlocked = !blocks.iter().any(|b| b.is_idle());
        self.unlocked
    }

    /// Head arrived on the gate cell. True exactly once, and only while
    /// unlocked; a locked gate is simply a solid cell to bump into.
    pub fn try_trigger_win(&mut self) -> bool {
        if self.unlocked && !self.won {
            self.won = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block::{BlockKind, PushableBlock};
    use crate::domain::sequence::Countdown;

    fn block_at(x: i32, y: i32) -> PushableBlock {
        PushableBlock::new(Pos::new(x, y), BlockKind::Apple)
    }

    #[test]
    fn locked_while_idle_blocks_remain() {
        let mut gate = WinGate::new(Pos::new(0, 0));
        let blocks = vec![block_at(1, 1), block_at(2, 2)];
        assert!(!gate.refresh(&blocks));
        assert!(!gate.try_trigger_win());
    }

    #[test]
    fn unlocks_when_no_block_is_idle() {
        let mut gate = WinGate::new(Pos::new(0, 0));
        let mut blocks = vec![block_at(1, 1), block_at(2, 2)];
        blocks[0].state = crate::domain::block::BlockState::Consumed;
        blocks[1].state = crate::domain::block::BlockState::Falling(Countdown::new(5));
        assert!(gate.refresh(&blocks));
    }

    #[test]
    fn empty_board_is_unlocked() {
        let mut gate = WinGate::new(Pos::new(0, 0));
        assert!(gate.refresh(&[]));
    }

    #[test]
    fn win_fires_exactly_once() {
        let mut gate = WinGate::new(Pos::new(0, 0));
        gate.refresh(&[]);
        assert!(gate.try_trigger_win());
        assert!(!gate.try_trigger_win());
    }
}
