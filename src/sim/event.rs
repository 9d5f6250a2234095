/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation/sound.

use crate::domain::block::BlockKind;
use crate::domain::grid::Pos;

/// Why a run of the current level ended in a loss.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FailReason {
    /// A pushed block left all surfaces and its fall ran out.
    BlockFell,
    /// The worm dangled with no segment supported past the grace period.
    WormFellFromGrace,
    /// A forced retreat never found a wall before its timeout.
    RetreatTimeout,
    /// The level timer hit zero.
    TimeUp,
}

#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    BlockPushed { pos: Pos },
    BlockConsumed { pos: Pos, kind: BlockKind },
    WormGrew,
    WormFallStart,
    BlockFallStart { pos: Pos },
    RetreatStart,
    RetreatHalted,
    GateUnlocked,
    WinTriggered,
    LevelFailed(FailReason),
}
