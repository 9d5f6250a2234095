/// Pushable fruit blocks.
///
/// Per-block state machine: Idle → (pushed into a wall) Consumed, or
/// Idle → (pushed over the void) Falling. Consumption destroys the
/// block and feeds the worm; a completed fall is a level loss.
///
/// Push resolution, in order:
///   1. Already consumed → `Consumed`, no side effects. This makes a
///      double push within one tick a no-op.
///   2. Wall on the far side → the block is crushed: state becomes
///      Consumed and the caller grows the worm. `Consumed`.
///   3. Target empty, or holding only another block of the same kind →
///      slide one step, then ask the support oracle; unsupported means
///      the fall countdown starts. `Moved`.
///   4. Anything else in the way → `Blocked`, nothing mutated.
///
/// All side effects land immediately — there is no deferred commit.

use super::grid::{Direction, Pos};
use super::sequence::Countdown;
use super::support::{SupportOracle, WallGrid};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockKind {
    Apple,
    Berry,
}

#[derive(Clone, Copy, Debug)]
pub enum BlockState {
    Idle,
    Falling(Countdown),
    Consumed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PushOutcome {
    Consumed,
    Moved,
    Blocked,
}

#[derive(Clone, Debug)]
pub struct PushableBlock {
    pub pos: Pos,
    pub kind: BlockKind,
    pub state: BlockState,
}

impl PushableBlock {
    pub fn new(pos: Pos, kind: BlockKind) -> Self {
        PushableBlock { pos, kind, state: BlockState::Idle }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, BlockState::Idle)
    }

    pub fn is_consumed(&self) -> bool {
        matches!(self.state, BlockState::Consumed)
    }

    /// Still part of the world (idle or mid-fall)?
    pub fn is_live(&self) -> bool {
        !self.is_consumed()
    }
}

/// Attempt to push `blocks[idx]` one step in `dir`.
///
/// `occupied` reports non-block occupants (gate, worm segments) at a
/// cell; block-on-block occupancy is resolved here. `fall_ticks` is the
/// countdown length if the slide ends over the void.
pub fn try_push(
    blocks: &mut [PushableBlock],
    idx: usize,
    dir: Direction,
    walls: &WallGrid,
    oracle: &SupportOracle,
    occupied: impl Fn(Pos) -> bool,
    fall_ticks: u32,
) -> PushOutcome {
    if blocks[idx].is_consumed() {
        return PushOutcome::Consumed;
    }
    // A block mid-fall is out of play; the level is already lost.
    if !blocks[idx].is_idle() {
        return PushOutcome::Blocked;
    }

    let kind = blocks[idx].kind;
    let target = blocks[idx].pos.step(dir);

    // Crushed against a wall: destroyed, worm grows (caller's job).
    if walls.is_wall(target) {
        blocks[idx].state = BlockState::Consumed;
        return PushOutcome::Consumed;
    }

    let same_kind_only = blocks
        .iter()
        .enumerate()
        .filter(|(j, b)| *j != idx && b.is_live() && b.pos == target)
        .all(|(_, b)| b.kind == kind);

    if !same_kind_only || occupied(target) {
        return PushOutcome::Blocked;
    }

    blocks[idx].pos = target;
    if oracle.is_configured() && !oracle.is_supported(target) {
        blocks[idx].state = BlockState::Falling(Countdown::new(fall_ticks));
    }
    PushOutcome::Moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::support::SurfaceLayer;

    fn open_walls() -> WallGrid {
        WallGrid::new(8, 8)
    }

    fn full_floor() -> SupportOracle {
        let mut layer = SurfaceLayer::new(Pos::new(0, 0), 8, 8);
        for y in 0..8 {
            for x in 0..8 {
                layer.set(Pos::new(x, y), true);
            }
        }
        SupportOracle::new(vec![layer])
    }

    fn no_one(_: Pos) -> bool {
        false
    }

    #[test]
    fn push_into_empty_cell_moves_one_step() {
        let mut blocks = vec![PushableBlock::new(Pos::new(3, 3), BlockKind::Apple)];
        let out = try_push(&mut blocks, 0, Direction::Down, &open_walls(), &full_floor(), no_one, 10);
        assert_eq!(out, PushOutcome::Moved);
        assert_eq!(blocks[0].pos, Pos::new(3, 4));
        assert!(blocks[0].is_idle());
    }

    #[test]
    fn push_against_wall_consumes() {
        let mut walls = open_walls();
        walls.set_wall(Pos::new(3, 2));
        let mut blocks = vec![PushableBlock::new(Pos::new(3, 3), BlockKind::Berry)];
        let out = try_push(&mut blocks, 0, Direction::Up, &walls, &full_floor(), no_one, 10);
        assert_eq!(out, PushOutcome::Consumed);
        assert!(blocks[0].is_consumed());
        // Block did not move into the wall
        assert_eq!(blocks[0].pos, Pos::new(3, 3));
    }

    #[test]
    fn consumed_block_push_is_idempotent() {
        let mut blocks = vec![PushableBlock::new(Pos::new(3, 3), BlockKind::Apple)];
        blocks[0].state = BlockState::Consumed;
        let before = blocks[0].pos;
        let out = try_push(&mut blocks, 0, Direction::Left, &open_walls(), &full_floor(), no_one, 10);
        assert_eq!(out, PushOutcome::Consumed);
        assert_eq!(blocks[0].pos, before);
    }

    #[test]
    fn other_kind_block_blocks() {
        let mut blocks = vec![
            PushableBlock::new(Pos::new(3, 3), BlockKind::Apple),
            PushableBlock::new(Pos::new(4, 3), BlockKind::Berry),
        ];
        let out = try_push(&mut blocks, 0, Direction::Right, &open_walls(), &full_floor(), no_one, 10);
        assert_eq!(out, PushOutcome::Blocked);
        assert_eq!(blocks[0].pos, Pos::new(3, 3));
    }

    #[test]
    fn same_kind_block_permits_overlap() {
        let mut blocks = vec![
            PushableBlock::new(Pos::new(3, 3), BlockKind::Apple),
            PushableBlock::new(Pos::new(4, 3), BlockKind::Apple),
        ];
        let out = try_push(&mut blocks, 0, Direction::Right, &open_walls(), &full_floor(), no_one, 10);
        assert_eq!(out, PushOutcome::Moved);
        assert_eq!(blocks[0].pos, Pos::new(4, 3));
    }

    #[test]
    fn occupied_target_blocks() {
        let mut blocks = vec![PushableBlock::new(Pos::new(3, 3), BlockKind::Apple)];
        let occupied = |p: Pos| p == Pos::new(3, 4);
        let out = try_push(&mut blocks, 0, Direction::Down, &open_walls(), &full_floor(), occupied, 10);
        assert_eq!(out, PushOutcome::Blocked);
        assert_eq!(blocks[0].pos, Pos::new(3, 3));
    }

    #[test]
    fn slide_over_void_starts_fall() {
        // Floor only under the starting cell
        let mut layer = SurfaceLayer::new(Pos::new(0, 0), 8, 8);
        layer.set(Pos::new(3, 3), true);
        let oracle = SupportOracle::new(vec![layer]);

        let mut blocks = vec![PushableBlock::new(Pos::new(3, 3), BlockKind::Berry)];
        let out = try_push(&mut blocks, 0, Direction::Right, &open_walls(), &oracle, no_one, 4);
        assert_eq!(out, PushOutcome::Moved);
        assert!(matches!(blocks[0].state, BlockState::Falling(_)));
    }

    #[test]
    fn unconfigured_oracle_never_starts_fall() {
        let mut blocks = vec![PushableBlock::new(Pos::new(3, 3), BlockKind::Apple)];
        let out = try_push(
            &mut blocks, 0, Direction::Right,
            &open_walls(), &SupportOracle::default(), no_one, 4,
        );
        assert_eq!(out, PushOutcome::Moved);
        assert!(blocks[0].is_idle());
    }
}
