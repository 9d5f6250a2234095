/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Latch the frame's direction request (newest wins)
///   2. Worm state machine (fall / retreat / debounce / consume input)
///   3. Falling blocks (drift + countdown)
///   4. Whole-worm support check
///   5. Gate refresh (edge events)
///   6. Level timer
///
/// A step into a cell holding something interactive never moves the
/// head that tick: the gate, a live block, or a wall each absorb the
/// step, and only an empty (or void) cell lets the worm advance.

use crate::domain::block::{self, BlockKind, BlockState, PushOutcome};
use crate::domain::gate::WinGate;
use crate::domain::grid::Direction;
use crate::domain::sequence::Countdown;
use crate::domain::worm::{RetreatProgress, Worm, WormState};
use super::event::{FailReason, GameEvent};
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: Option<Direction>) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    if let Some(dir) = input {
        world.pending_dir = Some(dir);
    }

    resolve_worm(world, &mut events);
    if world.phase != Phase::Playing { return events; }
    resolve_falling_blocks(world, &mut events);
    if world.phase != Phase::Playing { return events; }
    resolve_worm_support(world, &mut events);
    resolve_gate(world, &mut events);
    resolve_timer(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Worm state machine
// ══════════════════════════════════════════════════════════════

fn resolve_worm(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if matches!(world.worm.state, WormState::Falling(_)) {
        if world.worm.advance_fall() {
            fail(world, FailReason::WormFellFromGrace, events);
        }
    } else if matches!(world.worm.state, WormState::Retreating(_)) {
        match world.worm.advance_retreat(&world.walls) {
            RetreatProgress::HitWall => events.push(GameEvent::RetreatHalted),
            RetreatProgress::TimedOut => fail(world, FailReason::RetreatTimeout, events),
            RetreatProgress::Continuing => {}
        }
    } else if matches!(world.worm.state, WormState::Moving(_)) {
        world.worm.tick_debounce();
    } else if let Some(dir) = world.pending_dir.take() {
        try_move(world, dir, events);
    }
}

/// Attempt a head step. Probe order at the target cell:
/// gate → live block → wall → free movement.
fn try_move(world: &mut WorldState, dir: Direction, events: &mut Vec<GameEvent>) {
    // A reversal is dropped outright, not queued for later.
    if world.worm.is_reverse(dir) { return; }

    let target = world.worm.head.step(dir);

    if target == world.gate.pos {
        if world.gate.try_trigger_win() {
            world.score = world.remaining_secs();
            world.phase = Phase::LevelClear;
            world.anim_tick = 0;
            events.push(GameEvent::WinTriggered);
        }
        // A locked gate is a solid bump; either way the step is spent.
        return;
    }

    if let Some(idx) = world.block_index_at(target) {
        engage_block(world, idx, dir, events);
        return;
    }

    if world.walls.is_wall(target) { return; }

    world.worm.commit_step(dir, world.speed.move_debounce_ticks);
}

fn engage_block(world: &mut WorldState, idx: usize, dir: Direction, events: &mut Vec<GameEvent>) {
    let outcome = {
        let WorldState { ref mut blocks, ref walls, ref oracle, ref worm, ref gate, ref speed, .. } = *world;
        let gate_pos = gate.pos;
        let occupied = |p| worm.positions().any(|q| q == p) || p == gate_pos;
        block::try_push(blocks, idx, dir, walls, oracle, occupied, speed.block_fall_ticks)
    };

    match outcome {
        PushOutcome::Consumed => {
            let (pos, kind) = (world.blocks[idx].pos, world.blocks[idx].kind);
            events.push(GameEvent::BlockConsumed { pos, kind });
            world.worm.grow();
            events.push(GameEvent::WormGrew);
            if kind == BlockKind::Berry {
                // Sour one: the worm recoils backward until it slams a wall
                let timeout = match world.speed.retreat_timeout_ticks {
                    0 => None,
                    t => Some(t),
                };
                world.worm.begin_retreat(dir.reverse(), world.speed.retreat_step_ticks, timeout);
                events.push(GameEvent::RetreatStart);
            }
        }
        PushOutcome::Moved => {
            let pos = world.blocks[idx].pos;
            events.push(GameEvent::BlockPushed { pos });
            if matches!(world.blocks[idx].state, BlockState::Falling(_)) {
                events.push(GameEvent::BlockFallStart { pos });
            }
        }
        PushOutcome::Blocked => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Falling blocks
// ══════════════════════════════════════════════════════════════

fn resolve_falling_blocks(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let drift = world.tick % world.speed.fall_drift_ticks.max(1) as u64 == 0;
    let mut fell = false;

    for b in &mut world.blocks {
        if let BlockState::Falling(c) = &mut b.state {
            if c.tick() { fell = true; }
        }
        if drift && matches!(b.state, BlockState::Falling(_)) {
            b.pos.y += 1;
        }
    }

    if fell {
        fail(world, FailReason::BlockFell, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Worm support
// ══════════════════════════════════════════════════════════════

fn resolve_worm_support(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let grounded_state = matches!(world.worm.state, WormState::Idle | WormState::Moving(_));
    if grounded_state && world.worm.all_unsupported(&world.oracle) {
        world.worm.begin_fall(world.speed.fall_grace_ticks, world.speed.fall_drift_ticks);
        events.push(GameEvent::WormFallStart);
    }
}

// ══════════════════════════════════════════════════════════════
// Gate & timer
// ══════════════════════════════════════════════════════════════

fn resolve_gate(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let unlocked = world.gate.refresh(&world.blocks);
    if unlocked && !world.gate_was_unlocked {
        events.push(GameEvent::GateUnlocked);
        world.set_message("The gate is open!", 40);
    }
    world.gate_was_unlocked = unlocked;
}

fn resolve_timer(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.timer.tick() {
        fail(world, FailReason::TimeUp, events);
    }
}

fn fail(world: &mut WorldState, reason: FailReason, events: &mut Vec<GameEvent>) {
    world.fail_reason = Some(reason);
    world.phase = Phase::LevelFailed;
    world.anim_tick = 0;
    events.push(GameEvent::LevelFailed(reason));
}

// ══════════════════════════════════════════════════════════════
// Restart
// ══════════════════════════════════════════════════════════════

pub fn restart_level(world: &mut WorldState) {
    world.blocks = world.base_blocks.clone();
    world.worm = Worm::spawn(world.worm_spawn, world.speed.initial_body as usize);
    world.gate = WinGate::new(world.gate.pos);
    world.gate_was_unlocked = false;
    world.pending_dir = None;
    world.fail_reason = None;
    world.timer = Countdown::new(world.level_time_ticks());
    world.tick = 0;
    world.message.clear();
    world.message_timer = 0;
    world.phase = Phase::Playing;
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Pos;
    use crate::sim::level::{self, LevelDef};

    /// Build a playable world from an ASCII map. Legend matches the
    /// level loader: '#' wall, '.' ground, '~' bridge, ' ' void,
    /// 'a' apple, 'b' berry, 'G' gate, 'P' worm head.
    ///
    /// Maps keep a ground column above 'P' so the spawned body has
    /// somewhere supported to stand.
    fn world_from(rows: &[&str]) -> WorldState {
        let def = LevelDef {
            name: "test".to_string(),
            rows: rows.iter().map(|s| s.to_string()).collect(),
        };
        let mut world = WorldState::new();
        level::apply_def(&mut world, &def);
        world.phase = Phase::Playing;
        world
    }

    fn run_ticks(world: &mut WorldState, n: u32) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..n {
            all.extend(step(world, None));
        }
        all
    }

    /// Step once in a direction, then let the debounce elapse.
    fn press(world: &mut WorldState, dir: Direction) -> Vec<GameEvent> {
        let mut all = step(world, Some(dir));
        while matches!(world.worm.state, WormState::Moving(_)) {
            all.extend(step(world, None));
        }
        all
    }

    #[test]
    fn free_step_moves_head() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#.....#",
            "#######",
        ]);
        let head = w.worm.head;
        press(&mut w, Direction::Down);
        assert_eq!(w.worm.head, head.step(Direction::Down));
    }

    #[test]
    fn wall_bump_spends_the_step_without_moving() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#.....#",
            "#######",
        ]);
        let head = w.worm.head;
        press(&mut w, Direction::Left);
        press(&mut w, Direction::Left);
        // Third left would enter the border wall
        press(&mut w, Direction::Left);
        assert_eq!(w.worm.head, Pos::new(head.x - 2, head.y));
    }

    #[test]
    fn reverse_request_is_dropped_not_queued() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#.....#",
            "#######",
        ]);
        press(&mut w, Direction::Down); // travelling Down now
        let head = w.worm.head;
        press(&mut w, Direction::Up); // reverse: dropped
        assert_eq!(w.worm.head, head);
        assert!(w.pending_dir.is_none());
    }

    #[test]
    fn push_against_wall_consumes_and_grows() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#..a..#",
            "#######",
        ]);
        let before = w.worm.segments.len();
        let head = w.worm.head;
        let events = press(&mut w, Direction::Down);
        assert!(events.iter().any(|e| matches!(e, GameEvent::BlockConsumed { .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::WormGrew)));
        assert_eq!(w.worm.segments.len(), before + 1);
        // Engaging the block absorbed the step
        assert_eq!(w.worm.head, head);
    }

    #[test]
    fn push_into_open_ground_slides_the_block() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#..a..#",
            "#.....#",
            "#######",
        ]);
        let events = press(&mut w, Direction::Down);
        assert!(events.iter().any(|e| matches!(e, GameEvent::BlockPushed { .. })));
        assert_eq!(w.blocks[0].pos, Pos::new(3, 6));
        assert!(w.blocks[0].is_idle());
    }

    #[test]
    fn push_into_void_starts_block_fall_then_fails() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#..a..#",
            "#.. ..#",
            "#######",
        ]);
        let events = press(&mut w, Direction::Down);
        assert!(events.iter().any(|e| matches!(e, GameEvent::BlockFallStart { .. })));

        let ticks = w.speed.block_fall_ticks + 1;
        let events = run_ticks(&mut w, ticks);
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelFailed(FailReason::BlockFell))));
        assert_eq!(w.phase, Phase::LevelFailed);
        assert_eq!(w.fail_reason, Some(FailReason::BlockFell));
    }

    #[test]
    fn gate_stays_shut_while_blocks_remain() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#..G..#",
            "#.a...#",
            "#######",
        ]);
        let head = w.worm.head;
        let events = press(&mut w, Direction::Down);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::WinTriggered)));
        assert_eq!(w.worm.head, head);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn eating_last_block_opens_gate_and_wins_once() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#.GP..#",
            "#..a..#",
            "#######",
        ]);
        let events = press(&mut w, Direction::Down); // consume the apple
        assert!(events.iter().any(|e| matches!(e, GameEvent::GateUnlocked)));

        let events = press(&mut w, Direction::Left); // enter the gate
        assert!(events.iter().any(|e| matches!(e, GameEvent::WinTriggered)));
        assert_eq!(w.phase, Phase::LevelClear);
        assert!(w.score > 0); // remaining seconds banked as score
    }

    #[test]
    fn berry_consumption_triggers_retreat_until_wall() {
        let mut w = world_from(&[
            "#########",
            "#.......#",
            "#.......#",
            "#.......#",
            "#...P...#",
            "#...b...#",
            "#########",
        ]);
        let events = press(&mut w, Direction::Down);
        assert!(events.iter().any(|e| matches!(e, GameEvent::RetreatStart)));
        assert!(matches!(w.worm.state, WormState::Retreating(_)));

        // Recoiling Up: the spawned body column ends under the top wall
        let events = run_ticks(&mut w, 60);
        assert!(events.iter().any(|e| matches!(e, GameEvent::RetreatHalted)));
        assert!(w.worm.can_accept_input());
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn stepping_onto_void_starts_grace_fall_then_fails() {
        let mut w = world_from(&[
            "############",
            "#..........#",
            "#..........#",
            "#..........#",
            "#...P      #",
            "############",
        ]);
        // Crawl fully onto the unsupported span: the fall only starts
        // once the head and every trailing segment leave the ground.
        press(&mut w, Direction::Right);
        press(&mut w, Direction::Right);
        press(&mut w, Direction::Right);
        let events = press(&mut w, Direction::Right);
        assert!(events.iter().any(|e| matches!(e, GameEvent::WormFallStart)));
        assert!(matches!(w.worm.state, WormState::Falling(_)));

        let ticks = w.speed.fall_grace_ticks + 1;
        let events = run_ticks(&mut w, ticks);
        assert!(events.iter().any(|e| {
            matches!(e, GameEvent::LevelFailed(FailReason::WormFellFromGrace))
        }));
        assert_eq!(w.phase, Phase::LevelFailed);
    }

    #[test]
    fn timer_runs_out_into_time_up() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#.....#",
            "#######",
        ]);
        w.timer = Countdown::new(5);
        let events = run_ticks(&mut w, 6);
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelFailed(FailReason::TimeUp))));
        assert_eq!(w.fail_reason, Some(FailReason::TimeUp));
    }

    #[test]
    fn restart_restores_blocks_worm_and_clock() {
        let mut w = world_from(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#..P..#",
            "#..a..#",
            "#######",
        ]);
        let spawn = w.worm_spawn;
        press(&mut w, Direction::Down); // eat the apple
        assert!(!w.blocks[0].is_idle());

        restart_level(&mut w);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.worm.head, spawn);
        assert!(w.blocks[0].is_idle());
        assert!(w.fail_reason.is_none());
        assert_eq!(w.timer.elapsed, 0);
    }
}
