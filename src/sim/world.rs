/// WorldState: the complete snapshot of a running game.
///
/// Terrain is split across three structures, each answering one
/// question:
///   - `tiles`  — what the renderer draws (never mutated after load)
///   - `walls`  — what stops movement (`WallGrid`)
///   - `oracle` — what holds entities up (`SupportOracle` layers)
///
/// The ground and bridge tiles each become their own oracle layer, so
/// a cell counts as supported when any layer covers it.

use crate::config::SpeedConfig;
use crate::domain::block::PushableBlock;
use crate::domain::gate::WinGate;
use crate::domain::grid::{Direction, Pos};
use crate::domain::sequence::Countdown;
use crate::domain::support::{SupportOracle, WallGrid};
use crate::domain::tile::Tile;
use crate::domain::worm::Worm;
use super::event::FailReason;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    LevelIntro,
    Playing,
    LevelClear,
    LevelFailed,
    GameComplete,
}

pub struct WorldState {
    // ── Terrain ──
    /// Level tiles as loaded. Never mutated after `load_level`.
    pub tiles: Vec<Vec<Tile>>,
    pub width: usize,
    pub height: usize,
    pub walls: WallGrid,
    pub oracle: SupportOracle,

    // ── Entities ──
    pub worm: Worm,
    pub worm_spawn: Pos,
    pub blocks: Vec<PushableBlock>,
    /// Block layout as loaded, for level restarts.
    pub base_blocks: Vec<PushableBlock>,
    pub gate: WinGate,
    /// Remembered on the unlock edge, for event emission.
    pub gate_was_unlocked: bool,

    // ── Input ──
    /// Latest requested direction, consumed when the worm goes Idle.
    /// A newer request overwrites an older unconsumed one.
    pub pending_dir: Option<Direction>,

    // ── Round tracking ──
    pub timer: Countdown,
    pub fail_reason: Option<FailReason>,

    // ── Speed config ──
    pub speed: SpeedConfig,

    // ── Meta ──
    pub phase: Phase,
    /// Seconds left on the clock when the last level was cleared.
    pub score: u32,
    pub best_score: Option<u32>,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
    pub paused: bool,
}

impl WorldState {
    pub fn new() -> Self {
        WorldState {
            tiles: vec![],
            width: 0,
            height: 0,
            walls: WallGrid::new(0, 0),
            oracle: SupportOracle::default(),
            worm: Worm::spawn(Pos::new(0, 0), 0),
            worm_spawn: Pos::new(0, 0),
            blocks: vec![],
            base_blocks: vec![],
            gate: WinGate::new(Pos::new(0, 0)),
            gate_was_unlocked: false,
            pending_dir: None,
            timer: Countdown::new(0),
            fail_reason: None,
            speed: SpeedConfig {
                tick_rate_ms: 75,
                move_debounce_ticks: 2,
                fall_grace_ticks: 33,
                fall_drift_ticks: 4,
                block_fall_ticks: 20,
                retreat_step_ticks: 2,
                retreat_timeout_ticks: 80,
                level_time_secs: 60,
                initial_body: 2,
            },
            phase: Phase::Title,
            score: 0,
            best_score: None,
            current_level: 0,
            total_levels: 0,
            level_name: String::new(),
            tick: 0,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
            paused: false,
        }
    }

    /// Query the drawn tile at a position (out of bounds = Void).
    #[inline]
    pub fn terrain_at(&self, pos: Pos) -> Tile {
        if pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height {
            self.tiles[pos.y as usize][pos.x as usize]
        } else {
            Tile::Void
        }
    }

    /// Index of the live (idle or falling) block at a position, if any.
    #[inline]
    pub fn block_index_at(&self, pos: Pos) -> Option<usize> {
        self.blocks.iter().position(|b| b.is_live() && b.pos == pos)
    }

    /// Does the worm's head or any segment occupy this cell?
    #[inline]
    pub fn worm_occupies(&self, pos: Pos) -> bool {
        self.worm.positions().any(|p| p == pos)
    }

    /// Seconds left on the level clock, rounded up.
    pub fn remaining_secs(&self) -> u32 {
        let total_ms = self.timer.remaining() as u64 * self.speed.tick_rate_ms;
        ((total_ms + 999) / 1000) as u32
    }

    /// Ticks the level timer runs for, derived from the configured
    /// wall-clock duration.
    pub fn level_time_ticks(&self) -> u32 {
        let ms = self.speed.level_time_secs as u64 * 1000;
        (ms / self.speed.tick_rate_ms.max(1)) as u32
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}
