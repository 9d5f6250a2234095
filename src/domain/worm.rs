/// The worm: head plus trailing segments, moved one grid step at a
/// time by replaying a bounded history of head positions.
///
/// ## History invariant
///
/// `position_history.len() == segments.len() + 1` at all times (the
/// extra slot is the cell the head most recently vacated), and
/// `direction_history` mirrors it entry for entry. Newest first:
/// segment `i` sits at `position_history[i + 1]`.
///
/// ## State machine
///
///   Idle ──commit_step──▶ Moving (debounce window) ──▶ Idle
///   Idle/Moving ──all segments unsupported──▶ Falling (one-way)
///   Idle ──external trigger──▶ Retreating ──wall──▶ Idle
///
/// Falling never re-checks support: once the grace countdown starts,
/// the only outcomes are caller-side level reset or failure. Retreating
/// ends at the first wall any segment would touch, or at the optional
/// timeout (a distinct failure).

use super::grid::{Direction, Pos};
use super::history::Trail;
use super::sequence::{Countdown, Pacer};
use super::support::{SupportOracle, WallGrid};

/// Body sprite variants, derived from the direction pair around a
/// segment. Eight ordered corner pairs collapse onto four variants
/// (diagonal-symmetric); straight segments split by axis.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BodySprite {
    Horizontal,
    Vertical,
    CornerTopLeft,
    CornerTopRight,
    CornerBottomLeft,
    CornerBottomRight,
}

/// Sprite for the segment between an older direction (`prev`, how the
/// segment behind was entered) and a newer one (`curr`).
pub fn body_sprite(prev: Direction, curr: Direction) -> BodySprite {
    use Direction::*;
    if prev == curr {
        return if curr.is_horizontal() { BodySprite::Horizontal } else { BodySprite::Vertical };
    }
    match (prev, curr) {
        (Up, Left) | (Right, Down) => BodySprite::CornerTopRight,
        (Up, Right) | (Left, Down) => BodySprite::CornerTopLeft,
        (Down, Left) | (Right, Up) => BodySprite::CornerBottomRight,
        (Down, Right) | (Left, Up) => BodySprite::CornerBottomLeft,
        // Reversals never reach here (rejected before commit)
        _ => BodySprite::Vertical,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Segment {
    pub pos: Pos,
    pub sprite: BodySprite,
}

/// One-way fall: the whole worm drifts down while the grace countdown
/// runs; its completion is the caller's cue to declare the loss.
#[derive(Clone, Debug)]
pub struct Fall {
    pub grace: Countdown,
    drift: Pacer,
}

/// Forced retreat: whole-worm translation, one step per pace interval,
/// until a wall or the optional timeout.
#[derive(Clone, Debug)]
pub struct Retreat {
    pub dir: Direction,
    pace: Pacer,
    timeout: Option<Countdown>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RetreatProgress {
    Continuing,
    HitWall,
    TimedOut,
}

#[derive(Clone, Debug)]
pub enum WormState {
    Idle,
    Moving(Countdown),
    Retreating(Retreat),
    Falling(Fall),
}

#[derive(Clone, Debug)]
pub struct Worm {
    pub head: Pos,
    pub facing: Direction,
    pub current_direction: Direction,
    /// Trailing parts, body first, tail last. The head is not in here.
    pub segments: Vec<Segment>,
    pub tail_facing: Direction,
    pub state: WormState,
    position_history: Trail<Pos>,
    direction_history: Trail<Direction>,
}

impl Worm {
    /// Spawn facing Down with `initial_body` body segments plus a tail,
    /// laid out upward from the head.
    pub fn spawn(head: Pos, initial_body: usize) -> Self {
        let dir = Direction::Down;
        let trailing = initial_body + 1; // body parts + tail
        let mut position_history = Trail::with_capacity(trailing + 1);
        let mut direction_history = Trail::with_capacity(trailing + 1);
        let mut segments = Vec::with_capacity(trailing);

        position_history.push_back(head);
        direction_history.push_back(dir);

        let mut pos = head;
        for _ in 0..trailing {
            pos = pos.step(dir.reverse());
            segments.push(Segment { pos, sprite: BodySprite::Vertical });
            position_history.push_back(pos);
            direction_history.push_back(dir);
        }

        Worm {
            head,
            facing: dir,
            current_direction: dir,
            segments,
            tail_facing: dir,
            state: WormState::Idle,
            position_history,
            direction_history,
        }
    }

    pub fn can_accept_input(&self) -> bool {
        matches!(self.state, WormState::Idle)
    }

    /// A direction opposite to travel is never accepted while the worm
    /// has trailing segments (it would fold into itself).
    pub fn is_reverse(&self, dir: Direction) -> bool {
        !self.segments.is_empty() && dir == self.current_direction.reverse()
    }

    /// Head plus every trailing segment.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        std::iter::once(self.head).chain(self.segments.iter().map(|s| s.pos))
    }

    /// Commit one step: the caller has already cleared the target cell.
    /// Updates histories, drags every segment forward one slot, picks
    /// body sprites and the tail facing, and opens the debounce window.
    pub fn commit_step(&mut self, dir: Direction, debounce_ticks: u32) {
        let new_head = self.head.step(dir);

        self.position_history.push_front(new_head);
        self.direction_history.push_front(dir);
        self.head = new_head;
        self.facing = dir;
        self.current_direction = dir;

        let count = self.segments.len();
        for i in 0..count {
            if let Some(pos) = self.position_history.get(i + 1) {
                self.segments[i].pos = pos;
            }
            // Tail keeps its own facing; everything before it gets a
            // sprite from the direction pair around it.
            if i + 1 < count {
                if let (Some(prev), Some(curr)) =
                    (self.direction_history.get(i + 1), self.direction_history.get(i))
                {
                    self.segments[i].sprite = body_sprite(prev, curr);
                }
            }
        }

        self.update_tail_facing();
        self.state = WormState::Moving(Countdown::new(debounce_ticks));
    }

    /// Insert a new segment just before the tail, at the tail's current
    /// position. History is extended only if it does not already cover
    /// the new segment count; it is never shortened.
    pub fn grow(&mut self) {
        let tail_idx = match self.segments.len() {
            0 => return,
            n => n - 1,
        };
        let tail_pos = self.segments[tail_idx].pos;
        self.segments.insert(tail_idx, Segment { pos: tail_pos, sprite: BodySprite::Vertical });

        let needed = self.segments.len() + 1;
        self.position_history.ensure_capacity(needed);
        self.direction_history.ensure_capacity(needed);
        if self.position_history.len() < needed {
            self.position_history.push_back(tail_pos);
            self.direction_history.push_back(self.current_direction);
        }
    }

    /// Are head and every segment simultaneously off all surfaces?
    /// Always false until the oracle has layers (no data ≠ no ground).
    pub fn all_unsupported(&self, oracle: &SupportOracle) -> bool {
        if !oracle.is_configured() {
            return false;
        }
        self.positions().all(|p| !oracle.is_supported(p))
    }

    pub fn begin_fall(&mut self, grace_ticks: u32, drift_interval: u32) {
        self.state = WormState::Falling(Fall {
            grace: Countdown::new(grace_ticks),
            drift: Pacer::new(drift_interval),
        });
    }

    pub fn begin_retreat(&mut self, dir: Direction, pace_interval: u32, timeout_ticks: Option<u32>) {
        self.state = WormState::Retreating(Retreat {
            dir,
            pace: Pacer::new(pace_interval),
            timeout: timeout_ticks.map(Countdown::new),
        });
    }

    /// Advance the fall one tick. Returns true exactly once, on the
    /// tick the grace period elapses. There is no re-support check —
    /// the fall is a one-way countdown.
    pub fn advance_fall(&mut self) -> bool {
        let (drifted, done) = match &mut self.state {
            WormState::Falling(fall) => (fall.drift.tick(), fall.grace.tick()),
            _ => return false,
        };
        if drifted {
            self.translate_all(Direction::Down);
        }
        done
    }

    /// Advance the retreat one tick. On a pace boundary the whole worm
    /// shifts one step, unless any segment would enter a wall — then
    /// the sequence halts, histories are rebuilt with a uniform facing,
    /// and input resumes. The timeout only fires if no wall was hit.
    pub fn advance_retreat(&mut self, walls: &WallGrid) -> RetreatProgress {
        let (dir, step_now, timed_out) = match &mut self.state {
            WormState::Retreating(r) => {
                let step_now = r.pace.tick();
                let timed_out = r.timeout.as_mut().map_or(false, |t| t.tick());
                (r.dir, step_now, timed_out)
            }
            _ => return RetreatProgress::Continuing,
        };

        if step_now {
            let blocked = self.positions().any(|p| walls.is_wall(p.step(dir)));
            if blocked {
                self.finish_retreat();
                return RetreatProgress::HitWall;
            }
            self.translate_all(dir);
        }

        if timed_out {
            return RetreatProgress::TimedOut;
        }
        RetreatProgress::Continuing
    }

    /// Tick the Moving debounce window; back to Idle when it elapses.
    pub fn tick_debounce(&mut self) {
        if let WormState::Moving(lock) = &mut self.state {
            if lock.tick() || lock.is_done() {
                self.state = WormState::Idle;
            }
        }
    }

    /// Shift head and every segment one step without touching history
    /// (fall drift and retreat translation).
    fn translate_all(&mut self, dir: Direction) {
        self.head = self.head.step(dir);
        for seg in &mut self.segments {
            seg.pos = seg.pos.step(dir);
        }
    }

    /// Wall reached: rebuild both histories from current positions with
    /// a uniform facing, fix the tail, resume input.
    fn finish_retreat(&mut self) {
        let positions: Vec<Pos> = self.positions().collect();
        self.position_history.rebuild(positions);
        self.direction_history
            .rebuild(std::iter::repeat(self.current_direction).take(self.position_history.len()));
        self.update_tail_facing();
        self.state = WormState::Idle;
    }

    fn update_tail_facing(&mut self) {
        let n = self.segments.len();
        if n < 2 {
            return;
        }
        let tail = self.segments[n - 1].pos;
        let before = self.segments[n - 2].pos;
        self.tail_facing = Direction::from_vector(before.x - tail.x, before.y - tail.y);
    }

    // ── History access (step logic and invariant checks) ──

    pub fn history_len(&self) -> usize {
        self.position_history.len()
    }

    pub fn direction_history_len(&self) -> usize {
        self.direction_history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::support::SurfaceLayer;

    fn assert_invariants(w: &Worm) {
        assert_eq!(w.history_len(), w.segments.len() + 1);
        assert_eq!(w.direction_history_len(), w.history_len());
    }

    #[test]
    fn spawn_lays_body_upward() {
        let w = Worm::spawn(Pos::new(5, 5), 3);
        assert_eq!(w.segments.len(), 4); // 3 body + tail
        assert_eq!(w.head, Pos::new(5, 5));
        assert_eq!(w.segments[0].pos, Pos::new(5, 4));
        assert_eq!(w.segments[3].pos, Pos::new(5, 1));
        assert_invariants(&w);
    }

    #[test]
    fn step_drags_body_through_vacated_cells() {
        let mut w = Worm::spawn(Pos::new(5, 5), 2);
        let old_head = w.head;
        w.commit_step(Direction::Down, 2);
        assert_eq!(w.head, Pos::new(5, 6));
        assert_eq!(w.segments[0].pos, old_head);
        assert_invariants(&w);

        w.state = WormState::Idle;
        w.commit_step(Direction::Right, 2);
        assert_eq!(w.head, Pos::new(6, 6));
        assert_eq!(w.segments[0].pos, Pos::new(5, 6));
        assert_eq!(w.segments[1].pos, Pos::new(5, 5));
        assert_invariants(&w);
    }

    #[test]
    fn reverse_detection() {
        let w = Worm::spawn(Pos::new(0, 0), 2);
        assert!(w.is_reverse(Direction::Up)); // travelling Down
        assert!(!w.is_reverse(Direction::Down));
        assert!(!w.is_reverse(Direction::Left));
    }

    #[test]
    fn identical_step_sequences_are_deterministic() {
        let run = || {
            let mut w = Worm::spawn(Pos::new(4, 4), 3);
            for dir in [Direction::Down, Direction::Left, Direction::Down, Direction::Right] {
                w.commit_step(dir, 1);
                w.state = WormState::Idle;
            }
            (w.positions().collect::<Vec<_>>(), w.segments.iter().map(|s| s.sprite).collect::<Vec<_>>())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn grow_duplicates_tail_position() {
        let mut w = Worm::spawn(Pos::new(5, 5), 2);
        let before = w.segments.len();
        let tail_pos = w.segments.last().unwrap().pos;
        w.grow();
        assert_eq!(w.segments.len(), before + 1);
        assert_eq!(w.segments[before - 1].pos, tail_pos);
        assert_eq!(w.segments[before].pos, tail_pos); // tail itself
        assert_invariants(&w);

        // Growing again immediately stays consistent
        w.grow();
        assert_invariants(&w);
    }

    #[test]
    fn corner_sprites_are_diagonal_symmetric() {
        use Direction::*;
        assert_eq!(body_sprite(Up, Left), body_sprite(Right, Down));
        assert_eq!(body_sprite(Up, Right), body_sprite(Left, Down));
        assert_eq!(body_sprite(Down, Left), body_sprite(Right, Up));
        assert_eq!(body_sprite(Down, Right), body_sprite(Left, Up));

        assert_eq!(body_sprite(Up, Left), BodySprite::CornerTopRight);
        assert_eq!(body_sprite(Left, Down), BodySprite::CornerTopLeft);
        assert_eq!(body_sprite(Right, Up), BodySprite::CornerBottomRight);
        assert_eq!(body_sprite(Left, Up), BodySprite::CornerBottomLeft);
    }

    #[test]
    fn straight_sprites_split_by_axis() {
        assert_eq!(body_sprite(Direction::Left, Direction::Left), BodySprite::Horizontal);
        assert_eq!(body_sprite(Direction::Down, Direction::Down), BodySprite::Vertical);
    }

    #[test]
    fn turn_produces_corner_on_first_body_segment() {
        let mut w = Worm::spawn(Pos::new(5, 5), 2);
        w.commit_step(Direction::Down, 1);
        w.state = WormState::Idle;
        w.commit_step(Direction::Left, 1);
        // Segment 0 sits where the turn happened: entered Down, left Left
        assert_eq!(w.segments[0].sprite, BodySprite::CornerBottomRight);
    }

    #[test]
    fn all_unsupported_requires_every_segment_off() {
        let mut layer = SurfaceLayer::new(Pos::new(0, 0), 10, 10);
        layer.set(Pos::new(5, 3), true); // under one body segment only
        let oracle = SupportOracle::new(vec![layer]);
        let w = Worm::spawn(Pos::new(5, 5), 2);
        assert!(!w.all_unsupported(&oracle));

        let bare = SupportOracle::new(vec![SurfaceLayer::new(Pos::new(0, 0), 10, 10)]);
        assert!(w.all_unsupported(&bare));
    }

    #[test]
    fn unconfigured_oracle_means_no_fall() {
        let w = Worm::spawn(Pos::new(5, 5), 2);
        assert!(!w.all_unsupported(&SupportOracle::default()));
    }

    #[test]
    fn fall_grace_elapses_exactly_once() {
        let mut w = Worm::spawn(Pos::new(5, 5), 1);
        w.begin_fall(3, 10);
        assert!(!w.advance_fall());
        assert!(!w.advance_fall());
        assert!(w.advance_fall());
        assert!(!w.advance_fall()); // already elapsed, never fires again
    }

    #[test]
    fn fall_drifts_downward() {
        let mut w = Worm::spawn(Pos::new(5, 5), 1);
        let start = w.head;
        w.begin_fall(10, 2);
        w.advance_fall();
        w.advance_fall(); // drift boundary
        assert_eq!(w.head, start.step(Direction::Down));
    }

    #[test]
    fn retreat_halts_at_wall_preserving_shape() {
        // Wall three steps right of the head
        let mut walls = WallGrid::new(20, 20);
        walls.set_wall(Pos::new(9, 5));

        let mut w = Worm::spawn(Pos::new(5, 5), 2);
        let offsets: Vec<(i32, i32)> =
            w.positions().map(|p| (p.x - w.head.x, p.y - w.head.y)).collect();
        w.begin_retreat(Direction::Right, 1, None);

        let mut outcome = RetreatProgress::Continuing;
        for _ in 0..10 {
            outcome = w.advance_retreat(&walls);
            if outcome != RetreatProgress::Continuing {
                break;
            }
        }
        assert_eq!(outcome, RetreatProgress::HitWall);
        assert_eq!(w.head, Pos::new(8, 5)); // 3 sub-steps, stopped short of the wall
        let after: Vec<(i32, i32)> =
            w.positions().map(|p| (p.x - w.head.x, p.y - w.head.y)).collect();
        assert_eq!(offsets, after);
        assert!(w.can_accept_input());
        assert_invariants(&w);
    }

    #[test]
    fn retreat_without_wall_times_out() {
        let walls = WallGrid::new(50, 50);
        let mut w = Worm::spawn(Pos::new(5, 5), 1);
        w.begin_retreat(Direction::Right, 2, Some(6));

        let mut fired = 0;
        for _ in 0..6 {
            if w.advance_retreat(&walls) == RetreatProgress::TimedOut {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn debounce_returns_to_idle() {
        let mut w = Worm::spawn(Pos::new(5, 5), 1);
        w.commit_step(Direction::Down, 2);
        assert!(!w.can_accept_input());
        w.tick_debounce();
        assert!(!w.can_accept_input());
        w.tick_debounce();
        assert!(w.can_accept_input());
    }
}
