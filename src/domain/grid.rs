/// Grid primitives: cell positions and cardinal directions.
///
/// All engine positions are cell coordinates (one cell = one move step).
/// Screen-space y grows downward, so `Direction::Down` is the fall
/// direction.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    /// One step from here in the given direction.
    pub fn step(self, dir: Direction) -> Pos {
        let (dx, dy) = dir.delta();
        Pos { x: self.x + dx, y: self.y + dy }
    }

    /// Offset this position by a raw delta.
    pub fn offset(self, dx: i32, dy: i32) -> Pos {
        Pos { x: self.x + dx, y: self.y + dy }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Snap a raw vector to the nearest cardinal. Ties favor vertical,
    /// matching how the tail facing is derived from segment geometry.
    pub fn from_vector(dx: i32, dy: i32) -> Direction {
        if dx.abs() > dy.abs() {
            if dx > 0 { Direction::Right } else { Direction::Left }
        } else if dy > 0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_cell() {
        let p = Pos::new(3, 4);
        assert_eq!(p.step(Direction::Up), Pos::new(3, 3));
        assert_eq!(p.step(Direction::Down), Pos::new(3, 5));
        assert_eq!(p.step(Direction::Left), Pos::new(2, 4));
        assert_eq!(p.step(Direction::Right), Pos::new(4, 4));
    }

    #[test]
    fn reverse_is_involution() {
        for d in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            assert_eq!(d.reverse().reverse(), d);
            assert_ne!(d.reverse(), d);
        }
    }

    #[test]
    fn vector_snap() {
        assert_eq!(Direction::from_vector(2, 1), Direction::Right);
        assert_eq!(Direction::from_vector(-3, 1), Direction::Left);
        assert_eq!(Direction::from_vector(1, 2), Direction::Down);
        assert_eq!(Direction::from_vector(0, -1), Direction::Up);
        // Tie: vertical wins
        assert_eq!(Direction::from_vector(1, 1), Direction::Down);
    }
}
