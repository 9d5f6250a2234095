/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Void,   // no ground — anything resting here is over the abyss
    Ground, // base support layer
    Bridge, // second support layer (planks laid over the void)
    Wall,   // impassable, and what blocks are crushed against
}

impl Tile {
    /// Does this tile belong to the base support layer?
    pub fn is_ground(self) -> bool {
        matches!(self, Tile::Ground)
    }

    /// Does this tile belong to the bridge support layer?
    pub fn is_bridge(self) -> bool {
        matches!(self, Tile::Bridge)
    }

    /// Does this tile block movement (and crush pushed blocks)?
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Can an entity occupy this cell? Walls are the only terrain that
    /// refuses entry — void is enterable (and then you fall).
    pub fn is_passable(self) -> bool {
        !self.is_wall()
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Void
    }
}
