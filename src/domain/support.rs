/// Ground truth for "is this position over something?"
///
/// Two distinct concepts:
///   1. SUPPORT — layered surface maps; a position is supported when
///      ANY layer has an occupied cell there. Read-only after level
///      load, no side effects.
///   2. WALLS — the obstacle grid; blocks movement and crushes pushed
///      blocks. Queried separately from support.
///
/// An oracle with no layers answers "not supported" for everything.
/// That state means "no surface data yet", not "everything falls" —
/// callers check `is_configured()` before starting fall logic, so an
/// initialization race never produces a spurious loss.

use super::grid::Pos;

/// One surface layer: a boolean occupancy grid anchored at `origin`.
#[derive(Clone, Debug)]
pub struct SurfaceLayer {
    origin: Pos,
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl SurfaceLayer {
    pub fn new(origin: Pos, width: usize, height: usize) -> Self {
        SurfaceLayer {
            origin,
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub fn set(&mut self, pos: Pos, occupied: bool) {
        if let Some(idx) = self.index_of(pos) {
            self.cells[idx] = occupied;
        }
    }

    /// World position → this layer's cell, then occupancy.
    /// Outside the layer's extent is always unoccupied.
    pub fn has_tile(&self, pos: Pos) -> bool {
        self.index_of(pos).map_or(false, |idx| self.cells[idx])
    }

    fn index_of(&self, pos: Pos) -> Option<usize> {
        let cx = pos.x - self.origin.x;
        let cy = pos.y - self.origin.y;
        if cx < 0 || cy < 0 || cx as usize >= self.width || cy as usize >= self.height {
            return None;
        }
        Some(cy as usize * self.width + cx as usize)
    }
}

/// The support oracle: answers `is_supported` across all layers.
#[derive(Clone, Debug, Default)]
pub struct SupportOracle {
    layers: Vec<SurfaceLayer>,
}

impl SupportOracle {
    pub fn new(layers: Vec<SurfaceLayer>) -> Self {
        SupportOracle { layers }
    }

    /// Have any surface layers been assigned yet?
    pub fn is_configured(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Is `pos` over an occupied cell of ANY layer?
    /// An unconfigured oracle returns false for every position.
    pub fn is_supported(&self, pos: Pos) -> bool {
        self.layers.iter().any(|layer| layer.has_tile(pos))
    }
}

/// The wall/obstacle grid. Separate from support: a wall blocks entry,
/// void does not (entering void is what starts a fall).
#[derive(Clone, Debug, Default)]
pub struct WallGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl WallGrid {
    pub fn new(width: usize, height: usize) -> Self {
        WallGrid {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub fn set_wall(&mut self, pos: Pos) {
        if let Some(idx) = self.index_of(pos) {
            self.cells[idx] = true;
        }
    }

    /// Is there a wall at `pos`? Outside the grid counts as open —
    /// the void past the map edge is fallable, not walled.
    pub fn is_wall(&self, pos: Pos) -> bool {
        self.index_of(pos).map_or(false, |idx| self.cells[idx])
    }

    fn index_of(&self, pos: Pos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.width || pos.y as usize >= self.height {
            return None;
        }
        Some(pos.y as usize * self.width + pos.x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer_from(rows: &[&str], origin: Pos) -> SurfaceLayer {
        let h = rows.len();
        let w = rows[0].len();
        let mut layer = SurfaceLayer::new(origin, w, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    layer.set(origin.offset(x as i32, y as i32), true);
                }
            }
        }
        layer
    }

    #[test]
    fn unconfigured_oracle_supports_nothing() {
        let oracle = SupportOracle::default();
        assert!(!oracle.is_configured());
        assert!(!oracle.is_supported(Pos::new(0, 0)));
    }

    #[test]
    fn single_layer_lookup() {
        let oracle = SupportOracle::new(vec![layer_from(&["## ", " # "], Pos::new(0, 0))]);
        assert!(oracle.is_configured());
        assert!(oracle.is_supported(Pos::new(0, 0)));
        assert!(oracle.is_supported(Pos::new(1, 1)));
        assert!(!oracle.is_supported(Pos::new(2, 0)));
        assert!(!oracle.is_supported(Pos::new(0, 1)));
    }

    #[test]
    fn any_layer_wins() {
        let base = layer_from(&["#  "], Pos::new(0, 0));
        let bridge = layer_from(&["  #"], Pos::new(0, 0));
        let oracle = SupportOracle::new(vec![base, bridge]);
        assert!(oracle.is_supported(Pos::new(0, 0)));
        assert!(oracle.is_supported(Pos::new(2, 0)));
        assert!(!oracle.is_supported(Pos::new(1, 0)));
    }

    #[test]
    fn layer_origin_shifts_cells() {
        let oracle = SupportOracle::new(vec![layer_from(&["#"], Pos::new(5, 7))]);
        assert!(oracle.is_supported(Pos::new(5, 7)));
        assert!(!oracle.is_supported(Pos::new(0, 0)));
    }

    #[test]
    fn outside_extent_is_unsupported() {
        let oracle = SupportOracle::new(vec![layer_from(&["#"], Pos::new(0, 0))]);
        assert!(!oracle.is_supported(Pos::new(-1, 0)));
        assert!(!oracle.is_supported(Pos::new(0, 1)));
    }

    #[test]
    fn walls_are_bounded() {
        let mut walls = WallGrid::new(3, 2);
        walls.set_wall(Pos::new(2, 1));
        assert!(walls.is_wall(Pos::new(2, 1)));
        assert!(!walls.is_wall(Pos::new(0, 0)));
        // Off the edge of the map is open space, not wall
        assert!(!walls.is_wall(Pos::new(-1, 0)));
        assert!(!walls.is_wall(Pos::new(3, 0)));
    }
}
