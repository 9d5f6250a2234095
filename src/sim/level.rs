/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by name)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Line 1: `# Level Name`   (hash, space, name)
///   Lines: map rows
///
/// ## Tile legend:
///   '#' = Wall (impassable)     '.' = Ground (floor)
///   '~' = Bridge (second floor layer)
///   ' ' = Void (enterable, nothing to stand on)
///   'a' = Apple block            'b' = Berry block
///   'G' = Win gate               'P' = Worm head spawn
///
/// Entity cells ('a', 'b', 'G', 'P') imply ground beneath them. The
/// worm's body spawns in the cells above 'P', so maps keep that column
/// walkable.

use std::path::Path;

use crate::config::GameConfig;
use crate::domain::block::{BlockKind, PushableBlock};
use crate::domain::grid::Pos;
use crate::domain::gate::WinGate;
use crate::domain::sequence::Countdown;
use crate::domain::support::{SupportOracle, SurfaceLayer, WallGrid};
use crate::domain::tile::Tile;
use crate::domain::worm::Worm;
use crate::sim::world::{Phase, WorldState};

/// Runtime level data (owned strings, loaded from file or embedded).
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load a level into the world state.
pub fn load_level(world: &mut WorldState, level_idx: usize, config: &GameConfig) {
    let levels = load_all(config);

    if level_idx >= levels.len() {
        world.phase = Phase::GameComplete;
        return;
    }

    let def = &levels[level_idx];
    world.current_level = level_idx;
    world.total_levels = levels.len();
    world.level_name = def.name.clone();

    apply_def(world, def);

    world.phase = Phase::LevelIntro;
    world.anim_tick = 0;
    world.set_message(&def.name, 80);
}

/// Names of all available levels, for the HUD.
pub fn level_names(config: &GameConfig) -> Vec<String> {
    load_all(config).iter().map(|l| l.name.clone()).collect()
}

/// Rebuild the world's terrain and entities from a parsed level.
/// Uses the speed config already installed on the world.
pub fn apply_def(world: &mut WorldState, def: &LevelDef) {
    let height = def.rows.len();
    let width = def.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    world.width = width;
    world.height = height;
    world.tiles = vec![vec![Tile::Void; width]; height];
    world.walls = WallGrid::new(width, height);

    let origin = Pos::new(0, 0);
    let mut ground = SurfaceLayer::new(origin, width, height);
    let mut bridges = SurfaceLayer::new(origin, width, height);
    let mut blocks: Vec<PushableBlock> = vec![];
    let mut spawn = Pos::new(1, 1);
    // No 'G' in the map leaves the gate out of reach
    let mut gate_pos = Pos::new(-1, -1);

    for (y, row) in def.rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let pos = Pos::new(x as i32, y as i32);
            match ch {
                '#' => {
                    world.tiles[y][x] = Tile::Wall;
                    world.walls.set_wall(pos);
                }
                '.' => {
                    world.tiles[y][x] = Tile::Ground;
                    ground.set(pos, true);
                }
                '~' => {
                    world.tiles[y][x] = Tile::Bridge;
                    bridges.set(pos, true);
                }
                'a' | 'b' => {
                    world.tiles[y][x] = Tile::Ground;
                    ground.set(pos, true);
                    let kind = if ch == 'a' { BlockKind::Apple } else { BlockKind::Berry };
                    blocks.push(PushableBlock::new(pos, kind));
                }
                'G' => {
                    world.tiles[y][x] = Tile::Ground;
                    ground.set(pos, true);
                    gate_pos = pos;
                }
                'P' => {
                    world.tiles[y][x] = Tile::Ground;
                    ground.set(pos, true);
                    spawn = pos;
                }
                _ => {}
            }
        }
    }

    world.oracle = SupportOracle::new(vec![ground, bridges]);
    world.worm = Worm::spawn(spawn, world.speed.initial_body as usize);
    world.worm_spawn = spawn;
    world.base_blocks = blocks.clone();
    world.blocks = blocks;
    world.gate = WinGate::new(gate_pos);
    world.gate_was_unlocked = false;
    world.pending_dir = None;
    world.fail_reason = None;
    world.timer = Countdown::new(world.level_time_ticks());
    world.tick = 0;
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

fn load_all(config: &GameConfig) -> Vec<LevelDef> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let mut found = load_from_directory(dir);
        if !found.is_empty() {
            found.sort_by(|a, b| a.0.cmp(&b.0));
            return found.into_iter().map(|(_, def)| def).collect();
        }
    }
    embedded_levels()
}

fn load_from_directory(dir: &Path) -> Vec<(String, LevelDef)> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return results,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            if let Ok(content) = std::fs::read_to_string(&path) {
                if let Some(def) = parse_level_file(&content) {
                    let filename = path.file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string();
                    results.push((filename, def));
                }
            }
        }
    }

    results
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
fn parse_level_file(content: &str) -> Option<LevelDef> {
    let mut name = String::new();
    let mut rows = vec![];

    for line in content.lines() {
        if name.is_empty() && line.starts_with("# ") {
            // `# Name` is a title; a map row is a dense `#####...` run
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.to_string());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if rows.is_empty() {
        return None;
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    if name.is_empty() {
        name = "Unnamed Garden".to_string();
    }

    Some(LevelDef { name, rows })
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Garden 1 - First Bite", &[
            "################",
            "#..............#",
            "#..............#",
            "#..............#",
            "#..............#",
            "#....P.....a...#",
            "#..............#",
            "#.......G......#",
            "#..............#",
            "#..............#",
            "#..............#",
            "################",
        ]),
        make_embedded("Garden 2 - Over the Gap", &[
            "################",
            "#..............#",
            "#..............#",
            "#..............#",
            "#...P..........#",
            "#..............#",
            "#....    ......#",
            "#....~~~~......#",
            "#....    ..b...#",
            "#..............#",
            "#......G.......#",
            "################",
        ]),
        make_embedded("Garden 3 - Twin Fruit", &[
            "################",
            "#..............#",
            "#.....a........#",
            "#..............#",
            "#..P...........#",
            "#..............#",
            "#..........b...#",
            "#..............#",
            "#....~~~.......#",
            "#....~.~...G...#",
            "#..............#",
            "################",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_line_and_pads_rows() {
        let def = parse_level_file("# Test Garden\n####\n#P.\n####\n").unwrap();
        assert_eq!(def.name, "Test Garden");
        assert_eq!(def.rows.len(), 3);
        assert_eq!(def.rows[1].chars().count(), 4); // padded with void
    }

    #[test]
    fn dense_wall_rows_are_not_mistaken_for_titles() {
        let def = parse_level_file("####\n#P.#\n####\n").unwrap();
        assert_eq!(def.name, "Unnamed Garden");
        assert_eq!(def.rows.len(), 3);
    }

    #[test]
    fn apply_def_builds_terrain_and_entities() {
        let def = LevelDef {
            name: "t".into(),
            rows: vec![
                "#######".into(),
                "#.....#".into(),
                "#.....#".into(),
                "#.....#".into(),
                "#.aP~ #".into(),
                "#..G..#".into(),
                "#######".into(),
            ],
        };
        let mut world = WorldState::new();
        apply_def(&mut world, &def);

        assert_eq!(world.width, 7);
        assert_eq!(world.height, 7);
        assert!(world.walls.is_wall(Pos::new(0, 0)));
        assert!(!world.walls.is_wall(Pos::new(1, 1)));
        assert_eq!(world.worm.head, Pos::new(3, 4));
        assert_eq!(world.gate.pos, Pos::new(3, 5));
        assert_eq!(world.blocks.len(), 1);
        assert_eq!(world.blocks[0].pos, Pos::new(2, 4));

        // Ground, bridge, and entity cells are all supported; void is not
        assert!(world.oracle.is_supported(Pos::new(2, 4)));
        assert!(world.oracle.is_supported(Pos::new(4, 4)));
        assert!(!world.oracle.is_supported(Pos::new(5, 4)));
    }

    #[test]
    fn embedded_levels_all_have_spawn_room_and_gate() {
        for def in embedded_levels() {
            let mut world = WorldState::new();
            apply_def(&mut world, &def);
            assert!(world.gate.pos.x >= 0, "{} has no gate", def.name);
            assert!(!world.blocks.is_empty(), "{} has no blocks", def.name);
            // The spawned body column must be supported
            for p in world.worm.positions() {
                assert!(world.oracle.is_supported(p), "{} spawn unsupported", def.name);
                assert!(!world.walls.is_wall(p), "{} spawn inside wall", def.name);
            }
        }
    }
}
