/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub move_debounce_ticks: u32,   // input lockout after each committed step
    pub fall_grace_ticks: u32,      // how long the worm dangles before the loss
    pub fall_drift_ticks: u32,      // visual downward drift interval while falling
    pub block_fall_ticks: u32,      // falling block → BlockFell after this many ticks
    pub retreat_step_ticks: u32,    // ticks between forced-retreat sub-steps
    pub retreat_timeout_ticks: u32, // 0 = retreat may run forever
    pub level_time_secs: u32,
    pub initial_body: u32,          // body segments at spawn (tail not included)
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_move_debounce")]
    move_debounce_ticks: u32,
    #[serde(default = "default_fall_grace")]
    fall_grace_ticks: u32,
    #[serde(default = "default_fall_drift")]
    fall_drift_ticks: u32,
    #[serde(default = "default_block_fall")]
    block_fall_ticks: u32,
    #[serde(default = "default_retreat_step")]
    retreat_step_ticks: u32,
    #[serde(default = "default_retreat_timeout")]
    retreat_timeout_ticks: u32,
    #[serde(default = "default_level_time")]
    level_time_secs: u32,
    #[serde(default = "default_initial_body")]
    initial_body: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 75 }
fn default_move_debounce() -> u32 { 2 }
fn default_fall_grace() -> u32 { 33 }     // ~2.5s at 75ms tick
fn default_fall_drift() -> u32 { 4 }
fn default_block_fall() -> u32 { 20 }     // ~1.5s before BlockFell
fn default_retreat_step() -> u32 { 2 }
fn default_retreat_timeout() -> u32 { 80 } // ~6s, 0 disables
fn default_level_time() -> u32 { 60 }
fn default_initial_body() -> u32 { 2 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into(), "B".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            move_debounce_ticks: default_move_debounce(),
            fall_grace_ticks: default_fall_grace(),
            fall_drift_ticks: default_fall_drift(),
            block_fall_ticks: default_block_fall(),
            retreat_step_ticks: default_retreat_step(),
            retreat_timeout_ticks: default_retreat_timeout(),
            level_time_secs: default_level_time(),
            initial_body: default_initial_body(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();

        let toml_cfg = load_toml(&search_dirs);

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms,
                move_debounce_ticks: toml_cfg.speed.move_debounce_ticks,
                fall_grace_ticks: toml_cfg.speed.fall_grace_ticks,
                fall_drift_ticks: toml_cfg.speed.fall_drift_ticks,
                block_fall_ticks: toml_cfg.speed.block_fall_ticks,
                retreat_step_ticks: toml_cfg.speed.retreat_step_ticks,
                retreat_timeout_ticks: toml_cfg.speed.retreat_timeout_ticks,
                level_time_secs: toml_cfg.speed.level_time_secs,
                initial_body: toml_cfg.speed.initial_body,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
            },
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/gridworm → /usr/games/gridworm
        // still finds data relative to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/gridworm)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gridworm");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/gridworm)
    let sys = PathBuf::from("/usr/share/gridworm");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
