/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::grid::Direction;
use sim::event::GameEvent;
use sim::level::{level_names, load_level};
use sim::score::HighScores;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let mut world = WorldState::new();
    world.speed = config.speed.clone();
    world.total_levels = level_names(&config).len();

    let mut scores = HighScores::load();

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config, &mut scores);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Gridworm!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    scores: &mut HighScores,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    let mut prev_intro_rows: usize = 0;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, &gp, config, scores) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            // Pause blocks simulation; only the message timer keeps running
            if world.paused {
                if world.message_timer > 0 {
                    world.message_timer -= 1;
                    if world.message_timer == 0 { world.message.clear(); }
                }
                last_tick = Instant::now();
            } else {
                match world.phase {
                    Phase::Playing => {
                        let input = detect_movement(&kb, &gp);
                        let events = step::step(world, input);
                        process_events(world, sound, scores, &events);
                    }
                    Phase::LevelIntro => {
                        tick_level_intro(world);
                        if let Some(sfx) = sound {
                            let rows_visible = calc_intro_rows_visible(world);
                            if rows_visible > prev_intro_rows && rows_visible <= world.height {
                                sfx.play_intro_blip(rows_visible, world.height);
                            }
                            prev_intro_rows = rows_visible;
                        }
                    }
                    Phase::LevelClear | Phase::LevelFailed => {
                        world.anim_tick += 1;
                        prev_intro_rows = 0;
                    }
                    _ => {}
                }

                // Message timer runs in every non-playing phase too
                if world.phase != Phase::Playing && world.message_timer > 0 {
                    world.message_timer -= 1;
                    if world.message_timer == 0 { world.message.clear(); }
                }

                last_tick = Instant::now();
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn calc_intro_rows_visible(world: &WorldState) -> usize {
    let tick = world.anim_tick;
    if tick <= INTRO_NAME_TICKS {
        0
    } else {
        ((tick - INTRO_NAME_TICKS) / INTRO_ROW_INTERVAL).min(world.height as u32) as usize
    }
}

/// Map simulation events onto sounds, and bank the score on a win.
fn process_events(
    world: &mut WorldState,
    sound: Option<&SoundEngine>,
    scores: &mut HighScores,
    events: &[GameEvent],
) {
    for event in events {
        if let GameEvent::WinTriggered = event {
            // Freeze the standing best for the verdict box, then record.
            let level = world.current_level;
            world.best_score = scores.best(level);
            scores.record(level, world.score);
        }
    }

    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::BlockPushed { .. } => sfx.play_push(),
            GameEvent::BlockConsumed { .. } => sfx.play_eat(),
            GameEvent::GateUnlocked => sfx.play_unlock(),
            GameEvent::WormFallStart | GameEvent::BlockFallStart { .. } => sfx.play_fall(),
            GameEvent::LevelFailed(_) => sfx.play_lose(),
            GameEvent::WinTriggered => sfx.play_win(),
            _ => {}
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

fn detect_movement(kb: &InputState, gp: &GamepadState) -> Option<Direction> {
    if kb.any_held(KEYS_UP) || kb.any_pressed(KEYS_UP) || gp.up_held() {
        Some(Direction::Up)
    } else if kb.any_held(KEYS_DOWN) || kb.any_pressed(KEYS_DOWN) || gp.down_held() {
        Some(Direction::Down)
    } else if kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held() {
        Some(Direction::Left)
    } else if kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held() {
        Some(Direction::Right)
    } else {
        None
    }
}

/// Reset to title screen, preserving config-derived state.
fn return_to_title(world: &mut WorldState) {
    let speed = world.speed.clone();
    let total = world.total_levels;
    *world = WorldState::new();
    world.speed = speed;
    world.total_levels = total;
    world.paused = false;
    world.phase = Phase::Title;
}

/// Load a level and pull in its standing best score.
fn enter_level(world: &mut WorldState, level: usize, config: &GameConfig, scores: &HighScores) {
    load_level(world, level, config);
    world.best_score = scores.best(level);
}

fn handle_meta(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    config: &GameConfig,
    scores: &mut HighScores,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    // ── Pause handling (Playing only) ──
    if world.phase == Phase::Playing || world.paused {
        if kb.any_pressed(KEYS_PAUSE) {
            world.paused = !world.paused;
            return false;
        }
        if world.paused {
            if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                world.paused = false;
                step::restart_level(world);
                return false;
            }
            if esc {
                world.paused = false;
                return_to_title(world);
                return false;
            }
            return false; // Block all other input while paused
        }
    }

    match world.phase {
        // ── Title Screen ──
        Phase::Title => {
            if confirm {
                enter_level(world, 0, config, scores);
            } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) || esc {
                return true;
            }
        }

        // ── Level Intro ──
        Phase::LevelIntro => {
            if confirm {
                world.phase = Phase::Playing;
                world.anim_tick = 0;
            } else if esc {
                return_to_title(world);
            }
        }

        // ── Playing ──
        Phase::Playing => {
            if esc {
                return_to_title(world);
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                step::restart_level(world);
            }
        }

        // ── Level Clear ──
        Phase::LevelClear => {
            if confirm {
                enter_level(world, world.current_level + 1, config, scores);
            } else if esc {
                return_to_title(world);
            }
        }

        // ── Level Failed ──
        Phase::LevelFailed => {
            if confirm || kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                step::restart_level(world);
            } else if esc {
                return_to_title(world);
            }
        }

        // ── Game Complete ──
        Phase::GameComplete => {
            if confirm || esc {
                return_to_title(world);
            }
        }
    }

    false
}

// ── Animation tick functions ──

const INTRO_NAME_TICKS: u32 = 8;
const INTRO_ROW_INTERVAL: u32 = 2;

fn tick_level_intro(world: &mut WorldState) {
    world.anim_tick += 1;
    let total = INTRO_NAME_TICKS + world.height as u32 * INTRO_ROW_INTERVAL + 4;
    if world.anim_tick >= total {
        world.phase = Phase::Playing;
        world.anim_tick = 0;
    }
}
