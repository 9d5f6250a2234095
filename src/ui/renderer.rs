/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::block::{BlockKind, BlockState};
use crate::domain::grid::{Direction, Pos};
use crate::domain::tile::Tile;
use crate::domain::worm::{BodySprite, WormState};
use crate::sim::event::FailReason;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 16],  // up to 16 bytes (supports multi-byte emoji)
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// On VTE-based Linux terminals (GNOME Terminal, etc.), the inter-row gap
    /// pixels use the background color from the last Clear or the terminal's
    /// configured default.  By using the SAME explicit RGB for both
    /// `Clear(ClearType::All)` and every cell's background, the gap color
    /// matches the cell color exactly, eliminating visible horizontal lines.
    ///
    /// If your terminal's own background differs from this value, set it to
    /// RGB(18,24,18) in your terminal preferences for a seamless look.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 18 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 { return ""; }
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Each game cell spans 2 terminal columns, so square-ish cells come out
/// of typical terminal fonts.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const WORM_BODY: Color = Color::Rgb { r: 80, g: 210, b: 80 };
const WORM_HEAD: Color = Color::Rgb { r: 180, g: 255, b: 120 };
const WORM_FALLING: Color = Color::Rgb { r: 200, g: 190, b: 90 };
const WORM_RETREAT: Color = Color::Rgb { r: 220, g: 120, b: 255 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 40, b: 24 };
const MSG_FG: Color = Color::Black;
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const BRIGHT: Color = Color::Rgb { r: 80, g: 255, b: 80 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Terminal column of game column 0, centering the map.
    fn map_origin_x(&self, w: &WorldState) -> usize {
        let map_cols = w.width * CELL_W;
        self.term_w.saturating_sub(map_cols) / 2
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        let phase_changed = self.last_phase != Some(world.phase);
        if phase_changed {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        // Build front buffer
        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::LevelIntro => self.compose_level_intro(world),
            Phase::Playing => self.compose_game(world),
            Phase::LevelClear | Phase::LevelFailed => self.compose_level_end(world),
            Phase::GameComplete => self.compose_game_complete(world),
        }

        // Pause overlay (drawn on top of game)
        if world.paused {
            self.compose_pause_overlay(world);
        }

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // IMPORTANT: Do NOT use ResetColor here — it resets to the terminal's
        // native default, which may differ from BASE_BG and cause line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Skip continuation cells (right half of wide glyphs)
                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                // For wide cells, also check if the continuation changed
                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    // Wide char printed: cursor advanced 2 columns
                    last_x = x + 1;
                    x += 2; // skip the continuation cell
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &WorldState) {
        let buf_w = self.front.width;
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::from_char(' ', Color::White, HUD_BG));
        }
        let best = match w.best_score {
            Some(b) => format!("Best:{:<3}", b),
            None => "Best:---".to_string(),
        };
        let gate_status = if w.gate.is_unlocked() { "GATE OPEN!" } else { "" };
        let hud = format!(
            " Garden {}/{}  Time:{:<3}  {}  Len:{:<2}  {} ",
            w.current_level + 1, w.total_levels,
            w.remaining_secs(), best,
            w.worm.segments.len() + 1,
            gate_status,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_message_bar(&mut self, w: &WorldState) {
        let msg_row = MAP_ROW + w.height + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            for x in 0..self.front.width {
                self.front.set(x, msg_row, Cell::from_char(' ', MSG_FG, MSG_BG));
            }
            self.front.put_str(0, msg_row, &msg, MSG_FG, MSG_BG);
        }
    }

    fn compose_map(&mut self, w: &WorldState) {
        let ox = self.map_origin_x(w);
        for gy in 0..w.height {
            let row = MAP_ROW + gy;
            if row >= self.front.height { break; }
            for gx in 0..w.width {
                let col = ox + gx * CELL_W;
                if col + 1 >= self.front.width { break; }
                self.compose_cell(w, gx, gy, col, row);
            }
        }
    }

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_hud(w);
        self.compose_map(w);
        self.compose_message_bar(w);

        // ── Help bar ──
        let help_row = MAP_ROW + w.height + 3;
        if help_row < self.front.height {
            let help = " ←→↑↓/WASD:Move  R:Restart  P:Pause  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Write the visual for game cell (gx, gy) into the front buffer at
    /// (col, row). Each game cell = 2 terminal columns.
    fn compose_cell(&mut self, w: &WorldState, gx: usize, gy: usize, col: usize, row: usize) {
        let pos = Pos::new(gx as i32, gy as i32);

        // Worm (head, then body segments)
        if self.compose_worm_at(w, pos, col, row) {
            return;
        }

        // Blocks (fruit)
        for b in &w.blocks {
            if !b.is_live() || b.pos != pos { continue; }
            let ch = match b.kind {
                BlockKind::Apple => '🍎',
                BlockKind::Berry => '🫐',
            };
            let bg = match b.state {
                // Falling fruit sinks into the void's darkness
                BlockState::Falling(_) => Color::Rgb { r: 8, g: 8, b: 14 },
                _ => Color::Reset,
            };
            self.front.set(col, row, Cell::from_char_wide(ch, Color::Reset, bg));
            self.front.set(col + 1, row, Cell::WIDE_CONT);
            return;
        }

        // Gate
        if w.gate.pos == pos {
            if w.gate.is_unlocked() {
                let blink = (w.tick / 4) % 2 == 0;
                let fg = if blink { GOLD } else { BRIGHT };
                let bg = Color::Rgb { r: 20, g: 60, b: 20 };
                self.front.set(col, row, Cell::from_char('◆', fg, bg));
                self.front.set(col + 1, row, Cell::from_char('◆', fg, bg));
            } else {
                let fg = Color::Rgb { r: 180, g: 80, b: 80 };
                let bg = Color::Rgb { r: 60, g: 20, b: 20 };
                self.front.set(col, row, Cell::from_char('▒', fg, bg));
                self.front.set(col + 1, row, Cell::from_char('▒', fg, bg));
            }
            return;
        }

        self.compose_tile_only(w, gx, gy, col, row);
    }

    /// Render the worm if it occupies `pos`. Returns true if it did.
    fn compose_worm_at(&mut self, w: &WorldState, pos: Pos, col: usize, row: usize) -> bool {
        let worm = &w.worm;
        let color = match worm.state {
            WormState::Falling(_) => WORM_FALLING,
            WormState::Retreating(_) => WORM_RETREAT,
            _ => WORM_BODY,
        };

        if worm.head == pos {
            let head_fg = match worm.state {
                WormState::Falling(_) | WormState::Retreating(_) => color,
                _ => WORM_HEAD,
            };
            let (c0, c1) = match worm.facing {
                Direction::Up => ('▲', '▲'),
                Direction::Down => ('▼', '▼'),
                Direction::Left => ('◀', '═'),
                Direction::Right => ('═', '▶'),
            };
            self.front.set(col, row, Cell::from_char(c0, head_fg, Color::Reset));
            self.front.set(col + 1, row, Cell::from_char(c1, head_fg, Color::Reset));
            return true;
        }

        let last = worm.segments.len().saturating_sub(1);
        for (i, seg) in worm.segments.iter().enumerate() {
            if seg.pos != pos { continue; }
            let (c0, c1) = if i == last {
                // Tapered tail, oriented by its own travel direction
                if worm.tail_facing.is_horizontal() { ('─', '─') } else { ('│', '│') }
            } else {
                match seg.sprite {
                    BodySprite::Horizontal => ('═', '═'),
                    BodySprite::Vertical => ('║', '║'),
                    BodySprite::CornerTopLeft => ('╔', '═'),
                    BodySprite::CornerTopRight => ('═', '╗'),
                    BodySprite::CornerBottomLeft => ('╚', '═'),
                    BodySprite::CornerBottomRight => ('═', '╝'),
                }
            };
            self.front.set(col, row, Cell::from_char(c0, color, Color::Reset));
            self.front.set(col + 1, row, Cell::from_char(c1, color, Color::Reset));
            return true;
        }

        false
    }

    /// Render terrain only (no entities).
    fn compose_tile_only(&mut self, w: &WorldState, gx: usize, gy: usize, col: usize, row: usize) {
        let (c0, c1, fg, bg) = match w.tiles[gy][gx] {
            Tile::Void => (' ', ' ', Color::Reset, Color::Rgb { r: 8, g: 8, b: 14 }),
            Tile::Ground => ('·', ' ', Color::Rgb { r: 60, g: 95, b: 55 }, Color::Rgb { r: 34, g: 52, b: 30 }),
            Tile::Bridge => ('═', '═', Color::Rgb { r: 160, g: 120, b: 60 }, Color::Rgb { r: 45, g: 32, b: 16 }),
            Tile::Wall => ('█', '█', Color::Rgb { r: 110, g: 110, b: 120 }, Color::Rgb { r: 60, g: 60, b: 70 }),
        };
        self.front.set(col, row, Cell::from_char(c0, fg, bg));
        self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
    }

    // ── Static screens (title, level end, etc.) ──

    /// Level intro: progressive map reveal from bottom to top
    fn compose_level_intro(&mut self, w: &WorldState) {
        let tick = w.anim_tick;

        // Constants matching main.rs
        let intro_name_ticks: u32 = 8;
        let intro_row_interval: u32 = 2;

        // How many rows are visible (from bottom of the map)
        let rows_visible = if tick <= intro_name_ticks {
            0
        } else {
            ((tick - intro_name_ticks) / intro_row_interval).min(w.height as u32) as usize
        };

        // Show entities only when all rows revealed
        let show_entities = rows_visible >= w.height;

        self.compose_hud(w);

        // ── Level name display (centered over the map) ──
        let name_row = MAP_ROW + w.height / 2;
        if name_row + 2 < self.front.height && rows_visible < w.height {
            let name = format!(" ◈ {} ◈ ", w.level_name);
            let cx = self.term_w.saturating_sub(name.chars().count()) / 2;
            self.front.put_str(cx, name_row, &name, GOLD, Color::Reset);

            let ready = "▸▸▸ GET READY ◂◂◂";
            let rx = self.term_w.saturating_sub(ready.chars().count()) / 2;
            self.front.put_str(rx, name_row + 2, ready, BRIGHT, Color::Reset);
        }

        // ── Map reveal from bottom ──
        let ox = self.map_origin_x(w);
        for gy in 0..w.height {
            let row = MAP_ROW + gy;
            if row >= self.front.height { break; }

            // Row gy is visible if (height - 1 - gy) < rows_visible
            let from_bottom = w.height - 1 - gy;
            if from_bottom >= rows_visible {
                continue;
            }
            let is_frontier = from_bottom + 1 == rows_visible;

            for gx in 0..w.width {
                let col = ox + gx * CELL_W;
                if col + 1 >= self.front.width { break; }

                if is_frontier {
                    // The freshest row gets a highlight flash
                    let (c0, c1) = match w.tiles[gy][gx] {
                        Tile::Void => (' ', ' '),
                        Tile::Ground => ('▒', '▒'),
                        Tile::Bridge => ('═', '═'),
                        Tile::Wall => ('█', '█'),
                    };
                    let flash_fg = Color::Rgb { r: 180, g: 255, b: 200 };
                    let flash_bg = Color::Rgb { r: 0, g: 55, b: 30 };
                    self.front.set(col, row, Cell::from_char(c0, flash_fg, flash_bg));
                    self.front.set(col + 1, row, Cell::from_char(c1, flash_fg, flash_bg));
                } else if show_entities {
                    self.compose_cell(w, gx, gy, col, row);
                } else {
                    self.compose_tile_only(w, gx, gy, col, row);
                }
            }
        }

        // ── "ENTER to skip" hint ──
        let hint_row = MAP_ROW + w.height + 1;
        if hint_row < self.front.height && rows_visible < w.height {
            self.front.put_str(0, hint_row, " Press ENTER to skip ", Color::DarkGrey, Color::Reset);
        }
    }

    /// Level end: the final board stays visible under a verdict box.
    fn compose_level_end(&mut self, w: &WorldState) {
        self.compose_hud(w);
        self.compose_map(w);

        let cy = MAP_ROW + w.height / 2;
        if cy < 2 || cy + 3 >= self.front.height {
            return;
        }

        let (headline, fg, bg) = match w.phase {
            Phase::LevelClear => (
                "★ GARDEN CLEAR ★".to_string(),
                GOLD,
                Color::Rgb { r: 20, g: 60, b: 20 },
            ),
            _ => {
                let reason = match w.fail_reason {
                    Some(FailReason::BlockFell) => "A fruit fell into the void!",
                    Some(FailReason::WormFellFromGrace) => "The worm tumbled into the void!",
                    Some(FailReason::RetreatTimeout) => "Recoiled for too long!",
                    Some(FailReason::TimeUp) => "Time ran out!",
                    None => "The garden is lost!",
                };
                (
                    format!("✕ {} ✕", reason),
                    Color::Rgb { r: 255, g: 80, b: 80 },
                    Color::Rgb { r: 60, g: 16, b: 16 },
                )
            }
        };

        let detail = match w.phase {
            Phase::LevelClear => {
                let best_note = match w.best_score {
                    Some(b) if w.score <= b => "",
                    _ => "  NEW BEST!",
                };
                format!("Score: {}{}", w.score, best_note)
            }
            _ => String::new(),
        };
        let prompt = match w.phase {
            Phase::LevelClear => "ENTER: Next garden   ESC: Title",
            _ => "ENTER: Retry   ESC: Title",
        };

        let inner = headline
            .chars()
            .count()
            .max(detail.chars().count())
            .max(prompt.chars().count())
            + 4;
        let border_top = format!("╔{}╗", "═".repeat(inner));
        let border_bot = format!("╚{}╝", "═".repeat(inner));
        let boxed = |s: &str| {
            let pad = inner.saturating_sub(s.chars().count());
            let l = pad / 2;
            format!("║{}{}{}║", " ".repeat(l), s, " ".repeat(pad - l))
        };

        let cx = self.term_w.saturating_sub(inner + 2) / 2;
        self.front.put_str(cx, cy - 1, &border_top, fg, bg);
        self.front.put_str(cx, cy, &boxed(&headline), fg, bg);
        if detail.is_empty() {
            self.front.put_str(cx, cy + 1, &boxed(prompt), BRIGHT, bg);
            self.front.put_str(cx, cy + 2, &border_bot, fg, bg);
        } else {
            self.front.put_str(cx, cy + 1, &boxed(&detail), Color::White, bg);
            self.front.put_str(cx, cy + 2, &boxed(prompt), BRIGHT, bg);
            self.front.put_str(cx, cy + 3, &border_bot, fg, bg);
        }
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"   ___  ___  ___  ___   _    _  ___  ___  __  __ ",
            r"  / __|| _ \|_ _||   \ | |  | |/ _ \| _ \|  \/  |",
            r" | (_ ||   / | | | |) || |/\| | (_) |   /| |\/| |",
            r"  \___||_|_\|___||___/ |__/\__|\___/|_|_\|_|  |_|",
        ];

        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "◈◈  A Garden of Hungry Geometry  ◈◈";
        let sx = 2 + (title[1].len().saturating_sub(subtitle.chars().count())) / 2;
        self.front.put_str(sx, 7, subtitle, BRIGHT, Color::Reset);

        // Menu options
        let menu_base = 10;
        let dim = Color::DarkGrey;

        self.front.put_str(8, menu_base, "ENTER   Start", BRIGHT, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset);

        let garden_info = format!("      ⚘ {} gardens", w.total_levels);
        self.front.put_str(8, menu_base + 3, &garden_info, dim, Color::Reset);

        // Controls reference
        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Move the worm",
            "  R  Restart garden    P  Pause",
            "  ESC  Back to title",
            "",
            "Push every fruit to a wall to eat it.",
            "An empty garden opens the gate.",
        ];

        let help_base = menu_base + 5;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        let box_art = [
            "╔═══════════════════════════════════════╗",
            "║  ★ EVERY GARDEN CLEARED · WELL FED ★  ║",
            "╚═══════════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, GOLD, Color::Reset);
        }
        let levels = format!("◈ All {} gardens cleared", w.total_levels);
        self.front.put_str(6, 9, &levels, BRIGHT, Color::Reset);
        self.front.put_str(6, 11, "▸ ENTER / ESC: Back to Title", BRIGHT, Color::Reset);
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let blink = (w.tick / 8) % 2 == 0;

        let box_w = 26_usize.min(self.term_w);
        let box_h = 8_usize.min(self.term_h);
        let box_x = self.term_w.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + w.height.saturating_sub(box_h) / 2;

        // Dark background box
        for y in box_y..(box_y + box_h).min(self.front.height) {
            for x in box_x..(box_x + box_w).min(self.front.width) {
                self.front.set(x, y, Cell::from_char(' ', Color::Reset, dim));
            }
        }

        let hdr = GOLD;
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };

        let pause_label = if blink { "║  ▶  PAUSED  ◀  ║" } else { "║     PAUSED     ║" };
        self.front.put_str(box_x + 4, box_y, "╔════════════════╗", hdr, dim);
        self.front.put_str(box_x + 4, box_y + 1, pause_label, hdr, dim);
        self.front.put_str(box_x + 4, box_y + 2, "╚════════════════╝", hdr, dim);

        let y0 = box_y + 4;
        self.front.put_str(box_x + 3, y0, "P    Resume", key_c, dim);
        self.front.put_str(box_x + 3, y0 + 1, "R    Restart garden", key_c, dim);
        self.front.put_str(box_x + 3, y0 + 2, "ESC  Back to title", key_c, dim);
    }
}
