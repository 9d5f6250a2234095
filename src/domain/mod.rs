//! Pure game rules: no terminal, no clock, no I/O. Everything in here
//! is driven by the fixed-rate tick in `sim::step`.

pub mod block;
pub mod gate;
pub mod grid;
pub mod history;
pub mod sequence;
pub mod support;
pub mod tile;
pub mod worm;
