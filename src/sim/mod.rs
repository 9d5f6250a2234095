//! Simulation: world state, the per-tick step function, level
//! loading, and score persistence.

pub mod event;
pub mod level;
pub mod score;
pub mod step;
pub mod world;
