//! Tick simulation of cultivation zones.
//!
//! Each tick, every zone applies the vapour its plants transpired during the previous
//! tick, aggregates its device effects, drifts toward the ambient air and then grows,
//! stresses and develops every plant it holds before booking their transpiration against
//! its reservoirs.

pub mod analysis;
pub mod controller;
pub mod devices;
pub mod environment;
pub mod error;
pub mod events;
pub mod feedback;
pub mod growth;
pub mod logger;
pub mod phenology;
pub mod physics;
pub mod resources;
pub mod scenario;
pub mod simulation;

pub use error::GrowzoneError;
pub use simulation::{builder::SimulationBuilder, engine::SimulationEngine};
