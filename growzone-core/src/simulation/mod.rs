pub mod builder;
pub mod engine;
pub mod state;
mod zone;
