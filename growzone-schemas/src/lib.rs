//! Serializable data types shared by the growzone simulation crates.

pub mod command;
pub mod config;
pub mod device;
pub mod environment;
pub mod event;
pub mod file_formats;
pub mod plant;
pub mod strain;
