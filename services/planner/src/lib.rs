pub mod adapters;
pub mod backup;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod render;
