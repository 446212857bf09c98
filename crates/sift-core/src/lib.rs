//! Core sift library (turn engine, conversation store, config).

pub mod config;
pub mod interrupt;
pub mod logging;
pub mod scenario;
pub mod turn;
pub mod viewport;
