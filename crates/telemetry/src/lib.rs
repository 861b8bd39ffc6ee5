mod config;
mod health;
pub mod panel;
pub mod poll;
mod task;

pub use config::*;
pub use health::*;
pub use task::*;
