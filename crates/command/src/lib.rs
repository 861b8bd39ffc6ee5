//! The "Actions" side of the dashboard: the operator's command palette and
//! everything needed to turn a button press into a backend request.

mod arm;
mod capability;
mod config;
mod error;
mod input;
mod mode;
pub mod panel;
mod request;
mod task;

pub use arm::*;
pub use capability::*;
pub use config::*;
pub use error::*;
pub use input::*;
pub use mode::*;
pub use request::*;
pub use task::*;
