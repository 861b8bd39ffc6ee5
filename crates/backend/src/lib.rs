//! Access to the ground-station backend. Every HTTP request made by the
//! dashboard goes through [`BackendClient`], which is built from a single
//! [`BackendConfig`].

mod client;
mod config;
mod error;

#[cfg(feature = "mock")]
pub mod mock;

pub use client::*;
pub use config::*;
pub use error::*;
