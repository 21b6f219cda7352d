//! Area Remote
//!
//! Client side of a remote window display: every window announced by the
//! server gets a local counterpart whose metadata, pixels and lossless
//! repairs are driven from the packets it receives.

pub mod config;
pub mod error;
pub mod input;
pub mod ipc;
pub mod platform;
pub mod scheduler;
pub mod session;
pub mod shared;
pub mod window;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Result, WindowError};
pub use session::{Session, SessionEvent};
pub use window::{ClientWindow, WindowSettings};
