//! Shared value types used across the window core.

pub mod window_state;

pub use window_state::Geometry;
