//! Application wiring

pub mod state;
pub mod stats;

pub use state::AppState;
