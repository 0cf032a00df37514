//! HTTP command surface for the longbox comic monitor.

pub mod api;
pub mod metrics;
pub mod state;
