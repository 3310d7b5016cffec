//! Claims analytics: filter a loaded claim dataset, group it, and derive the
//! summary series each dashboard tab renders.

pub mod aggregate;
pub mod claims;
pub mod dashboard;
pub mod data;
pub mod filter;
pub mod logging;
pub mod state;
pub mod synth;
