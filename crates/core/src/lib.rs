pub mod alerts;
pub mod config;
pub mod error;
pub mod filter;
pub mod ids;
pub mod level;
pub mod model;
pub mod query;
pub mod time;

pub use error::{PulseError, Result};
