pub mod config;
pub mod display;
pub mod error;
pub mod types;

pub use config::ArogyaConfig;
pub use error::{ArogyaError, Result};
pub use types::*;
