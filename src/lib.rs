pub mod config;
pub mod disburse;
pub mod error;
pub mod funding;
pub mod models;
pub mod round;
pub mod source;
pub mod voting;

pub use error::{SplitError, SplitResult};
