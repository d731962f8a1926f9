pub mod case_study;
pub mod config;
pub mod error;
pub mod eval;
pub mod generate;
pub mod listings;
pub mod ranking;
pub mod schools;

pub use config::Config;
pub use error::{PropevalError, Result};
