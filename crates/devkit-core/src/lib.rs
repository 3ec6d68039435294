pub mod config;
pub mod error;
pub mod exchange;
pub mod history;
pub mod io;
pub mod logscan;
pub mod paths;
pub mod risk;
pub mod runner;
pub mod snippet;
pub mod store;
pub mod types;
pub mod workspace;

pub use error::{DevkitError, Result};
