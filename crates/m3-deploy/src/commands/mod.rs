pub mod config;
mod deploy;
mod plan;

pub use deploy::*;
pub use plan::*;
