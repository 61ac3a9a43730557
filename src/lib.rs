pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::process::SystemRunner;
pub use config::{CliConfig, ResolvedConfig};
pub use core::{
    plan::build_plan,
    provisioner::{ProvisionEngine, RunFailure},
};
pub use utils::error::{ProvisionError, Result};
