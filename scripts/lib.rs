//! Deploys the regression contract and calls it once with the sample
//! observations.

pub mod config;
pub mod runner;
pub mod toolchain;

pub use config::{parse_config, Network, RunnerConfig};
pub use runner::{report, run, ContractToolchain, RegressionInput, RunnerError, CONTRACT_NAME};
pub use toolchain::MidenToolchain;
