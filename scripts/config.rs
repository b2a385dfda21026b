use std::{ffi::OsString, path::PathBuf};

use anyhow::Context;
use clap::{error::ErrorKind, Parser, ValueEnum};
use helpers::ClientConfig;
use miden_client::rpc::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    Testnet,
    Devnet,
    Localhost,
}

impl Network {
    pub fn endpoint(self) -> Endpoint {
        match self {
            Network::Testnet => Endpoint::testnet(),
            Network::Devnet => Endpoint::devnet(),
            Network::Localhost => Endpoint::localhost(),
        }
    }
}

/// Deploy the regression contract and run it on the sample observations
#[derive(Debug, Clone, Parser)]
#[command(name = "deploy_regression")]
#[command(version)]
pub struct RunnerConfig {
    /// Network to deploy to
    #[arg(long, env = "REGRESSION_NETWORK", value_enum, default_value = "testnet")]
    pub network: Network,

    /// RPC endpoint URL, overrides --network
    #[arg(long, env = "REGRESSION_RPC_URL")]
    pub rpc_url: Option<String>,

    /// RPC timeout in milliseconds
    #[arg(long, default_value = "10000")]
    pub timeout_ms: u64,

    /// Client sqlite store
    #[arg(long, default_value = "./store.sqlite3")]
    pub store_path: PathBuf,

    /// Filesystem keystore directory
    #[arg(long, default_value = "./keystore")]
    pub keystore_path: PathBuf,

    /// Directory holding the Miden contract projects
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/../contracts"))]
    pub contracts_dir: PathBuf,

    /// Build contracts with the debug profile
    #[arg(long)]
    pub debug_build: bool,
}

impl RunnerConfig {
    pub fn endpoint(&self) -> anyhow::Result<Endpoint> {
        match &self.rpc_url {
            Some(url) => Endpoint::try_from(url.as_str())
                .map_err(|e| anyhow::anyhow!("{e}"))
                .with_context(|| format!("invalid RPC URL `{url}`")),
            None => Ok(self.network.endpoint()),
        }
    }

    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        Ok(ClientConfig {
            endpoint: self.endpoint()?,
            timeout_ms: self.timeout_ms,
            store_path: self.store_path.clone(),
            keystore_path: self.keystore_path.clone(),
        })
    }
}

/// Parses the command line, printing clap's output on failure.
///
/// `Err` carries the exit status: 0 after `--help` or `--version`, 1 for any
/// invalid flag or environment value.
pub fn parse_config<I, T>(args: I) -> Result<RunnerConfig, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    RunnerConfig::try_parse_from(args).map_err(|err| {
        // nothing sensible to do if stdout/stderr is gone
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_without_flags() {
        let config = RunnerConfig::try_parse_from(["deploy_regression"]).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.store_path, PathBuf::from("./store.sqlite3"));
        assert!(config.contracts_dir.ends_with("contracts"));
        assert!(!config.debug_build);
    }

    #[test]
    fn flags_override_defaults() {
        let config = RunnerConfig::try_parse_from([
            "deploy_regression",
            "--network",
            "localhost",
            "--timeout-ms",
            "500",
            "--debug-build",
        ])
        .unwrap();
        assert_eq!(config.network, Network::Localhost);
        assert_eq!(config.timeout_ms, 500);
        assert!(config.debug_build);
    }

    #[test]
    fn invalid_flags_exit_with_one() {
        assert_eq!(
            parse_config(["deploy_regression", "--network", "mainnet"]).err(),
            Some(1)
        );
        assert_eq!(
            parse_config(["deploy_regression", "--timeout-ms", "soon"]).err(),
            Some(1)
        );
        assert_eq!(parse_config(["deploy_regression", "--no-such-flag"]).err(), Some(1));
    }

    #[test]
    fn help_and_version_exit_with_zero() {
        assert_eq!(parse_config(["deploy_regression", "--help"]).err(), Some(0));
        assert_eq!(parse_config(["deploy_regression", "--version"]).err(), Some(0));
    }
}
