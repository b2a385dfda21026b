use std::io::Write;

use regression::{Coefficients, Matrix, RegressionError};
use tracing::{error, info};

/// Contract deployed by the runner
pub const CONTRACT_NAME: &str = "regression-account";

const SAMPLE_MATRIX: [[i64; 2]; 6] = [[43, 1], [21, 1], [25, 1], [42, 1], [57, 1], [59, 1]];
const SAMPLE_VECTOR: [i64; 6] = [99, 65, 79, 75, 87, 81];

/// Observations passed to `multiple_linear_regression`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressionInput {
    pub matrix: Matrix,
    pub vector: Vec<i64>,
}

impl RegressionInput {
    /// The fixed observations the deploy script runs with
    pub fn sample() -> Result<Self, RegressionError> {
        Ok(Self {
            matrix: Matrix::from_rows(&SAMPLE_MATRIX)?,
            vector: SAMPLE_VECTOR.to_vec(),
        })
    }
}

/// Contract factory provider and deployed contract handle.
///
/// Each method is one await point of the deploy sequence; errors are opaque
/// to the runner.
#[allow(async_fn_in_trait)]
pub trait ContractToolchain {
    type Factory;
    type Contract;

    async fn get_contract_factory(&mut self, name: &str) -> anyhow::Result<Self::Factory>;

    async fn deploy(&mut self, factory: &Self::Factory) -> anyhow::Result<Self::Contract>;

    /// Resolves once the toolchain accepts the deployment; what that proves
    /// depends on the network
    async fn deployed(&mut self, contract: &Self::Contract) -> anyhow::Result<()>;

    async fn multiple_linear_regression(
        &mut self,
        contract: &Self::Contract,
        matrix: &Matrix,
        vector: &[i64],
    ) -> anyhow::Result<Coefficients>;
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Stage of the deploy sequence that failed
#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    #[error("failed to get contract factory for `{name}`")]
    FactoryLookup {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to deploy `{name}`")]
    Deploy {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("`{name}` was not confirmed as deployed")]
    Deployment {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("call to `{name}`.multiple_linear_regression failed")]
    Invoke {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Looks up the factory, deploys, waits for the deployment and calls
/// `multiple_linear_regression` exactly once. Stops at the first error.
pub async fn run<T: ContractToolchain>(
    toolchain: &mut T,
    input: &RegressionInput,
) -> Result<Coefficients, RunnerError> {
    let name = CONTRACT_NAME.to_string();

    info!(contract = %name, "getting contract factory");
    let factory = toolchain
        .get_contract_factory(&name)
        .await
        .map_err(|source| RunnerError::FactoryLookup {
            name: name.clone(),
            source: source.into(),
        })?;

    info!(contract = %name, "deploying");
    let contract = toolchain
        .deploy(&factory)
        .await
        .map_err(|source| RunnerError::Deploy {
            name: name.clone(),
            source: source.into(),
        })?;
    toolchain
        .deployed(&contract)
        .await
        .map_err(|source| RunnerError::Deployment {
            name: name.clone(),
            source: source.into(),
        })?;
    info!(contract = %name, "deployed");

    let coefficients = toolchain
        .multiple_linear_regression(&contract, &input.matrix, &input.vector)
        .await
        .map_err(|source| RunnerError::Invoke {
            name: name.clone(),
            source: source.into(),
        })?;
    info!(coefficients = coefficients.len(), "regression returned");

    Ok(coefficients)
}

/// Prints the result to `out` and returns the process exit status: 0 on
/// success, 1 after logging any error.
pub fn report(result: Result<Coefficients, RunnerError>, out: &mut impl Write) -> u8 {
    let coefficients = match result {
        Ok(coefficients) => coefficients,
        Err(err) => {
            error!(error = ?anyhow::Error::from(err), "deployment run failed");
            return 1;
        }
    };

    match writeln!(out, "{coefficients}") {
        Ok(()) => 0,
        Err(err) => {
            error!(%err, "failed to print result");
            1
        }
    }
}
