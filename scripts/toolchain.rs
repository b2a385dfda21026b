use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context};
use helpers::{
    build_project_in_dir, create_account_from_package, create_basic_wallet_account,
    create_note_from_package, setup_client, AccountCreationConfig, ClientSetup, MidenClient,
    NoteCreationConfig,
};
use miden_client::{
    account::{AccountId, StorageMap, StorageSlot},
    keystore::FilesystemKeyStore,
    transaction::{OutputNote, TransactionRequestBuilder},
    Felt, Word,
};
use miden_mast_package::Package;
use rand::rngs::StdRng;
use regression::{decode_felt, encode_call, Coefficients, Matrix};
use tracing::{debug, info};

use crate::{runner::ContractToolchain, RunnerConfig};

/// Note project that carries a `multiple_linear_regression` call
pub const CALL_NOTE: &str = "regression-note";

/// Storage slot of the coefficient map written by the contract
const COEFFICIENT_SLOT: u8 = 0;

/// Compiled contract and call note, ready to deploy
pub struct RegressionFactory {
    pub name: String,
    pub account_package: Arc<Package>,
    pub note_package: Arc<Package>,
}

/// Handle to a deployed regression account
pub struct RegressionDeployment {
    pub account_id: AccountId,
    /// Wallet that sends call notes to the account
    pub deployer_id: AccountId,
    note_package: Arc<Package>,
}

/// [`ContractToolchain`] backed by a Miden client and `cargo miden`
pub struct MidenToolchain {
    client: MidenClient,
    keystore: Arc<FilesystemKeyStore<StdRng>>,
    contracts_dir: PathBuf,
    release: bool,
}

impl MidenToolchain {
    pub async fn connect(config: &RunnerConfig) -> anyhow::Result<Self> {
        let setup = setup_client(&config.client_config()?).await?;
        Ok(Self::new(
            setup,
            config.contracts_dir.clone(),
            !config.debug_build,
        ))
    }

    pub fn new(setup: ClientSetup, contracts_dir: PathBuf, release: bool) -> Self {
        let ClientSetup { client, keystore } = setup;
        Self {
            client,
            keystore,
            contracts_dir,
            release,
        }
    }

    pub fn client(&mut self) -> &mut MidenClient {
        &mut self.client
    }

    async fn read_coefficients(
        &mut self,
        account_id: AccountId,
        count: usize,
    ) -> anyhow::Result<Coefficients> {
        let record = self
            .client
            .get_account(account_id)
            .await?
            .ok_or_else(|| anyhow!("account {account_id} not found after the call"))?;
        let storage = record.account().storage();

        // unwritten map keys read back as the empty word, so check the count
        // the contract records before trusting any coefficient
        let stored_count: [Felt; 4] = storage
            .get_map_item(COEFFICIENT_SLOT, count_key())
            .context("coefficient count missing from storage")?
            .into();
        check_coefficient_count(stored_count, count)?;

        let mut scaled = Vec::with_capacity(count);
        for index in 0..count {
            let value: [Felt; 4] = storage
                .get_map_item(COEFFICIENT_SLOT, coefficient_key(index))
                .with_context(|| format!("coefficient {index} missing from storage"))?
                .into();
            scaled.push(decode_felt(value[3].as_int())?);
        }
        Ok(Coefficients::from_scaled(scaled))
    }
}

/// Map key of coefficient `index`, mirrored by the contract
pub fn coefficient_key(index: usize) -> Word {
    Word::from([
        Felt::new(0),
        Felt::new(0),
        Felt::new(0),
        Felt::new(index as u64),
    ])
}

/// Map key under which the contract records how many coefficients it wrote
pub fn count_key() -> Word {
    Word::from([Felt::new(0), Felt::new(0), Felt::new(1), Felt::new(0)])
}

/// Fails unless the stored count word holds exactly `expected`
pub fn check_coefficient_count(stored: [Felt; 4], expected: usize) -> anyhow::Result<()> {
    let found = stored[3].as_int();
    if found == 0 {
        bail!("contract stored no coefficients");
    }
    if found != expected as u64 {
        bail!("contract stored {found} coefficients, expected {expected}");
    }
    Ok(())
}

impl ContractToolchain for MidenToolchain {
    type Factory = RegressionFactory;
    type Contract = RegressionDeployment;

    async fn get_contract_factory(&mut self, name: &str) -> anyhow::Result<RegressionFactory> {
        let account_package = build_project_in_dir(&self.contracts_dir.join(name), self.release)
            .with_context(|| format!("failed to build contract `{name}`"))?;
        let note_package = build_project_in_dir(&self.contracts_dir.join(CALL_NOTE), self.release)
            .with_context(|| format!("failed to build call note `{CALL_NOTE}`"))?;
        debug!(contract = name, note = CALL_NOTE, "packages built");

        Ok(RegressionFactory {
            name: name.to_string(),
            account_package: Arc::new(account_package),
            note_package: Arc::new(note_package),
        })
    }

    async fn deploy(&mut self, factory: &RegressionFactory) -> anyhow::Result<RegressionDeployment> {
        let contract_cfg = AccountCreationConfig {
            storage_slots: vec![StorageSlot::Map(StorageMap::new())],
            ..Default::default()
        };
        let account =
            create_account_from_package(&mut self.client, &factory.account_package, contract_cfg)
                .await?;

        let deployer = create_basic_wallet_account(
            &mut self.client,
            &self.keystore,
            AccountCreationConfig::default(),
        )
        .await?;

        info!(
            contract = %factory.name,
            account_id = %account.id().to_hex(),
            deployer_id = %deployer.id().to_hex(),
            "accounts created"
        );
        Ok(RegressionDeployment {
            account_id: account.id(),
            deployer_id: deployer.id(),
            note_package: factory.note_package.clone(),
        })
    }

    /// Checks that the client syncs with the node and tracks both accounts.
    ///
    /// This does not prove on-chain presence: a Miden account is published
    /// by its first state-changing transaction, which here is the call
    /// itself. After a successful `deploy` only the sync can fail.
    async fn deployed(&mut self, contract: &RegressionDeployment) -> anyhow::Result<()> {
        let summary = self.client.sync_state().await?;
        for id in [contract.account_id, contract.deployer_id] {
            self.client
                .get_account(id)
                .await?
                .ok_or_else(|| anyhow!("account {id} is not tracked by the client"))?;
        }
        debug!(block = %summary.block_num, "deployment synced");
        Ok(())
    }

    async fn multiple_linear_regression(
        &mut self,
        contract: &RegressionDeployment,
        matrix: &Matrix,
        vector: &[i64],
    ) -> anyhow::Result<Coefficients> {
        let inputs = encode_call(matrix, vector)?
            .into_iter()
            .map(Felt::new)
            .collect();
        let call_note = create_note_from_package(
            &mut self.client,
            &contract.note_package,
            contract.deployer_id,
            NoteCreationConfig::with_inputs(inputs)?,
        )?;
        debug!(note_id = %call_note.id().to_hex(), "call note built");

        // publish the call note from the deployer
        let publish_request = TransactionRequestBuilder::new()
            .own_output_notes(vec![OutputNote::Full(call_note.clone())])
            .build()?;
        let publish_tx = self
            .client
            .new_transaction(contract.deployer_id, publish_request)
            .await?;
        self.client.submit_transaction(publish_tx.clone()).await?;
        self.client.sync_state().await?;
        info!(
            tx_id = %publish_tx.executed_transaction().id().to_hex(),
            "call note published"
        );

        // consume it with the regression account
        let consume_request = TransactionRequestBuilder::new()
            .unauthenticated_input_notes([(call_note, None)])
            .build()?;
        let consume_tx = self
            .client
            .new_transaction(contract.account_id, consume_request)
            .await?;
        self.client.submit_transaction(consume_tx.clone()).await?;
        self.client.sync_state().await?;
        info!(
            tx_id = %consume_tx.executed_transaction().id().to_hex(),
            "call note consumed"
        );

        self.read_coefficients(contract.account_id, matrix.cols())
            .await
    }
}
