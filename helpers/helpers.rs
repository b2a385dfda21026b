//! Common helper functions for deploy scripts and tests

use std::{collections::BTreeSet, path::Path, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context};
use cargo_miden::{run, OutputType};
use miden_client::{
    account::{
        component::{AuthRpoFalcon512, BasicWallet, NoAuth},
        Account, AccountId, AccountStorageMode, AccountType, StorageSlot,
    },
    auth::AuthSecretKey,
    builder::ClientBuilder,
    crypto::{FeltRng, SecretKey},
    keystore::FilesystemKeyStore,
    note::{
        Note, NoteAssets, NoteExecutionHint, NoteInputs, NoteMetadata, NoteRecipient, NoteScript,
        NoteTag, NoteType,
    },
    rpc::{Endpoint, TonicRpcClient},
    utils::Deserializable,
    Client,
};
use miden_core::{Felt, FieldElement};
use miden_mast_package::Package;
use miden_objects::account::{
    AccountBuilder, AccountComponent, AccountComponentMetadata, AccountComponentTemplate,
};
use rand::{rngs::StdRng, RngCore};
use tracing::{debug, info};

pub type MidenClient = Client<FilesystemKeyStore<StdRng>>;

/// Where the client connects and keeps its local state
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    pub timeout_ms: u64,
    pub store_path: PathBuf,
    pub keystore_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::testnet(),
            timeout_ms: 10_000,
            store_path: PathBuf::from("./store.sqlite3"),
            keystore_path: PathBuf::from("./keystore"),
        }
    }
}

pub struct ClientSetup {
    pub client: MidenClient,
    pub keystore: Arc<FilesystemKeyStore<StdRng>>,
}

/// Connects a client to the configured node with a sqlite store and a
/// filesystem keystore
pub async fn setup_client(config: &ClientConfig) -> anyhow::Result<ClientSetup> {
    let rpc_api = Arc::new(TonicRpcClient::new(&config.endpoint, config.timeout_ms));

    let keystore = Arc::new(
        FilesystemKeyStore::<StdRng>::new(config.keystore_path.clone()).with_context(|| {
            format!("failed to open keystore at {}", config.keystore_path.display())
        })?,
    );

    let store_path = config
        .store_path
        .to_str()
        .ok_or_else(|| anyhow!("store path {} is not UTF-8", config.store_path.display()))?;
    let client = ClientBuilder::new()
        .rpc(rpc_api)
        .sqlite_store(store_path)
        .authenticator(keystore.clone())
        .in_debug_mode(true.into())
        .build()
        .await
        .context("failed to build the Miden client")?;

    info!(endpoint = %config.endpoint, "client initialized");
    Ok(ClientSetup { client, keystore })
}

/// Runs `cargo miden build` on the project in `dir` and loads the resulting
/// package
pub fn build_project_in_dir(dir: &Path, release: bool) -> anyhow::Result<Package> {
    let profile: &str = if release { "--release" } else { "--debug" };
    let manifest_path = dir.join("Cargo.toml");
    if !manifest_path.is_file() {
        bail!("no Miden project at {}", dir.display());
    }
    let manifest_arg = manifest_path.to_string_lossy().to_string();

    let args = vec![
        "cargo".to_string(),
        "miden".to_string(),
        "build".to_string(),
        profile.to_string(),
        "--manifest-path".to_string(),
        manifest_arg,
    ];
    debug!(?args, "building Miden project");

    let output = run(args.into_iter(), OutputType::Masm)
        .map_err(|e| anyhow!("cargo miden build failed for {}: {e}", dir.display()))?
        .ok_or_else(|| anyhow!("cargo miden build returned no output for {}", dir.display()))?;
    let artifact_path = match output {
        cargo_miden::CommandOutput::BuildCommandOutput { output } => match output {
            cargo_miden::BuildOutput::Masm { artifact_path } => artifact_path,
            other => bail!("expected Masm output, got {other:?}"),
        },
        other => bail!("expected BuildCommandOutput, got {other:?}"),
    };

    let package_bytes = std::fs::read(&artifact_path)
        .with_context(|| format!("failed to read {}", artifact_path.display()))?;
    Package::read_from_bytes(&package_bytes)
        .map_err(|e| anyhow!("invalid package at {}: {e}", artifact_path.display()))
}

/// Configuration for creating an account with a custom component
#[derive(Clone)]
pub struct AccountCreationConfig {
    pub account_type: AccountType,
    pub storage_mode: AccountStorageMode,
    pub storage_slots: Vec<StorageSlot>,
    pub supported_types: Option<Vec<AccountType>>,
}

impl Default for AccountCreationConfig {
    fn default() -> Self {
        Self {
            account_type: AccountType::RegularAccountImmutableCode,
            storage_mode: AccountStorageMode::Public,
            storage_slots: vec![],
            supported_types: None,
        }
    }
}

pub fn account_component_from_package(
    package: &Package,
    config: &AccountCreationConfig,
) -> anyhow::Result<AccountComponent> {
    let bytes = package
        .account_component_metadata_bytes
        .as_deref()
        .ok_or_else(|| anyhow!("package {} has no account component metadata", package.name))?;
    let metadata = AccountComponentMetadata::read_from_bytes(bytes)
        .map_err(|e| anyhow!("invalid component metadata in {}: {e}", package.name))?;
    let template =
        AccountComponentTemplate::new(metadata, package.unwrap_library().as_ref().clone());

    let component = AccountComponent::new(template.library().clone(), config.storage_slots.clone())
        .context("failed to instantiate account component")?;

    let supported_types = match &config.supported_types {
        Some(types) => BTreeSet::from_iter(types.clone()),
        None => BTreeSet::from_iter([config.account_type]),
    };
    Ok(component.with_supported_types(supported_types))
}

/// Creates an account carrying the package's component behind a no-auth
/// component and registers it with the client
pub async fn create_account_from_package(
    client: &mut MidenClient,
    package: &Package,
    config: AccountCreationConfig,
) -> anyhow::Result<Account> {
    let account_component = account_component_from_package(package, &config)?;

    let mut init_seed = [0_u8; 32];
    client.rng().fill_bytes(&mut init_seed);

    // Sync client state to get latest block info
    client.sync_state().await?;

    let (account, seed) = AccountBuilder::new(init_seed)
        .account_type(config.account_type)
        .storage_mode(config.storage_mode)
        .with_component(account_component)
        .with_auth_component(NoAuth)
        .build()
        .context("failed to build account")?;

    debug!(account_id = %account.id(), "account built");
    client.add_account(&account, Some(seed), false).await?;

    Ok(account)
}

pub async fn create_basic_wallet_account(
    client: &mut MidenClient,
    keystore: &FilesystemKeyStore<StdRng>,
    config: AccountCreationConfig,
) -> anyhow::Result<Account> {
    let mut init_seed = [0_u8; 32];
    client.rng().fill_bytes(&mut init_seed);

    let key_pair = SecretKey::with_rng(client.rng());

    client.sync_state().await?;

    let (account, seed) = AccountBuilder::new(init_seed)
        .account_type(config.account_type)
        .storage_mode(config.storage_mode)
        .with_auth_component(AuthRpoFalcon512::new(key_pair.public_key()))
        .with_component(BasicWallet)
        .build()
        .context("failed to build wallet account")?;
    client.add_account(&account, Some(seed), false).await?;
    keystore
        .add_key(&AuthSecretKey::RpoFalcon512(key_pair))
        .context("failed to store wallet key")?;

    Ok(account)
}

/// Configuration for creating a note
pub struct NoteCreationConfig {
    pub note_type: NoteType,
    pub tag: NoteTag,
    pub assets: NoteAssets,
    pub inputs: Vec<Felt>,
    pub execution_hint: NoteExecutionHint,
    pub aux: Felt,
}

impl NoteCreationConfig {
    /// Public, asset-less note for local use carrying `inputs`
    pub fn with_inputs(inputs: Vec<Felt>) -> anyhow::Result<Self> {
        Ok(Self {
            note_type: NoteType::Public,
            tag: NoteTag::for_local_use_case(0, 0)?,
            assets: NoteAssets::default(),
            inputs,
            execution_hint: NoteExecutionHint::always(),
            aux: Felt::ZERO,
        })
    }
}

/// Builds a note whose script is the package's program
pub fn create_note_from_package(
    client: &mut MidenClient,
    package: &Package,
    sender_id: AccountId,
    config: NoteCreationConfig,
) -> anyhow::Result<Note> {
    let note_program = package.unwrap_program();
    let note_script =
        NoteScript::from_parts(note_program.mast_forest().clone(), note_program.entrypoint());

    let serial_num = client.rng().draw_word();
    let note_inputs = NoteInputs::new(config.inputs).context("invalid note inputs")?;
    let recipient = NoteRecipient::new(serial_num, note_script, note_inputs);

    let metadata = NoteMetadata::new(
        sender_id,
        config.note_type,
        config.tag,
        config.execution_hint,
        config.aux,
    )?;

    Ok(Note::new(config.assets, metadata, recipient))
}
