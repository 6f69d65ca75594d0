use envconfig::Envconfig;
use kube::Client;
use oprc_nodeclass::{
    config::NodeClassConfig, init_tracing, inventory::MemoryInstanceInventory,
    profile::MemoryProfileStore, runtime,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let cfg = NodeClassConfig::init_from_env()?;
    info!(?cfg, "Starting node class controller");

    // Only in-process collaborators ship with this crate; profiles created
    // here do not outlive the process.
    warn!("using in-memory profile store and instance inventory");
    let store = Arc::new(MemoryProfileStore::new());
    let inventory = Arc::new(MemoryInstanceInventory::new());

    let client = Client::try_default().await?;
    runtime::run_all(client, cfg, store, inventory).await
}
