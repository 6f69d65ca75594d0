use std::sync::Arc;

use kube::Client;
use tokio::task::JoinHandle;

use crate::{
    config::NodeClassConfig,
    controller::{ControllerContext, run_controller},
    inventory::InstanceInventory,
    profile::{HashedProfileNamer, ProfileStore},
};

/// Build the controller context with the default profile namer.
pub fn build_context(
    client: Client,
    cfg: NodeClassConfig,
    store: Arc<dyn ProfileStore>,
    inventory: Arc<dyn InstanceInventory>,
) -> Arc<ControllerContext> {
    Arc::new(ControllerContext::new(
        client,
        cfg,
        store,
        inventory,
        Arc::new(HashedProfileNamer),
    ))
}

/// Spawn the node class controller loop.
pub fn spawn_controller(
    ctx: Arc<ControllerContext>,
) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { run_controller(ctx).await })
}

/// Run the controller until its watch stream ends.
pub async fn run_all(
    client: Client,
    cfg: NodeClassConfig,
    store: Arc<dyn ProfileStore>,
    inventory: Arc<dyn InstanceInventory>,
) -> anyhow::Result<()> {
    let ctx = build_context(client, cfg, store, inventory);
    spawn_controller(ctx).await?
}
