pub mod driver;
pub mod events;
pub mod gc;
pub mod role;
pub mod status;

use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use kube::{
    Client, Resource, ResourceExt,
    api::{Api, Patch, PatchParams},
    runtime::{
        Controller,
        controller::Action,
        events::{Recorder, Reporter},
        watcher::Config,
    },
};
use serde_json::json;
use tracing::{error, info, instrument, trace, warn};

use crate::config::NodeClassConfig;
use crate::crd::node_class::NodeClass;
use crate::error::ReconcileError;
use crate::inventory::InstanceInventory;
use crate::profile::{ProfileNamer, ProfileStore};

pub use driver::{ReconcileDriver, ReconcileOutcome};
pub use gc::GarbageCollector;
pub use role::{RoleReconciler, Rotation};

#[derive(thiserror::Error, Debug)]
pub enum ReconcileErr {
    #[error(transparent)]
    Profile(#[from] ReconcileError),
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),
}

#[derive(Clone)]
pub struct ControllerContext {
    pub client: Client,
    pub cfg: NodeClassConfig,
    pub store: Arc<dyn ProfileStore>,
    pub inventory: Arc<dyn InstanceInventory>,
    pub namer: Arc<dyn ProfileNamer>,
    pub recorder: Recorder,
}

impl ControllerContext {
    pub fn new(
        client: Client,
        cfg: NodeClassConfig,
        store: Arc<dyn ProfileStore>,
        inventory: Arc<dyn InstanceInventory>,
        namer: Arc<dyn ProfileNamer>,
    ) -> Self {
        let reporter = Reporter {
            controller: cfg.reporter.clone(),
            instance: std::env::var("POD_NAME").ok(),
        };
        let recorder = Recorder::new(client.clone(), reporter);
        Self {
            client,
            cfg,
            store,
            inventory,
            namer,
            recorder,
        }
    }

    pub fn driver(&self) -> ReconcileDriver<'_> {
        ReconcileDriver::new(
            self.store.as_ref(),
            self.inventory.as_ref(),
            self.namer.as_ref(),
            &self.cfg.cluster_name,
            &self.cfg.region,
        )
    }
}

pub async fn run_controller(ctx: Arc<ControllerContext>) -> anyhow::Result<()> {
    let api: Api<NodeClass> = Api::all(ctx.client.clone());
    info!(
        cluster = %ctx.cfg.cluster_name,
        region = %ctx.cfg.region,
        "starting node class controller"
    );

    Controller::new(api, Config::default())
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj_ref, action)) => {
                    info!(name = %obj_ref.name, "reconciled: requeue={:?}", action)
                }
                Err(e) => error!(error = ?e, "reconcile error"),
            }
        })
        .await;

    Ok(())
}

#[instrument(skip_all, fields(name = %obj.name_any()))]
pub async fn reconcile(
    obj: Arc<NodeClass>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileErr> {
    let name = obj.name_any();
    if obj.meta().deletion_timestamp.is_some() {
        // Profiles of a deleted node class are not reclaimed here.
        return Ok(Action::await_change());
    }

    let mut working = (*obj).clone();
    let outcome = ctx.driver().run(&mut working).await?;

    let mut status = working.status.unwrap_or_default();
    status.observed_generation = obj.meta().generation;
    status.last_updated = Some(Utc::now().to_rfc3339());

    if status::should_patch_status(obj.status.as_ref(), &status) {
        trace!(%name, "reconcile: status changed; patching status");
        let api: Api<NodeClass> = Api::all(ctx.client.clone());
        let patch = json!({ "status": status });
        api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
    } else {
        trace!(%name, "reconcile: status unchanged; skipping patch");
    }

    let obj_ref = obj.object_ref(&());
    events::emit_outcome(&ctx.recorder, &obj_ref, &outcome).await;

    Ok(Action::requeue(ctx.cfg.requeue_after()))
}

pub fn error_policy(
    obj: Arc<NodeClass>,
    error: &ReconcileErr,
    ctx: Arc<ControllerContext>,
) -> Action {
    warn!(name = %obj.name_any(), %error, "reconcile failed; status not persisted");
    Action::requeue(ctx.cfg.error_requeue_after())
}
