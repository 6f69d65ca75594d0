use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct NodeClassConfig {
    /// Cluster name used to derive profile names and ownership tags.
    /// Env: OPRC_NC_CLUSTER_NAME
    #[envconfig(from = "OPRC_NC_CLUSTER_NAME", default = "oaas")]
    pub cluster_name: String,

    /// Region the identity provider and compute inventory live in.
    /// Env: OPRC_NC_REGION
    #[envconfig(from = "OPRC_NC_REGION", default = "us-east-1")]
    pub region: String,

    /// Periodic requeue after a successful reconcile. Garbage collection only
    /// makes progress on a reconcile, so this bounds how long a retired
    /// profile can outlive its last instance.
    #[envconfig(from = "OPRC_NC_REQUEUE_SECS", default = "300")]
    pub requeue_secs: u64,

    #[envconfig(from = "OPRC_NC_ERROR_REQUEUE_SECS", default = "30")]
    pub error_requeue_secs: u64,

    /// Reporting controller name on published Kubernetes events.
    #[envconfig(from = "OPRC_NC_REPORTER", default = "oprc-nodeclass")]
    pub reporter: String,
}

impl NodeClassConfig {
    pub fn requeue_after(&self) -> Duration {
        Duration::from_secs(self.requeue_secs)
    }

    pub fn error_requeue_after(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs.max(1))
    }
}

impl Default for NodeClassConfig {
    fn default() -> Self {
        Self {
            cluster_name: "oaas".into(),
            region: "us-east-1".into(),
            requeue_secs: 300,
            error_requeue_secs: 30,
            reporter: "oprc-nodeclass".into(),
        }
    }
}
