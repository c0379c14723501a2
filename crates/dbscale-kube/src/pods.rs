//! Pod listing across all namespaces.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use tracing::{debug, warn};

use dbscale_core::{CommunicationError, WorkloadInstance, WorkloadLister};

/// Lists pods in every namespace matching a label selector.
#[derive(Clone)]
pub struct KubePodLister {
    pods: Api<Pod>,
}

impl KubePodLister {
    pub fn new(client: Client) -> Self {
        Self {
            pods: Api::all(client),
        }
    }
}

impl WorkloadLister for KubePodLister {
    async fn list(&self, selector: &str) -> Result<Vec<WorkloadInstance>, CommunicationError> {
        let list = match self.pods.list(&list_params(selector)).await {
            Ok(list) => list,
            Err(kube::Error::Api(status)) if status.code == 404 => {
                warn!(%selector, "pod list returned not found, treating as no pods");
                return Ok(Vec::new());
            }
            Err(kube::Error::Api(status)) => {
                let message = if status.message.is_empty() {
                    status.status
                } else {
                    status.message
                };
                return Err(CommunicationError::List(format!(
                    "{} {}: {message}",
                    status.code, status.reason
                )));
            }
            Err(e) => return Err(CommunicationError::List(e.to_string())),
        };

        let instances: Vec<_> = list.items.into_iter().map(instance_from_pod).collect();
        debug!(%selector, pods = instances.len(), "listed pods");
        Ok(instances)
    }
}

/// An empty selector lists every pod.
pub fn list_params(selector: &str) -> ListParams {
    if selector.is_empty() {
        ListParams::default()
    } else {
        ListParams::default().labels(selector)
    }
}

fn instance_from_pod(pod: Pod) -> WorkloadInstance {
    let name = match pod.namespace() {
        Some(ns) => format!("{ns}/{}", pod.name_any()),
        None => pod.name_any(),
    };
    WorkloadInstance {
        name,
        annotations: pod.metadata.annotations.unwrap_or_default().into_iter().collect(),
    }
}
