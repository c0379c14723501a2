//! dbscale-kube — Kubernetes workload lister.
//!
//! Lists pods across all namespaces by label selector and exposes their
//! annotations to the autoscaler.
//!
//! # Connection modes
//!
//! ```text
//! inferred   in-cluster service account, falling back to the local kubeconfig
//! explicit   any http(s) URL, e.g. http://127.0.0.1:8001 behind `kubectl proxy`
//! ```

pub mod client;
pub mod pods;

pub use client::connect;
pub use pods::KubePodLister;
