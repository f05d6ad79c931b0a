//! Job DTOs sent to the training API

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::spec::{JobSpec, Resources, Volume};

/// Body of a job-create request
///
/// Built from a [`JobSpec`]; this is where the CPU/GPU exclusion is applied
/// and unset optional fields are dropped from the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub command: Vec<String>,
    pub default_http_port: u16,
    pub deletion_requested: bool,
    pub env_vars: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub resources: Resources,
    pub ssh_public_keys: Vec<String>,
    pub volumes: Vec<Volume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl From<&JobSpec> for CreateJobRequest {
    fn from(spec: &JobSpec) -> Self {
        Self {
            command: spec.command.clone(),
            default_http_port: spec.http_port,
            deletion_requested: false,
            env_vars: spec.env_vars.clone(),
            labels: spec.labels.clone(),
            image: spec.image.clone(),
            name: spec.name.clone(),
            resources: spec.resources.effective(),
            ssh_public_keys: spec.ssh_public_keys.iter().cloned().collect(),
            volumes: spec.volumes.clone(),
            timeout: spec.timeout,
        }
    }
}
