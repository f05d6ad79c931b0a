//! Job specification domain types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default HTTP port exposed by a job container
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Description of a job to submit
///
/// Built once by the caller and consumed by submission. Every collection is
/// created fresh by [`JobSpec::new`], so two specs never share state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Container image to run
    pub image: String,
    /// Command and arguments; empty means the image entrypoint
    pub command: Vec<String>,
    /// Environment variables injected into the container
    pub env_vars: BTreeMap<String, String>,
    /// Free-form labels attached to the job
    pub labels: BTreeMap<String, String>,
    /// Requested compute
    pub resources: Resources,
    /// Port the service exposes over HTTP
    pub http_port: u16,
    /// Public keys allowed to open an SSH session into the job
    pub ssh_public_keys: BTreeSet<String>,
    /// Mounted volumes, in mount order
    pub volumes: Vec<Volume>,
    /// Optional display name
    pub name: Option<String>,
    /// Remote-side time limit in seconds, enforced by the service
    pub timeout: Option<u64>,
}

impl JobSpec {
    /// Creates a spec for `image` with one GPU and the default port
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            command: Vec::new(),
            env_vars: BTreeMap::new(),
            labels: BTreeMap::new(),
            resources: Resources::default(),
            http_port: DEFAULT_HTTP_PORT,
            ssh_public_keys: BTreeSet::new(),
            volumes: Vec::new(),
            name: None,
            timeout: None,
        }
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_resources(mut self, cpu: u32, gpu: u32) -> Self {
        self.resources = Resources { cpu, gpu };
        self
    }

    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    pub fn with_ssh_key(mut self, key: impl Into<String>) -> Self {
        self.ssh_public_keys.insert(key.into());
        self
    }

    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the remote-side time limit in seconds
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }
}

/// Requested compute for a job
///
/// CPU and GPU requests are mutually exclusive on the remote side: a job asking
/// for CPUs runs without GPUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: u32,
    pub gpu: u32,
}

impl Resources {
    /// Resources as they are sent to the service
    ///
    /// Any CPU request forces the GPU count to zero.
    pub fn effective(self) -> Self {
        if self.cpu > 0 {
            Self {
                cpu: self.cpu,
                gpu: 0,
            }
        } else {
            self
        }
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self { cpu: 0, gpu: 1 }
    }
}

/// A volume mounted into the job container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub mount_path: String,
    pub permission: VolumePermission,
    #[serde(default)]
    pub cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_store: Option<DataStore>,
}

impl Volume {
    /// Mounts an object storage container read-only at `mount_path`
    pub fn data_store(
        alias: impl Into<String>,
        container: impl Into<String>,
        mount_path: impl Into<String>,
    ) -> Self {
        Self {
            mount_path: mount_path.into(),
            permission: VolumePermission::ReadOnly,
            cache: false,
            data_store: Some(DataStore {
                alias: alias.into(),
                container: container.into(),
                prefix: None,
            }),
        }
    }

    pub fn with_permission(mut self, permission: VolumePermission) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }
}

/// Access mode of a mounted volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumePermission {
    #[serde(rename = "RO")]
    ReadOnly,
    #[serde(rename = "RW")]
    ReadWrite,
    #[serde(rename = "RWD")]
    ReadWriteDelete,
}

/// Object storage container backing a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStore {
    pub alias: String,
    pub container: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}
