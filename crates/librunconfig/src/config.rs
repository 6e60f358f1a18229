use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::port::{PortMap, PortSet};
use crate::union::{Command, Entrypoint};

/// Image-facing configuration: everything that describes the process that
/// runs inside the container, independent of the host it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    #[serde(default, deserialize_with = "null_default")]
    pub hostname: String,
    #[serde(default, deserialize_with = "null_default")]
    pub domainname: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user: String,
    #[serde(default, deserialize_with = "null_default")]
    pub attach_stdin: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub attach_stdout: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub attach_stderr: bool,
    #[serde(default)]
    pub exposed_ports: PortSet,
    #[serde(default, deserialize_with = "null_default")]
    pub tty: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub open_stdin: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub stdin_once: bool,
    /// `KEY=VALUE` entries. Keys may repeat until the config is merged.
    #[serde(default, deserialize_with = "null_default")]
    pub env: Vec<String>,
    #[serde(default)]
    pub cmd: Option<Command>,
    #[serde(default, deserialize_with = "null_default")]
    pub image: String,
    /// Container paths of named volumes.
    #[serde(default, with = "key_set")]
    pub volumes: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub working_dir: String,
    #[serde(default)]
    pub entrypoint: Option<Entrypoint>,
    #[serde(default, deserialize_with = "null_default")]
    pub network_disabled: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub mac_address: String,
    #[serde(default, deserialize_with = "null_default")]
    pub on_build: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub labels: BTreeMap<String, String>,
}

/// Host-facing configuration: resources and wiring decided by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    /// Bind mount literals. `None` when no bind mount was requested, which
    /// callers tell apart from an explicitly emptied list.
    #[serde(default)]
    pub binds: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_default")]
    pub memory: i64,
    /// Memory plus swap. `-1` is unlimited.
    #[serde(default, deserialize_with = "null_default")]
    pub memory_swap: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub cpu_shares: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub cpuset_cpus: String,
    #[serde(default, deserialize_with = "null_default")]
    pub privileged: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub port_bindings: PortMap,
    /// `name:alias` entries in the order given.
    #[serde(default, deserialize_with = "null_default")]
    pub links: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub publish_all_ports: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub dns: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub volumes_from: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub network_mode: String,
    #[serde(default, deserialize_with = "null_default")]
    pub restart_policy: RestartPolicy,
    #[serde(default, deserialize_with = "null_default")]
    pub auto_remove: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartPolicy {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub maximum_retry_count: i64,
}

impl RestartPolicy {
    pub const NO: &'static str = "no";
    pub const ALWAYS: &'static str = "always";
    pub const ON_FAILURE: &'static str = "on-failure";

    /// Parses `no`, `always` or `on-failure[:max-retries]`.
    pub fn parse(policy: &str) -> Option<Self> {
        let (name, count) = match policy.split_once(':') {
            Some((name, count)) => (name, Some(count)),
            None => (policy, None),
        };
        match (name, count) {
            (Self::NO | Self::ALWAYS | Self::ON_FAILURE, None) => Some(Self {
                name: name.to_owned(),
                maximum_retry_count: 0,
            }),
            (Self::ON_FAILURE, Some(count)) => {
                let count: i64 = count.parse().ok().filter(|c| *c >= 0)?;
                Some(Self {
                    name: name.to_owned(),
                    maximum_retry_count: count,
                })
            }
            _ => None,
        }
    }

    /// True when the policy never restarts the container.
    pub fn is_none(&self) -> bool {
        self.name.is_empty() || self.name == Self::NO
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == Self::ON_FAILURE && self.maximum_retry_count > 0 {
            write!(f, "{}:{}", self.name, self.maximum_retry_count)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Treats an explicit `null` like an absent field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sets of strings are written as `{"member": {}}`.
mod key_set {
    use std::collections::BTreeSet;

    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use crate::port::{Empty, KeySetVisitor};

    pub fn serialize<S: Serializer>(set: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(set.len()))?;
        for key in set {
            map.serialize_entry(key, &Empty {})?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeSet<String>, D::Error> {
        deserializer.deserialize_any(KeySetVisitor)
    }
}
