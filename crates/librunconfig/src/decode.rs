//! Decoding of container config documents written by any API generation.
//!
//! Up to v1.18 resource limits (`Memory`, `MemorySwap`, `CpuShares`,
//! `Cpuset`) sat at the top level of the document. From v1.15 a nested
//! `HostConfig` object carries host settings, and from v1.19 it carries the
//! resource limits too. `Entrypoint` and `Cmd` were plain strings in some
//! generations and lists in others.

use std::io::{Read, Write};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{Config, HostConfig};
use crate::union::{ShapeError, UnionValue};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to parse container config document")]
    Json(#[source] serde_json::Error),
    #[error("invalid {field}")]
    Shape {
        field: &'static str,
        #[source]
        source: ShapeError,
    },
    #[error("invalid container config: {reason}")]
    Schema { reason: String },
}

impl DecodeError {
    fn schema<S: Into<String>>(reason: S) -> Self {
        DecodeError::Schema {
            reason: reason.into(),
        }
    }
}

/// Resource limits as written at the top level by old clients.
#[derive(Debug, Default)]
struct LegacyResources {
    memory: i64,
    memory_swap: i64,
    cpu_shares: i64,
    cpuset: String,
}

impl LegacyResources {
    fn from_document(doc: &Map<String, Value>) -> Result<Self, DecodeError> {
        let cpuset = match doc.get("Cpuset") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(cpuset)) => cpuset.clone(),
            Some(_) => return Err(DecodeError::schema("Cpuset must be a string")),
        };
        Ok(Self {
            memory: integer(doc, "Memory")?,
            memory_swap: integer(doc, "MemorySwap")?,
            cpu_shares: integer(doc, "CpuShares")?,
            cpuset,
        })
    }

    fn apply(self, host: &mut HostConfig) {
        if host.memory == 0 {
            host.memory = self.memory;
        }
        if host.memory_swap == 0 {
            host.memory_swap = self.memory_swap;
        }
        if host.cpu_shares == 0 {
            host.cpu_shares = self.cpu_shares;
        }
        if host.cpuset_cpus.is_empty() {
            host.cpuset_cpus = self.cpuset;
        }
    }
}

fn integer(doc: &Map<String, Value>, field: &str) -> Result<i64, DecodeError> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| DecodeError::schema(format!("{field} must be an integer, got {n}"))),
        Some(_) => Err(DecodeError::schema(format!("{field} must be an integer"))),
    }
}

/// Reads a container config document of any known generation.
pub fn decode_container_config<R: Read>(reader: R) -> Result<(Config, HostConfig), DecodeError> {
    let document: Value = serde_json::from_reader(reader).map_err(DecodeError::Json)?;
    decode_document(document)
}

/// Same as [`decode_container_config`] for an already parsed document.
pub fn decode_document(document: Value) -> Result<(Config, HostConfig), DecodeError> {
    let Value::Object(mut doc) = document else {
        return Err(DecodeError::schema("document must be an object"));
    };

    match doc.get("Image") {
        Some(Value::String(_)) => {}
        Some(_) => return Err(DecodeError::schema("Image must be a string")),
        None => return Err(DecodeError::schema("Image is required")),
    }

    for field in ["Entrypoint", "Cmd"] {
        if let Some(value) = doc.get(field).filter(|v| !v.is_null()) {
            UnionValue::<String>::from_json(value)
                .map_err(|source| DecodeError::Shape { field, source })?;
        }
    }

    let legacy = LegacyResources::from_document(&doc)?;
    let nested = doc.remove("HostConfig");

    let config: Config = serde_json::from_value(Value::Object(doc))
        .map_err(|err| DecodeError::schema(err.to_string()))?;

    let mut host = match nested {
        None | Some(Value::Null) => {
            tracing::debug!(image = %config.image, "no nested host config, using top-level resources");
            HostConfig::default()
        }
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|err| DecodeError::schema(format!("HostConfig: {err}")))?,
        Some(_) => return Err(DecodeError::schema("HostConfig must be an object")),
    };
    legacy.apply(&mut host);

    Ok((config, host))
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(flatten)]
    config: &'a Config,
    #[serde(rename = "HostConfig")]
    host_config: &'a HostConfig,
}

/// Writes the current document format: host settings nested under
/// `HostConfig` and `Entrypoint`/`Cmd` as lists.
pub fn encode_container_config<W: Write>(
    writer: W,
    config: &Config,
    host_config: &HostConfig,
) -> Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(
        writer,
        &Document {
            config,
            host_config,
        },
    )
}
