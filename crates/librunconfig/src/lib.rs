//! Normalization of a container's run intent.
//!
//! Run flags ([`parse::parse_run`]) and serialized documents
//! ([`decode::decode_container_config`]) both produce a [`Config`] and a
//! [`HostConfig`]. Pairs can then be reconciled with [`merge::merge`] or
//! checked for equivalence with [`compare::compare`].

pub mod compare;
pub mod config;
pub mod decode;
pub mod merge;
pub mod mount;
pub mod parse;
pub mod port;
pub mod union;
pub mod utils;

pub use config::{Config, HostConfig, RestartPolicy};
pub use union::{Command, Entrypoint, UnionValue};
