//! Folds an image's default configuration into a user configuration.
//!
//! The user side wins for every field it sets. Set-like fields accumulate
//! from both sides, `Env` is merged per key. Both functions take the primary
//! configuration by `&mut`, so a configuration cannot be merged into from two
//! places at once.

use std::collections::BTreeSet;

use crate::config::{Config, HostConfig};
use crate::port::{Port, PortError};
use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("cannot merge exposed port {port:?}")]
    InvalidPort {
        port: String,
        #[source]
        source: PortError,
    },
}

/// Merges `image` into `user` in place.
pub fn merge(user: &mut Config, image: &Config) -> Result<(), MergeError> {
    merge_exposed_ports(user, image)?;

    // Keys already present, including ones appended from the image below.
    let mut seen: BTreeSet<String> = user
        .env
        .iter()
        .map(|e| utils::env_key(e).to_owned())
        .collect();
    let mut appended = 0;
    for entry in &image.env {
        if seen.insert(utils::env_key(entry).to_owned()) {
            user.env.push(entry.clone());
            appended += 1;
        }
    }

    user.volumes.extend(image.volumes.iter().cloned());

    for (key, value) in &image.labels {
        user.labels
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    if user.entrypoint.as_ref().map_or(true, |e| e.is_empty()) && image.entrypoint.is_some() {
        user.entrypoint = image.entrypoint.clone();
    }
    if user.cmd.as_ref().map_or(true, |c| c.is_empty()) && image.cmd.is_some() {
        user.cmd = image.cmd.clone();
    }

    adopt(&mut user.hostname, &image.hostname);
    adopt(&mut user.domainname, &image.domainname);
    adopt(&mut user.user, &image.user);
    adopt(&mut user.image, &image.image);
    adopt(&mut user.working_dir, &image.working_dir);
    adopt(&mut user.mac_address, &image.mac_address);
    adopt(&mut user.on_build, &image.on_build);
    adopt(&mut user.attach_stdin, &image.attach_stdin);
    adopt(&mut user.attach_stdout, &image.attach_stdout);
    adopt(&mut user.attach_stderr, &image.attach_stderr);
    adopt(&mut user.tty, &image.tty);
    adopt(&mut user.open_stdin, &image.open_stdin);
    adopt(&mut user.stdin_once, &image.stdin_once);
    adopt(&mut user.network_disabled, &image.network_disabled);

    tracing::debug!(
        exposed_ports = user.exposed_ports.len(),
        env_appended = appended,
        volumes = user.volumes.len(),
        "merged image config"
    );
    Ok(())
}

/// Merges `base` into `user` in place. Lists keep the user's entries first and
/// append unseen entries of `base`.
pub fn merge_host_config(user: &mut HostConfig, base: &HostConfig) {
    if let Some(base_binds) = &base.binds {
        let binds = user.binds.get_or_insert_with(Vec::new);
        append_unseen(binds, base_binds);
    }
    append_unseen(&mut user.links, &base.links);
    append_unseen(&mut user.dns, &base.dns);
    append_unseen(&mut user.volumes_from, &base.volumes_from);

    for (port, bindings) in &base.port_bindings {
        user.port_bindings
            .entry(port.clone())
            .or_insert_with(|| bindings.clone());
    }

    adopt(&mut user.memory, &base.memory);
    adopt(&mut user.memory_swap, &base.memory_swap);
    adopt(&mut user.cpu_shares, &base.cpu_shares);
    adopt(&mut user.cpuset_cpus, &base.cpuset_cpus);
    adopt(&mut user.privileged, &base.privileged);
    adopt(&mut user.publish_all_ports, &base.publish_all_ports);
    adopt(&mut user.network_mode, &base.network_mode);
    adopt(&mut user.restart_policy, &base.restart_policy);
    adopt(&mut user.auto_remove, &base.auto_remove);
}

fn merge_exposed_ports(user: &mut Config, image: &Config) -> Result<(), MergeError> {
    let normalize = |port: &Port| {
        port.normalized().map_err(|source| MergeError::InvalidPort {
            port: port.to_string(),
            source,
        })
    };

    let mut present = BTreeSet::new();
    for port in &user.exposed_ports {
        present.insert(normalize(port)?);
    }
    let mut missing = Vec::new();
    for port in &image.exposed_ports {
        let port = normalize(port)?;
        if !present.contains(&port) {
            present.insert(port.clone());
            missing.push(port);
        }
    }
    user.exposed_ports.extend(missing);
    Ok(())
}

fn adopt<T: Default + PartialEq + Clone>(field: &mut T, fallback: &T) {
    if *field == T::default() {
        *field = fallback.clone();
    }
}

fn append_unseen(target: &mut Vec<String>, other: &[String]) {
    for entry in other {
        if !target.contains(entry) {
            target.push(entry.clone());
        }
    }
}
