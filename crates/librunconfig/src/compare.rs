//! Structural equivalence of configurations.
//!
//! Set-like fields (`ExposedPorts`, `Volumes`, `Labels`, `PortBindings`) are
//! compared as sets. Lists such as `Env`, `Cmd` or `Binds` are compared in
//! order, since their order reaches the container process.

use std::collections::BTreeSet;

use crate::config::{Config, HostConfig};
use crate::port::{Port, PortSet};

/// True when `a` and `b` describe the same configuration, so applying one
/// over the other changes nothing.
pub fn compare(a: &Config, b: &Config) -> bool {
    a.hostname == b.hostname
        && a.domainname == b.domainname
        && a.user == b.user
        && a.attach_stdin == b.attach_stdin
        && a.attach_stdout == b.attach_stdout
        && a.attach_stderr == b.attach_stderr
        && a.tty == b.tty
        && a.open_stdin == b.open_stdin
        && a.stdin_once == b.stdin_once
        && a.image == b.image
        && a.working_dir == b.working_dir
        && a.network_disabled == b.network_disabled
        && a.mac_address == b.mac_address
        && a.env == b.env
        && a.on_build == b.on_build
        && a.cmd == b.cmd
        && a.entrypoint == b.entrypoint
        && a.volumes == b.volumes
        && a.labels == b.labels
        && same_ports(&a.exposed_ports, &b.exposed_ports)
}

pub fn compare_host_config(a: &HostConfig, b: &HostConfig) -> bool {
    a.binds == b.binds
        && a.memory == b.memory
        && a.memory_swap == b.memory_swap
        && a.cpu_shares == b.cpu_shares
        && a.cpuset_cpus == b.cpuset_cpus
        && a.privileged == b.privileged
        && a.port_bindings == b.port_bindings
        && a.links == b.links
        && a.publish_all_ports == b.publish_all_ports
        && a.dns == b.dns
        && a.volumes_from == b.volumes_from
        && a.network_mode == b.network_mode
        && a.restart_policy == b.restart_policy
        && a.auto_remove == b.auto_remove
}

// "80" and "80/tcp" name the same port; tokens that are not ports at all
// only match themselves.
fn same_ports(a: &PortSet, b: &PortSet) -> bool {
    let normalize = |set: &PortSet| -> BTreeSet<Port> {
        set.iter()
            .map(|p| p.normalized().unwrap_or_else(|_| p.clone()))
            .collect()
    };
    a.len() == b.len() && normalize(a) == normalize(b)
}
