use anyhow::{Context, Result};
use librunconfig::parse::{parse_run, RunFlags};
use librunconfig_cli::Run;

use super::print_document;

pub fn run_config(args: Run) -> Result<()> {
    let flags = run_flags(args);
    let (config, host_config) =
        parse_run(&flags).with_context(|| format!("invalid run arguments for {}", flags.image))?;
    print_document(&config, &host_config)
}

fn run_flags(args: Run) -> RunFlags {
    RunFlags {
        attach: args.attach,
        detach: args.detach,
        auto_remove: args.rm,
        interactive: args.interactive,
        tty: args.tty,
        volumes: args.volumes,
        links: args.links,
        env: args.env,
        labels: args.labels,
        expose: args.expose,
        publish: args.publish,
        publish_all: args.publish_all,
        memory: args.memory,
        memory_swap: args.memory_swap,
        cpu_shares: args.cpu_shares,
        cpuset_cpus: args.cpuset_cpus,
        entrypoint: args.entrypoint,
        workdir: args.workdir,
        user: args.user,
        hostname: args.hostname,
        mac_address: args.mac_address,
        dns: args.dns,
        volumes_from: args.volumes_from,
        network_mode: args.net,
        privileged: args.privileged,
        restart: args.restart,
        image: args.image,
        command: args.command,
    }
}
