//! Normalizes `run`-style flag values into a [`Config`] and [`HostConfig`].

use crate::config::{Config, HostConfig, RestartPolicy};
use crate::mount::{parse_mount_spec, MountSpec, MountSpecError};
use crate::port::{self, PortError};
use crate::union::{Command, Entrypoint};
use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid attach value {value:?}: must be one of stdin, stdout or stderr")]
    InvalidAttach { value: String },
    #[error("conflicting options: {first} and {second} cannot be used together")]
    ConflictingFlags {
        first: &'static str,
        second: &'static str,
    },
    #[error(transparent)]
    InvalidMount(#[from] MountSpecError),
    #[error("invalid link {value:?}: expected name:alias")]
    InvalidLink { value: String },
    #[error("invalid environment variable {value:?}")]
    InvalidEnv { value: String },
    #[error("invalid label {value:?}")]
    InvalidLabel { value: String },
    #[error(transparent)]
    InvalidPort(#[from] PortError),
    #[error("invalid memory value {value:?}")]
    InvalidMemory { value: String },
    #[error("memory swap limit {swap} must be at least the memory limit {memory}")]
    MemorySwapTooSmall { memory: i64, swap: i64 },
    #[error("invalid restart policy {value:?}")]
    InvalidRestartPolicy { value: String },
    #[error("an image name is required")]
    MissingImage,
}

/// Flag values as produced by a flag parser, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFlags {
    /// `-a/--attach`, repeatable.
    pub attach: Vec<String>,
    /// `-d/--detach`
    pub detach: bool,
    /// `--rm`
    pub auto_remove: bool,
    /// `-i/--interactive`
    pub interactive: bool,
    /// `-t/--tty`
    pub tty: bool,
    /// `-v/--volume`, repeatable.
    pub volumes: Vec<String>,
    /// `--link`, repeatable.
    pub links: Vec<String>,
    /// `-e/--env`, repeatable.
    pub env: Vec<String>,
    /// `-l/--label`, repeatable.
    pub labels: Vec<String>,
    /// `--expose`, repeatable.
    pub expose: Vec<String>,
    /// `-p/--publish`, repeatable.
    pub publish: Vec<String>,
    /// `-P/--publish-all`
    pub publish_all: bool,
    /// `-m/--memory`
    pub memory: Option<String>,
    /// `--memory-swap`
    pub memory_swap: Option<String>,
    /// `-c/--cpu-shares`
    pub cpu_shares: i64,
    /// `--cpuset-cpus`
    pub cpuset_cpus: Option<String>,
    /// `--entrypoint`
    pub entrypoint: Option<String>,
    /// `-w/--workdir`
    pub workdir: Option<String>,
    /// `-u/--user`
    pub user: Option<String>,
    /// `-h/--hostname`
    pub hostname: Option<String>,
    /// `--mac-address`
    pub mac_address: Option<String>,
    /// `--dns`, repeatable.
    pub dns: Vec<String>,
    /// `--volumes-from`, repeatable.
    pub volumes_from: Vec<String>,
    /// `--net`
    pub network_mode: Option<String>,
    /// `--privileged`
    pub privileged: bool,
    /// `--restart`
    pub restart: Option<String>,
    pub image: String,
    pub command: Vec<String>,
}

const STDIN: &str = "stdin";
const STDOUT: &str = "stdout";
const STDERR: &str = "stderr";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Attach {
    stdin: bool,
    stdout: bool,
    stderr: bool,
}

/// Builds the configuration pair described by `flags`. On error nothing is
/// returned, so a partially built configuration never escapes.
#[tracing::instrument(level = "debug", skip_all, fields(image = %flags.image))]
pub fn parse_run(flags: &RunFlags) -> Result<(Config, HostConfig), ParseError> {
    let attach = parse_attach(&flags.attach)?;
    check_conflicts(flags)?;

    if flags.image.is_empty() {
        return Err(ParseError::MissingImage);
    }

    let attach = if flags.detach {
        Attach::default()
    } else if flags.attach.is_empty() {
        Attach {
            stdin: flags.interactive,
            stdout: true,
            stderr: true,
        }
    } else {
        attach
    };

    let mut config = Config {
        hostname: flags.hostname.clone().unwrap_or_default(),
        user: flags.user.clone().unwrap_or_default(),
        attach_stdin: attach.stdin,
        attach_stdout: attach.stdout,
        attach_stderr: attach.stderr,
        tty: flags.tty,
        open_stdin: flags.interactive,
        stdin_once: flags.interactive && attach.stdin,
        image: flags.image.clone(),
        working_dir: flags.workdir.clone().unwrap_or_default(),
        mac_address: flags.mac_address.clone().unwrap_or_default(),
        ..Default::default()
    };
    let mut host = HostConfig {
        cpu_shares: flags.cpu_shares,
        cpuset_cpus: flags.cpuset_cpus.clone().unwrap_or_default(),
        privileged: flags.privileged,
        publish_all_ports: flags.publish_all,
        dns: flags.dns.clone(),
        volumes_from: flags.volumes_from.clone(),
        network_mode: flags.network_mode.clone().unwrap_or_default(),
        auto_remove: flags.auto_remove,
        ..Default::default()
    };

    if let Some(entrypoint) = flags.entrypoint.as_deref().filter(|e| !e.is_empty()) {
        config.entrypoint = Some(Entrypoint::from(entrypoint));
    }
    if !flags.command.is_empty() {
        config.cmd = Some(Command::new(flags.command.clone()));
    }

    for token in &flags.volumes {
        match parse_mount_spec(token)? {
            MountSpec::NamedVolume { container_path } => {
                config.volumes.insert(container_path);
            }
            MountSpec::Bind(bind) => host
                .binds
                .get_or_insert_with(Vec::new)
                .push(bind.to_string()),
        }
    }

    for link in &flags.links {
        host.links.push(parse_link(link)?);
    }

    for entry in &flags.env {
        if utils::env_key(entry).is_empty() {
            return Err(ParseError::InvalidEnv {
                value: entry.clone(),
            });
        }
        config.env.push(entry.clone());
    }

    for label in &flags.labels {
        let (key, value) = label.split_once('=').unwrap_or((label.as_str(), ""));
        if key.is_empty() {
            return Err(ParseError::InvalidLabel {
                value: label.clone(),
            });
        }
        config.labels.insert(key.to_owned(), value.to_owned());
    }

    let (exposed, bindings) = port::parse_port_specs(&flags.publish)?;
    config.exposed_ports = exposed;
    host.port_bindings = bindings;
    for expose in &flags.expose {
        config.exposed_ports.extend(port::parse_expose(expose)?);
    }

    if let Some(memory) = &flags.memory {
        host.memory = parse_memory(memory)?;
    }
    if let Some(swap) = &flags.memory_swap {
        host.memory_swap = match swap.as_str() {
            "-1" => -1,
            other => parse_memory(other)?,
        };
        if host.memory > 0 && host.memory_swap > 0 && host.memory_swap < host.memory {
            return Err(ParseError::MemorySwapTooSmall {
                memory: host.memory,
                swap: host.memory_swap,
            });
        }
    }

    if let Some(restart) = &flags.restart {
        host.restart_policy =
            RestartPolicy::parse(restart).ok_or_else(|| ParseError::InvalidRestartPolicy {
                value: restart.clone(),
            })?;
        if flags.auto_remove && !host.restart_policy.is_none() {
            return Err(ParseError::ConflictingFlags {
                first: "--restart",
                second: "--rm",
            });
        }
    }

    tracing::debug!(
        volumes = config.volumes.len(),
        binds = host.binds.as_ref().map_or(0, Vec::len),
        links = host.links.len(),
        "normalized run flags"
    );
    Ok((config, host))
}

fn parse_attach(values: &[String]) -> Result<Attach, ParseError> {
    let mut attach = Attach::default();
    for value in values {
        match value.as_str() {
            STDIN => attach.stdin = true,
            STDOUT => attach.stdout = true,
            STDERR => attach.stderr = true,
            _ => {
                return Err(ParseError::InvalidAttach {
                    value: value.clone(),
                })
            }
        }
    }
    Ok(attach)
}

fn check_conflicts(flags: &RunFlags) -> Result<(), ParseError> {
    if flags.detach && !flags.attach.is_empty() {
        return Err(ParseError::ConflictingFlags {
            first: "--attach",
            second: "--detach",
        });
    }
    if flags.detach && flags.auto_remove {
        return Err(ParseError::ConflictingFlags {
            first: "--detach",
            second: "--rm",
        });
    }
    Ok(())
}

/// `name:alias`, or a bare `name` which is its own alias.
fn parse_link(link: &str) -> Result<String, ParseError> {
    let invalid = || ParseError::InvalidLink {
        value: link.to_owned(),
    };
    match link.split(':').collect::<Vec<_>>().as_slice() {
        [name] if !name.is_empty() => Ok(format!("{name}:{name}")),
        [name, alias] if !name.is_empty() && !alias.is_empty() => Ok(link.to_owned()),
        _ => Err(invalid()),
    }
}

fn parse_memory(value: &str) -> Result<i64, ParseError> {
    utils::ram_in_bytes(value).ok_or_else(|| ParseError::InvalidMemory {
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn flags(args: &str) -> RunFlags {
        let mut flags = RunFlags {
            image: "ubuntu".into(),
            command: vec!["bash".into()],
            ..Default::default()
        };
        let mut tokens = args.split_whitespace();
        while let Some(flag) = tokens.next() {
            let mut value = || tokens.next().unwrap_or_default().to_owned();
            match flag {
                "-a" => flags.attach.push(value()),
                "-v" => flags.volumes.push(value()),
                "--link" => flags.links.push(value()),
                "-e" => flags.env.push(value()),
                "-l" => flags.labels.push(value()),
                "-p" => flags.publish.push(value()),
                "--expose" => flags.expose.push(value()),
                "-m" => flags.memory = Some(value()),
                "--memory-swap" => flags.memory_swap = Some(value()),
                "--restart" => flags.restart = Some(value()),
                "--entrypoint" => flags.entrypoint = Some(value()),
                "-d" => flags.detach = true,
                "-i" => flags.interactive = true,
                "--rm" => flags.auto_remove = true,
                other => panic!("unexpected test flag {other}"),
            }
        }
        flags
    }

    fn parse(args: &str) -> Result<(Config, HostConfig), ParseError> {
        parse_run(&flags(args))
    }

    #[test]
    fn test_parse_run_links() -> Result<()> {
        let (_, host) = parse("--link a:b")?;
        assert_eq!(host.links, ["a:b"]);
        let (_, host) = parse("--link a:b --link c:d")?;
        assert_eq!(host.links, ["a:b", "c:d"]);
        let (_, host) = parse("")?;
        assert!(host.links.is_empty());
        let (_, host) = parse("--link db")?;
        assert_eq!(host.links, ["db:db"]);

        for bad in ["a:b:c", ":b", "a:", ""] {
            assert!(
                matches!(
                    parse_run(&RunFlags {
                        links: vec![bad.into()],
                        ..flags("")
                    }),
                    Err(ParseError::InvalidLink { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
        Ok(())
    }

    #[test]
    fn test_parse_run_attach() -> Result<()> {
        let (config, _) = parse("-a stdin")?;
        assert!(config.attach_stdin && !config.attach_stdout && !config.attach_stderr);

        let (config, _) = parse("-a stdin -a stdout")?;
        assert!(config.attach_stdin && config.attach_stdout && !config.attach_stderr);

        let (config, _) = parse("-a stdin -a stdout -a stderr")?;
        assert!(config.attach_stdin && config.attach_stdout && config.attach_stderr);

        let (config, _) = parse("")?;
        assert!(!config.attach_stdin && config.attach_stdout && config.attach_stderr);

        let (config, _) = parse("-d")?;
        assert!(!config.attach_stdin && !config.attach_stdout && !config.attach_stderr);
        Ok(())
    }

    #[test]
    fn test_parse_run_attach_errors() {
        for args in ["-a", "-a invalid", "-a invalid -a stdout", "-a stdout -a Stdin"] {
            assert!(
                matches!(parse(args), Err(ParseError::InvalidAttach { .. })),
                "{args} should be an invalid attach"
            );
        }
        for args in [
            "-a stdout -a stderr -d",
            "-a stdin -d",
            "-a stdout -d",
            "-a stderr -d",
            "-d --rm",
            "--rm --restart always",
        ] {
            assert!(
                matches!(parse(args), Err(ParseError::ConflictingFlags { .. })),
                "{args} should conflict"
            );
        }
        assert!(parse("--rm --restart no").is_ok());
    }

    #[test]
    fn test_parse_run_interactive() -> Result<()> {
        let (config, _) = parse("-i")?;
        assert!(config.attach_stdin && config.open_stdin && config.stdin_once);

        let (config, _) = parse("-i -a stdout")?;
        assert!(!config.attach_stdin && config.open_stdin && !config.stdin_once);

        let (config, _) = parse("-i -d")?;
        assert!(!config.attach_stdin && config.open_stdin && !config.stdin_once);
        Ok(())
    }

    #[test]
    fn test_parse_run_volumes() -> Result<()> {
        let (config, host) = parse("-v /tmp")?;
        assert_eq!(host.binds, None);
        assert!(config.volumes.contains("/tmp"));

        let (config, host) = parse("-v /tmp -v /var")?;
        assert_eq!(host.binds, None);
        assert!(config.volumes.contains("/tmp") && config.volumes.contains("/var"));

        let (config, host) = parse("-v /hostTmp:/containerTmp")?;
        assert_eq!(host.binds, Some(vec!["/hostTmp:/containerTmp".to_owned()]));
        assert!(config.volumes.is_empty());

        let (_, host) = parse("-v /hostTmp:/containerTmp:ro -v /hostVar:/containerVar:rw")?;
        assert_eq!(
            host.binds.unwrap_or_default(),
            ["/hostTmp:/containerTmp:ro", "/hostVar:/containerVar:rw"]
        );

        let (_, host) = parse("-v /hostTmp:/containerTmp:roZ -v /hostVar:/containerVar:rwZ")?;
        assert_eq!(
            host.binds.unwrap_or_default(),
            ["/hostTmp:/containerTmp:roZ", "/hostVar:/containerVar:rwZ"]
        );

        let (_, host) = parse("-v /hostTmp:/containerTmp:Z -v /hostVar:/containerVar:z")?;
        assert_eq!(
            host.binds.unwrap_or_default(),
            ["/hostTmp:/containerTmp:Z", "/hostVar:/containerVar:z"]
        );

        let (config, host) = parse("-v /hostTmp:/containerTmp -v /containerVar")?;
        assert_eq!(host.binds, Some(vec!["/hostTmp:/containerTmp".to_owned()]));
        assert!(config.volumes.contains("/containerVar"));
        assert_eq!(config.volumes.len(), 1);

        let (config, host) = parse("")?;
        assert_eq!(host.binds, None);
        assert!(config.volumes.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_run_volume_duplicates() -> Result<()> {
        let (config, host) = parse("-v /data -v /data -v /a:/b -v /a:/b")?;
        assert_eq!(config.volumes.len(), 1);
        assert_eq!(host.binds.unwrap_or_default(), ["/a:/b", "/a:/b"]);
        Ok(())
    }

    #[test]
    fn test_parse_run_volume_errors() {
        for args in [
            "-v /",
            "-v /:/",
            "-v",
            "-v /tmp:",
            "-v /tmp:ro",
            "-v /tmp::",
            "-v :",
            "-v ::",
            "-v /tmp:/tmp:/tmp:/tmp",
        ] {
            assert!(
                matches!(parse(args), Err(ParseError::InvalidMount(_))),
                "{args} should fail"
            );
        }
    }

    #[test]
    fn test_parse_run_env_and_labels() -> Result<()> {
        let (config, _) = parse("-e A=1 -e B -e A=2 -l tier=web -l debug")?;
        assert_eq!(config.env, ["A=1", "B", "A=2"]);
        assert_eq!(config.labels["tier"], "web");
        assert_eq!(config.labels["debug"], "");

        assert!(matches!(
            parse("-e =oops"),
            Err(ParseError::InvalidEnv { .. })
        ));
        assert!(matches!(
            parse("-l =oops"),
            Err(ParseError::InvalidLabel { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_parse_run_ports() -> Result<()> {
        let (config, host) = parse("-p 8080:80 --expose 9000-9001 --expose 53/udp")?;
        let exposed: Vec<_> = config.exposed_ports.iter().map(|p| p.as_str()).collect();
        assert_eq!(exposed, ["53/udp", "80/tcp", "9000/tcp", "9001/tcp"]);
        assert_eq!(host.port_bindings.len(), 1);

        assert!(matches!(
            parse("--expose 1:2"),
            Err(ParseError::InvalidPort(_))
        ));
        assert!(matches!(parse("-p x"), Err(ParseError::InvalidPort(_))));
        Ok(())
    }

    #[test]
    fn test_parse_run_memory() -> Result<()> {
        let (_, host) = parse("-m 512m --memory-swap 1g")?;
        assert_eq!(host.memory, 512 * 1024 * 1024);
        assert_eq!(host.memory_swap, 1024 * 1024 * 1024);

        let (_, host) = parse("-m 1g --memory-swap -1")?;
        assert_eq!(host.memory_swap, -1);

        let (_, host) = parse("-m 2G --memory-swap 4GB")?;
        assert_eq!(host.memory, 2 << 30);
        assert_eq!(host.memory_swap, 4 << 30);

        assert!(matches!(
            parse("-m lots"),
            Err(ParseError::InvalidMemory { .. })
        ));
        assert!(matches!(
            parse("-m 1g --memory-swap 512m"),
            Err(ParseError::MemorySwapTooSmall { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_parse_run_entrypoint_and_command() -> Result<()> {
        let (config, _) = parse("--entrypoint /bin/sh")?;
        assert_eq!(config.entrypoint.unwrap_or_default().slice(), ["/bin/sh"]);
        assert_eq!(config.cmd.unwrap_or_default().slice(), ["bash"]);

        let (config, _) = parse_run(&RunFlags {
            image: "ubuntu".into(),
            ..Default::default()
        })?;
        assert_eq!(config.entrypoint, None);
        assert_eq!(config.cmd, None);
        Ok(())
    }

    #[test]
    fn test_parse_run_restart() -> Result<()> {
        let (_, host) = parse("--restart on-failure:3")?;
        assert_eq!(host.restart_policy.name, "on-failure");
        assert_eq!(host.restart_policy.maximum_retry_count, 3);
        assert!(matches!(
            parse("--restart sometimes"),
            Err(ParseError::InvalidRestartPolicy { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_parse_run_missing_image() {
        assert_eq!(parse_run(&RunFlags::default()), Err(ParseError::MissingImage));
    }
}
