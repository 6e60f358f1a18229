use clap::Parser;

/// Normalize `docker run` style arguments into a container config document
// `-h` is taken by --hostname, so help is only reachable through --help.
#[derive(Parser, Debug, Default)]
#[clap(disable_help_flag = true)]
pub struct Run {
    /// Attach to STDIN, STDOUT or STDERR
    #[clap(short, long, number_of_values = 1)]
    pub attach: Vec<String>,
    /// Run the container in the background
    #[clap(short, long)]
    pub detach: bool,
    /// Automatically remove the container when it exits
    #[clap(long)]
    pub rm: bool,
    /// Keep STDIN open even if not attached
    #[clap(short, long)]
    pub interactive: bool,
    /// Allocate a pseudo-TTY
    #[clap(short, long)]
    pub tty: bool,
    /// Bind mount a volume, or create an anonymous one
    #[clap(short, long = "volume", number_of_values = 1)]
    pub volumes: Vec<String>,
    /// Add a link to another container (name or name:alias)
    #[clap(long = "link", number_of_values = 1)]
    pub links: Vec<String>,
    /// Set environment variables
    #[clap(short, long, number_of_values = 1)]
    pub env: Vec<String>,
    /// Set metadata on the container
    #[clap(short, long = "label", number_of_values = 1)]
    pub labels: Vec<String>,
    /// Expose a port or a range of ports
    #[clap(long, number_of_values = 1)]
    pub expose: Vec<String>,
    /// Publish a container's port(s) to the host
    #[clap(short, long, number_of_values = 1)]
    pub publish: Vec<String>,
    /// Publish all exposed ports to random ports
    #[clap(short = 'P', long)]
    pub publish_all: bool,
    /// Memory limit (format: <number>[<unit>], where unit = b, k, m or g)
    #[clap(short, long)]
    pub memory: Option<String>,
    /// Total memory (memory + swap), '-1' to disable swap limits
    #[clap(long, allow_hyphen_values = true)]
    pub memory_swap: Option<String>,
    /// CPU shares (relative weight)
    #[clap(short, long, default_value = "0")]
    pub cpu_shares: i64,
    /// CPUs in which to allow execution (0-3, 0,1)
    #[clap(long)]
    pub cpuset_cpus: Option<String>,
    /// Overwrite the default entrypoint of the image
    #[clap(long)]
    pub entrypoint: Option<String>,
    /// Working directory inside the container
    #[clap(short, long)]
    pub workdir: Option<String>,
    /// Username or UID
    #[clap(short, long)]
    pub user: Option<String>,
    /// Container host name
    #[clap(short, long)]
    pub hostname: Option<String>,
    /// Container MAC address (e.g. 92:d0:c6:0a:29:33)
    #[clap(long)]
    pub mac_address: Option<String>,
    /// Set custom DNS servers
    #[clap(long, number_of_values = 1)]
    pub dns: Vec<String>,
    /// Mount volumes from the specified container(s)
    #[clap(long, number_of_values = 1)]
    pub volumes_from: Vec<String>,
    /// Set the network mode for the container
    #[clap(long)]
    pub net: Option<String>,
    /// Give extended privileges to this container
    #[clap(long)]
    pub privileged: bool,
    /// Restart policy to apply when a container exits
    #[clap(long)]
    pub restart: Option<String>,
    /// Print help
    #[clap(long, action = clap::ArgAction::Help)]
    pub help: Option<bool>,

    /// Image the container is created from
    #[clap(value_parser = clap::builder::NonEmptyStringValueParser::new(), required = true)]
    pub image: String,
    /// Command to run in the container
    #[clap(required = false, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Run, clap::Error> {
        Run::try_parse_from(std::iter::once("run-config").chain(args.iter().copied()))
    }

    #[test]
    fn test_run_flags() {
        let run = parse(&[
            "-a", "stdin", "-a", "stdout", "-i", "-t", "--rm", "-v", "/data", "-v",
            "/src:/dst:ro", "--link", "db:db", "-e", "A=1", "-l", "team=infra", "-p",
            "8080:80", "-P", "-m", "1g", "--memory-swap", "-1", "-c", "512", "-h", "box",
            "-w", "/srv", "-u", "app", "--net", "host", "--restart", "on-failure:3", "ubuntu",
            "bash", "-c", "true",
        ])
        .expect("valid arguments");

        assert_eq!(run.attach, ["stdin", "stdout"]);
        assert!(run.interactive && run.tty && run.rm && run.publish_all);
        assert!(!run.detach);
        assert_eq!(run.volumes, ["/data", "/src:/dst:ro"]);
        assert_eq!(run.links, ["db:db"]);
        assert_eq!(run.env, ["A=1"]);
        assert_eq!(run.labels, ["team=infra"]);
        assert_eq!(run.publish, ["8080:80"]);
        assert_eq!(run.memory.as_deref(), Some("1g"));
        assert_eq!(run.memory_swap.as_deref(), Some("-1"));
        assert_eq!(run.cpu_shares, 512);
        assert_eq!(run.hostname.as_deref(), Some("box"));
        assert_eq!(run.workdir.as_deref(), Some("/srv"));
        assert_eq!(run.user.as_deref(), Some("app"));
        assert_eq!(run.net.as_deref(), Some("host"));
        assert_eq!(run.restart.as_deref(), Some("on-failure:3"));
        assert_eq!(run.image, "ubuntu");
        assert_eq!(run.command, ["bash", "-c", "true"]);
    }

    #[test]
    fn test_run_requires_image() {
        assert!(parse(&["-d"]).is_err());
        assert!(parse(&[""]).is_err());
    }

    #[test]
    fn test_run_defaults() {
        let run = parse(&["busybox"]).expect("valid arguments");
        assert!(run.attach.is_empty());
        assert!(run.command.is_empty());
        assert_eq!(run.cpu_shares, 0);
        assert_eq!(run.memory, None);
    }
}
