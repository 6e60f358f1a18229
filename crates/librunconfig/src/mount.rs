//! Parsing of `-v` volume tokens.
//!
//! A token is `container`, `host:container` or `host:container:mode`. The
//! single segment form declares a named volume, the others bind a host path.
//! A two segment token is always read as `host:container`; a mode can only be
//! given as the third segment.

use std::fmt;
use std::path::Path;

use crate::utils::PathExt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountSpecError {
    #[error("invalid volume specification {spec:?}: expected 1 to 3 colon separated parts, found {count}")]
    SegmentCount { spec: String, count: usize },
    #[error("invalid volume specification {spec:?}: empty path")]
    EmptyPath { spec: String },
    #[error("invalid volume specification {spec:?}: cannot mount over the root directory")]
    RootTarget { spec: String },
    #[error("invalid volume specification {spec:?}: {path:?} is not an absolute path")]
    RelativeTarget { spec: String, path: String },
    #[error("invalid volume specification {spec:?}: unknown mode {mode:?}")]
    UnknownMode { spec: String, mode: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Relabel {
    #[default]
    Unlabeled,
    /// `Z`: the content is private to this container.
    Private,
    /// `z`: the content is shared between containers.
    Shared,
}

/// The mode suffix of a bind mount. `access` is `None` when only a relabel
/// flag was written (`z`, `Z`); such a mount is read-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MountMode {
    pub access: Option<Access>,
    pub relabel: Relabel,
}

impl MountMode {
    pub fn parse(mode: &str) -> Option<Self> {
        if !mode.is_ascii() {
            return None;
        }
        let (access, relabel) = match mode.len() {
            1 => ("", mode),
            2 => (mode, ""),
            3 => mode.split_at(2),
            _ => return None,
        };
        let access = match access {
            "" => None,
            "rw" => Some(Access::ReadWrite),
            "ro" => Some(Access::ReadOnly),
            _ => return None,
        };
        let relabel = match relabel {
            "" => Relabel::Unlabeled,
            "Z" => Relabel::Private,
            "z" => Relabel::Shared,
            _ => return None,
        };
        Some(Self { access, relabel })
    }

    pub fn is_read_only(&self) -> bool {
        self.access == Some(Access::ReadOnly)
    }
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access {
            Some(Access::ReadWrite) => f.write_str("rw")?,
            Some(Access::ReadOnly) => f.write_str("ro")?,
            None => {}
        }
        match self.relabel {
            Relabel::Unlabeled => Ok(()),
            Relabel::Private => f.write_str("Z"),
            Relabel::Shared => f.write_str("z"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindMount {
    pub host_path: String,
    pub container_path: String,
    pub mode: Option<MountMode>,
}

impl BindMount {
    pub fn is_read_only(&self) -> bool {
        self.mode.map_or(false, |m| m.is_read_only())
    }
}

/// Renders the literal stored in `HostConfig.Binds`.
impl fmt::Display for BindMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_path, self.container_path)?;
        if let Some(mode) = self.mode {
            write!(f, ":{mode}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MountSpec {
    NamedVolume { container_path: String },
    Bind(BindMount),
}

impl MountSpec {
    pub fn container_path(&self) -> &str {
        match self {
            MountSpec::NamedVolume { container_path } => container_path,
            MountSpec::Bind(bind) => &bind.container_path,
        }
    }
}

/// Parses a single `-v` token.
pub fn parse_mount_spec(spec: &str) -> Result<MountSpec, MountSpecError> {
    let segments: Vec<&str> = spec.split(':').collect();
    match segments.as_slice() {
        [container] => {
            check_container_path(spec, container)?;
            Ok(MountSpec::NamedVolume {
                container_path: (*container).to_owned(),
            })
        }
        [host, container] => Ok(MountSpec::Bind(bind(spec, host, container, None)?)),
        [host, container, mode] => {
            let parsed = MountMode::parse(mode).ok_or_else(|| MountSpecError::UnknownMode {
                spec: spec.to_owned(),
                mode: (*mode).to_owned(),
            })?;
            Ok(MountSpec::Bind(bind(spec, host, container, Some(parsed))?))
        }
        _ => Err(MountSpecError::SegmentCount {
            spec: spec.to_owned(),
            count: segments.len(),
        }),
    }
}

fn bind(
    spec: &str,
    host: &str,
    container: &str,
    mode: Option<MountMode>,
) -> Result<BindMount, MountSpecError> {
    if host.is_empty() {
        return Err(MountSpecError::EmptyPath {
            spec: spec.to_owned(),
        });
    }
    check_container_path(spec, container)?;
    Ok(BindMount {
        host_path: host.to_owned(),
        container_path: container.to_owned(),
        mode,
    })
}

fn check_container_path(spec: &str, container: &str) -> Result<(), MountSpecError> {
    if container.is_empty() {
        return Err(MountSpecError::EmptyPath {
            spec: spec.to_owned(),
        });
    }
    let path = Path::new(container);
    if !path.is_absolute() {
        return Err(MountSpecError::RelativeTarget {
            spec: spec.to_owned(),
            path: container.to_owned(),
        });
    }
    if path.is_root() {
        return Err(MountSpecError::RootTarget {
            spec: spec.to_owned(),
        });
    }
    Ok(())
}
