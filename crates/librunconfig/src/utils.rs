//! Utility functionality

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

static RAM_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)([kKmMgGtTpP])?[bB]?$").expect("static size pattern is valid")
});

pub trait PathExt {
    fn normalize(&self) -> PathBuf;
    fn is_root(&self) -> bool;
}

impl PathExt for Path {
    /// Normalizes a path. In contrast to canonicalize the path does not need to exist.
    // adapted from https://github.com/rust-lang/cargo/blob/fede83ccf973457de319ba6fa0e36ead454d2e20/src/cargo/util/paths.rs#L61
    fn normalize(&self) -> PathBuf {
        let mut components = self.components().peekable();
        let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek().cloned() {
            components.next();
            PathBuf::from(c.as_os_str())
        } else {
            PathBuf::new()
        };

        for component in components {
            match component {
                Component::Prefix(..) => {}
                Component::RootDir => {
                    ret.push(component.as_os_str());
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    ret.pop();
                }
                Component::Normal(c) => {
                    ret.push(c);
                }
            }
        }
        ret
    }

    /// True for `/` and anything that normalizes to it, such as `/.` or `/tmp/..`.
    fn is_root(&self) -> bool {
        self.is_absolute() && self.normalize() == Path::new("/")
    }
}

/// Returns the key part of a `KEY=VALUE` environment entry.
pub fn env_key(entry: &str) -> &str {
    entry.split_once('=').map_or(entry, |(key, _)| key)
}

/// Parses a human readable size such as `512m` or `1G` into bytes. Suffixes
/// are binary multiples and an optional trailing `b` is accepted.
pub fn ram_in_bytes(size: &str) -> Option<i64> {
    let captures = RAM_SIZE.captures(size.trim())?;
    let value: i64 = captures.get(1)?.as_str().parse().ok()?;
    let shift = match captures
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .as_deref()
    {
        None => 0,
        Some("k") => 10,
        Some("m") => 20,
        Some("g") => 30,
        Some("t") => 40,
        Some("p") => 50,
        Some(_) => return None,
    };
    value.checked_mul(1_i64 << shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(Path::new("/a/./b/../c").normalize(), PathBuf::from("/a/c"));
        assert_eq!(Path::new("/..").normalize(), PathBuf::from("/"));
    }

    #[test]
    fn test_is_root() {
        for root in ["/", "/.", "//", "/tmp/..", "/../.."] {
            assert!(Path::new(root).is_root(), "{root} should be root");
        }
        for not_root in ["/tmp", "tmp", ".", "", "/tmp/../var"] {
            assert!(!Path::new(not_root).is_root(), "{not_root} should not be root");
        }
    }

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("PATH=/usr/bin"), "PATH");
        assert_eq!(env_key("A=b=c"), "A");
        assert_eq!(env_key("TERM"), "TERM");
        assert_eq!(env_key("EMPTY="), "EMPTY");
    }

    #[test]
    fn test_ram_in_bytes() {
        let cases = [
            ("32", Some(32)),
            ("32b", Some(32)),
            ("32k", Some(32 * 1024)),
            ("32KB", Some(32 * 1024)),
            ("1m", Some(1024 * 1024)),
            ("2G", Some(2 * 1024 * 1024 * 1024)),
            ("1t", Some(1 << 40)),
            ("", None),
            ("-1", None),
            ("12x", None),
            ("1.5g", None),
            ("m", None),
            ("99999999999p", None),
        ];
        for (input, expected) in cases {
            assert_eq!(ram_in_bytes(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_ram_in_bytes_suffix_case() {
        assert_eq!(ram_in_bytes("512m"), Some(512 * 1024 * 1024));
        assert_eq!(ram_in_bytes("512M"), Some(512 * 1024 * 1024));
        assert_eq!(ram_in_bytes("1Gb"), Some(1 << 30));
        assert_eq!(ram_in_bytes("1gB"), Some(1 << 30));
        assert_eq!(ram_in_bytes("4P"), Some(4 << 50));
        assert_eq!(ram_in_bytes("1 k"), None);
        assert_eq!(ram_in_bytes("1kk"), None);
    }
}
