//! Port tokens used by exposed ports and port bindings.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_PROTO: &str = "tcp";
const PROTOCOLS: [&str; 3] = ["tcp", "udp", "sctp"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("invalid port {value:?}")]
    InvalidPort { value: String },
    #[error("invalid protocol {proto:?} in {value:?}")]
    InvalidProto { value: String, proto: String },
    #[error("invalid port range {value:?}")]
    InvalidRange { value: String },
    #[error("invalid port specification {value:?}")]
    InvalidSpec { value: String },
    #[error("host port range {host:?} does not match container port range {container:?}")]
    RangeMismatch { host: String, container: String },
    #[error("port {value:?} may not contain a host part here")]
    UnexpectedHost { value: String },
}

/// A `<port>/<proto>` token. Construct through [`Port::parse`] to get the
/// normalized form; values decoded from a document are kept verbatim and
/// normalized when they are compared or merged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Port(String);

impl Port {
    pub fn new(port: u16, proto: &str) -> Self {
        Self(format!("{port}/{proto}"))
    }

    /// Accepts `80`, `80/udp` or `0000`, returns `80/tcp`, `80/udp`, `0/tcp`.
    pub fn parse(value: &str) -> Result<Self, PortError> {
        let (port, proto) = split_proto(value)?;
        let number = parse_port_number(port, value)?;
        Ok(Self::new(number, proto))
    }

    /// The normalized form of this token.
    pub fn normalized(&self) -> Result<Self, PortError> {
        Self::parse(&self.0)
    }

    pub fn port(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(port, _)| port)
    }

    pub fn proto(&self) -> &str {
        self.0.split_once('/').map_or(DEFAULT_PROTO, |(_, proto)| proto)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps a token without validating it, as a document decoder would.
    pub fn from_raw<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Port {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Port {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Port)
    }
}

/// A set of ports, serialized as `{"80/tcp": {}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortSet(BTreeSet<Port>);

impl PortSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, port: Port) -> bool {
        self.0.insert(port)
    }

    pub fn contains(&self, port: &Port) -> bool {
        self.0.contains(port)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.0.iter()
    }

    pub fn extend<I: IntoIterator<Item = Port>>(&mut self, ports: I) {
        self.0.extend(ports)
    }
}

impl FromIterator<Port> for PortSet {
    fn from_iter<I: IntoIterator<Item = Port>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PortSet {
    type Item = &'a Port;
    type IntoIter = std::collections::btree_set::Iter<'a, Port>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for PortSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for port in &self.0 {
            map.serialize_entry(port, &Empty {})?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PortSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(KeySetVisitor::default())
            .map(|keys| PortSet(keys.into_iter().map(Port).collect()))
    }
}

/// The empty object used as the value of set-like maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Empty {}

/// Reads the keys of a JSON object whose values carry no information.
#[derive(Default)]
pub(crate) struct KeySetVisitor;

impl<'de> Visitor<'de> for KeySetVisitor {
    type Value = BTreeSet<String>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object keyed by member")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(BTreeSet::new())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut keys = BTreeSet::new();
        while let Some((key, _)) = access.next_entry::<String, de::IgnoredAny>()? {
            keys.insert(key);
        }
        Ok(keys)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    #[serde(default)]
    pub host_ip: String,
    #[serde(default)]
    pub host_port: String,
}

pub type PortMap = BTreeMap<Port, Vec<PortBinding>>;

/// Parses an `--expose` token (`80`, `80/udp`, `8000-8010/tcp`) into ports.
pub fn parse_expose(value: &str) -> Result<Vec<Port>, PortError> {
    if value.contains(':') {
        return Err(PortError::UnexpectedHost {
            value: value.to_owned(),
        });
    }
    let (ports, proto) = split_proto(value)?;
    let (start, end) = parse_port_range(ports, value)?;
    Ok((start..=end).map(|p| Port::new(p, proto)).collect())
}

/// Parses `-p` publish tokens. Each token is one of `containerPort`,
/// `hostPort:containerPort`, `ip::containerPort` or
/// `ip:hostPort:containerPort`, with an optional `/proto`. Ports on either
/// side may be ranges.
pub fn parse_port_specs<S: AsRef<str>>(specs: &[S]) -> Result<(PortSet, PortMap), PortError> {
    let mut exposed = PortSet::new();
    let mut bindings = PortMap::new();

    for spec in specs {
        let raw = spec.as_ref();
        let (host_ip, host_port, container) = split_publish(raw)?;
        let (container_ports, proto) = split_proto(container)?;
        let (start, end) = parse_port_range(container_ports, raw)?;

        let host_range = if host_port.is_empty() {
            None
        } else {
            let (host_start, host_end) = parse_port_range(host_port, raw)?;
            if host_end - host_start != end - start {
                return Err(PortError::RangeMismatch {
                    host: host_port.to_owned(),
                    container: container_ports.to_owned(),
                });
            }
            Some(host_start)
        };

        for (offset, number) in (start..=end).enumerate() {
            let port = Port::new(number, proto);
            let host_port = match host_range {
                // offset is bounded by the validated u16 range width
                Some(host_start) => (u32::from(host_start) + offset as u32).to_string(),
                None => String::new(),
            };
            exposed.insert(port.clone());
            bindings.entry(port).or_default().push(PortBinding {
                host_ip: host_ip.to_owned(),
                host_port,
            });
        }
    }

    Ok((exposed, bindings))
}

fn split_publish(raw: &str) -> Result<(&str, &str, &str), PortError> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (ip, host, container) = match parts.as_slice() {
        [container] => ("", "", *container),
        [host, container] => ("", *host, *container),
        [ip, host, container] => (*ip, *host, *container),
        _ => {
            return Err(PortError::InvalidSpec {
                value: raw.to_owned(),
            })
        }
    };
    if container.is_empty() || (parts.len() == 2 && host.is_empty()) {
        return Err(PortError::InvalidSpec {
            value: raw.to_owned(),
        });
    }
    Ok((ip, host, container))
}

fn split_proto(value: &str) -> Result<(&str, &str), PortError> {
    match value.split_once('/') {
        None => Ok((value, DEFAULT_PROTO)),
        Some((port, proto)) => {
            let proto = PROTOCOLS
                .iter()
                .find(|p| p.eq_ignore_ascii_case(proto))
                .ok_or_else(|| PortError::InvalidProto {
                    value: value.to_owned(),
                    proto: proto.to_owned(),
                })?;
            Ok((port, *proto))
        }
    }
}

fn parse_port_number(port: &str, value: &str) -> Result<u16, PortError> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PortError::InvalidPort {
            value: value.to_owned(),
        });
    }
    port.parse().map_err(|_| PortError::InvalidPort {
        value: value.to_owned(),
    })
}

fn parse_port_range(ports: &str, value: &str) -> Result<(u16, u16), PortError> {
    match ports.split_once('-') {
        None => {
            let port = parse_port_number(ports, value)?;
            Ok((port, port))
        }
        Some((start, end)) => {
            let start = parse_port_number(start, value)?;
            let end = parse_port_number(end, value)?;
            if end < start {
                return Err(PortError::InvalidRange {
                    value: value.to_owned(),
                });
            }
            Ok((start, end))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_port_parse() -> Result<()> {
        assert_eq!(Port::parse("80")?.as_str(), "80/tcp");
        assert_eq!(Port::parse("53/udp")?.as_str(), "53/udp");
        assert_eq!(Port::parse("0000")?.as_str(), "0/tcp");
        assert_eq!(Port::parse("22/TCP")?.as_str(), "22/tcp");
        assert_eq!(Port::parse("1111")?.port(), "1111");
        assert_eq!(Port::parse("1111")?.proto(), "tcp");

        assert!(Port::parse("").is_err());
        assert!(Port::parse("abc").is_err());
        assert!(Port::parse("65536").is_err());
        assert!(Port::parse("80/icmp").is_err());
        assert!(Port::parse("-1").is_err());
        Ok(())
    }

    #[test]
    fn test_port_set_json() -> Result<()> {
        let set: PortSet = serde_json::from_str(r#"{"22/tcp": {}, "80/tcp": {}}"#)?;
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Port::parse("22")?));
        assert_eq!(
            serde_json::to_string(&set)?,
            r#"{"22/tcp":{},"80/tcp":{}}"#
        );

        let set: PortSet = serde_json::from_str("null")?;
        assert!(set.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_expose() -> Result<()> {
        assert_eq!(parse_expose("80")?, vec![Port::parse("80")?]);
        let range = parse_expose("8000-8002/udp")?;
        assert_eq!(
            range.iter().map(Port::as_str).collect::<Vec<_>>(),
            ["8000/udp", "8001/udp", "8002/udp"]
        );
        assert!(parse_expose("127.0.0.1:80").is_err());
        assert!(parse_expose("90-80").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_port_specs() -> Result<()> {
        let (exposed, bindings) = parse_port_specs(&[
            "80",
            "8080:80",
            "127.0.0.1::53/udp",
            "0.0.0.0:9000-9001:7000-7001",
        ])?;

        assert_eq!(exposed.len(), 4);
        let http = &bindings[&Port::parse("80")?];
        assert_eq!(
            http,
            &vec![
                PortBinding::default(),
                PortBinding {
                    host_ip: String::new(),
                    host_port: "8080".into()
                }
            ]
        );
        let dns = &bindings[&Port::parse("53/udp")?];
        assert_eq!(dns[0].host_ip, "127.0.0.1");
        assert_eq!(dns[0].host_port, "");
        assert_eq!(bindings[&Port::parse("7001")?][0].host_port, "9001");
        Ok(())
    }

    #[test]
    fn test_parse_port_specs_errors() {
        for bad in [
            "",
            ":80",
            "8080:",
            "1:2:3:4",
            "9000-9002:7000-7001",
            "80/bogus",
            "host:abc:80",
        ] {
            assert!(parse_port_specs(&[bad]).is_err(), "{bad:?} should fail");
        }
    }
}
