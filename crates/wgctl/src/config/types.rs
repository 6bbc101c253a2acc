//! Tunnel definition types and their YAML shape.

use serde::Deserialize;

use crate::netlink::error::{Error, Result};
use crate::util::IpPrefix;

/// A validated tunnel definition.
///
/// Key material is kept in its external encoding (base64 for private and
/// public keys, hex for preshared keys) and only decoded when the
/// `SET_DEVICE` message is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    /// Tunnel name, also the interface name.
    pub instance: String,
    pub description: Option<String>,
    pub interface: InterfaceConfig,
    pub peers: Vec<PeerConfig>,
    /// Commands run after bring-up, in order.
    pub post_up: Vec<String>,
    /// Commands run before tear-down, in order.
    pub pre_down: Vec<String>,
}

/// The `interface` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// Base64 private key, as read from the key file.
    pub private_key: String,
    pub listen_port: u16,
    pub fwmark: Option<u32>,
    pub address: Option<IpPrefix>,
}

/// One entry of the `peers` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    pub description: Option<String>,
    /// Base64 public key.
    pub public_key: String,
    /// 64 hexadecimal characters.
    pub preshared_key: Option<String>,
    /// `host:port`, IPv4 only.
    pub endpoint: Option<String>,
    pub allowed_ips: Vec<IpPrefix>,
    /// Seconds.
    pub persistent_keepalive_interval: Option<u16>,
}

impl TunnelConfig {
    /// A minimal definition without peers, hooks or address.
    pub fn new(instance: impl Into<String>, private_key: impl Into<String>, listen_port: u16) -> Self {
        Self {
            instance: instance.into(),
            description: None,
            interface: InterfaceConfig {
                private_key: private_key.into(),
                listen_port,
                fwmark: None,
                address: None,
            },
            peers: Vec::new(),
            post_up: Vec::new(),
            pre_down: Vec::new(),
        }
    }

    /// True when any peer routes `0.0.0.0/0`.
    pub fn has_catch_all(&self) -> bool {
        self.peers
            .iter()
            .any(|peer| peer.allowed_ips.iter().any(IpPrefix::is_catch_all))
    }

    /// Description of the peer with the given base64 public key.
    pub fn peer_description(&self, public_key: &str) -> Option<&str> {
        self.peers
            .iter()
            .find(|peer| peer.public_key == public_key)
            .and_then(|peer| peer.description.as_deref())
    }
}

impl PeerConfig {
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            description: None,
            public_key: public_key.into(),
            preshared_key: None,
            endpoint: None,
            allowed_ips: Vec::new(),
            persistent_keepalive_interval: None,
        }
    }

    pub fn allowed_ip(mut self, prefix: IpPrefix) -> Self {
        self.allowed_ips.push(prefix);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn preshared_key(mut self, hex: impl Into<String>) -> Self {
        self.preshared_key = Some(hex.into());
        self
    }
}

// ============================================================================
// File shape
// ============================================================================

/// Top level of a tunnel file, before validation.
///
/// Sections are loosely typed so that validation can report which part is
/// wrong instead of a bare YAML type error.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConfig {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub interface: Option<serde_yaml::Value>,
    #[serde(default)]
    pub peers: Option<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawInterface {
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub listen_port: Option<serde_yaml::Value>,
    #[serde(default)]
    pub fwmark: Option<u32>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub post_up: Vec<String>,
    #[serde(default)]
    pub pre_down: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPeer {
    #[serde(default)]
    pub description: Option<String>,
    pub public_key: String,
    #[serde(default)]
    pub preshared_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    #[serde(default)]
    pub persistent_keepalive_interval: Option<u16>,
}

fn invalid(message: impl std::fmt::Display) -> Error {
    Error::Config(format!("could not parse configuration: {}", message))
}

/// Intermediate result of validation; the private key is still a file path.
#[derive(Debug)]
pub(crate) struct Validated {
    pub private_key_path: String,
    pub config: TunnelConfig,
}

impl RawConfig {
    /// Check the structure and parse addresses.
    ///
    /// Keys and endpoints are left for the message mapper.
    pub(crate) fn validate(self, instance: &str) -> Result<Validated> {
        let interface = match self.interface {
            Some(value @ serde_yaml::Value::Mapping(_)) => serde_yaml::from_value::<RawInterface>(value)
                .map_err(|e| invalid(format!("interface: {}", e)))?,
            _ => return Err(invalid("there must be an interface definition")),
        };

        let private_key_path = interface
            .private_key
            .ok_or_else(|| invalid("the interface must have a private key"))?;

        let listen_port = match interface.listen_port.as_ref().and_then(serde_yaml::Value::as_u64) {
            Some(port) if port > 0 && port <= u64::from(u16::MAX) => port as u16,
            _ => return Err(invalid("the interface must have an integer listening port")),
        };

        let address = interface
            .address
            .as_deref()
            .map(|a| a.parse::<IpPrefix>().map_err(|e| invalid(format!("interface address: {}", e))))
            .transpose()?;

        let peers = match self.peers {
            None | Some(serde_yaml::Value::Null) => Vec::new(),
            Some(serde_yaml::Value::Sequence(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    serde_yaml::from_value::<RawPeer>(item)
                        .map_err(|e| invalid(format!("peer {}: {}", i, e)))
                        .and_then(|raw| raw.validate(i))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(invalid("the peers definition must be a list")),
        };

        Ok(Validated {
            private_key_path,
            config: TunnelConfig {
                instance: instance.to_string(),
                description: self.description,
                interface: InterfaceConfig {
                    private_key: String::new(),
                    listen_port,
                    fwmark: interface.fwmark,
                    address,
                },
                peers,
                post_up: interface.post_up,
                pre_down: interface.pre_down,
            },
        })
    }
}

impl RawPeer {
    fn validate(self, index: usize) -> Result<PeerConfig> {
        let allowed_ips = self
            .allowed_ips
            .iter()
            .map(|ip| {
                ip.parse::<IpPrefix>()
                    .map_err(|e| invalid(format!("peer {} allowed IP: {}", index, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PeerConfig {
            description: self.description,
            public_key: self.public_key,
            preshared_key: self.preshared_key,
            endpoint: self.endpoint,
            allowed_ips,
            persistent_keepalive_interval: self.persistent_keepalive_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(yaml: &str) -> Result<Validated> {
        let raw: RawConfig = serde_yaml::from_str(yaml).unwrap();
        raw.validate("wg0")
    }

    fn message(result: Result<Validated>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_full_definition() {
        let v = validate(
            r#"
description: office
interface:
  private_key: /etc/wireguard/office.key
  listen_port: 51820
  fwmark: 51820
  address: 10.8.0.2/24
  post_up: [ "iptables -A FORWARD -i wg0 -j ACCEPT" ]
peers:
  - public_key: xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=
    endpoint: 198.51.100.7:51820
    allowed_ips: [ 10.8.0.0/24, 0.0.0.0/0 ]
    persistent_keepalive_interval: 25
    description: gateway
"#,
        )
        .unwrap();

        assert_eq!(v.private_key_path, "/etc/wireguard/office.key");
        let config = v.config;
        assert_eq!(config.instance, "wg0");
        assert_eq!(config.description.as_deref(), Some("office"));
        assert_eq!(config.interface.listen_port, 51820);
        assert_eq!(config.interface.fwmark, Some(51820));
        assert_eq!(config.interface.address, Some("10.8.0.2/24".parse().unwrap()));
        assert_eq!(config.post_up.len(), 1);
        assert!(config.pre_down.is_empty());
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.peers[0].allowed_ips.len(), 2);
        assert_eq!(config.peers[0].persistent_keepalive_interval, Some(25));
        assert!(config.has_catch_all());
        assert_eq!(
            config.peer_description("xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg="),
            Some("gateway")
        );
    }

    #[test]
    fn test_missing_interface() {
        assert_eq!(
            message(validate("peers: []")),
            "could not parse configuration: there must be an interface definition"
        );
        assert!(message(validate("interface: 3")).contains("there must be an interface definition"));
    }

    #[test]
    fn test_missing_private_key() {
        assert!(
            message(validate("interface: { listen_port: 51820 }"))
                .contains("the interface must have a private key")
        );
    }

    #[test]
    fn test_listen_port() {
        for yaml in [
            "interface: { private_key: k }",
            "interface: { private_key: k, listen_port: '51820' }",
            "interface: { private_key: k, listen_port: 0 }",
            "interface: { private_key: k, listen_port: 70000 }",
        ] {
            assert!(
                message(validate(yaml)).contains("the interface must have an integer listening port"),
                "{}",
                yaml
            );
        }
    }

    #[test]
    fn test_peers_not_a_list() {
        assert!(
            message(validate("interface: { private_key: k, listen_port: 1 }\npeers: { a: 1 }"))
                .contains("the peers definition must be a list")
        );
    }

    #[test]
    fn test_no_peers() {
        let v = validate("interface: { private_key: k, listen_port: 1 }").unwrap();
        assert!(v.config.peers.is_empty());
        assert!(!v.config.has_catch_all());
    }

    #[test]
    fn test_bad_allowed_ip() {
        let err = message(validate(
            "interface: { private_key: k, listen_port: 1 }\npeers: [ { public_key: p, allowed_ips: [ 10.0.0.0/40 ] } ]",
        ));
        assert!(err.contains("peer 0 allowed IP"), "{}", err);
    }

    #[test]
    fn test_keys_not_checked_here() {
        // decoded by the message mapper
        let v = validate(
            "interface: { private_key: k, listen_port: 1 }\npeers: [ { public_key: short, preshared_key: abc, endpoint: 'x:y' } ]",
        )
        .unwrap();
        assert_eq!(v.config.peers[0].preshared_key.as_deref(), Some("abc"));
    }
}
