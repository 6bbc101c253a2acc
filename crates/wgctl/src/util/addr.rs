//! IP prefixes in `address/prefix` notation.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Error type for prefix parsing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddrError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid prefix length: {0}")]
    InvalidPrefix(String),
}

/// An address together with a prefix length, e.g. `10.0.0.0/24`.
///
/// Used for allowed IPs, interface addresses and route destinations.
/// The address is kept as written; host bits are not masked off, which
/// matches what the kernel echoes back for allowed IPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpPrefix {
    pub addr: IpAddr,
    pub prefix_len: u8,
}

impl IpPrefix {
    /// The IPv4 default route, `0.0.0.0/0`.
    pub const CATCH_ALL: IpPrefix = IpPrefix {
        addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        prefix_len: 0,
    };

    /// Create a prefix, rejecting lengths beyond the address width.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self, AddrError> {
        if prefix_len > max_prefix_len(&addr) {
            return Err(AddrError::InvalidPrefix(format!(
                "{} exceeds maximum {} for address family",
                prefix_len,
                max_prefix_len(&addr)
            )));
        }
        Ok(Self { addr, prefix_len })
    }

    /// Shorthand for an IPv4 prefix. Lengths above 32 are clamped.
    pub fn v4(addr: Ipv4Addr, prefix_len: u8) -> Self {
        Self {
            addr: IpAddr::V4(addr),
            prefix_len: prefix_len.min(32),
        }
    }

    /// True for `0.0.0.0/0`, the network that marks a catch-all peer.
    pub fn is_catch_all(&self) -> bool {
        *self == Self::CATCH_ALL
    }

    /// Kernel address family (`AF_INET` / `AF_INET6`).
    pub fn family(&self) -> u16 {
        match self.addr {
            IpAddr::V4(_) => libc::AF_INET as u16,
            IpAddr::V6(_) => libc::AF_INET6 as u16,
        }
    }

    /// Address octets in network order.
    pub fn addr_bytes(&self) -> Vec<u8> {
        match self.addr {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        }
    }
}

fn max_prefix_len(addr: &IpAddr) -> u8 {
    if addr.is_ipv4() { 32 } else { 128 }
}

impl FromStr for IpPrefix {
    type Err = AddrError;

    /// Parse `address/prefix`. A bare address is a host prefix (/32 or /128).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr_str, prefix_str) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };

        let addr: IpAddr = addr_str
            .parse()
            .map_err(|_| AddrError::InvalidAddress(addr_str.to_string()))?;

        let prefix_len = match prefix_str {
            Some(p) => p
                .parse::<u8>()
                .map_err(|_| AddrError::InvalidPrefix(p.to_string()))?,
            None => max_prefix_len(&addr),
        };

        Self::new(addr, prefix_len)
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl Serialize for IpPrefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
