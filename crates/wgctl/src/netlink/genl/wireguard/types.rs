//! WireGuard value types: keys, endpoints and the decoded device view.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Serialize, Serializer};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use crate::netlink::error::{Error, Result};
use crate::util::IpPrefix;

/// Size of a WireGuard key in bytes.
pub const WG_KEY_LEN: usize = 32;

/// Length of `struct sockaddr_in` on the wire.
pub(crate) const SOCKADDR_IN_LEN: usize = 16;

/// Result type for the winnow sub-parsers below.
type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// A 32-byte Curve25519 key (private, public or preshared).
///
/// Keys travel as raw bytes on the wire. The external encodings, base64 for
/// public and private keys and hex for preshared keys, are converted here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Key([u8; WG_KEY_LEN]);

impl Key {
    /// Take a key from raw bytes, which must be exactly 32 long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key: [u8; WG_KEY_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "expected {} bytes, got {}",
                WG_KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(key))
    }

    /// Decode a base64 key.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| Error::InvalidKey(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Decode a preshared key written as 64 hexadecimal characters.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != WG_KEY_LEN * 2 || !s.is_ascii() {
            return Err(Error::InvalidKey(
                "pre-shared key must be 64 hexadecimal characters".into(),
            ));
        }

        let mut key = [0u8; WG_KEY_LEN];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| {
                Error::InvalidKey("pre-shared key must be 64 hexadecimal characters".into())
            })?;
        }
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; WG_KEY_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// The kernel reports an unset preshared key as all zeroes.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<[u8; WG_KEY_LEN]> for Key {
    fn from(bytes: [u8; WG_KEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.to_base64())
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

/// An IPv4 peer endpoint as written in a tunnel definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint(pub SocketAddrV4);

impl Endpoint {
    /// Parse `host:port`.
    ///
    /// The port must be numeric and the host a literal IPv4 address. IPv6
    /// hosts fail with [`Error::UnsupportedAddressFamily`].
    pub fn parse(s: &str) -> Result<Self> {
        let malformed = || Error::InvalidEndpoint(s.to_string());

        let (host, port) = s.trim().rsplit_once(':').ok_or_else(malformed)?;
        let port: u16 = port.parse().map_err(|_| malformed())?;

        let host = host.trim_start_matches('[').trim_end_matches(']');
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(addr)) => Ok(Self(SocketAddrV4::new(addr, port))),
            Ok(IpAddr::V6(_)) => Err(Error::UnsupportedAddressFamily(format!(
                "IPv6 endpoint {}",
                s
            ))),
            // a bare IPv6 address also ends in ":digits"
            Err(_) if host.contains(':') => Err(Error::UnsupportedAddressFamily(format!(
                "IPv6 endpoint {}",
                s
            ))),
            Err(_) => Err(malformed()),
        }
    }

    /// Pack as `struct sockaddr_in`: native-endian family, big-endian port,
    /// the address, and eight zero bytes.
    pub fn to_sockaddr(&self) -> [u8; SOCKADDR_IN_LEN] {
        let mut buf = [0u8; SOCKADDR_IN_LEN];
        buf[0..2].copy_from_slice(&(libc::AF_INET as u16).to_ne_bytes());
        buf[2..4].copy_from_slice(&self.0.port().to_be_bytes());
        buf[4..8].copy_from_slice(&self.0.ip().octets());
        buf
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the kernel reports about one WireGuard device.
///
/// Built fresh from every `GET_DEVICE` exchange; nothing is cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    pub ifindex: Option<u32>,
    pub ifname: String,
    pub public_key: Option<Key>,
    pub listen_port: u16,
    pub fwmark: Option<u32>,
    pub peers: Vec<PeerStatus>,
}

/// Runtime state of one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerStatus {
    pub public_key: Key,
    /// `None` when the kernel reports the all-zero key.
    pub preshared_key: Option<Key>,
    pub endpoint: Option<SocketAddr>,
    pub allowed_ips: Vec<IpPrefix>,
    /// `None` means the peer never completed a handshake.
    #[serde(serialize_with = "serialize_handshake")]
    pub last_handshake: Option<SystemTime>,
    /// Seconds; `None` when disabled.
    pub persistent_keepalive: Option<u16>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub protocol_version: Option<u32>,
}

impl PeerStatus {
    pub fn new(public_key: Key) -> Self {
        Self {
            public_key,
            preshared_key: None,
            endpoint: None,
            allowed_ips: Vec::new(),
            last_handshake: None,
            persistent_keepalive: None,
            rx_bytes: 0,
            tx_bytes: 0,
            protocol_version: None,
        }
    }
}

fn serialize_handshake<S: Serializer>(
    value: &Option<SystemTime>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value.and_then(|t| t.duration_since(UNIX_EPOCH).ok()) {
        Some(since_epoch) => serializer.serialize_some(&since_epoch.as_secs()),
        None => serializer.serialize_none(),
    }
}

fn fixed<const N: usize>(input: &mut &[u8]) -> PResult<[u8; N]> {
    take(N)
        .map(|bytes: &[u8]| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(bytes);
            raw
        })
        .parse_next(input)
}

fn native_u16(input: &mut &[u8]) -> PResult<u16> {
    fixed::<2>.map(u16::from_ne_bytes).parse_next(input)
}

fn be_u16(input: &mut &[u8]) -> PResult<u16> {
    fixed::<2>.map(u16::from_be_bytes).parse_next(input)
}

fn native_i64(input: &mut &[u8]) -> PResult<i64> {
    fixed::<8>.map(i64::from_ne_bytes).parse_next(input)
}

fn sockaddr(input: &mut &[u8]) -> PResult<Option<SocketAddr>> {
    let family = native_u16(input)?;
    let port = be_u16(input)?;

    if family == libc::AF_INET as u16 {
        let octets = fixed::<4>(input)?;
        Ok(Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::from(octets)), port)))
    } else if family == libc::AF_INET6 as u16 {
        let _flowinfo = fixed::<4>(input)?;
        let raw = fixed::<16>(input)?;
        Ok(Some(SocketAddr::new(IpAddr::V6(Ipv6Addr::from(raw)), port)))
    } else {
        // AF_UNSPEC: no endpoint learned yet
        Ok(None)
    }
}

/// Decode a `WGPEER_A_ENDPOINT` payload (`sockaddr_in` or `sockaddr_in6`).
pub(crate) fn parse_sockaddr(data: &[u8]) -> Result<Option<SocketAddr>> {
    let mut input = data;
    sockaddr(&mut input).map_err(|_| {
        Error::MalformedMessage(format!("endpoint sockaddr too short: {} bytes", data.len()))
    })
}

/// Decode a `WGPEER_A_LAST_HANDSHAKE_TIME` payload (`__kernel_timespec`).
///
/// Zero seconds since the epoch means the peer never handshaked.
pub(crate) fn parse_timespec(data: &[u8]) -> Result<Option<SystemTime>> {
    let mut input = data;
    let (secs, nanos) = (native_i64, native_i64)
        .parse_next(&mut input)
        .map_err(|_| {
            Error::MalformedMessage(format!("handshake timespec too short: {} bytes", data.len()))
        })?;

    if secs <= 0 {
        return Ok(None);
    }
    let nanos = u32::try_from(nanos).unwrap_or(0).min(999_999_999);
    Ok(Some(UNIX_EPOCH + Duration::new(secs as u64, nanos)))
}

/// Encode a timespec the way the kernel does. Only used to build fixtures.
#[cfg(test)]
pub(crate) fn timespec_bytes(secs: i64, nanos: i64) -> Vec<u8> {
    let mut buf = secs.to_ne_bytes().to_vec();
    buf.extend_from_slice(&nanos.to_ne_bytes());
    buf
}
