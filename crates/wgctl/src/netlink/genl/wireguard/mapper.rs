//! Translation between tunnel definitions and `wireguard` attribute trees.
//!
//! Encoding validates key material and endpoints before anything reaches
//! the kernel; decoding walks the tree through the `TryFrom<u16>` tables in
//! the parent module, so every known attribute id is matched explicitly.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::types::{DeviceSnapshot, Endpoint, Key, PeerStatus, parse_sockaddr, parse_timespec};
use super::{WG_GENL_VERSION, WgAllowedIpAttr, WgCmd, WgDeviceAttr, WgPeerAttr};
use crate::config::{PeerConfig, TunnelConfig};
use crate::netlink::attr::Attribute;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::GenlMessage;
use crate::netlink::interface_ref::InterfaceRef;
use crate::util::IpPrefix;

/// The device selector attribute: `WGDEVICE_A_IFINDEX` or `WGDEVICE_A_IFNAME`.
fn selector(iface: &InterfaceRef) -> Attribute {
    match iface {
        InterfaceRef::Index(index) => Attribute::u32(WgDeviceAttr::Ifindex as u16, *index),
        InterfaceRef::Name(name) => Attribute::string(WgDeviceAttr::Ifname as u16, name),
    }
}

/// Build a `GET_DEVICE` request for one device.
pub fn build_get_device(iface: &InterfaceRef) -> GenlMessage {
    GenlMessage::new(WgCmd::GetDevice as u8, WG_GENL_VERSION, vec![selector(iface)])
}

/// Build the `SET_DEVICE` request that applies `config` to `iface`.
///
/// Fails with [`Error::InvalidKey`] for keys that do not decode to 32 bytes,
/// [`Error::InvalidEndpoint`] for an endpoint without a numeric port and
/// [`Error::UnsupportedAddressFamily`] for IPv6 endpoints.
pub fn build_set_device(iface: &InterfaceRef, config: &TunnelConfig) -> Result<GenlMessage> {
    let private_key = Key::from_base64(&config.interface.private_key)
        .map_err(|e| Error::InvalidKey(format!("private key: {}", e)))?;

    let mut attrs = vec![
        selector(iface),
        Attribute::u16(WgDeviceAttr::ListenPort as u16, config.interface.listen_port),
    ];
    if let Some(fwmark) = config.interface.fwmark {
        attrs.push(Attribute::u32(WgDeviceAttr::Fwmark as u16, fwmark));
    }
    attrs.push(Attribute::bytes(
        WgDeviceAttr::PrivateKey as u16,
        private_key.as_bytes().to_vec(),
    ));

    if !config.peers.is_empty() {
        let peers = config
            .peers
            .iter()
            .enumerate()
            .map(|(i, peer)| peer_attr(i as u16, peer))
            .collect::<Result<Vec<_>>>()?;
        attrs.push(Attribute::nested(WgDeviceAttr::Peers as u16, peers));
    }

    Ok(GenlMessage::new(WgCmd::SetDevice as u8, WG_GENL_VERSION, attrs))
}

fn peer_attr(index: u16, peer: &PeerConfig) -> Result<Attribute> {
    let public_key = Key::from_base64(&peer.public_key)
        .map_err(|e| Error::InvalidKey(format!("peer public key: {}", e)))?;

    let mut attrs = vec![Attribute::bytes(
        WgPeerAttr::PublicKey as u16,
        public_key.as_bytes().to_vec(),
    )];

    if let Some(hex) = &peer.preshared_key {
        let psk = Key::from_hex(hex)?;
        attrs.push(Attribute::bytes(
            WgPeerAttr::PresharedKey as u16,
            psk.as_bytes().to_vec(),
        ));
    }

    if let Some(endpoint) = &peer.endpoint {
        let endpoint = Endpoint::parse(endpoint)?;
        attrs.push(Attribute::bytes(
            WgPeerAttr::Endpoint as u16,
            endpoint.to_sockaddr().to_vec(),
        ));
    }

    if let Some(interval) = peer.persistent_keepalive_interval {
        attrs.push(Attribute::u16(WgPeerAttr::PersistentKeepalive as u16, interval));
    }

    if !peer.allowed_ips.is_empty() {
        let ips = peer
            .allowed_ips
            .iter()
            .enumerate()
            .map(|(i, prefix)| {
                Attribute::nested(
                    i as u16,
                    vec![
                        Attribute::u16(WgAllowedIpAttr::Family as u16, prefix.family()),
                        Attribute::bytes(WgAllowedIpAttr::IpAddr as u16, prefix.addr_bytes()),
                        Attribute::u8(WgAllowedIpAttr::CidrMask as u16, prefix.prefix_len),
                    ],
                )
            })
            .collect();
        attrs.push(Attribute::nested(WgPeerAttr::AllowedIps as u16, ips));
    }

    Ok(Attribute::nested(index, attrs))
}

/// Decode one `GET_DEVICE` reply.
pub fn parse_get_device(msg: &GenlMessage) -> Result<DeviceSnapshot> {
    let mut device = DeviceSnapshot::default();

    for attr in &msg.attrs {
        match WgDeviceAttr::try_from(attr.kind) {
            Ok(WgDeviceAttr::Ifindex) => device.ifindex = Some(attr.as_u32()?),
            Ok(WgDeviceAttr::Ifname) => device.ifname = attr.as_str()?.to_string(),
            Ok(WgDeviceAttr::PublicKey) => device.public_key = Some(Key::from_bytes(attr.as_bytes()?)?),
            Ok(WgDeviceAttr::ListenPort) => device.listen_port = attr.as_u16()?,
            Ok(WgDeviceAttr::Fwmark) => {
                let mark = attr.as_u32()?;
                device.fwmark = (mark != 0).then_some(mark);
            }
            Ok(WgDeviceAttr::Peers) => {
                for peer in attr.children()? {
                    device.peers.push(parse_peer(&peer)?);
                }
            }
            // never reported, or set-only
            Ok(WgDeviceAttr::PrivateKey) | Ok(WgDeviceAttr::Flags) | Err(_) => {}
        }
    }

    Ok(device)
}

fn parse_peer(node: &Attribute) -> Result<PeerStatus> {
    let mut public_key = None;
    let mut peer = PeerStatus::new(Key::default());

    for attr in node.children()? {
        match WgPeerAttr::try_from(attr.kind) {
            Ok(WgPeerAttr::PublicKey) => public_key = Some(Key::from_bytes(attr.as_bytes()?)?),
            Ok(WgPeerAttr::PresharedKey) => {
                let key = Key::from_bytes(attr.as_bytes()?)?;
                peer.preshared_key = (!key.is_zero()).then_some(key);
            }
            Ok(WgPeerAttr::Endpoint) => peer.endpoint = parse_sockaddr(attr.as_bytes()?)?,
            Ok(WgPeerAttr::PersistentKeepalive) => {
                let interval = attr.as_u16()?;
                peer.persistent_keepalive = (interval != 0).then_some(interval);
            }
            Ok(WgPeerAttr::LastHandshake) => peer.last_handshake = parse_timespec(attr.as_bytes()?)?,
            Ok(WgPeerAttr::RxBytes) => peer.rx_bytes = attr.as_u64()?,
            Ok(WgPeerAttr::TxBytes) => peer.tx_bytes = attr.as_u64()?,
            Ok(WgPeerAttr::AllowedIps) => {
                for ip in attr.children()? {
                    peer.allowed_ips.push(parse_allowed_ip(&ip)?);
                }
            }
            Ok(WgPeerAttr::ProtocolVersion) => peer.protocol_version = Some(attr.as_u32()?),
            Ok(WgPeerAttr::Flags) | Err(_) => {}
        }
    }

    peer.public_key = public_key
        .ok_or_else(|| Error::MalformedMessage("peer without a public key".into()))?;
    Ok(peer)
}

fn parse_allowed_ip(node: &Attribute) -> Result<IpPrefix> {
    let mut family = None;
    let mut addr = None;
    let mut cidr = None;

    for attr in node.children()? {
        match WgAllowedIpAttr::try_from(attr.kind) {
            Ok(WgAllowedIpAttr::Family) => family = Some(attr.as_u16()?),
            Ok(WgAllowedIpAttr::IpAddr) => addr = Some(attr.as_bytes()?.to_vec()),
            Ok(WgAllowedIpAttr::CidrMask) => cidr = Some(attr.as_u8()?),
            Err(_) => {}
        }
    }

    let (Some(family), Some(addr), Some(cidr)) = (family, addr, cidr) else {
        return Err(Error::MalformedMessage(
            "allowed IP without family, address or mask".into(),
        ));
    };

    let ip = if family == libc::AF_INET as u16 {
        let octets: [u8; 4] = addr.as_slice().try_into().map_err(|_| {
            Error::MalformedMessage(format!("IPv4 allowed IP of {} bytes", addr.len()))
        })?;
        IpAddr::V4(Ipv4Addr::from(octets))
    } else if family == libc::AF_INET6 as u16 {
        let octets: [u8; 16] = addr.as_slice().try_into().map_err(|_| {
            Error::MalformedMessage(format!("IPv6 allowed IP of {} bytes", addr.len()))
        })?;
        IpAddr::V6(Ipv6Addr::from(octets))
    } else {
        return Err(Error::UnsupportedAddressFamily(format!(
            "allowed IP family {}",
            family
        )));
    };

    IpPrefix::new(ip, cidr).map_err(|e| Error::MalformedMessage(e.to_string()))
}

/// Decode a full `GET_DEVICE` dump.
///
/// Large devices are split over several messages. Each continuation repeats
/// the device attributes and carries the next peers; a peer cut in half
/// reappears with the same public key and the rest of its allowed IPs.
pub fn parse_get_device_dump(replies: &[GenlMessage]) -> Result<DeviceSnapshot> {
    let (first, rest) = replies
        .split_first()
        .ok_or_else(|| Error::MalformedMessage("empty GET_DEVICE dump".into()))?;

    let mut device = parse_get_device(first)?;
    for reply in rest {
        let part = parse_get_device(reply)?;
        for peer in part.peers {
            match device.peers.last_mut() {
                Some(last) if last.public_key == peer.public_key => {
                    last.allowed_ips.extend(peer.allowed_ips);
                }
                _ => device.peers.push(peer),
            }
        }
    }

    Ok(device)
}
