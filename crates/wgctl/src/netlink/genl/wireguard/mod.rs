//! WireGuard configuration via Generic Netlink.
//!
//! Link creation uses route netlink; everything else about a WireGuard
//! device (keys, port, fwmark, peers, allowed IPs) goes through the
//! `wireguard` GENL family with two commands, `GET_DEVICE` and
//! `SET_DEVICE`.
//!
//! - [`mapper`] translates between [`TunnelConfig`](crate::TunnelConfig) /
//!   [`DeviceSnapshot`] and attribute trees
//! - [`gateway`] performs the exchanges with the kernel
//!
//! # Example
//!
//! ```ignore
//! use wgctl::netlink::genl::wireguard::{DeviceGateway, WireguardGateway};
//!
//! let gateway = WireguardGateway::new().await?;
//! if gateway.exists(&"wg0".into()).await {
//!     let device = gateway.query(&"wg0".into()).await?;
//!     for peer in &device.peers {
//!         println!("{} {:?}", peer.public_key, peer.allowed_ips);
//!     }
//! }
//! ```

pub mod gateway;
pub mod mapper;
mod types;

pub use gateway::{DeviceGateway, WireguardGateway};
pub use mapper::{build_get_device, build_set_device, parse_get_device, parse_get_device_dump};
pub use types::{DeviceSnapshot, Endpoint, Key, PeerStatus, WG_KEY_LEN};

/// WireGuard Generic Netlink family name.
pub const WG_GENL_NAME: &str = "wireguard";

/// WireGuard Generic Netlink version.
pub const WG_GENL_VERSION: u8 = 1;

/// WireGuard GENL commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgCmd {
    GetDevice = 0,
    SetDevice = 1,
}

/// WireGuard device attributes (WGDEVICE_A_*).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgDeviceAttr {
    Ifindex = 1,
    Ifname = 2,
    PrivateKey = 3,
    PublicKey = 4,
    Flags = 5,
    ListenPort = 6,
    Fwmark = 7,
    Peers = 8,
}

impl TryFrom<u16> for WgDeviceAttr {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, u16> {
        Ok(match value {
            1 => Self::Ifindex,
            2 => Self::Ifname,
            3 => Self::PrivateKey,
            4 => Self::PublicKey,
            5 => Self::Flags,
            6 => Self::ListenPort,
            7 => Self::Fwmark,
            8 => Self::Peers,
            other => return Err(other),
        })
    }
}

/// WireGuard peer attributes (WGPEER_A_*).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgPeerAttr {
    PublicKey = 1,
    PresharedKey = 2,
    Flags = 3,
    Endpoint = 4,
    PersistentKeepalive = 5,
    LastHandshake = 6,
    RxBytes = 7,
    TxBytes = 8,
    AllowedIps = 9,
    ProtocolVersion = 10,
}

impl TryFrom<u16> for WgPeerAttr {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, u16> {
        Ok(match value {
            1 => Self::PublicKey,
            2 => Self::PresharedKey,
            3 => Self::Flags,
            4 => Self::Endpoint,
            5 => Self::PersistentKeepalive,
            6 => Self::LastHandshake,
            7 => Self::RxBytes,
            8 => Self::TxBytes,
            9 => Self::AllowedIps,
            10 => Self::ProtocolVersion,
            other => return Err(other),
        })
    }
}

/// WireGuard allowed IP attributes (WGALLOWEDIP_A_*).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgAllowedIpAttr {
    Family = 1,
    IpAddr = 2,
    CidrMask = 3,
}

impl TryFrom<u16> for WgAllowedIpAttr {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, u16> {
        Ok(match value {
            1 => Self::Family,
            2 => Self::IpAddr,
            3 => Self::CidrMask,
            other => return Err(other),
        })
    }
}
