//! Output for `wgctl info` and status lines (text or JSON).

pub mod formatting;

use std::io::Write;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::config::TunnelConfig;
use crate::netlink::genl::wireguard::{DeviceSnapshot, Key};
use crate::util::IpPrefix;
use formatting::{format_bytes, format_endpoint, format_handshake, format_key};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Placeholder for peers the definition does not describe.
pub const NO_PEER_DESCRIPTION: &str = "<no peer description>";

/// Symbol prefixed to a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
    Progress,
    Up,
    Down,
}

impl Status {
    pub fn symbol(self) -> char {
        match self {
            Self::Ok => '✓',
            Self::Failed => '✗',
            Self::Progress => '-',
            Self::Up => '↑',
            Self::Down => '↓',
        }
    }
}

/// `[✓] message` and friends.
pub fn status_line(status: Status, message: &str) -> String {
    format!("[{}] {}", status.symbol(), message)
}

/// A device snapshot joined with the descriptions from its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunnelInfo {
    pub tunnel: Option<String>,
    pub interface: String,
    pub public_key: Option<Key>,
    pub listening_port: u16,
    pub fwmark: Option<u32>,
    pub peers: Vec<PeerInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerInfo {
    pub description: String,
    pub public_key: Key,
    pub endpoint: Option<SocketAddr>,
    pub allowed_ips: Vec<IpPrefix>,
    pub preshared_key: bool,
    /// Seconds since the epoch.
    pub latest_handshake: Option<u64>,
    pub persistent_keepalive: Option<u16>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl TunnelInfo {
    pub fn new(device: &DeviceSnapshot, config: Option<&TunnelConfig>) -> Self {
        let peers = device
            .peers
            .iter()
            .map(|peer| {
                let description = config
                    .and_then(|c| c.peer_description(&peer.public_key.to_base64()))
                    .unwrap_or(NO_PEER_DESCRIPTION)
                    .to_string();
                PeerInfo {
                    description,
                    public_key: peer.public_key,
                    endpoint: peer.endpoint,
                    allowed_ips: peer.allowed_ips.clone(),
                    preshared_key: peer.preshared_key.is_some(),
                    latest_handshake: epoch_secs(peer.last_handshake),
                    persistent_keepalive: peer.persistent_keepalive,
                    rx_bytes: peer.rx_bytes,
                    tx_bytes: peer.tx_bytes,
                }
            })
            .collect();

        Self {
            tunnel: config.and_then(|c| c.description.clone()),
            interface: device.ifname.clone(),
            public_key: device.public_key,
            listening_port: device.listen_port,
            fwmark: device.fwmark,
            peers,
        }
    }

    /// Print in the given format.
    pub fn print<W: Write>(&self, w: &mut W, format: OutputFormat) -> std::io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, self)?;
                writeln!(w)
            }
        }
    }

    fn print_text<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "tunnel: {}", self.tunnel.as_deref().unwrap_or(&self.interface))?;
        writeln!(w, "  interface: {}", self.interface)?;
        if let Some(key) = &self.public_key {
            writeln!(w, "  public key: {}", format_key(key))?;
        }
        writeln!(w, "  listening port: {}", self.listening_port)?;
        match self.fwmark {
            Some(mark) => writeln!(w, "  fwmark: {}", mark)?,
            None => writeln!(w, "  fwmark: off")?,
        }

        for peer in &self.peers {
            let handshake = peer
                .latest_handshake
                .map(|secs| UNIX_EPOCH + std::time::Duration::from_secs(secs));

            writeln!(w)?;
            writeln!(w, "  - peer: {}", peer.description)?;
            writeln!(w, "      public key: {}", format_key(&peer.public_key))?;
            writeln!(w, "      endpoint: {}", format_endpoint(peer.endpoint))?;
            writeln!(
                w,
                "      allowed ips: {}",
                peer.allowed_ips
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            writeln!(w, "      preshared key? {}", peer.preshared_key)?;
            writeln!(w, "      latest handshake: {}", format_handshake(handshake))?;
            if let Some(interval) = peer.persistent_keepalive {
                writeln!(w, "      persistent keepalive: every {} seconds", interval)?;
            }
            writeln!(
                w,
                "      transfer: {} received, {} sent",
                format_bytes(peer.rx_bytes),
                format_bytes(peer.tx_bytes)
            )?;
        }
        Ok(())
    }
}

fn epoch_secs(time: Option<SystemTime>) -> Option<u64> {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}
