//! Kernel exchanges for WireGuard devices.

use tracing::debug;

use super::WG_GENL_NAME;
use super::mapper::{build_get_device, build_set_device, parse_get_device_dump};
use super::types::DeviceSnapshot;
use crate::config::TunnelConfig;
use crate::netlink::connection::Connection;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::{FamilyInfo, GenlConnection, GenlMessage};
use crate::netlink::interface_ref::InterfaceRef;
use crate::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST};
use crate::netlink::socket::Protocol;

/// Operations on WireGuard devices.
///
/// The tunnel orchestrator only talks to devices through this trait, so it
/// can be driven against a recording double in tests.
#[allow(async_fn_in_trait)]
pub trait DeviceGateway {
    /// Whether a WireGuard device answers to `iface`.
    ///
    /// Never fails: any error, including "no such device", reads as `false`.
    async fn exists(&self, iface: &InterfaceRef) -> bool;

    /// Current state of the device.
    async fn query(&self, iface: &InterfaceRef) -> Result<DeviceSnapshot>;

    /// Apply a tunnel definition to the device.
    async fn configure(&self, iface: &InterfaceRef, config: &TunnelConfig) -> Result<()>;

    /// Names of every WireGuard device in the namespace.
    ///
    /// Devices can vanish between listing and checking, so the result may
    /// be shorter than the link table suggests.
    async fn list_devices(&self) -> Result<Vec<String>>;
}

/// [`DeviceGateway`] over the `wireguard` generic netlink family.
///
/// Built once per command invocation; it owns one GENL socket that is
/// closed when the gateway is dropped.
pub struct WireguardGateway {
    genl: GenlConnection,
    family: FamilyInfo,
}

impl WireguardGateway {
    /// Open a GENL socket and resolve the `wireguard` family.
    ///
    /// Fails with [`Error::FamilyNotFound`] when the module is not loaded.
    pub async fn new() -> Result<Self> {
        let genl = GenlConnection::new()?;
        let family = genl.resolve_family(WG_GENL_NAME).await?;
        Ok(Self { genl, family })
    }

    /// The resolved family.
    pub fn family(&self) -> &FamilyInfo {
        &self.family
    }

    async fn get_device(&self, iface: &InterfaceRef) -> Result<Vec<GenlMessage>> {
        self.genl
            .request(
                self.family.id,
                NLM_F_REQUEST | NLM_F_ACK | NLM_F_DUMP,
                &build_get_device(iface),
            )
            .await
    }
}

impl DeviceGateway for WireguardGateway {
    async fn exists(&self, iface: &InterfaceRef) -> bool {
        match self.get_device(iface).await {
            Ok(_) => true,
            Err(e) => {
                debug!(%iface, error = %e, "no WireGuard device");
                false
            }
        }
    }

    async fn query(&self, iface: &InterfaceRef) -> Result<DeviceSnapshot> {
        let not_found = || Error::DeviceNotFound {
            name: iface.to_string(),
        };

        let replies = self
            .get_device(iface)
            .await
            .map_err(|e| if e.is_not_found() { not_found() } else { e })?;
        if replies.is_empty() {
            return Err(not_found());
        }

        let device = parse_get_device_dump(&replies)?;
        debug!(%iface, peers = device.peers.len(), "queried WireGuard device");
        Ok(device)
    }

    async fn configure(&self, iface: &InterfaceRef, config: &TunnelConfig) -> Result<()> {
        let msg = build_set_device(iface, config)?;
        debug!(%iface, peers = config.peers.len(), "configuring WireGuard device");

        self.genl
            .request(self.family.id, NLM_F_REQUEST | NLM_F_ACK, &msg)
            .await
            .map(|_| ())
            .map_err(|e| match e.errno() {
                Some(errno) => Error::rejected(errno),
                None => e,
            })
    }

    async fn list_devices(&self) -> Result<Vec<String>> {
        let route = Connection::new(Protocol::Route)?;

        let mut devices = Vec::new();
        for link in route.list_links().await? {
            if self.exists(&InterfaceRef::Index(link.index)).await {
                devices.push(link.name);
            }
        }
        Ok(devices)
    }
}
