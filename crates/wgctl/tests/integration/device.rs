//! WireGuard device integration tests.

use wgctl::Result;
use wgctl::config::{PeerConfig, TunnelConfig};
use wgctl::netlink::InterfaceRef;
use wgctl::netlink::genl::wireguard::{DeviceGateway, Key, WireguardGateway};
use wgctl::tunnel::{LinkControl, NetlinkLinkControl, WIREGUARD_KIND};
use wgctl::util::IpPrefix;

use crate::common::{LinkGuard, unique_port};

const PRIVATE_KEY: &str = "yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=";
const PEER: &str = "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=";
const PSK: &str = "188515093e952f5f22e865cef3012e72f8b5f0b598ac0309d5dacce3b70fcf52";

#[tokio::test]
async fn test_resolve_family() -> Result<()> {
    require_root!();

    let gateway = WireguardGateway::new().await?;
    assert_ne!(gateway.family().id, 0);
    let missing = InterfaceRef::name("wgt-missing");
    // A failed lookup must not poison the shared socket. The recording
    // fakes in lifecycle.rs cannot show this, only the real gateway can.
    assert!(!gateway.exists(&missing).await);
    assert!(!gateway.exists(&missing).await);

    Ok(())
}

#[tokio::test]
async fn test_configure_and_query() -> Result<()> {
    require_root!();

    let guard = LinkGuard::new();
    let links = NetlinkLinkControl::new()?;
    let gateway = WireguardGateway::new().await?;
    let port = unique_port();

    links.create_link(&guard.name, WIREGUARD_KIND).await?;
    let iface = InterfaceRef::name(&guard.name);
    assert!(gateway.exists(&iface).await);
    assert!(gateway.exists(&iface).await);

    let mut config = TunnelConfig::new(&guard.name, PRIVATE_KEY, port);
    config.interface.fwmark = Some(u32::from(port));
    let mut peer = PeerConfig::new(PEER)
        .endpoint("198.51.100.7:51820")
        .preshared_key(PSK)
        .allowed_ip("10.99.0.0/16".parse().unwrap())
        .allowed_ip(IpPrefix::CATCH_ALL);
    peer.persistent_keepalive_interval = Some(25);
    config.peers.push(peer);

    gateway.configure(&iface, &config).await?;

    let device = gateway.query(&iface).await?;
    assert_eq!(device.ifname, guard.name);
    assert_eq!(device.listen_port, port);
    assert_eq!(device.fwmark, Some(u32::from(port)));
    assert!(device.public_key.is_some());

    assert_eq!(device.peers.len(), 1);
    let peer = &device.peers[0];
    assert_eq!(peer.public_key, Key::from_base64(PEER)?);
    assert_eq!(peer.preshared_key, Some(Key::from_hex(PSK)?));
    assert_eq!(peer.endpoint, Some("198.51.100.7:51820".parse().unwrap()));
    assert_eq!(peer.persistent_keepalive, Some(25));
    assert_eq!(peer.last_handshake, None);
    assert!(peer.allowed_ips.contains(&IpPrefix::CATCH_ALL));
    assert!(peer.allowed_ips.contains(&"10.99.0.0/16".parse().unwrap()));

    assert!(gateway.list_devices().await?.contains(&guard.name));

    links.delete_link(&guard.name).await?;
    assert!(!gateway.exists(&iface).await);

    Ok(())
}
