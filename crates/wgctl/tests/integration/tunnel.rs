//! Bring-up and tear-down against the kernel.

use wgctl::config::{PeerConfig, TunnelConfig};
use wgctl::netlink::InterfaceRef;
use wgctl::netlink::genl::wireguard::{DeviceGateway, WireguardGateway};
use wgctl::tunnel::{CommandHookRunner, NetlinkLinkControl, TunnelController, TunnelState};
use wgctl::{Error, Result};

use crate::common::{LinkGuard, unique_port};

const PRIVATE_KEY: &str = "yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=";
const PEER: &str = "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=";

#[tokio::test]
async fn test_tunnel_lifecycle() -> Result<()> {
    require_root!();

    let guard = LinkGuard::new();
    let gateway = WireguardGateway::new().await?;
    let links = NetlinkLinkControl::new()?;
    let hooks = CommandHookRunner;
    let controller = TunnelController::new(&gateway, &links, &hooks);

    let mut config = TunnelConfig::new(&guard.name, PRIVATE_KEY, unique_port());
    config.interface.address = Some("10.98.0.2/24".parse().unwrap());
    config
        .peers
        .push(PeerConfig::new(PEER).allowed_ip("10.98.1.0/24".parse().unwrap()));
    config.post_up.push("true".into());
    config.pre_down.push("true".into());

    controller.up(&config).await?;
    assert_eq!(controller.state(), TunnelState::RoutedUp);
    assert!(gateway.exists(&InterfaceRef::name(&guard.name)).await);

    assert!(matches!(
        controller.up(&config).await,
        Err(Error::AlreadyUp { .. })
    ));

    controller.down(&config).await?;
    assert_eq!(controller.state(), TunnelState::Down);
    assert!(!gateway.exists(&InterfaceRef::name(&guard.name)).await);

    assert!(matches!(
        controller.down(&config).await,
        Err(Error::AlreadyDown { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_tunnel_without_address() -> Result<()> {
    require_root!();

    let guard = LinkGuard::new();
    let gateway = WireguardGateway::new().await?;
    let links = NetlinkLinkControl::new()?;
    let hooks = CommandHookRunner;
    let controller = TunnelController::new(&gateway, &links, &hooks);

    // Device routes need the link up even when no address is assigned.
    let mut config = TunnelConfig::new(&guard.name, PRIVATE_KEY, unique_port());
    config
        .peers
        .push(PeerConfig::new(PEER).allowed_ip("10.97.1.0/24".parse().unwrap()));

    controller.up(&config).await?;
    assert_eq!(controller.state(), TunnelState::RoutedUp);

    controller.down(&config).await?;
    assert!(!gateway.exists(&InterfaceRef::name(&guard.name)).await);

    Ok(())
}
