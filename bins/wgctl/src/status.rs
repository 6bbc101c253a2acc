//! status and info.

use std::io;

use wgctl::netlink::InterfaceRef;
use wgctl::netlink::genl::wireguard::{DeviceGateway, WireguardGateway};
use wgctl::output::{OutputFormat, TunnelInfo};
use wgctl::{Result, config};

use crate::cli;

/// `description (name)` when the definition has a description.
fn describe(instance: &str) -> String {
    match config::inspect(instance) {
        Ok(config) => match config.description {
            Some(description) => format!("{} ({})", description, instance),
            None => instance.to_string(),
        },
        Err(e) => {
            tracing::debug!(instance, error = %e, "no usable definition");
            instance.to_string()
        }
    }
}

pub async fn status(instance: &str) -> Result<()> {
    let config = config::inspect(instance)?;
    let gateway = WireguardGateway::new().await?;

    if !gateway.exists(&InterfaceRef::name(&config.instance)).await {
        cli::error("WireGuard interface is down.");
        std::process::exit(1);
    }

    cli::up("WireGuard interface is up");
    Ok(())
}

pub async fn status_all() -> Result<()> {
    let gateway = WireguardGateway::new().await?;
    let devices = gateway.list_devices().await?;

    for device in &devices {
        cli::up(&describe(device));
    }

    for instance in config::list_instances()? {
        if !devices.contains(&instance) {
            cli::down(&describe(&instance));
        }
    }
    Ok(())
}

pub async fn info(instance: &str, json: bool) -> Result<()> {
    let config = config::inspect(instance)?;
    let iface = InterfaceRef::name(&config.instance);
    let gateway = WireguardGateway::new().await?;

    if !gateway.exists(&iface).await {
        cli::fatal("device does not exist");
    }

    let device = gateway.query(&iface).await?;
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    TunnelInfo::new(&device, Some(&config)).print(&mut io::stdout().lock(), format)?;
    Ok(())
}
