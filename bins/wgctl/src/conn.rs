//! up, down and restart.

use wgctl::netlink::InterfaceRef;
use wgctl::netlink::genl::wireguard::{DeviceGateway, WireguardGateway};
use wgctl::tunnel::{CommandHookRunner, NetlinkLinkControl, TunnelController};
use wgctl::{Error, Result, config};

use crate::cli;

const ABORTED: &str = "had to abort early, network stack might be in unknown state.";

/// Collaborators for one invocation.
struct Stack {
    gateway: WireguardGateway,
    links: NetlinkLinkControl,
    hooks: CommandHookRunner,
}

impl Stack {
    async fn open() -> Result<Self> {
        Ok(Self {
            gateway: WireguardGateway::new().await?,
            links: NetlinkLinkControl::new()?,
            hooks: CommandHookRunner,
        })
    }

    fn controller(&self) -> TunnelController<'_, WireguardGateway, NetlinkLinkControl, CommandHookRunner> {
        TunnelController::new(&self.gateway, &self.links, &self.hooks)
    }
}

pub async fn up(instance: &str) -> Result<()> {
    let config = config::inspect(instance)?;
    let stack = Stack::open().await?;

    // A running tunnel is reported as such even if its key file is gone.
    if stack.gateway.exists(&InterfaceRef::name(&config.instance)).await {
        return Err(Error::AlreadyUp {
            name: config.instance,
        });
    }
    let config = config::with_private_key(config)?;
    let controller = stack.controller();

    if let Err(e) = controller.up(&config).await {
        if controller.is_partial() {
            cli::error(&e.to_string());
            cli::fatal(ABORTED);
        }
        return Err(e);
    }

    cli::ok("tunnel set up successfully");
    Ok(())
}

pub async fn down(instance: &str) -> Result<()> {
    let config = config::inspect(instance)?;
    let stack = Stack::open().await?;

    stack.controller().down(&config).await?;

    cli::ok("tunnel brought down successfully");
    Ok(())
}

pub async fn restart(instance: &str) -> Result<()> {
    let config = config::inspect(instance)?;
    let stack = Stack::open().await?;
    let controller = stack.controller();

    cli::info(&format!("restarting {}", config.instance));
    if let Err(e) = controller.restart(&config, || config::load(instance)).await {
        if controller.is_partial() {
            cli::error(&e.to_string());
            cli::fatal(ABORTED);
        }
        return Err(e);
    }

    cli::ok("tunnel restarted successfully");
    Ok(())
}
