//! Bring-up and tear-down sequencing.

use std::cell::Cell;

use tracing::{debug, info, warn};

use super::control::LinkControl;
use super::hooks::HookRunner;
use super::policy::{PolicyAction, PolicyOp, policy_operations};
use crate::config::TunnelConfig;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::wireguard::{DeviceGateway, build_set_device};
use crate::netlink::interface_ref::InterfaceRef;

/// Link kind created for every tunnel.
pub const WIREGUARD_KIND: &str = "wireguard";

/// Progress of a bring-up or tear-down.
///
/// Bring-up: `Down → Creating → Addressed → Configured → RoutedUp`.
/// Tear-down: `RoutedUp → Unrouted → LinkRemoved → Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    Down,
    Creating,
    Addressed,
    Configured,
    RoutedUp,
    Unrouted,
    LinkRemoved,
}

/// Sequences one tunnel through its lifecycle.
///
/// Steps are never rolled back: when bring-up fails half way, everything
/// done so far stays in place and [`state`](Self::state) tells how far it
/// got. Tear-down is the way out.
pub struct TunnelController<'a, G, L, H> {
    gateway: &'a G,
    links: &'a L,
    hooks: &'a H,
    state: Cell<TunnelState>,
}

impl<'a, G, L, H> TunnelController<'a, G, L, H>
where
    G: DeviceGateway,
    L: LinkControl,
    H: HookRunner,
{
    pub fn new(gateway: &'a G, links: &'a L, hooks: &'a H) -> Self {
        Self {
            gateway,
            links,
            hooks,
            state: Cell::new(TunnelState::Down),
        }
    }

    /// The last state reached.
    pub fn state(&self) -> TunnelState {
        self.state.get()
    }

    /// Whether a failed bring-up left anything behind.
    pub fn is_partial(&self) -> bool {
        self.state() != TunnelState::Down
    }

    fn transition(&self, instance: &str, to: TunnelState) {
        let from = self.state.replace(to);
        debug!(instance, ?from, ?to, "tunnel state");
    }

    /// Bring the tunnel up.
    ///
    /// Fails with [`Error::AlreadyUp`], before touching anything, when the
    /// device already exists. Keys and endpoints that do not decode are
    /// rejected before the first kernel call.
    pub async fn up(&self, config: &TunnelConfig) -> Result<()> {
        self.state.set(TunnelState::Down);
        let result = self.bring_up(config).await;
        if let Err(e) = &result
            && self.is_partial()
        {
            warn!(
                instance = %config.instance,
                state = ?self.state(),
                error = %e,
                "bring-up aborted, network stack left partially configured"
            );
        }
        result
    }

    async fn bring_up(&self, config: &TunnelConfig) -> Result<()> {
        let instance = config.instance.as_str();
        let iface = InterfaceRef::name(instance);

        build_set_device(&iface, config)?;

        if self.gateway.exists(&iface).await {
            return Err(Error::AlreadyUp {
                name: instance.to_string(),
            });
        }

        self.links.create_link(instance, WIREGUARD_KIND).await?;
        self.transition(instance, TunnelState::Creating);

        if let Some(address) = &config.interface.address {
            self.links.add_address(instance, address).await?;
        }
        // Device routes are refused on a link that is down.
        self.links.set_link_up(instance).await?;
        self.transition(instance, TunnelState::Addressed);

        self.gateway.configure(&iface, config).await?;
        self.transition(instance, TunnelState::Configured);

        let mut policy_installed = false;
        for peer in &config.peers {
            for network in &peer.allowed_ips {
                if !network.is_catch_all() {
                    self.links.add_route(network, instance, None).await?;
                } else if !policy_installed {
                    let table = u32::from(config.interface.listen_port);
                    for op in policy_operations(table, PolicyAction::Install) {
                        self.apply(instance, &op).await?;
                    }
                    policy_installed = true;
                }
            }
        }
        self.transition(instance, TunnelState::RoutedUp);

        if !config.post_up.is_empty() {
            info!(instance, "running post-up commands");
        }
        for command in &config.post_up {
            self.hooks.run(command).await?;
        }

        info!(instance, "tunnel up");
        Ok(())
    }

    async fn apply(&self, instance: &str, op: &PolicyOp) -> Result<()> {
        match op {
            PolicyOp::AddRoute { dst, table } => self.links.add_route(dst, instance, Some(*table)).await,
            PolicyOp::AddRule(rule) => self.links.add_rule(rule).await,
            PolicyOp::DeleteRule(rule) => self.links.delete_rule(rule).await,
        }
    }

    /// Tear the tunnel down.
    ///
    /// Fails with [`Error::AlreadyDown`] when the device does not exist.
    /// Failing to remove the catch-all rules is logged and ignored.
    pub async fn down(&self, config: &TunnelConfig) -> Result<()> {
        let instance = config.instance.as_str();

        if !self.gateway.exists(&InterfaceRef::name(instance)).await {
            self.state.set(TunnelState::Down);
            return Err(Error::AlreadyDown {
                name: instance.to_string(),
            });
        }
        self.state.set(TunnelState::RoutedUp);

        if !config.pre_down.is_empty() {
            info!(instance, "running pre-down commands");
        }
        for command in &config.pre_down {
            self.hooks.run(command).await?;
        }

        // Routes through the link, including the policy table route, go
        // away with it.
        self.links.delete_link(instance).await?;
        self.transition(instance, TunnelState::Unrouted);
        self.transition(instance, TunnelState::LinkRemoved);

        if config.has_catch_all() {
            let table = u32::from(config.interface.listen_port);
            for op in policy_operations(table, PolicyAction::Remove) {
                if let Err(e) = self.apply(instance, &op).await {
                    warn!(instance, ?op, error = %e, "could not remove policy rule");
                }
            }
        }
        self.transition(instance, TunnelState::Down);

        info!(instance, "tunnel down");
        Ok(())
    }

    /// Tear down, then bring up with a freshly loaded definition.
    ///
    /// Not atomic: when tear-down fails, `reload` is not called and the
    /// tunnel is not brought back.
    pub async fn restart<F>(&self, config: &TunnelConfig, reload: F) -> Result<()>
    where
        F: FnOnce() -> Result<TunnelConfig>,
    {
        self.down(config).await?;
        let fresh = reload()?;
        self.up(&fresh).await
    }
}
